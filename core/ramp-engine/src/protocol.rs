//! Staging ↔ production protocol messages.
//!
//! Each stage makes exactly one request: staging sends a
//! [`DeployEnvelope`], production answers with a [`DeployResponse`]. Results
//! are carried per extension as [`ExtensionReply`] so one extension's failure
//! never spoils the others.

use crate::registry::ExtensionSummary;
use ramp_types::{Batch, BatchId, CompiledComparison, ExtensionId};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Protocol version for compatibility checking.
pub const PROTOCOL_VERSION: u32 = 1;

/// Per-extension payloads, keyed by extension id.
pub type ExtensionPayloads = BTreeMap<ExtensionId, Value>;

/// Per-extension replies, keyed by extension id.
pub type ExtensionReplies = BTreeMap<ExtensionId, ExtensionReply>;

/// A request from staging, stamped with the protocol version.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeployEnvelope {
    pub version: u32,
    pub batch_id: BatchId,
    pub request: DeployRequest,
}

impl DeployEnvelope {
    pub fn new(batch_id: BatchId, request: DeployRequest) -> Self {
        Self {
            version: PROTOCOL_VERSION,
            batch_id,
            request,
        }
    }
}

/// What staging asks production to do.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeployRequest {
    /// Handshake: exchange environment names and registered extensions.
    Hello { environment: String },

    /// Comparison step 2: check every extension's staged rows.
    ComparisonCheck { compiled: CompiledComparison },

    /// Preflight step 2: validate preflight-send payloads.
    PreflightCheck {
        data: ExtensionPayloads,
        batch: Batch,
    },

    /// Transfer step 2: apply send payloads.
    Receive { data: ExtensionPayloads },
}

impl DeployRequest {
    /// Short name for logs and errors.
    pub fn kind(&self) -> &'static str {
        match self {
            DeployRequest::Hello { .. } => "hello",
            DeployRequest::ComparisonCheck { .. } => "comparison_check",
            DeployRequest::PreflightCheck { .. } => "preflight_check",
            DeployRequest::Receive { .. } => "receive",
        }
    }
}

/// Production's answer.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum DeployResponse {
    HelloAck {
        environment: String,
        extensions: Vec<ExtensionSummary>,
    },
    ComparisonCheck { replies: ExtensionReplies },
    PreflightCheck { replies: ExtensionReplies },
    Receive { replies: ExtensionReplies },
    /// The request as a whole was rejected.
    Error { message: String },
}

impl DeployResponse {
    pub fn error(message: impl Into<String>) -> Self {
        DeployResponse::Error {
            message: message.into(),
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            DeployResponse::HelloAck { .. } => "hello_ack",
            DeployResponse::ComparisonCheck { .. } => "comparison_check",
            DeployResponse::PreflightCheck { .. } => "preflight_check",
            DeployResponse::Receive { .. } => "receive",
            DeployResponse::Error { .. } => "error",
        }
    }
}

/// One extension's result on production.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", content = "value", rename_all = "snake_case")]
pub enum ExtensionReply {
    /// The callback's serialized result.
    Ok(Value),
    /// The callback faulted on production.
    Fault(String),
    /// Production has no extension with this id.
    NotRegistered,
}
