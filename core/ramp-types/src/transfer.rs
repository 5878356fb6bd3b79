//! Transfer results.

use crate::fault::Fault;
use crate::ids::ExtensionId;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// What a receive callback reports back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferResult {
    pub success: bool,
    pub message: String,
}

impl TransferResult {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

/// Result of one invoked extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferOutcome {
    pub extension_id: ExtensionId,
    pub name: String,
    #[serde(flatten)]
    pub result: TransferResult,
}

/// Result of a whole transfer stage.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransferReport {
    /// Invoked extensions in registration order; skipped ones are absent.
    pub outcomes: Vec<TransferOutcome>,
    pub faults: Vec<Fault>,
    pub success: bool,
    pub completed_at: DateTime<Utc>,
}

impl TransferReport {
    /// Aggregates outcomes: success is the AND over all of them.
    pub fn from_outcomes(outcomes: Vec<TransferOutcome>, faults: Vec<Fault>) -> Self {
        let success = outcomes.iter().all(|o| o.result.success);
        Self {
            outcomes,
            faults,
            success,
            completed_at: Utc::now(),
        }
    }

    pub fn outcome(&self, extension_id: &ExtensionId) -> Option<&TransferOutcome> {
        self.outcomes.iter().find(|o| &o.extension_id == extension_id)
    }

    /// Outcomes that reported `success = false`.
    pub fn failures(&self) -> impl Iterator<Item = &TransferOutcome> {
        self.outcomes.iter().filter(|o| !o.result.success)
    }
}

/// Whether a send payload means "nothing to transfer".
///
/// Null, `false`, empty strings, empty arrays, and empty objects are empty.
#[must_use]
pub fn is_empty_payload(payload: &Value) -> bool {
    match payload {
        Value::Null => true,
        Value::Bool(b) => !b,
        Value::String(s) => s.is_empty(),
        Value::Array(a) => a.is_empty(),
        Value::Object(o) => o.is_empty(),
        Value::Number(_) => false,
    }
}
