//! Production side of the protocol.
//!
//! Receives one request per stage, runs the matching production callbacks
//! in registration order, and answers with one reply per extension.

use crate::config::EngineConfig;
use crate::error::CallbackFault;
use crate::invoke::{fault, invoke};
use crate::protocol::{
    DeployEnvelope, DeployRequest, DeployResponse, ExtensionPayloads, ExtensionReplies,
    ExtensionReply, PROTOCOL_VERSION,
};
use crate::registry::{RegisteredExtension, Registry};
use ramp_types::{Batch, Capability, CompiledComparison, ExtensionId, Fault};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Answers staging's requests using the production registry.
pub struct ProductionResponder {
    registry: Arc<Registry>,
    config: EngineConfig,
}

impl ProductionResponder {
    pub fn new(registry: Arc<Registry>, config: EngineConfig) -> Self {
        Self { registry, config }
    }

    pub fn registry(&self) -> &Arc<Registry> {
        &self.registry
    }

    pub fn environment(&self) -> &str {
        &self.config.environment
    }

    /// Handles one request from staging.
    pub async fn handle(&self, envelope: DeployEnvelope) -> DeployResponse {
        if envelope.version != PROTOCOL_VERSION {
            warn!(
                got = envelope.version,
                expected = PROTOCOL_VERSION,
                "Rejecting request with mismatched protocol version"
            );
            return DeployResponse::error(format!(
                "version mismatch: expected {PROTOCOL_VERSION}, got {}",
                envelope.version
            ));
        }

        info!(
            batch_id = %envelope.batch_id,
            request = envelope.request.kind(),
            "Handling deploy request"
        );

        match envelope.request {
            DeployRequest::Hello { environment } => {
                debug!(peer = %environment, "Hello from staging");
                DeployResponse::HelloAck {
                    environment: self.config.environment.clone(),
                    extensions: self.registry.summaries(),
                }
            }
            DeployRequest::ComparisonCheck { compiled } => DeployResponse::ComparisonCheck {
                replies: self.comparison_check(compiled).await,
            },
            DeployRequest::PreflightCheck { data, batch } => DeployResponse::PreflightCheck {
                replies: self.preflight_check(data, batch).await,
            },
            DeployRequest::Receive { data } => DeployResponse::Receive {
                replies: self.receive(data).await,
            },
        }
    }

    async fn comparison_check(&self, compiled: CompiledComparison) -> ExtensionReplies {
        let mut replies = self.unregistered(compiled.keys());
        let compiled = Arc::new(compiled);

        for ext in self.registry.with_capability(Capability::ComparisonCheck) {
            if !compiled.contains_key(ext.id()) {
                continue;
            }
            let shared = Arc::clone(&compiled);
            let id = ext.id().clone();
            let result = invoke(
                ext,
                Capability::ComparisonCheck,
                self.config.callback_timeout(),
                move |e| {
                    let rows = shared.get(&id).cloned().unwrap_or_default();
                    e.comparison_check(&rows, &shared)
                },
            )
            .await;
            replies.insert(ext.id().clone(), reply(ext, Capability::ComparisonCheck, result));
        }
        replies
    }

    async fn preflight_check(&self, data: ExtensionPayloads, batch: Batch) -> ExtensionReplies {
        let mut replies = self.unregistered(data.keys());
        let batch = Arc::new(batch);

        for ext in self.registry.with_capability(Capability::PreflightCheck) {
            let Some(payload) = data.get(ext.id()).cloned() else {
                continue;
            };
            let batch = Arc::clone(&batch);
            let result = invoke(
                ext,
                Capability::PreflightCheck,
                self.config.callback_timeout(),
                move |e| e.preflight_check(&payload, &batch),
            )
            .await;
            replies.insert(ext.id().clone(), reply(ext, Capability::PreflightCheck, result));
        }
        replies
    }

    async fn receive(&self, data: ExtensionPayloads) -> ExtensionReplies {
        let mut replies = self.unregistered(data.keys());

        for ext in self.registry.iter() {
            let Some(payload) = data.get(ext.id()).cloned() else {
                continue;
            };
            // A payload for an extension without a receive slot is reported
            // as a fault, never dropped.
            let result = invoke(
                ext,
                Capability::Receive,
                self.config.callback_timeout(),
                move |e| e.receive(&payload),
            )
            .await;
            replies.insert(ext.id().clone(), reply(ext, Capability::Receive, result));
        }
        replies
    }

    /// `NotRegistered` replies for ids production does not know.
    fn unregistered<'a>(&self, ids: impl Iterator<Item = &'a ExtensionId>) -> ExtensionReplies {
        ids.filter(|id| !self.registry.contains(id))
            .map(|id| {
                warn!(extension_id = %id, "Request names an extension not registered on production");
                (id.clone(), ExtensionReply::NotRegistered)
            })
            .collect()
    }
}

fn reply<T: Serialize>(
    ext: &RegisteredExtension,
    capability: Capability,
    result: Result<T, Fault>,
) -> ExtensionReply {
    match result.and_then(|value| {
        serde_json::to_value(value).map_err(|e| {
            fault(ext.id(), capability, CallbackFault::Malformed(e.to_string()))
        })
    }) {
        Ok(value) => ExtensionReply::Ok(value),
        Err(f) => ExtensionReply::Fault(f.message),
    }
}
