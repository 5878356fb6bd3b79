//! Transfer engine.
//!
//! Send runs on staging, receive on production, and only for extensions with
//! at least one row selected in the batch. An empty send payload means
//! the extension has nothing to deploy: receive is not called and the
//! extension is left out of the report. Each extension owns its own
//! atomicity; a failed extension never rolls back the others.

use crate::config::EngineConfig;
use crate::error::{CallbackFault, DeployError, DeployResult};
use crate::invoke::{decode, fault, invoke};
use crate::link::{call_production, ProductionLink};
use crate::protocol::{
    DeployEnvelope, DeployRequest, DeployResponse, ExtensionPayloads, ExtensionReply,
};
use crate::registry::{RegisteredExtension, Registry};
use ramp_extension::SendMode;
use ramp_types::{
    is_empty_payload, Batch, Capability, Fault, TransferOutcome, TransferReport, TransferResult,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Runs one transfer pass.
pub struct TransferEngine {
    registry: Arc<Registry>,
    link: Arc<dyn ProductionLink>,
    config: EngineConfig,
}

impl TransferEngine {
    pub fn new(registry: Arc<Registry>, link: Arc<dyn ProductionLink>, config: EngineConfig) -> Self {
        Self {
            registry,
            link,
            config,
        }
    }

    /// Transfers everything the batch selected.
    ///
    /// Returns `Err` only when the production request itself fails.
    pub async fn run(&self, batch: &Batch) -> DeployResult<TransferReport> {
        info!(batch_id = %batch.id, "Transfer started");
        let mut outcomes: Vec<TransferOutcome> = Vec::new();
        let mut faults: Vec<Fault> = Vec::new();
        let shared_batch = Arc::new(batch.clone());

        // Staging: send.
        let mut data = ExtensionPayloads::new();
        for ext in self.registry.with_capability(Capability::Send) {
            if batch.extras_for(ext.id()).is_empty() {
                debug!(extension_id = %ext.id(), "Not in batch");
                continue;
            }
            let b = Arc::clone(&shared_batch);
            match invoke(
                ext,
                Capability::Send,
                self.config.callback_timeout(),
                move |e| e.send(&b, SendMode::Batch),
            )
            .await
            {
                Ok(Some(payload)) if !is_empty_payload(&payload) => {
                    data.insert(ext.id().clone(), payload);
                }
                Ok(_) => debug!(extension_id = %ext.id(), "Nothing to transfer"),
                Err(f) => {
                    outcomes.push(failed(ext, &f));
                    faults.push(f);
                }
            }
        }

        // Production: receive.
        if !data.is_empty() {
            let envelope = DeployEnvelope::new(batch.id, DeployRequest::Receive { data: data.clone() });
            let mut replies =
                match call_production(&*self.link, envelope, self.config.remote_timeout())
                    .await?
                {
                    DeployResponse::Receive { replies } => replies,
                    other => {
                        return Err(DeployError::Protocol(format!(
                            "expected receive response, got {}",
                            other.kind()
                        )));
                    }
                };

            for ext in self.registry.iter() {
                if !data.contains_key(ext.id()) {
                    continue;
                }
                let result: Result<TransferResult, Fault> = match replies.remove(ext.id()) {
                    Some(ExtensionReply::Ok(value)) => decode(ext.id(), Capability::Receive, value),
                    Some(ExtensionReply::Fault(message)) => Err(fault(
                        ext.id(),
                        Capability::Receive,
                        CallbackFault::Failed(message),
                    )),
                    Some(ExtensionReply::NotRegistered) => Err(fault(
                        ext.id(),
                        Capability::Receive,
                        CallbackFault::NotRegistered,
                    )),
                    None => Err(fault(
                        ext.id(),
                        Capability::Receive,
                        CallbackFault::Failed("no reply from production".into()),
                    )),
                };
                match result {
                    Ok(result) => {
                        if !result.success {
                            warn!(extension_id = %ext.id(), message = %result.message, "Transfer failed");
                        }
                        outcomes.push(TransferOutcome {
                            extension_id: ext.id().clone(),
                            name: ext.name().to_string(),
                            result,
                        });
                    }
                    Err(f) => {
                        outcomes.push(failed(ext, &f));
                        faults.push(f);
                    }
                }
            }
        }

        // Registration order, whichever side produced the outcome.
        let order = self.registry.ids();
        outcomes.sort_by_key(|o| order.iter().position(|id| id == &o.extension_id));

        let report = TransferReport::from_outcomes(outcomes, faults);
        info!(
            batch_id = %batch.id,
            success = report.success,
            invoked = report.outcomes.len(),
            "Transfer finished"
        );
        Ok(report)
    }
}

fn failed(ext: &RegisteredExtension, f: &Fault) -> TransferOutcome {
    TransferOutcome {
        extension_id: ext.id().clone(),
        name: ext.name().to_string(),
        result: TransferResult::failed(f.message.clone()),
    }
}
