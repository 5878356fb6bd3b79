//! Preflight engine.
//!
//! 1. Staging: preflight-send per extension selected in the batch; empty
//!    payloads skip it.
//! 2. Production: preflight-check per extension; rows land under
//!    `extras/<id>`.
//! 3. Staging: preflight-display per extension. Each callback sees a
//!    snapshot of the whole report and returns its edits through a
//!    `ReportEdits` accumulator; the edits are applied before the next
//!    extension runs.
//!
//! The batch is blocked iff an `__error__` exists anywhere in the report.

use crate::config::EngineConfig;
use crate::error::{CallbackFault, DeployError, DeployResult};
use crate::invoke::{decode, fault, invoke};
use crate::link::{call_production, ProductionLink};
use crate::protocol::{
    DeployEnvelope, DeployRequest, DeployResponse, ExtensionPayloads, ExtensionReply,
};
use crate::registry::Registry;
use ramp_extension::ReportEdits;
use ramp_types::{
    is_empty_payload, AttributedEdit, Batch, Capability, Fault, MessageKind, PreflightOutcome,
    PreflightReport, PreflightRow, RowPath,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one preflight pass.
pub struct PreflightEngine {
    registry: Arc<Registry>,
    link: Arc<dyn ProductionLink>,
    config: EngineConfig,
}

impl PreflightEngine {
    pub fn new(registry: Arc<Registry>, link: Arc<dyn ProductionLink>, config: EngineConfig) -> Self {
        Self {
            registry,
            link,
            config,
        }
    }

    /// Runs preflight over `batch`, starting from `seed` (rows the host
    /// contributes for its own content categories).
    ///
    /// Returns `Err` only when the production request itself fails.
    pub async fn run(&self, batch: &Batch, seed: PreflightReport) -> DeployResult<PreflightOutcome> {
        info!(batch_id = %batch.id, "Preflight started");
        let mut outcome = PreflightOutcome {
            report: seed,
            ..Default::default()
        };
        let shared_batch = Arc::new(batch.clone());

        // Staging: gather payloads.
        let mut data = ExtensionPayloads::new();
        for ext in self.registry.with_capability(Capability::PreflightSend) {
            if batch.extras_for(ext.id()).is_empty() {
                debug!(extension_id = %ext.id(), "Preflight skipped: not in batch");
                outcome.skipped.push(ext.id().clone());
                continue;
            }
            let b = Arc::clone(&shared_batch);
            match invoke(
                ext,
                Capability::PreflightSend,
                self.config.callback_timeout(),
                move |e| e.preflight_send(&b),
            )
            .await
            {
                Ok(Some(payload)) if !is_empty_payload(&payload) => {
                    data.insert(ext.id().clone(), payload);
                }
                Ok(_) => {
                    debug!(extension_id = %ext.id(), "Preflight skipped: nothing to send");
                    outcome.skipped.push(ext.id().clone());
                }
                Err(f) => record(&mut outcome, f),
            }
        }

        // Production: check payloads.
        if !data.is_empty() {
            let envelope = DeployEnvelope::new(
                batch.id,
                DeployRequest::PreflightCheck {
                    data: data.clone(),
                    batch: batch.clone(),
                },
            );
            let mut replies =
                match call_production(&*self.link, envelope, self.config.remote_timeout())
                    .await?
                {
                    DeployResponse::PreflightCheck { replies } => replies,
                    other => {
                        return Err(DeployError::Protocol(format!(
                            "expected preflight_check response, got {}",
                            other.kind()
                        )));
                    }
                };

            for ext in self.registry.iter() {
                if !data.contains_key(ext.id()) {
                    continue;
                }
                let result: Result<PreflightRow, Fault> = match replies.remove(ext.id()) {
                    None => {
                        debug!(extension_id = %ext.id(), "No preflight check on production");
                        continue;
                    }
                    Some(ExtensionReply::Ok(value)) => {
                        decode(ext.id(), Capability::PreflightCheck, value)
                    }
                    Some(ExtensionReply::Fault(message)) => Err(fault(
                        ext.id(),
                        Capability::PreflightCheck,
                        CallbackFault::Failed(message),
                    )),
                    Some(ExtensionReply::NotRegistered) => Err(fault(
                        ext.id(),
                        Capability::PreflightCheck,
                        CallbackFault::NotRegistered,
                    )),
                };
                match result {
                    Ok(row) => {
                        // Keep any warning already recorded for this row.
                        let path = RowPath::extra(ext.id());
                        let target = outcome.report.resolve_mut(&path);
                        merge_row(target, row);
                    }
                    Err(f) => record(&mut outcome, f),
                }
            }
        }

        // Staging: display hooks.
        for ext in self.registry.with_capability(Capability::PreflightDisplay) {
            let snapshot = Arc::new(outcome.report.clone());
            let result = invoke(
                ext,
                Capability::PreflightDisplay,
                self.config.callback_timeout(),
                move |e| {
                    let mut edits = ReportEdits::new();
                    e.preflight_display(&snapshot, &mut edits)?;
                    Ok(edits)
                },
            )
            .await;

            match result {
                Ok(edits) => {
                    if !edits.is_empty() {
                        debug!(extension_id = %ext.id(), edits = edits.len(), "Applying display edits");
                    }
                    edits.apply_to(&mut outcome.report);
                    outcome
                        .edits
                        .extend(edits.into_edits().into_iter().map(|edit| AttributedEdit {
                            extension_id: ext.id().clone(),
                            edit,
                        }));
                }
                Err(f) => record(&mut outcome, f),
            }
        }

        outcome.blocked = outcome.report.has_errors();
        info!(
            batch_id = %batch.id,
            blocked = outcome.blocked,
            errors = outcome.report.error_count(),
            faults = outcome.faults.len(),
            "Preflight finished"
        );
        Ok(outcome)
    }
}

/// Records a fault and surfaces it as a warning on the extension's own row.
fn record(outcome: &mut PreflightOutcome, f: Fault) {
    outcome
        .report
        .resolve_mut(&RowPath::extra(&f.extension_id))
        .push(MessageKind::Warning, f.to_string());
    outcome.faults.push(f);
}

fn merge_row(target: &mut PreflightRow, row: PreflightRow) {
    target.messages.extend(row.messages);
    target.notices.extend(row.notices);
    target.warnings.extend(row.warnings);
    target.errors.extend(row.errors);
    target.rows.extend(row.rows);
}
