//! Comparison ("new batch") engine.
//!
//! 1. Staging: comparison-send per extension, rows wrapped as `StagedRow`.
//! 2. Production: comparison-check per extension, one verdict per row.
//! 3. Staging: selection-row per row present on both sides.

use crate::config::EngineConfig;
use crate::error::{CallbackFault, DeployError, DeployResult};
use crate::invoke::{decode, fault, invoke};
use crate::link::{call_production, ProductionLink};
use crate::protocol::{DeployEnvelope, DeployRequest, DeployResponse, ExtensionReply};
use crate::registry::{RegisteredExtension, Registry};
use ramp_types::{
    Batch, Capability, CompiledComparison, ComparisonReport, ComparisonRow, RemoteStatuses,
    SelectionRow, SelectionRowInput, StagedRow, StagedRows,
};
use std::sync::Arc;
use tracing::{debug, info};

/// Runs one comparison pass.
pub struct ComparisonEngine {
    registry: Arc<Registry>,
    link: Arc<dyn ProductionLink>,
    config: EngineConfig,
}

impl ComparisonEngine {
    pub fn new(registry: Arc<Registry>, link: Arc<dyn ProductionLink>, config: EngineConfig) -> Self {
        Self {
            registry,
            link,
            config,
        }
    }

    /// Compares staging with production for every extension.
    ///
    /// Returns `Err` only when the production request itself fails.
    pub async fn run(&self, batch: &Batch) -> DeployResult<ComparisonReport> {
        info!(batch_id = %batch.id, "Comparison started");
        let mut report = ComparisonReport::default();
        let shared_batch = Arc::new(batch.clone());

        // Staging: collect rows.
        let mut compiled = CompiledComparison::new();
        for ext in self.registry.with_capability(Capability::ComparisonSend) {
            let b = Arc::clone(&shared_batch);
            match invoke(
                ext,
                Capability::ComparisonSend,
                self.config.callback_timeout(),
                move |e| e.comparison_send(&b),
            )
            .await
            {
                Ok(rows) if rows.is_empty() => {
                    debug!(extension_id = %ext.id(), "No comparison rows");
                }
                Ok(rows) => {
                    let staged: StagedRows = rows
                        .into_iter()
                        .map(|(row_id, status)| (row_id, StagedRow::new(status)))
                        .collect();
                    compiled.insert(ext.id().clone(), staged);
                }
                Err(f) => report.faults.push(f),
            }
        }

        if compiled.is_empty() {
            info!(batch_id = %batch.id, "Comparison finished: nothing to compare");
            return Ok(report);
        }

        // Production: check rows.
        let envelope = DeployEnvelope::new(
            batch.id,
            DeployRequest::ComparisonCheck {
                compiled: compiled.clone(),
            },
        );
        let mut replies =
            match call_production(&*self.link, envelope, self.config.remote_timeout())
                .await?
            {
                DeployResponse::ComparisonCheck { replies } => replies,
                other => {
                    return Err(DeployError::Protocol(format!(
                        "expected comparison_check response, got {}",
                        other.kind()
                    )));
                }
            };

        // Staging: build selection rows.
        for ext in self.registry.iter() {
            let Some(staged) = compiled.remove(ext.id()) else {
                continue;
            };
            let verdicts: RemoteStatuses = match replies.remove(ext.id()) {
                None => {
                    debug!(extension_id = %ext.id(), "No comparison check on production");
                    continue;
                }
                Some(ExtensionReply::Ok(value)) => {
                    match decode(ext.id(), Capability::ComparisonCheck, value) {
                        Ok(v) => v,
                        Err(f) => {
                            report.faults.push(f);
                            continue;
                        }
                    }
                }
                Some(ExtensionReply::Fault(message)) => {
                    report.faults.push(fault(
                        ext.id(),
                        Capability::ComparisonCheck,
                        CallbackFault::Failed(message),
                    ));
                    continue;
                }
                Some(ExtensionReply::NotRegistered) => {
                    report.faults.push(fault(
                        ext.id(),
                        Capability::ComparisonCheck,
                        CallbackFault::NotRegistered,
                    ));
                    continue;
                }
            };

            for (row_id, staged_row) in staged {
                let Some(remote_status) = verdicts.get(&row_id).cloned() else {
                    continue;
                };
                let input = SelectionRowInput {
                    status: staged_row.status,
                    remote_status,
                    id: ext.id().clone(),
                    in_batch: batch.contains_extra(ext.id(), &row_id),
                    extra_id: row_id,
                };
                match self.selection_row(ext, &input).await {
                    Ok(selection) => report.rows.push(ComparisonRow {
                        extension_id: input.id,
                        row_id: input.extra_id,
                        status: input.status,
                        remote_status: input.remote_status,
                        selection,
                    }),
                    Err(f) => report.faults.push(f),
                }
            }
        }

        info!(
            batch_id = %batch.id,
            rows = report.rows.len(),
            faults = report.faults.len(),
            "Comparison finished"
        );
        Ok(report)
    }

    async fn selection_row(
        &self,
        ext: &RegisteredExtension,
        input: &SelectionRowInput,
    ) -> Result<SelectionRow, ramp_types::Fault> {
        if !ext.supports(Capability::ComparisonSelectionRow) {
            return Ok(SelectionRow::informational(ext.name(), ext.description()));
        }

        let owned = input.clone();
        let row = invoke(
            ext,
            Capability::ComparisonSelectionRow,
            self.config.callback_timeout(),
            move |e| e.comparison_selection_row(&owned),
        )
        .await?;

        row.validate().map_err(|reason| {
            fault(
                ext.id(),
                Capability::ComparisonSelectionRow,
                CallbackFault::Malformed(reason),
            )
        })?;
        Ok(row)
    }
}
