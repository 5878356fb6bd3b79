//! Batch coordinator.
//!
//! Owns one batch and drives it through comparison, preflight and transfer:
//!
//! ```text
//! Building → Comparing → AwaitingSelection → Preflighting ─┬→ Blocked
//!                                                          └→ Transferring → Completed
//! ```
//!
//! A stage that fails at the transport level leaves the batch in the stage
//! it was in before the call. `Blocked` and `Completed` are terminal.

use crate::comparison::ComparisonEngine;
use crate::config::EngineConfig;
use crate::error::{DeployError, DeployResult};
use crate::link::{call_production, ProductionLink};
use crate::preflight::PreflightEngine;
use crate::protocol::{DeployEnvelope, DeployRequest, DeployResponse};
use crate::registry::{ExtensionSummary, Registry};
use crate::transfer::TransferEngine;
use ramp_types::{
    Batch, BatchId, ComparisonReport, ExtensionId, PreflightOutcome, PreflightReport,
    TransferReport,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info, warn};

/// Where a batch is in its lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStage {
    Building,
    Comparing,
    AwaitingSelection,
    Preflighting,
    Blocked,
    Transferring,
    Completed,
}

impl BatchStage {
    pub fn is_terminal(self) -> bool {
        matches!(self, BatchStage::Blocked | BatchStage::Completed)
    }
}

/// Overall verdict for a batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchStatus {
    InProgress,
    ValidationBlocked,
    TransferPartialFailure,
    Succeeded,
}

/// Everything known about a batch so far.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BatchReport {
    pub batch_id: BatchId,
    pub stage: BatchStage,
    pub comparison: Option<ComparisonReport>,
    pub preflight: Option<PreflightOutcome>,
    pub transfer: Option<TransferReport>,
}

impl BatchReport {
    pub fn status(&self) -> BatchStatus {
        match (&self.preflight, &self.transfer) {
            (_, Some(t)) if t.success => BatchStatus::Succeeded,
            (_, Some(_)) => BatchStatus::TransferPartialFailure,
            (Some(p), None) if p.blocked => BatchStatus::ValidationBlocked,
            _ => BatchStatus::InProgress,
        }
    }
}

/// Result of the hello exchange with production.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HandshakeReport {
    pub environment: String,
    pub extensions: Vec<ExtensionSummary>,
    /// Registered on staging but unknown to production.
    pub missing_on_production: Vec<ExtensionId>,
    /// Registered on production only.
    pub only_on_production: Vec<ExtensionId>,
}

impl HandshakeReport {
    pub fn is_matched(&self) -> bool {
        self.missing_on_production.is_empty() && self.only_on_production.is_empty()
    }
}

/// Drives a single batch from staging.
pub struct BatchCoordinator {
    registry: Arc<Registry>,
    link: Arc<dyn ProductionLink>,
    config: EngineConfig,
    batch: Batch,
    stage: BatchStage,
    comparison: Option<ComparisonReport>,
    preflight: Option<PreflightOutcome>,
    transfer: Option<TransferReport>,
}

impl BatchCoordinator {
    pub fn new(
        registry: Arc<Registry>,
        link: Arc<dyn ProductionLink>,
        config: EngineConfig,
        batch: Batch,
    ) -> Self {
        Self {
            registry,
            link,
            config,
            batch,
            stage: BatchStage::Building,
            comparison: None,
            preflight: None,
            transfer: None,
        }
    }

    pub fn stage(&self) -> BatchStage {
        self.stage
    }

    pub fn batch(&self) -> &Batch {
        &self.batch
    }

    /// Mutable access to the batch while it is still being assembled.
    pub fn batch_mut(&mut self) -> DeployResult<&mut Batch> {
        self.require_stage("edit batch", &[BatchStage::Building, BatchStage::AwaitingSelection])?;
        Ok(&mut self.batch)
    }

    pub fn comparison(&self) -> Option<&ComparisonReport> {
        self.comparison.as_ref()
    }

    pub fn preflight_outcome(&self) -> Option<&PreflightOutcome> {
        self.preflight.as_ref()
    }

    pub fn transfer_report(&self) -> Option<&TransferReport> {
        self.transfer.as_ref()
    }

    pub fn report(&self) -> BatchReport {
        BatchReport {
            batch_id: self.batch.id,
            stage: self.stage,
            comparison: self.comparison.clone(),
            preflight: self.preflight.clone(),
            transfer: self.transfer.clone(),
        }
    }

    /// Exchanges environment names and extension lists with production.
    /// Does not change the stage.
    pub async fn handshake(&self) -> DeployResult<HandshakeReport> {
        let envelope = DeployEnvelope::new(
            self.batch.id,
            DeployRequest::Hello {
                environment: self.config.environment.clone(),
            },
        );
        let (environment, extensions) =
            match call_production(&*self.link, envelope, self.config.remote_timeout()).await? {
                DeployResponse::HelloAck {
                    environment,
                    extensions,
                } => (environment, extensions),
                other => {
                    return Err(DeployError::Protocol(format!(
                        "expected hello_ack, got {}",
                        other.kind()
                    )));
                }
            };

        let local = self.registry.ids();
        let missing_on_production = local
            .iter()
            .filter(|id| !extensions.iter().any(|s| &s.id == *id))
            .cloned()
            .collect::<Vec<_>>();
        let only_on_production = extensions
            .iter()
            .filter(|s| !local.contains(&s.id))
            .map(|s| s.id.clone())
            .collect::<Vec<_>>();

        for id in &missing_on_production {
            warn!(extension_id = %id, "Extension not registered on production");
        }
        info!(production = %environment, extensions = extensions.len(), "Handshake complete");

        Ok(HandshakeReport {
            environment,
            extensions,
            missing_on_production,
            only_on_production,
        })
    }

    /// Runs the comparison and applies each row's default selection to the
    /// batch.
    pub async fn compare(&mut self) -> DeployResult<&ComparisonReport> {
        self.require_stage("compare", &[BatchStage::Building])?;
        let previous = self.enter(BatchStage::Comparing);

        let engine = ComparisonEngine::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.link),
            self.config.clone(),
        );
        let report = match engine.run(&self.batch).await {
            Ok(report) => report,
            Err(e) => return Err(self.restore(previous, e)),
        };

        for row in &report.rows {
            match row.selection.selected {
                Some(true) => self.batch.select_extra(&row.extension_id, row.row_id.clone()),
                Some(false) => {
                    self.batch.deselect_extra(&row.extension_id, &row.row_id);
                }
                None => {}
            }
        }

        self.enter(BatchStage::AwaitingSelection);
        Ok(&*self.comparison.insert(report))
    }

    /// Checks or unchecks one comparison row.
    pub fn set_selected(
        &mut self,
        extension_id: &ExtensionId,
        row_id: &str,
        selected: bool,
    ) -> DeployResult<()> {
        self.require_stage("change selection", &[BatchStage::AwaitingSelection])?;

        let row = self
            .comparison
            .as_mut()
            .and_then(|c| {
                c.rows
                    .iter_mut()
                    .find(|r| &r.extension_id == extension_id && r.row_id == row_id)
            })
            .ok_or_else(|| DeployError::UnknownRow {
                extension_id: extension_id.clone(),
                row_id: row_id.to_string(),
            })?;

        if row.selection.selected.is_none() {
            return Err(DeployError::NotSelectable {
                extension_id: extension_id.clone(),
                row_id: row_id.to_string(),
            });
        }
        if row.selection.forced {
            return Err(DeployError::ForcedRow {
                extension_id: extension_id.clone(),
                row_id: row_id.to_string(),
            });
        }

        row.selection.selected = Some(selected);
        if selected {
            self.batch.select_extra(extension_id, row_id);
        } else {
            self.batch.deselect_extra(extension_id, row_id);
        }
        debug!(extension_id = %extension_id, row_id, selected, "Selection changed");
        Ok(())
    }

    /// Runs preflight with no host content rows.
    pub async fn preflight(&mut self) -> DeployResult<&PreflightOutcome> {
        self.preflight_with(PreflightReport::new()).await
    }

    /// Runs preflight, starting from the host's own rows in `seed`.
    pub async fn preflight_with(&mut self, seed: PreflightReport) -> DeployResult<&PreflightOutcome> {
        self.require_stage("preflight", &[BatchStage::AwaitingSelection])?;
        self.enforce_forced_rows();
        let previous = self.enter(BatchStage::Preflighting);

        let engine = PreflightEngine::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.link),
            self.config.clone(),
        );
        let outcome = match engine.run(&self.batch, seed).await {
            Ok(outcome) => outcome,
            Err(e) => return Err(self.restore(previous, e)),
        };

        if outcome.blocked {
            warn!(
                batch_id = %self.batch.id,
                errors = outcome.report.error_count(),
                "Batch blocked by preflight"
            );
            self.enter(BatchStage::Blocked);
        }
        Ok(&*self.preflight.insert(outcome))
    }

    /// Transfers a batch that cleared preflight. Extension failures are
    /// reported, not returned as errors; the batch always ends `Completed`.
    pub async fn transfer(&mut self) -> DeployResult<&TransferReport> {
        self.require_stage("transfer", &[BatchStage::Preflighting])?;
        if self.preflight.as_ref().is_none_or(|p| p.blocked) {
            return Err(DeployError::InvalidStage {
                operation: "transfer",
                stage: self.stage,
            });
        }
        let previous = self.enter(BatchStage::Transferring);

        let engine = TransferEngine::new(
            Arc::clone(&self.registry),
            Arc::clone(&self.link),
            self.config.clone(),
        );
        let report = match engine.run(&self.batch).await {
            Ok(report) => report,
            Err(e) => return Err(self.restore(previous, e)),
        };

        self.enter(BatchStage::Completed);
        Ok(&*self.transfer.insert(report))
    }

    fn enforce_forced_rows(&mut self) {
        let Some(comparison) = &self.comparison else {
            return;
        };
        for row in comparison.rows.iter().filter(|r| r.selection.forced) {
            match row.selection.selected {
                Some(true) => self.batch.select_extra(&row.extension_id, row.row_id.clone()),
                Some(false) => {
                    self.batch.deselect_extra(&row.extension_id, &row.row_id);
                }
                None => {}
            }
        }
    }

    fn require_stage(&self, operation: &'static str, allowed: &[BatchStage]) -> DeployResult<()> {
        if allowed.contains(&self.stage) {
            Ok(())
        } else {
            Err(DeployError::InvalidStage {
                operation,
                stage: self.stage,
            })
        }
    }

    /// Moves to `stage`, returning the one left behind.
    fn enter(&mut self, stage: BatchStage) -> BatchStage {
        let previous = std::mem::replace(&mut self.stage, stage);
        debug!(batch_id = %self.batch.id, from = ?previous, to = ?stage, "Batch stage changed");
        previous
    }

    fn restore(&mut self, previous: BatchStage, err: DeployError) -> DeployError {
        warn!(
            batch_id = %self.batch.id,
            stage = ?self.stage,
            error = %err,
            "Stage failed; batch restored"
        );
        self.stage = previous;
        err
    }
}
