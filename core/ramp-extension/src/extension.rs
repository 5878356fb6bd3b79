//! The extension contract.

use crate::edits::ReportEdits;
use crate::error::{CallbackError, CallbackResult};
use ramp_types::{
    Batch, Capability, CapabilitySet, CompiledComparison, PreflightReport, PreflightRow,
    RemoteStatuses, RowMap, SelectionRow, SelectionRowInput, StagedRows, TransferResult,
};
use serde_json::Value;

/// Why `send` is being called.
///
/// The same slot serves both the transfer stage and, through
/// `comparison_send` implementations that delegate to it, the comparison
/// stage.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SendMode {
    /// Transfer: only send what the batch selected.
    Batch,
    /// Comparison: always produce data, selected or not.
    Forced,
}

impl SendMode {
    #[must_use]
    pub const fn is_forced(self) -> bool {
        matches!(self, SendMode::Forced)
    }
}

/// A pluggable unit registering callbacks with the deployment pipeline.
///
/// Every callback slot is optional. An extension lists the slots it fills in
/// [`DeployExtension::capabilities`]; the engine only calls declared slots
/// and skips the extension for the rest. Undeclared slots fall back to
/// defaults that return [`CallbackError::Unsupported`].
///
/// Callbacks run one at a time, in registration order, on a blocking thread.
/// Staging slots run on the staging node, `receive` and the `*_check` slots
/// on production.
pub trait DeployExtension: Send + Sync + 'static {
    /// Human-readable name. The registry derives the extension id from it,
    /// so it must be identical on staging and production.
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    /// Slots this extension implements.
    fn capabilities(&self) -> CapabilitySet;

    // ── Transfer ─────────────────────────────────────────────────

    /// Staging: produce the data `receive` will apply. `None` or an empty
    /// payload means nothing to transfer, and `receive` is not called.
    fn send(&self, batch: &Batch, mode: SendMode) -> CallbackResult<Option<Value>> {
        let _ = (batch, mode);
        Err(CallbackError::Unsupported(Capability::Send))
    }

    /// Production: apply what `send` produced.
    ///
    /// A call that overruns the callback deadline is reported as failed but
    /// is not cancelled; it may still change production state afterwards.
    fn receive(&self, data: &Value) -> CallbackResult<TransferResult> {
        let _ = data;
        Err(CallbackError::Unsupported(Capability::Receive))
    }

    // ── Preflight ────────────────────────────────────────────────

    /// Staging: produce the data `preflight_check` validates. `None` or an
    /// empty payload skips the extension for this preflight.
    fn preflight_send(&self, batch: &Batch) -> CallbackResult<Option<Value>> {
        let _ = batch;
        Err(CallbackError::Unsupported(Capability::PreflightSend))
    }

    /// Production: validate `data` against production state.
    fn preflight_check(&self, data: &Value, batch: &Batch) -> CallbackResult<PreflightRow> {
        let _ = (data, batch);
        Err(CallbackError::Unsupported(Capability::PreflightCheck))
    }

    /// Staging: annotate any part of the compiled report.
    fn preflight_display(
        &self,
        report: &PreflightReport,
        edits: &mut ReportEdits,
    ) -> CallbackResult<()> {
        let _ = (report, edits);
        Err(CallbackError::Unsupported(Capability::PreflightDisplay))
    }

    // ── Comparison ───────────────────────────────────────────────

    /// Staging: produce one entry per comparable row, keyed by row id.
    fn comparison_send(&self, batch: &Batch) -> CallbackResult<RowMap> {
        let _ = batch;
        Err(CallbackError::Unsupported(Capability::ComparisonSend))
    }

    /// Production: compare this extension's staged rows with production.
    fn comparison_check(
        &self,
        rows: &StagedRows,
        compiled: &CompiledComparison,
    ) -> CallbackResult<RemoteStatuses> {
        let _ = (rows, compiled);
        Err(CallbackError::Unsupported(Capability::ComparisonCheck))
    }

    /// Staging: decide how one compared row is presented.
    fn comparison_selection_row(&self, input: &SelectionRowInput) -> CallbackResult<SelectionRow> {
        let _ = input;
        Err(CallbackError::Unsupported(Capability::ComparisonSelectionRow))
    }
}
