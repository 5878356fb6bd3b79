//! Everything an extension usually needs.

pub use crate::{
    CallbackError, CallbackResult, DeployExtension, MemoryOptionStore, OptionStore,
    OptionStoreError, ReportEdits, SendMode,
};
pub use ramp_types::{
    make_id, Batch, Capability, CapabilitySet, CompiledComparison, ExtensionId, MessageKind,
    PreflightReport, PreflightRow, RemoteStatus, RemoteStatuses, RowMap, RowPath, SelectionRow,
    SelectionRowInput, StagedRow, StagedRows, TransferResult, EXTRAS,
};
