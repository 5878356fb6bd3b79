//! Core type definitions for RAMP batch deployments.
//!
//! This crate defines the data model shared by the engine, the extension
//! SDK, and extensions themselves:
//! - Extension and batch identifiers ([`make_id`] derives extension ids)
//! - The [`Batch`] selected for promotion
//! - Comparison rows, the preflight report tree, and transfer results
//! - [`Capability`] slots and attributed [`Fault`]s
//!
//! Nothing here performs I/O.

mod batch;
mod capability;
mod comparison;
mod fault;
mod ids;
mod preflight;
mod transfer;

pub use batch::{Batch, EXTRAS};
pub use capability::{Capability, CapabilitySet, Environment, Stage};
pub use comparison::{
    CompiledComparison, ComparisonReport, ComparisonRow, RemoteStatus, RemoteStatuses, RowMap,
    SelectionRow, SelectionRowInput, StagedRow, StagedRows,
};
pub use fault::Fault;
pub use ids::{make_id, BatchId, ExtensionId};
pub use preflight::{
    AttributedEdit, EditOp, MessageKind, PreflightOutcome, PreflightReport, PreflightRow,
    ReportEdit, RowPath,
};
pub use transfer::{is_empty_payload, TransferOutcome, TransferReport, TransferResult};

/// Result type alias using the crate's error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur in type operations.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("invalid UUID: {0}")]
    InvalidUuid(#[from] uuid::Error),
}
