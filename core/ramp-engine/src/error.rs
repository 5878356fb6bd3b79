//! Error types for the deployment engine.

use crate::coordinator::BatchStage;
use ramp_extension::CallbackError;
use ramp_types::{Capability, ExtensionId};
use thiserror::Error;

/// Result type for stage-level operations.
pub type DeployResult<T> = Result<T, DeployError>;

/// Registry errors.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error("extension id '{id}' already registered by '{existing}'")]
    DuplicateId { id: ExtensionId, existing: String },

    #[error("extension name '{0}' does not produce a usable id")]
    InvalidName(String),

    #[error("extension not found: {0}")]
    NotFound(ExtensionId),
}

/// Why a single callback invocation failed.
///
/// Faults never escape an engine pass; they are attributed to the extension
/// and recorded in the stage report.
#[derive(Debug, Error)]
pub enum CallbackFault {
    #[error("{0}")]
    Failed(String),

    #[error("callback '{0}' is not implemented")]
    Unsupported(Capability),

    #[error("callback panicked: {0}")]
    Panicked(String),

    /// The callback keeps running after the deadline, so its effects are unknown.
    #[error("callback exceeded {timeout_ms}ms deadline; outcome unknown")]
    TimedOut { timeout_ms: u64 },

    #[error("malformed result: {0}")]
    Malformed(String),

    #[error("extension is not registered on production")]
    NotRegistered,
}

impl From<CallbackError> for CallbackFault {
    fn from(err: CallbackError) -> Self {
        match err {
            CallbackError::Unsupported(c) => CallbackFault::Unsupported(c),
            other => CallbackFault::Failed(other.to_string()),
        }
    }
}

/// Stage-level errors. A stage that returns one of these made no progress
/// and left the batch as it was.
#[derive(Debug, Error)]
pub enum DeployError {
    /// Network error talking to production.
    #[error("transport error: {0}")]
    Transport(String),

    /// Production did not answer in time.
    #[error("production did not answer within {timeout_ms}ms")]
    Timeout { timeout_ms: u64 },

    /// Production answered with the wrong message.
    #[error("protocol error: {0}")]
    Protocol(String),

    /// Production rejected the request.
    #[error("production rejected the request: {0}")]
    Remote(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("cannot {operation} while batch is {stage:?}")]
    InvalidStage {
        operation: &'static str,
        stage: BatchStage,
    },

    #[error("row '{row_id}' of '{extension_id}' is forced and cannot be changed")]
    ForcedRow {
        extension_id: ExtensionId,
        row_id: String,
    },

    #[error("row '{row_id}' of '{extension_id}' has no checkbox")]
    NotSelectable {
        extension_id: ExtensionId,
        row_id: String,
    },

    #[error("no comparison row '{row_id}' for '{extension_id}'")]
    UnknownRow {
        extension_id: ExtensionId,
        row_id: String,
    },

    #[error(transparent)]
    Registration(#[from] RegistrationError),
}
