//! Errors an extension callback or option store can report.

use ramp_types::Capability;
use thiserror::Error;

/// Result type for extension callbacks.
pub type CallbackResult<T> = Result<T, CallbackError>;

/// Why a callback could not produce its result.
///
/// The engine never propagates these past the extension boundary; each one
/// becomes a fault attributed to the extension that raised it.
#[derive(Debug, Error)]
pub enum CallbackError {
    /// The slot was called but the extension does not implement it.
    #[error("callback '{0}' is not implemented")]
    Unsupported(Capability),

    /// The callback input did not have the expected shape.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// The option store failed.
    #[error("option store error: {0}")]
    Store(#[from] OptionStoreError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Any other failure inside the extension.
    #[error("{0}")]
    Failed(String),
}

impl CallbackError {
    pub fn failed(message: impl Into<String>) -> Self {
        Self::Failed(message.into())
    }
}

/// Errors from an [`OptionStore`](crate::OptionStore).
#[derive(Debug, Error)]
pub enum OptionStoreError {
    /// The backing storage failed.
    #[error("backend error: {0}")]
    Backend(String),

    /// A stored value could not be (de)serialized.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}
