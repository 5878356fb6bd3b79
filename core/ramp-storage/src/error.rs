//! Error types for the storage layer.

use ramp_extension::OptionStoreError;
use thiserror::Error;

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Errors that can occur in storage operations.
#[derive(Debug, Error)]
pub enum StorageError {
    /// Database error from SQLite.
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Serialization/deserialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid data.
    #[error("invalid data: {0}")]
    InvalidData(String),
}

impl From<StorageError> for OptionStoreError {
    fn from(err: StorageError) -> Self {
        match err {
            StorageError::Serialization(e) => OptionStoreError::Serialization(e),
            other => OptionStoreError::Backend(other.to_string()),
        }
    }
}
