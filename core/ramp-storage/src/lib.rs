//! SQLite storage layer for RAMP environments.
//!
//! Provides [`SqliteOptionStore`], the persistent implementation of the
//! extension SDK's `OptionStore`. Each store is scoped to one environment
//! (staging or production) and keeps values as JSON text.

mod error;
mod option_store;

pub use error::{StorageError, StorageResult};
pub use option_store::SqliteOptionStore;
