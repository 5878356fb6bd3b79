//! Environment-scoped option store.
//!
//! Extensions receive their store at construction instead of reaching for
//! global settings, so they can be exercised without a live host.

use crate::error::OptionStoreError;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Mutex, PoisonError};

/// A key → JSON value store belonging to one environment.
pub trait OptionStore: Send + Sync {
    /// Returns the stored value, or `None` if the key was never set.
    fn get(&self, key: &str) -> Result<Option<Value>, OptionStoreError>;

    /// Stores `value` under `key`, replacing any previous value.
    fn set(&self, key: &str, value: Value) -> Result<(), OptionStoreError>;
}

/// In-memory store, for tests and single-process demos.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    values: Mutex<HashMap<String, Value>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style seed value.
    #[must_use]
    pub fn with_option(self, key: impl Into<String>, value: Value) -> Self {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.into(), value);
        self
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, key: &str) -> Result<Option<Value>, OptionStoreError> {
        let values = self.values.lock().unwrap_or_else(PoisonError::into_inner);
        Ok(values.get(key).cloned())
    }

    fn set(&self, key: &str, value: Value) -> Result<(), OptionStoreError> {
        self.values
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.to_string(), value);
        Ok(())
    }
}
