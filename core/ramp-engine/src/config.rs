//! Engine configuration.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Configuration for the deployment engines.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Name of the local environment (also scopes its option store).
    pub environment: String,
    /// Deadline for a single extension callback (ms).
    pub callback_timeout_ms: u64,
    /// Deadline for one staging → production request (ms).
    pub remote_timeout_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            environment: "staging".to_string(),
            callback_timeout_ms: 10_000,
            remote_timeout_ms: 30_000,
        }
    }
}

impl EngineConfig {
    /// Default configuration for the production side.
    pub fn production() -> Self {
        Self {
            environment: "production".to_string(),
            ..Self::default()
        }
    }

    pub fn callback_timeout(&self) -> Duration {
        Duration::from_millis(self.callback_timeout_ms)
    }

    pub fn remote_timeout(&self) -> Duration {
        Duration::from_millis(self.remote_timeout_ms)
    }
}
