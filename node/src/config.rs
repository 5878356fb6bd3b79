//! Node configuration, read from `ramp.toml`.
//!
//! ```toml
//! [node]
//! environment = "production"
//! database = "/var/lib/ramp/options.db"
//! port = 4100
//! remote_url = "http://prod.internal:4100"
//!
//! [engine]
//! callback_timeout_ms = 10000
//! remote_timeout_ms = 30000
//! ```
//!
//! Every key is optional. A missing file means defaults; a malformed one is
//! logged and ignored.

use ramp_engine::EngineConfig;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Default HTTP port for a production node.
pub const DEFAULT_PORT: u16 = 4100;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeConfig {
    pub node: NodeSettings,
    pub engine: EngineConfig,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NodeSettings {
    /// Environment this node serves; scopes its option store.
    pub environment: String,
    /// SQLite file holding the option store.
    pub database: PathBuf,
    /// Listen port for `serve`.
    pub port: u16,
    /// Production node that `deploy` talks to.
    pub remote_url: Option<String>,
}

impl Default for NodeSettings {
    fn default() -> Self {
        Self {
            environment: "staging".to_string(),
            database: PathBuf::from("ramp.db"),
            port: DEFAULT_PORT,
            remote_url: None,
        }
    }
}

impl NodeConfig {
    /// Loads configuration from `path`, falling back to defaults.
    pub fn load_from(path: &Path) -> Self {
        if !path.exists() {
            info!("No config file at {:?}, using defaults", path);
            return Self::default();
        }

        match std::fs::read_to_string(path) {
            Ok(contents) => match toml::from_str::<NodeConfig>(&contents) {
                Ok(config) => {
                    info!("Loaded config from {:?}", path);
                    config
                }
                Err(e) => {
                    warn!("Failed to parse config file {:?}: {}. Using defaults.", path, e);
                    Self::default()
                }
            },
            Err(e) => {
                warn!("Failed to read config file {:?}: {}", path, e);
                Self::default()
            }
        }
    }

    /// Engine settings for this node; `[node] environment` wins.
    pub fn engine_config(&self) -> EngineConfig {
        EngineConfig {
            environment: self.node.environment.clone(),
            ..self.engine.clone()
        }
    }
}
