//! Server configuration.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level server configuration.
///
/// ```toml
/// [capture]
/// passive_ack_timeout_ms = 5000
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    pub capture: CaptureConfig,
}

impl ServerConfig {
    /// Parses a configuration from TOML text. Missing keys take defaults.
    pub fn from_toml_str(s: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(s)?)
    }

    /// Reads and parses a TOML configuration file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Result capture tuning.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Upper bound on how long an active capture waits for passive
    /// acknowledgment before failing the invocation. `None` waits forever.
    pub passive_ack_timeout_ms: Option<u64>,
}

impl CaptureConfig {
    pub fn passive_ack_timeout(&self) -> Option<Duration> {
        self.passive_ack_timeout_ms.map(Duration::from_millis)
    }
}
