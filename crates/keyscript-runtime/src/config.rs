//! Runtime configuration.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{ConfigError, KeyPrefix};

/// Settings shared by the runtimes.
///
/// ```toml
/// prefix = "app"
/// redis_url = "redis://127.0.0.1:6379/0"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RuntimeConfig {
    /// Key prefix; empty means keys are used as given.
    pub prefix: String,
    /// Redis server to run scripts on. Without it scripts run in-process.
    pub redis_url: Option<String>,
}

impl RuntimeConfig {
    /// Load configuration from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml(&contents)
    }

    pub fn from_toml(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    pub fn key_prefix(&self) -> KeyPrefix {
        KeyPrefix::new(self.prefix.as_str())
    }
}
