use serde::{Deserialize, Serialize};
use std::path::Path;
use thiserror::Error;

use khata_ingest::DEFAULT_CURRENCY;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("invalid config: {0}")]
    Toml(#[from] toml::de::Error),
}

/// Engine configuration. Everything has a sensible default, so a missing
/// config file is not an error.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Currency code stamped on staged records. Pass-through only — the
    /// engine never converts.
    pub currency: String,
    /// Batch endpoint of the persistence collaborator. Commit is disabled
    /// when unset.
    pub endpoint: Option<String>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        EngineConfig {
            currency: DEFAULT_CURRENCY.to_string(),
            endpoint: None,
        }
    }
}

impl EngineConfig {
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        Self::from_toml(&std::fs::read_to_string(path)?)
    }
}
