//! DevTools Configuration
//!
//! Every field has a default, so an empty JSON object is a valid config
//! and a missing config file means "all defaults".

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::observability::Severity;

/// Storage key the web client has always used
pub const DEFAULT_STORAGE_KEY: &str = "bb-devtools";

/// Result type for config loading
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Config loading errors
#[derive(Debug, Clone, Error)]
pub enum ConfigError {
    #[error("Failed to read config {path}: {reason}")]
    Read { path: String, reason: String },

    #[error("Invalid config {path}: {reason}")]
    Parse { path: String, reason: String },

    #[error("Invalid config: {0}")]
    Invalid(String),
}

/// Configuration for the devtools store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DevToolsConfig {
    /// Key the state is persisted under
    pub storage_key: String,
    /// Directory for the file backend
    pub storage_dir: PathBuf,
    /// Run role changes one at a time instead of letting them interleave
    pub serialize_role_changes: bool,
    /// Minimum severity written to the log
    pub log_level: Severity,
}

impl Default for DevToolsConfig {
    fn default() -> Self {
        Self {
            storage_key: DEFAULT_STORAGE_KEY.to_string(),
            storage_dir: default_storage_dir(),
            serialize_role_changes: false,
            log_level: Severity::Warn,
        }
    }
}

fn default_storage_dir() -> PathBuf {
    dirs::data_local_dir()
        .map(|dir| dir.join("devtools-store"))
        .unwrap_or_else(|| PathBuf::from(".devtools"))
}

impl DevToolsConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let content = fs::read_to_string(path).map_err(|e| ConfigError::Read {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_json(&content).map_err(|e| match e {
            ConfigError::Parse { reason, .. } => ConfigError::Parse {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    /// Parse and validate a JSON config document
    pub fn from_json(content: &str) -> ConfigResult<Self> {
        let config: Self = serde_json::from_str(content).map_err(|e| ConfigError::Parse {
            path: "<inline>".to_string(),
            reason: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    /// Reject configs the store cannot run with
    pub fn validate(&self) -> ConfigResult<()> {
        if self.storage_key.trim().is_empty() {
            return Err(ConfigError::Invalid("storage_key must not be empty".into()));
        }
        Ok(())
    }
}
