//! CLI-specific error types

use std::io;

use thiserror::Error;

use crate::devtools::ConfigError;
use crate::persistence::StorageError;

/// CLI result type
pub type CliResult<T> = Result<T, CliError>;

/// Errors the `devtools` binary reports before exiting non-zero
///
/// `Display` renders `CODE: message`.
#[derive(Debug, Error)]
pub enum CliError {
    /// Config file missing, unreadable or invalid
    #[error("DEVTOOLS_CLI_CONFIG_ERROR: {0}")]
    Config(#[from] ConfigError),

    /// The change could not be written to the storage directory
    #[error("DEVTOOLS_CLI_STORAGE_ERROR: {0}")]
    Storage(#[from] StorageError),

    /// Printing the state failed
    #[error("DEVTOOLS_CLI_IO_ERROR: {0}")]
    Output(#[from] io::Error),

    #[error("DEVTOOLS_CLI_IO_ERROR: JSON error: {0}")]
    Encode(#[from] serde_json::Error),
}

impl CliError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            CliError::Config(_) => "DEVTOOLS_CLI_CONFIG_ERROR",
            CliError::Storage(_) => "DEVTOOLS_CLI_STORAGE_ERROR",
            CliError::Output(_) | CliError::Encode(_) => "DEVTOOLS_CLI_IO_ERROR",
        }
    }
}
