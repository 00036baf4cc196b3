//! # Persistence Errors

use thiserror::Error;

/// Result type for persistence operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Persistence errors
#[derive(Debug, Clone, Error)]
pub enum StorageError {
    /// Underlying filesystem operation failed
    #[error("I/O error: {0}")]
    IoError(String),

    /// Value could not be encoded or decoded
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Key cannot be mapped to a storage location
    #[error("Invalid key: {0}")]
    InvalidKey(String),

    /// A backend lock was poisoned by a panicking writer
    #[error("Lock poisoned")]
    LockPoisoned,
}

impl StorageError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            StorageError::IoError(_) => "STORAGE_IO_ERROR",
            StorageError::Serialization(_) => "STORAGE_SERIALIZATION_ERROR",
            StorageError::InvalidKey(_) => "STORAGE_INVALID_KEY",
            StorageError::LockPoisoned => "STORAGE_LOCK_POISONED",
        }
    }
}

impl From<std::io::Error> for StorageError {
    fn from(e: std::io::Error) -> Self {
        StorageError::IoError(e.to_string())
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(e: serde_json::Error) -> Self {
        StorageError::Serialization(e.to_string())
    }
}
