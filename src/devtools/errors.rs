//! # DevTools Errors
//!
//! The error type role-change collaborators report. The store never
//! wraps or rewrites these; a failed refresh reaches the caller as-is.

use thiserror::Error;

/// Result type for devtools operations
pub type DevToolsResult<T> = Result<T, DevToolsError>;

/// Errors raised while applying a role change downstream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DevToolsError {
    /// The auth store could not re-fetch the current user
    #[error("Failed to fetch user: {0}")]
    UserFetch(String),

    /// The session is no longer valid
    #[error("Authentication required")]
    AuthenticationRequired,

    /// Rebuilding the application state failed
    #[error("Failed to initialise application: {0}")]
    Initialise(String),
}

impl DevToolsError {
    /// Stable error code
    pub fn code(&self) -> &'static str {
        match self {
            DevToolsError::UserFetch(_) => "DEVTOOLS_USER_FETCH_FAILED",
            DevToolsError::AuthenticationRequired => "DEVTOOLS_AUTH_REQUIRED",
            DevToolsError::Initialise(_) => "DEVTOOLS_INITIALISE_FAILED",
        }
    }

    /// Convenience constructor for user fetch failures
    pub fn user_fetch(msg: impl Into<String>) -> Self {
        DevToolsError::UserFetch(msg.into())
    }

    /// Convenience constructor for initialisation failures
    pub fn initialise(msg: impl Into<String>) -> Self {
        DevToolsError::Initialise(msg.into())
    }
}
