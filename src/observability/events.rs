//! Observable events
//!
//! Every lifecycle event the store and its persistence layer emit.
//! Events are explicit and typed.

use std::fmt;

use super::logger::Severity;

/// Observable events
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    // Persistence
    /// State read back from storage
    StoreHydrated,
    /// Persisted value missing fields or unparseable, defaults used
    StoreHydrateFallback,
    /// Writing the state to storage failed
    StatePersistFailed,
    /// State restored to its initial value
    StoreReset,

    // Role change steps
    /// API response cache discarded
    CacheInvalidated,
    /// Current user re-fetched under the new role
    UserRefetched,
    /// Application state rebuilt under the new role
    AppReinitialised,

    // CLI
    /// Configuration loaded
    ConfigLoaded,
}

impl Event {
    /// Returns the string representation of the event
    pub fn as_str(&self) -> &'static str {
        match self {
            Event::StoreHydrated => "STORE_HYDRATED",
            Event::StoreHydrateFallback => "STORE_HYDRATE_FALLBACK",
            Event::StatePersistFailed => "STATE_PERSIST_FAILED",
            Event::StoreReset => "STORE_RESET",

            Event::CacheInvalidated => "CACHE_INVALIDATED",
            Event::UserRefetched => "USER_REFETCHED",
            Event::AppReinitialised => "APP_REINITIALISED",

            Event::ConfigLoaded => "CONFIG_LOADED",
        }
    }

    /// Severity this event is logged at
    pub fn severity(&self) -> Severity {
        match self {
            Event::StoreHydrateFallback => Severity::Warn,
            Event::StatePersistFailed => Severity::Error,
            Event::CacheInvalidated | Event::UserRefetched => Severity::Trace,
            _ => Severity::Info,
        }
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
