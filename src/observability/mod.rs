//! Observability subsystem
//!
//! - Structured logging (JSON)
//! - Lifecycle event tracing
//!
//! # Principles
//!
//! 1. Observability is read-only
//! 2. No side effects on store behaviour
//! 3. No background threads
//! 4. Deterministic output
//!
//! # Usage
//!
//! ```ignore
//! use devtools_store::observability::{Logger, Event, ObservationScope, log_event};
//!
//! Logger::info("STORE_HYDRATED", &[("key", "bb-devtools")]);
//! log_event(Event::CacheInvalidated);
//!
//! let scope = ObservationScope::new("ROLE_CHANGE");
//! // ... do work ...
//! scope.complete();
//! ```

mod events;
mod logger;
mod scope;

pub use events::Event;
pub use logger::{Logger, Severity};
pub use scope::ObservationScope;

/// Log a lifecycle event at its own severity
pub fn log_event(event: Event) {
    log_event_with_fields(event, &[]);
}

/// Log a lifecycle event with fields
pub fn log_event_with_fields(event: Event, fields: &[(&str, &str)]) {
    let severity = event.severity();
    if uses_stderr(severity) {
        Logger::log_stderr(severity, event.as_str(), fields);
    } else {
        Logger::log(severity, event.as_str(), fields);
    }
}

fn uses_stderr(severity: Severity) -> bool {
    severity >= Severity::Error
}
