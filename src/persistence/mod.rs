//! # Persistence
//!
//! Client-local key-value storage and the observable store built on it.
//! State written here survives a restart of the same client; it is not
//! shared between clients.

pub mod backend;
pub mod errors;
pub mod file;
pub mod store;

pub use backend::{MemoryBackend, StorageBackend};
pub use errors::{StorageError, StorageResult};
pub use file::FileBackend;
pub use store::{PersistedStore, Subscription};
