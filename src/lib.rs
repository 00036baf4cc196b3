//! devtools-store - persisted developer-tools panel state
//!
//! Tracks whether the dev-tools panel is shown, whether element
//! selection is on, and which role the app is being previewed as.
//! Changing the role refreshes the user and the whole app under it.

pub mod cli;
pub mod devtools;
pub mod observability;
pub mod persistence;

pub use devtools::{
    ApiClient, AppInitializer, AuthStore, Collaborators, DevToolsActions, DevToolsConfig,
    DevToolsError, DevToolsResult, DevToolsState, DevToolsStore,
};
pub use persistence::{FileBackend, MemoryBackend, PersistedStore, StorageBackend, Subscription};
