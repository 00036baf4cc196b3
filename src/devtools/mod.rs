//! # DevTools
//!
//! State behind the in-app developer-tools panel: panel visibility,
//! element-selection mode, and the role the app is being previewed as.
//!
//! ```ignore
//! let store = DevToolsStore::new(&config, backend, collaborators);
//! let _sub = store.subscribe(|state| render_panel(state));
//!
//! store.actions().set_visible(true);
//! store.actions().change_role(Some("editor")).await?;
//! ```

pub mod collaborators;
pub mod config;
pub mod errors;
pub mod state;
pub mod store;

pub use collaborators::{ApiClient, AppInitializer, AuthStore, CollaboratorFuture, Collaborators};
pub use config::{ConfigError, ConfigResult, DevToolsConfig, DEFAULT_STORAGE_KEY};
pub use errors::{DevToolsError, DevToolsResult};
pub use state::{normalize_role, DevToolsState, SELF_ROLE};
pub use store::{DevToolsActions, DevToolsStore};
