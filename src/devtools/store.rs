//! # DevTools Store
//!
//! Owns the panel state, persists it, and drives the refresh sequence
//! when the previewed role changes.
//!
//! ## Invariants
//! - `role` is never stored as `"self"`
//! - The three fields change independently
//! - A role change always runs: persist, invalidate cache, fetch user,
//!   initialise, in that order
//! - A failed refresh does not roll the recorded role back

use std::sync::Arc;

use tokio::sync::Mutex;

use super::collaborators::Collaborators;
use super::config::DevToolsConfig;
use super::errors::DevToolsResult;
use super::state::{DevToolsState, SELF_ROLE};
use crate::observability::{log_event, log_event_with_fields, Event, ObservationScope};
use crate::persistence::{PersistedStore, StorageBackend, Subscription};

/// Persisted developer-tools state plus its role-change side effects
pub struct DevToolsStore {
    store: PersistedStore<DevToolsState>,
    collaborators: Collaborators,
    /// Present when role changes are serialized
    role_gate: Option<Mutex<()>>,
}

impl DevToolsStore {
    /// Build the store, hydrating from `backend`
    pub fn new(
        config: &DevToolsConfig,
        backend: Arc<dyn StorageBackend>,
        collaborators: Collaborators,
    ) -> Self {
        // A stored "self" is normalized while decoding
        let store = PersistedStore::new(
            config.storage_key.clone(),
            DevToolsState::default(),
            backend,
        );

        Self {
            store,
            collaborators,
            role_gate: config.serialize_role_changes.then(|| Mutex::new(())),
        }
    }

    /// Register a listener; it receives the current state immediately
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&DevToolsState) + Send + Sync + 'static,
    {
        self.store.subscribe(listener)
    }

    /// Snapshot of the current state
    pub fn state(&self) -> DevToolsState {
        self.store.get()
    }

    /// Role currently impersonated, `None` when acting as self
    pub fn effective_role(&self) -> Option<String> {
        self.store.get().role
    }

    pub fn is_impersonating(&self) -> bool {
        self.store.get().is_impersonating()
    }

    pub fn storage_key(&self) -> &str {
        self.store.key()
    }

    /// The mutators
    pub fn actions(&self) -> DevToolsActions<'_> {
        DevToolsActions { store: self }
    }

    /// Back to defaults without refreshing anything downstream
    ///
    /// The persisted entry is removed, so a reload also starts from defaults.
    pub fn reset(&self) {
        self.store.reset();
    }

    /// Re-read persisted state written by another window of this client
    pub fn hydrate(&self) {
        self.store.hydrate();
    }

    fn set_visible(&self, visible: bool) {
        self.store.update(|state| state.clone().with_visible(visible));
    }

    fn set_allow_selection(&self, allow_selection: bool) {
        self.store
            .update(|state| state.clone().with_allow_selection(allow_selection));
    }

    async fn change_role(&self, role: Option<&str>) -> DevToolsResult<()> {
        let _serialized = match &self.role_gate {
            Some(gate) => Some(gate.lock().await),
            None => None,
        };

        self.store.update(|state| state.clone().with_role(role));
        let recorded = self.store.get().role;
        let role_field = recorded.as_deref().unwrap_or(SELF_ROLE);
        let scope = ObservationScope::with_fields("ROLE_CHANGE", &[("role", role_field)]);

        self.collaborators.api.invalidate_cache();
        log_event(Event::CacheInvalidated);

        if let Err(e) = self.collaborators.auth.fetch_user().await {
            scope.fail(&e.to_string());
            return Err(e);
        }
        log_event_with_fields(Event::UserRefetched, &[("role", role_field)]);

        if let Err(e) = self.collaborators.initializer.initialise().await {
            scope.fail(&e.to_string());
            return Err(e);
        }
        log_event_with_fields(Event::AppReinitialised, &[("role", role_field)]);

        scope.complete();
        Ok(())
    }
}

impl std::fmt::Debug for DevToolsStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DevToolsStore")
            .field("store", &self.store)
            .field("serialized", &self.role_gate.is_some())
            .finish()
    }
}

/// Mutators exposed to the UI
#[derive(Debug, Clone, Copy)]
pub struct DevToolsActions<'a> {
    store: &'a DevToolsStore,
}

impl DevToolsActions<'_> {
    /// Show or hide the panel
    pub fn set_visible(&self, visible: bool) {
        self.store.set_visible(visible);
    }

    /// Toggle element-selection mode
    pub fn set_allow_selection(&self, allow_selection: bool) {
        self.store.set_allow_selection(allow_selection);
    }

    /// Preview the app as `role`, or as self for `None` / `"self"`
    ///
    /// Resolves once the user and the whole application state reflect the
    /// new role. A fetch or initialise failure is returned unchanged and
    /// the recorded role stays in place.
    pub async fn change_role(&self, role: Option<&str>) -> DevToolsResult<()> {
        self.store.change_role(role).await
    }
}
