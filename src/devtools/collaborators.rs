//! # Role Change Collaborators
//!
//! The three services a role change drives. The store only depends on
//! these contracts; the auth store, initialisation routine and API client
//! live in the host application.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;

use super::errors::DevToolsResult;

/// Future returned by async collaborator calls
pub type CollaboratorFuture<'a> = Pin<Box<dyn Future<Output = DevToolsResult<()>> + Send + 'a>>;

/// Auth store holding the current user
pub trait AuthStore: Send + Sync {
    /// Re-fetch identity, role and permissions from the server
    fn fetch_user(&self) -> CollaboratorFuture<'_>;
}

/// Routine that rebuilds application and screen state from scratch
pub trait AppInitializer: Send + Sync {
    fn initialise(&self) -> CollaboratorFuture<'_>;
}

/// API client with a response cache
pub trait ApiClient: Send + Sync {
    /// Discard cached responses so the next request hits the network.
    /// Synchronous and infallible.
    fn invalidate_cache(&self);
}

impl<F, Fut> AppInitializer for F
where
    F: Fn() -> Fut + Send + Sync,
    Fut: Future<Output = DevToolsResult<()>> + Send + 'static,
{
    fn initialise(&self) -> CollaboratorFuture<'_> {
        Box::pin(self())
    }
}

impl<F> ApiClient for F
where
    F: Fn() + Send + Sync,
{
    fn invalidate_cache(&self) {
        self()
    }
}

/// The collaborators a [`DevToolsStore`](super::DevToolsStore) is built with
#[derive(Clone)]
pub struct Collaborators {
    pub(crate) auth: Arc<dyn AuthStore>,
    pub(crate) initializer: Arc<dyn AppInitializer>,
    pub(crate) api: Arc<dyn ApiClient>,
}

impl Collaborators {
    pub fn new(
        auth: impl AuthStore + 'static,
        initializer: impl AppInitializer + 'static,
        api: impl ApiClient + 'static,
    ) -> Self {
        Self {
            auth: Arc::new(auth),
            initializer: Arc::new(initializer),
            api: Arc::new(api),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
