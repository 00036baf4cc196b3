//! # Persisted Store
//!
//! An observable value mirrored into a [`StorageBackend`] under one key.
//!
//! ## Invariants
//! - Subscribers receive the current value on subscribe, then changes in
//!   the order they were applied; a value overtaken by a newer one before
//!   delivery is skipped, never delivered late
//! - Every mutation is written to the backend before subscribers are told
//! - `update`/`set`/`reset` never fail; a storage failure is logged and the
//!   in-memory value stays authoritative. The `try_*` variants return the
//!   failure and leave the value untouched
//! - Listeners may read the store but must not mutate it synchronously

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, Weak};

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use super::backend::StorageBackend;
use super::errors::{StorageError, StorageResult};
use crate::observability::{log_event_with_fields, Event};

type Listener<T> = Arc<dyn Fn(&T) + Send + Sync>;

struct Shared<T> {
    value: RwLock<T>,
    /// Bumped under the `value` write lock on every change
    version: AtomicU64,
    /// Highest version handed to listeners; held while they run
    delivered: Mutex<u64>,
    listeners: RwLock<Vec<(u64, Listener<T>)>>,
    next_listener_id: AtomicU64,
}

impl<T> Shared<T> {
    fn remove_listener(&self, id: u64) {
        let mut listeners = self
            .listeners
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        listeners.retain(|(listener_id, _)| *listener_id != id);
    }

    fn listener_count(&self) -> usize {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    fn snapshot_listeners(&self) -> Vec<Listener<T>> {
        self.listeners
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .iter()
            .map(|(_, listener)| Arc::clone(listener))
            .collect()
    }
}

/// Handle returned by [`PersistedStore::subscribe`]
///
/// Dropping it unsubscribes.
#[must_use = "dropping a Subscription unsubscribes immediately"]
pub struct Subscription {
    unsubscribe: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Stop receiving updates
    pub fn unsubscribe(mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(unsubscribe) = self.unsubscribe.take() {
            unsubscribe();
        }
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("active", &self.unsubscribe.is_some())
            .finish()
    }
}

/// What happens to the in-memory value when the backend refuses a change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum OnStorageFailure {
    KeepNewValue,
    Abort,
}

/// Observable value persisted under a fixed key
pub struct PersistedStore<T> {
    key: String,
    initial: T,
    backend: Arc<dyn StorageBackend>,
    shared: Arc<Shared<T>>,
}

impl<T> PersistedStore<T>
where
    T: Clone + Serialize + DeserializeOwned + Send + Sync + 'static,
{
    /// Create a store and hydrate it from `backend`
    ///
    /// Falls back to `initial` when nothing is stored under `key` or the
    /// stored value cannot be read back as `T`.
    pub fn new(key: impl Into<String>, initial: T, backend: Arc<dyn StorageBackend>) -> Self {
        let key = key.into();
        let value = load(&key, &initial, backend.as_ref());

        Self {
            key,
            initial,
            backend,
            shared: Arc::new(Shared {
                value: RwLock::new(value),
                version: AtomicU64::new(0),
                delivered: Mutex::new(0),
                listeners: RwLock::new(Vec::new()),
                next_listener_id: AtomicU64::new(0),
            }),
        }
    }

    /// Storage key
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Snapshot of the current value
    pub fn get(&self) -> T {
        self.shared
            .value
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a listener
    ///
    /// The listener is called with the current value before this returns,
    /// then after every change until the subscription is dropped.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: Fn(&T) + Send + Sync + 'static,
    {
        let listener: Listener<T> = Arc::new(listener);
        let id = self.shared.next_listener_id.fetch_add(1, Ordering::Relaxed);

        // Holding `delivered` keeps a concurrent change from reaching the
        // new listener ahead of the value it starts from
        let _delivering = self
            .shared
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        let current = {
            let value = self
                .shared
                .value
                .read()
                .unwrap_or_else(PoisonError::into_inner);
            self.shared
                .listeners
                .write()
                .unwrap_or_else(PoisonError::into_inner)
                .push((id, Arc::clone(&listener)));
            value.clone()
        };
        listener(&current);

        let shared: Weak<Shared<T>> = Arc::downgrade(&self.shared);
        Subscription {
            unsubscribe: Some(Box::new(move || {
                if let Some(shared) = shared.upgrade() {
                    shared.remove_listener(id);
                }
            })),
        }
    }

    /// Number of live subscriptions
    pub fn subscriber_count(&self) -> usize {
        self.shared.listener_count()
    }

    /// Replace the value with `f(current)`, persist, then notify
    pub fn update<F>(&self, f: F)
    where
        F: FnOnce(&T) -> T,
    {
        let result = self.commit(f, |next| self.persist(next), OnStorageFailure::KeepNewValue);
        if let Err(e) = result {
            self.log_persist_failure(&e);
        }
    }

    /// Replace the value with `f(current)` only if it can be persisted
    ///
    /// On a storage failure the value and subscribers are left untouched.
    pub fn try_update<F>(&self, f: F) -> StorageResult<()>
    where
        F: FnOnce(&T) -> T,
    {
        self.commit(f, |next| self.persist(next), OnStorageFailure::Abort)
    }

    /// Replace the value outright
    pub fn set(&self, value: T) {
        self.update(move |_| value);
    }

    /// Restore the initial value and drop the persisted entry
    pub fn reset(&self) {
        let initial = self.initial.clone();
        let result = self.commit(
            move |_| initial,
            |_| self.backend.remove(&self.key),
            OnStorageFailure::KeepNewValue,
        );
        match result {
            Ok(()) => log_event_with_fields(Event::StoreReset, &[("key", self.key.as_str())]),
            Err(e) => self.log_persist_failure(&e),
        }
    }

    /// Like [`reset`](Self::reset), but fails without touching the value
    /// when the entry cannot be removed
    pub fn try_reset(&self) -> StorageResult<()> {
        let initial = self.initial.clone();
        self.commit(
            move |_| initial,
            |_| self.backend.remove(&self.key),
            OnStorageFailure::Abort,
        )?;
        log_event_with_fields(Event::StoreReset, &[("key", self.key.as_str())]);
        Ok(())
    }

    /// Re-read the backend and notify subscribers
    ///
    /// Picks up a value written to the same key by someone else, e.g.
    /// another window of the same client.
    pub fn hydrate(&self) {
        let loaded = load(&self.key, &self.initial, self.backend.as_ref());
        // Nothing is written back, so this cannot fail
        let _ = self.commit(move |_| loaded, |_| Ok(()), OnStorageFailure::KeepNewValue);
    }

    /// Apply `f`, run `store` against the new value, then notify
    ///
    /// `store` runs under the value lock so storage order matches memory
    /// order. Listeners run outside it so they may read the store.
    fn commit<F, S>(&self, f: F, store: S, on_failure: OnStorageFailure) -> StorageResult<()>
    where
        F: FnOnce(&T) -> T,
        S: FnOnce(&T) -> StorageResult<()>,
    {
        let (version, next, stored) = {
            let mut value = self
                .shared
                .value
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let next = f(&value);
            let stored = store(&next);
            if stored.is_err() && on_failure == OnStorageFailure::Abort {
                return stored;
            }
            *value = next.clone();
            let version = self.shared.version.fetch_add(1, Ordering::SeqCst) + 1;
            (version, next, stored)
        };

        self.notify(version, &next);
        stored
    }

    fn persist(&self, value: &T) -> StorageResult<()> {
        let encoded = serde_json::to_string(value)?;
        self.backend.write(&self.key, &encoded)
    }

    fn log_persist_failure(&self, e: &StorageError) {
        let reason = e.to_string();
        log_event_with_fields(
            Event::StatePersistFailed,
            &[
                ("key", self.key.as_str()),
                ("code", e.code()),
                ("reason", reason.as_str()),
            ],
        );
    }

    fn notify(&self, version: u64, value: &T) {
        let mut delivered = self
            .shared
            .delivered
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
        if *delivered > version {
            // A newer value already went out
            return;
        }
        *delivered = version;

        for listener in self.shared.snapshot_listeners() {
            listener(value);
        }
    }
}

impl<T> std::fmt::Debug for PersistedStore<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PersistedStore")
            .field("key", &self.key)
            .field("backend", &self.backend)
            .finish_non_exhaustive()
    }
}

fn load<T>(key: &str, initial: &T, backend: &dyn StorageBackend) -> T
where
    T: Clone + Serialize + DeserializeOwned,
{
    let raw = match backend.read(key) {
        Ok(Some(raw)) => raw,
        Ok(None) => return initial.clone(),
        Err(e) => {
            let reason = e.to_string();
            log_event_with_fields(
                Event::StoreHydrateFallback,
                &[("key", key), ("code", e.code()), ("reason", reason.as_str())],
            );
            return initial.clone();
        }
    };

    match decode(&raw, initial) {
        Ok(value) => {
            log_event_with_fields(Event::StoreHydrated, &[("key", key)]);
            value
        }
        Err(e) => {
            let reason = e.to_string();
            log_event_with_fields(
                Event::StoreHydrateFallback,
                &[("key", key), ("reason", reason.as_str())],
            );
            initial.clone()
        }
    }
}

/// Decode a stored value, filling fields it lacks from `initial`
fn decode<T>(raw: &str, initial: &T) -> Result<T, serde_json::Error>
where
    T: Serialize + DeserializeOwned,
{
    let stored: Value = serde_json::from_str(raw)?;
    let merged = match (serde_json::to_value(initial)?, stored) {
        (Value::Object(mut base), Value::Object(overlay)) => {
            base.extend(overlay);
            Value::Object(base)
        }
        (_, stored) => stored,
    };
    serde_json::from_value(merged)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistence::MemoryBackend;
    use serde::Deserialize;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Panel {
        open: bool,
        width: u32,
    }

    const INITIAL: Panel = Panel {
        open: false,
        width: 300,
    };

    fn recorder() -> (Arc<Mutex<Vec<Panel>>>, impl Fn(&Panel) + Send + Sync + 'static) {
        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        (seen, move |panel: &Panel| sink.lock().unwrap().push(panel.clone()))
    }

    #[test]
    fn test_initial_value_when_nothing_stored() {
        let store = PersistedStore::new("panel", INITIAL, Arc::new(MemoryBackend::new()));
        assert_eq!(store.get(), INITIAL);
    }

    #[test]
    fn test_update_persists_json() {
        let backend = MemoryBackend::new();
        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend.clone()));

        store.update(|p| Panel { open: true, ..p.clone() });

        let raw = backend.read("panel").unwrap().unwrap();
        let stored: Panel = serde_json::from_str(&raw).unwrap();
        assert_eq!(stored, Panel { open: true, width: 300 });
    }

    #[test]
    fn test_subscribe_delivers_current_value_first() {
        let store = PersistedStore::new("panel", INITIAL, Arc::new(MemoryBackend::new()));
        let (seen, listener) = recorder();

        let _sub = store.subscribe(listener);
        store.set(Panel { open: true, width: 10 });

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 2);
        assert_eq!(seen[0], INITIAL);
        assert_eq!(seen[1], Panel { open: true, width: 10 });
    }

    #[test]
    fn test_unsubscribe_stops_delivery() {
        let store = PersistedStore::new("panel", INITIAL, Arc::new(MemoryBackend::new()));
        let (seen, listener) = recorder();

        let sub = store.subscribe(listener);
        assert_eq!(store.subscriber_count(), 1);
        sub.unsubscribe();
        assert_eq!(store.subscriber_count(), 0);

        store.set(Panel { open: true, width: 10 });
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_dropping_subscription_unsubscribes() {
        let store = PersistedStore::new("panel", INITIAL, Arc::new(MemoryBackend::new()));
        {
            let _sub = store.subscribe(|_| {});
            assert_eq!(store.subscriber_count(), 1);
        }
        assert_eq!(store.subscriber_count(), 0);
    }

    #[test]
    fn test_listener_may_read_store() {
        let store = Arc::new(PersistedStore::new(
            "panel",
            INITIAL,
            Arc::new(MemoryBackend::new()),
        ));
        let reader = Arc::clone(&store);
        let widths = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&widths);

        let _sub = store.subscribe(move |_| sink.lock().unwrap().push(reader.get().width));
        store.set(Panel { open: false, width: 42 });

        assert_eq!(*widths.lock().unwrap(), vec![300, 42]);
    }

    #[test]
    fn test_invalid_json_falls_back_to_initial() {
        let backend = MemoryBackend::new();
        backend.write("panel", "{not json").unwrap();

        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend));
        assert_eq!(store.get(), INITIAL);
    }

    #[test]
    fn test_wrong_shape_falls_back_to_initial() {
        let backend = MemoryBackend::new();
        backend.write("panel", "[1, 2, 3]").unwrap();

        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend));
        assert_eq!(store.get(), INITIAL);
    }

    #[test]
    fn test_partial_value_merged_over_initial() {
        let backend = MemoryBackend::new();
        backend.write("panel", "{\"open\": true}").unwrap();

        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend));
        assert_eq!(store.get(), Panel { open: true, width: 300 });
    }

    #[test]
    fn test_reset_restores_initial_and_removes_entry() {
        let backend = MemoryBackend::new();
        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend.clone()));

        store.set(Panel { open: true, width: 1 });
        store.reset();

        assert_eq!(store.get(), INITIAL);
        assert_eq!(backend.read("panel").unwrap(), None);
    }

    #[test]
    fn test_hydrate_picks_up_external_write() {
        let backend = MemoryBackend::new();
        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend.clone()));
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);

        backend.write("panel", "{\"open\": true, \"width\": 7}").unwrap();
        store.hydrate();

        assert_eq!(store.get(), Panel { open: true, width: 7 });
        assert_eq!(seen.lock().unwrap().last(), Some(&Panel { open: true, width: 7 }));
    }

    #[derive(Debug)]
    struct FailingBackend;

    impl StorageBackend for FailingBackend {
        fn read(&self, _key: &str) -> crate::persistence::StorageResult<Option<String>> {
            Err(crate::persistence::StorageError::IoError("disk gone".into()))
        }

        fn write(&self, _key: &str, _value: &str) -> crate::persistence::StorageResult<()> {
            Err(crate::persistence::StorageError::IoError("disk gone".into()))
        }

        fn remove(&self, _key: &str) -> crate::persistence::StorageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn test_storage_failure_keeps_memory_authoritative() {
        let store = PersistedStore::new("panel", INITIAL, Arc::new(FailingBackend));
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);
        assert_eq!(store.get(), INITIAL);

        store.set(Panel { open: true, width: 5 });
        assert_eq!(store.get(), Panel { open: true, width: 5 });
        assert_eq!(seen.lock().unwrap().len(), 2);
    }

    #[test]
    fn test_try_update_failure_leaves_value_untouched() {
        let store = PersistedStore::new("panel", INITIAL, Arc::new(FailingBackend));
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);

        let result = store.try_update(|p| Panel { open: true, ..p.clone() });

        assert!(matches!(result, Err(StorageError::IoError(_))));
        assert_eq!(store.get(), INITIAL);
        assert_eq!(seen.lock().unwrap().len(), 1);
    }

    #[test]
    fn test_try_update_persists_and_notifies() {
        let backend = MemoryBackend::new();
        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend.clone()));
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);

        store.try_update(|p| Panel { width: 9, ..p.clone() }).unwrap();

        assert_eq!(store.get().width, 9);
        assert_eq!(seen.lock().unwrap().last().map(|p| p.width), Some(9));
        assert!(backend.read("panel").unwrap().is_some());
    }

    #[test]
    fn test_try_reset_removes_entry() {
        let backend = MemoryBackend::new();
        let store = PersistedStore::new("panel", INITIAL, Arc::new(backend.clone()));
        store.set(Panel { open: true, width: 1 });

        store.try_reset().unwrap();

        assert_eq!(store.get(), INITIAL);
        assert_eq!(backend.read("panel").unwrap(), None);
    }

    #[test]
    fn test_concurrent_updates_notify_in_order() {
        let store = Arc::new(PersistedStore::new(
            "panel",
            INITIAL,
            Arc::new(MemoryBackend::new()),
        ));
        let (seen, listener) = recorder();
        let _sub = store.subscribe(listener);

        let workers: Vec<_> = (0..4)
            .map(|_| {
                let store = Arc::clone(&store);
                std::thread::spawn(move || {
                    for _ in 0..50 {
                        store.update(|p| Panel { width: p.width + 1, ..p.clone() });
                    }
                })
            })
            .collect();
        for worker in workers {
            worker.join().unwrap();
        }

        let widths: Vec<u32> = seen.lock().unwrap().iter().map(|p| p.width).collect();
        assert!(widths.windows(2).all(|pair| pair[0] < pair[1]));
        assert_eq!(widths.last().copied(), Some(300 + 200));
        assert_eq!(store.get().width, 500);
    }
}
