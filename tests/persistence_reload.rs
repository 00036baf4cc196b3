//! Reload tests
//!
//! A new store over the same storage must come back with the last state
//! written, and fall back to defaults when storage holds garbage.

use std::fs;
use std::sync::{Arc, Mutex};

use tempfile::TempDir;

use devtools_store::devtools::{
    AuthStore, CollaboratorFuture, Collaborators, DevToolsConfig, DevToolsState, DevToolsStore,
};
use devtools_store::persistence::{FileBackend, MemoryBackend, StorageBackend};

struct NoopAuth;

impl AuthStore for NoopAuth {
    fn fetch_user(&self) -> CollaboratorFuture<'_> {
        Box::pin(async { Ok(()) })
    }
}

fn collaborators() -> Collaborators {
    Collaborators::new(
        NoopAuth,
        || async { Ok::<(), devtools_store::DevToolsError>(()) },
        || {},
    )
}

fn open(config: &DevToolsConfig, backend: Arc<dyn StorageBackend>) -> DevToolsStore {
    DevToolsStore::new(config, backend, collaborators())
}

// =============================================================================
// MEMORY BACKEND
// =============================================================================

/// Test: State set through the actions survives a reload.
#[tokio::test]
async fn test_memory_reload_restores_last_state() {
    let backend = MemoryBackend::new();
    let config = DevToolsConfig::default();

    {
        let store = open(&config, Arc::new(backend.clone()));
        store.actions().set_visible(true);
        store.actions().set_allow_selection(true);
        store.actions().change_role(Some("editor")).await.unwrap();
        store.actions().set_allow_selection(false);
    }

    let reloaded = open(&config, Arc::new(backend));
    assert_eq!(
        reloaded.state(),
        DevToolsState {
            visible: true,
            allow_selection: false,
            role: Some("editor".to_string()),
        }
    );
}

/// Test: Different keys do not see each other's state.
#[test]
fn test_storage_keys_are_isolated() {
    let backend = MemoryBackend::new();
    let a = DevToolsConfig {
        storage_key: "preview-a".into(),
        ..DevToolsConfig::default()
    };
    let b = DevToolsConfig {
        storage_key: "preview-b".into(),
        ..DevToolsConfig::default()
    };

    open(&a, Arc::new(backend.clone())).actions().set_visible(true);

    assert!(open(&a, Arc::new(backend.clone())).state().visible);
    assert!(!open(&b, Arc::new(backend)).state().visible);
}

/// Test: hydrate() picks up a write made by another store on the same key.
#[test]
fn test_hydrate_sees_other_window() {
    let backend = MemoryBackend::new();
    let config = DevToolsConfig::default();
    let left = open(&config, Arc::new(backend.clone()));
    let right = open(&config, Arc::new(backend));

    right.actions().set_allow_selection(true);
    assert!(!left.state().allow_selection);

    left.hydrate();
    assert!(left.state().allow_selection);
}

/// Test: A "self" role written by an older client reads back as no role,
/// whether it is picked up at startup or by hydrate().
#[test]
fn test_stored_self_role_is_never_surfaced() {
    let backend = MemoryBackend::new();
    let config = DevToolsConfig::default();
    let legacy = r#"{"visible": true, "allowSelection": false, "role": "self"}"#;

    backend.write("bb-devtools", legacy).unwrap();
    let store = open(&config, Arc::new(backend.clone()));
    assert_eq!(store.effective_role(), None);

    let roles = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&roles);
    let _sub = store.subscribe(move |s: &DevToolsState| sink.lock().unwrap().push(s.role.clone()));

    store.actions().set_visible(false);
    backend.write("bb-devtools", legacy).unwrap();
    store.hydrate();

    assert_eq!(
        store.state(),
        DevToolsState {
            visible: true,
            allow_selection: false,
            role: None,
        }
    );
    assert!(!store.is_impersonating());
    assert!(roles.lock().unwrap().iter().all(Option::is_none));
}

/// Test: reset() drops the persisted entry, so a reload starts from defaults.
#[tokio::test]
async fn test_reset_survives_reload() {
    let backend = MemoryBackend::new();
    let config = DevToolsConfig::default();

    let store = open(&config, Arc::new(backend.clone()));
    store.actions().set_visible(true);
    store.actions().change_role(Some("editor")).await.unwrap();
    store.reset();

    assert_eq!(backend.read("bb-devtools").unwrap(), None);
    assert_eq!(open(&config, Arc::new(backend)).state(), DevToolsState::default());
}

// =============================================================================
// FILE BACKEND
// =============================================================================

/// Test: State survives a reload through the filesystem.
#[tokio::test]
async fn test_file_reload_restores_last_state() {
    let temp = TempDir::new().unwrap();
    let config = DevToolsConfig {
        storage_dir: temp.path().to_path_buf(),
        ..DevToolsConfig::default()
    };

    {
        let store = open(&config, Arc::new(FileBackend::new(&config.storage_dir)));
        store.actions().set_visible(true);
        store.actions().change_role(Some("viewer")).await.unwrap();
    }

    let reloaded = open(&config, Arc::new(FileBackend::new(&config.storage_dir)));
    assert!(reloaded.state().visible);
    assert_eq!(reloaded.effective_role().as_deref(), Some("viewer"));
}

/// Test: A corrupt file yields defaults and is overwritten by the next write.
#[test]
fn test_corrupt_file_falls_back_to_defaults() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("bb-devtools.json");
    fs::write(&path, "{\"visible\": tru").unwrap();

    let config = DevToolsConfig {
        storage_dir: temp.path().to_path_buf(),
        ..DevToolsConfig::default()
    };
    let store = open(&config, Arc::new(FileBackend::new(temp.path())));
    assert_eq!(store.state(), DevToolsState::default());

    store.actions().set_visible(true);
    let on_disk: DevToolsState =
        serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
    assert!(on_disk.visible);
}

/// Test: A value written by the web client (camelCase, missing fields) loads.
#[test]
fn test_web_client_shape_loads() {
    let temp = TempDir::new().unwrap();
    fs::write(
        temp.path().join("bb-devtools.json"),
        r#"{"allowSelection": true, "role": "BASIC"}"#,
    )
    .unwrap();

    let config = DevToolsConfig {
        storage_dir: temp.path().to_path_buf(),
        ..DevToolsConfig::default()
    };
    let store = open(&config, Arc::new(FileBackend::new(temp.path())));

    assert_eq!(
        store.state(),
        DevToolsState {
            visible: false,
            allow_selection: true,
            role: Some("BASIC".to_string()),
        }
    );
}
