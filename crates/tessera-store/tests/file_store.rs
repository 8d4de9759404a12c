//! FileStore tests against a temporary directory.

use tempfile::TempDir;
use tessera_core::{SecureStore, SessionManager};
use tessera_store::FileStore;

fn store_in(dir: &TempDir) -> FileStore {
    FileStore::new(dir.path().join("nested").join("session.json"))
}

#[tokio::test]
async fn test_set_and_get() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    assert_eq!(store.get("auth.access_token").await.unwrap(), None);

    store.set("auth.access_token", "a").await.unwrap();
    store.set("auth.refresh_token", "r").await.unwrap();
    store.set("auth.access_token", "a2").await.unwrap();

    assert_eq!(
        store.get("auth.access_token").await.unwrap().as_deref(),
        Some("a2")
    );
    assert_eq!(
        store.get("auth.refresh_token").await.unwrap().as_deref(),
        Some("r")
    );
}

#[tokio::test]
async fn test_persists_across_instances() {
    let dir = TempDir::new().unwrap();
    store_in(&dir).set("auth.refresh_token", "r").await.unwrap();

    let reopened = store_in(&dir);
    assert_eq!(
        reopened.get("auth.refresh_token").await.unwrap().as_deref(),
        Some("r")
    );
}

#[tokio::test]
async fn test_remove() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    // Removing from an empty store is not an error.
    store.remove("auth.access_token").await.unwrap();

    store.set("auth.access_token", "a").await.unwrap();
    store.set("auth.refresh_token", "r").await.unwrap();
    store.remove("auth.access_token").await.unwrap();

    assert_eq!(store.get("auth.access_token").await.unwrap(), None);
    assert!(store.path().exists());

    store.remove("auth.refresh_token").await.unwrap();
    assert!(!store.path().exists());
}

#[tokio::test]
async fn test_no_temp_files_left_behind() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);

    for i in 0..5 {
        store.set("auth.access_token", &format!("a{}", i)).await.unwrap();
    }

    let leftovers: Vec<_> = std::fs::read_dir(store.path().parent().unwrap())
        .unwrap()
        .filter_map(Result::ok)
        .filter(|e| e.file_name().to_string_lossy().ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_file_is_owner_only() {
    use std::os::unix::fs::PermissionsExt;

    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.set("auth.access_token", "a").await.unwrap();

    let mode = std::fs::metadata(store.path()).unwrap().permissions().mode();
    assert_eq!(mode & 0o777, 0o600);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_concurrent_writers_keep_every_key() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("session.json");

    let tasks: Vec<_> = (0..16)
        .map(|i| {
            // Separate instances, as separate processes would have.
            let store = FileStore::new(&path);
            tokio::spawn(async move {
                store
                    .set(&format!("key.{}", i), &format!("value-{}", i))
                    .await
                    .unwrap();
            })
        })
        .collect();
    for task in tasks {
        task.await.unwrap();
    }

    let store = FileStore::new(&path);
    for i in 0..16 {
        assert_eq!(
            store.get(&format!("key.{}", i)).await.unwrap(),
            Some(format!("value-{}", i))
        );
    }
}

#[tokio::test]
async fn test_session_restores_from_file() {
    let dir = TempDir::new().unwrap();
    let store = store_in(&dir);
    store.set("auth.access_token", "persisted-access").await.unwrap();
    store.set("auth.refresh_token", "persisted-refresh").await.unwrap();

    let session = SessionManager::new(
        NoNetwork,
        tessera_core::ApiUrl::new("https://erp.example.com").unwrap(),
        store.clone(),
    );

    assert!(session.restore().await);
    assert_eq!(
        session.access_token().await.as_deref(),
        Some("persisted-access")
    );

    // Logout cannot reach the server but still wipes the file.
    assert!(!session.logout().await);
    assert!(!store.path().exists());
}

/// Transport that fails every request.
struct NoNetwork;

#[async_trait::async_trait]
impl tessera_core::Transport for NoNetwork {
    async fn send(
        &self,
        _request: tessera_core::TransportRequest,
    ) -> Result<tessera_core::TransportResponse, tessera_core::error::TransportError> {
        Err(tessera_core::error::TransportError::Connection {
            message: "offline".to_string(),
        })
    }
}
