//! OS keychain secure store.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, instrument};

use tessera_core::SecureStore;
use tessera_core::error::StoreError;

/// Service name used by [`KeyringStore::default`].
pub const DEFAULT_SERVICE: &str = "tessera";

/// Secure store backed by the platform credential store.
///
/// Each key becomes one keychain item under `service`: the macOS Keychain,
/// the Windows Credential Manager, or the Linux kernel keyring.
#[derive(Clone)]
pub struct KeyringStore {
    service: String,
    entries: Arc<Mutex<HashMap<String, Arc<Entry>>>>,
}

impl KeyringStore {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            entries: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    pub fn service(&self) -> &str {
        &self.service
    }

    fn entry(&self, key: &str) -> Result<Arc<Entry>, StoreError> {
        let mut entries = self.entries.lock().map_err(|_| StoreError::Backend {
            message: "keyring entry cache poisoned".to_string(),
        })?;
        if let Some(entry) = entries.get(key) {
            return Ok(Arc::clone(entry));
        }

        let entry = Arc::new(Entry::new(&self.service, key).map_err(map_keyring)?);
        entries.insert(key.to_string(), Arc::clone(&entry));
        Ok(entry)
    }

    async fn blocking<T, F>(&self, key: &str, op: F) -> Result<T, StoreError>
    where
        T: Send + 'static,
        F: FnOnce(&Entry) -> keyring::Result<T> + Send + 'static,
    {
        let entry = self.entry(key)?;
        tokio::task::spawn_blocking(move || op(&entry))
            .await
            .map_err(|e| StoreError::Backend {
                message: format!("keychain task failed: {}", e),
            })?
            .map_err(map_keyring)
    }
}

impl Default for KeyringStore {
    fn default() -> Self {
        Self::new(DEFAULT_SERVICE)
    }
}

impl std::fmt::Debug for KeyringStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("KeyringStore")
            .field("service", &self.service)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl SecureStore for KeyringStore {
    #[instrument(skip(self), fields(service = %self.service))]
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.blocking(key, |entry| match entry.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(err) => Err(err),
        })
        .await
    }

    #[instrument(skip(self, value), fields(service = %self.service))]
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let value = value.to_string();
        self.blocking(key, move |entry| entry.set_password(&value))
            .await?;
        debug!("Stored keychain item");
        Ok(())
    }

    #[instrument(skip(self), fields(service = %self.service))]
    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        self.blocking(key, |entry| match entry.delete_credential() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(err) => Err(err),
        })
        .await?;
        debug!("Removed keychain item");
        Ok(())
    }
}

fn map_keyring(err: keyring::Error) -> StoreError {
    StoreError::Keychain {
        message: err.to_string(),
    }
}
