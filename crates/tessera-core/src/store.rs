//! In-memory secure store.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use zeroize::Zeroize;

use crate::error::StoreError;
use crate::traits::SecureStore;

/// A process-local [`SecureStore`].
///
/// Nothing survives the process. Useful for hosts that do not want tokens
/// on disk, and for tests. Clones share the same map.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    entries: Arc<RwLock<HashMap<String, String>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries currently held.
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }
}

#[async_trait]
impl SecureStore for MemoryStore {
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError> {
        let previous = self
            .entries
            .write()
            .await
            .insert(key.to_string(), value.to_string());
        if let Some(mut previous) = previous {
            previous.zeroize();
        }
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<(), StoreError> {
        if let Some(mut previous) = self.entries.write().await.remove(key) {
            previous.zeroize();
        }
        Ok(())
    }
}
