//! Secure credential store trait.

use async_trait::async_trait;

use crate::error::StoreError;

/// Asynchronous string key/value store for secrets.
///
/// The persistence mechanism (OS keychain, encrypted file, memory) is up to
/// the implementation. Removing a missing key is not an error.
#[async_trait]
pub trait SecureStore: Send + Sync {
    /// Read a value, returning `None` if the key is absent.
    async fn get(&self, key: &str) -> Result<Option<String>, StoreError>;

    /// Write a value, replacing any previous one.
    async fn set(&self, key: &str, value: &str) -> Result<(), StoreError>;

    /// Delete a value.
    async fn remove(&self, key: &str) -> Result<(), StoreError>;
}
