//! Remote secret storage capability.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::RwLock;
use thiserror::Error;

/// Secret store failures.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SecretStoreError {
    /// The named secret does not exist.
    #[error("Secret not found: {0}")]
    NotFound(String),

    /// The store could not be reached or refused the request.
    #[error("Secret store unavailable: {0}")]
    Unavailable(String),
}

/// A remote store of named secrets.
#[async_trait]
pub trait SecretStore: Send + Sync {
    /// Fetches the string payload of secret `name`.
    ///
    /// `Ok(None)` means the secret exists but carries no string payload.
    async fn get_secret_string(&self, name: &str) -> Result<Option<String>, SecretStoreError>;
}

/// A shared, type-erased secret store.
pub type BoxedSecretStore = Arc<dyn SecretStore>;

/// An in-memory [`SecretStore`] that counts fetches.
#[derive(Debug, Default)]
pub struct MemorySecretStore {
    secrets: RwLock<HashMap<String, String>>,
    failure: RwLock<Option<SecretStoreError>>,
    fetches: AtomicUsize,
}

impl MemorySecretStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a secret (builder pattern).
    pub fn with_secret(self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.set_secret(name, value);
        self
    }

    pub fn set_secret(&self, name: impl Into<String>, value: impl Into<String>) {
        self.secrets.write().insert(name.into(), value.into());
    }

    pub fn remove_secret(&self, name: &str) {
        self.secrets.write().remove(name);
    }

    /// Makes every fetch fail with `error` until cleared with `None`.
    pub fn fail_with(&self, error: Option<SecretStoreError>) {
        *self.failure.write() = error;
    }

    /// Number of `get_secret_string` calls so far.
    pub fn fetch_count(&self) -> usize {
        self.fetches.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    async fn get_secret_string(&self, name: &str) -> Result<Option<String>, SecretStoreError> {
        self.fetches.fetch_add(1, Ordering::SeqCst);

        if let Some(error) = self.failure.read().clone() {
            return Err(error);
        }
        self.secrets
            .read()
            .get(name)
            .cloned()
            .map(Some)
            .ok_or_else(|| SecretStoreError::NotFound(name.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_memory_store_returns_secret() {
        let store = MemorySecretStore::new().with_secret("a/b/config", "{}");

        let value = store.get_secret_string("a/b/config").await.unwrap();
        assert_eq!(value.as_deref(), Some("{}"));
        assert_eq!(store.fetch_count(), 1);
    }

    #[tokio::test]
    async fn test_memory_store_missing_secret() {
        let store = MemorySecretStore::new();
        let err = store.get_secret_string("nope").await.unwrap_err();
        assert_eq!(err, SecretStoreError::NotFound("nope".into()));
    }

    #[tokio::test]
    async fn test_memory_store_injected_failure() {
        let store = MemorySecretStore::new().with_secret("s", "{}");
        store.fail_with(Some(SecretStoreError::Unavailable("throttled".into())));
        assert!(store.get_secret_string("s").await.is_err());

        store.fail_with(None);
        assert!(store.get_secret_string("s").await.is_ok());
        assert_eq!(store.fetch_count(), 2);
    }
}
