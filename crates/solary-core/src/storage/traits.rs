//! Storage trait definitions

use crate::error::Result;
use async_trait::async_trait;

/// Key-value contract the wallet persists through
///
/// Values are whole strings: `set` replaces the previous value atomically,
/// never patches it.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// Read a value; `Ok(None)` when the key is absent
    async fn get(&self, key: &str) -> Result<Option<String>>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: &str) -> Result<()>;

    /// Remove a value; removing an absent key is not an error
    async fn remove(&self, key: &str) -> Result<()>;

    /// List all keys with a given prefix
    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>>;

    /// Get a human-readable name for this storage backend
    fn backend_name(&self) -> &'static str;
}
