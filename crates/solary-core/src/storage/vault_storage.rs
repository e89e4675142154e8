//! Namespaced persistence of vault blobs and bookkeeping records

use chrono::{DateTime, Utc};
use std::sync::Arc;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::Result;
use crate::metadata::{BackupRecord, SessionRecord};

/// Default key namespace
pub const DEFAULT_NAMESPACE: &str = "solary";

/// Vault persistence bound to one key namespace
///
/// Keys look like `<namespace>_<kind>_<address>`, one per kind and wallet,
/// so repeated writes never grow the store.
#[derive(Clone)]
pub struct VaultStorage {
    store: Arc<dyn KeyValueStore>,
    namespace: String,
}

impl VaultStorage {
    pub fn new(store: Arc<dyn KeyValueStore>, namespace: impl Into<String>) -> Self {
        Self {
            store,
            namespace: namespace.into(),
        }
    }

    /// Storage under the default `solary` namespace
    pub fn with_default_namespace(store: Arc<dyn KeyValueStore>) -> Self {
        Self::new(store, DEFAULT_NAMESPACE)
    }

    pub fn namespace(&self) -> &str {
        &self.namespace
    }

    pub fn backend_name(&self) -> &'static str {
        self.store.backend_name()
    }

    fn key(&self, kind: &str, id: &str) -> String {
        format!("{}_{}_{}", self.namespace, kind, id)
    }

    fn active_key(&self) -> String {
        format!("{}_active_wallet", self.namespace)
    }

    /// Persist the encrypted blob for `address`; last write wins
    pub async fn save_vault(&self, address: &str, blob: &str) -> Result<()> {
        self.store.set(&self.key("vault", address), blob).await?;
        debug!("Saved vault for {}", address);
        Ok(())
    }

    /// Load the blob for `address`; `None` if nothing is stored
    pub async fn load_vault(&self, address: &str) -> Result<Option<String>> {
        self.store.get(&self.key("vault", address)).await
    }

    /// Remove the vault and its bookkeeping records
    pub async fn delete_vault(&self, address: &str) -> Result<()> {
        self.store.remove(&self.key("vault", address)).await?;
        self.store.remove(&self.key("backup", address)).await?;
        self.store.remove(&self.key("session", address)).await?;
        debug!("Deleted vault for {}", address);
        Ok(())
    }

    /// Remember which wallet `unlock` should open
    pub async fn set_active_wallet(&self, address: &str) -> Result<()> {
        self.store.set(&self.active_key(), address).await
    }

    pub async fn active_wallet(&self) -> Result<Option<String>> {
        self.store.get(&self.active_key()).await
    }

    pub async fn clear_active_wallet(&self) -> Result<()> {
        self.store.remove(&self.active_key()).await
    }

    /// Record an export; failures are logged and swallowed
    pub async fn record_backup_metadata(&self, address: &str, timestamp: DateTime<Utc>) {
        let record = BackupRecord {
            wallet_address: address.to_string(),
            exported_at: timestamp,
        };
        self.put_record(&self.key("backup", address), &record).await;
    }

    /// Record the latest session of a wallet, replacing the previous one;
    /// failures are logged and swallowed
    pub async fn record_session_metadata(&self, session: &SessionRecord) {
        let key = self.key("session", &session.wallet_address);
        self.put_record(&key, session).await;
    }

    pub async fn backup_metadata(&self, address: &str) -> Option<BackupRecord> {
        self.get_record(&self.key("backup", address)).await
    }

    /// Latest session recorded for `address`
    pub async fn session_metadata(&self, address: &str) -> Option<SessionRecord> {
        self.get_record(&self.key("session", address)).await
    }

    async fn put_record<T: serde::Serialize + Sync>(&self, key: &str, record: &T) {
        let json = match serde_json::to_string(record) {
            Ok(json) => json,
            Err(e) => {
                warn!("Could not serialize metadata {}: {}", key, e);
                return;
            }
        };

        if let Err(e) = self.store.set(key, &json).await {
            warn!("Could not record metadata {}: {}", key, e);
        }
    }

    async fn get_record<T: serde::de::DeserializeOwned>(&self, key: &str) -> Option<T> {
        match self.store.get(key).await {
            Ok(Some(json)) => serde_json::from_str(&json)
                .map_err(|e| warn!("Ignoring unreadable metadata {}: {}", key, e))
                .ok(),
            Ok(None) => None,
            Err(e) => {
                warn!("Could not read metadata {}: {}", key, e);
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalletError;
    use crate::storage::{FileStore, MemoryStore};
    use async_trait::async_trait;
    use tempfile::TempDir;

    fn memory_storage() -> VaultStorage {
        VaultStorage::with_default_namespace(Arc::new(MemoryStore::new()))
    }

    /// Store whose writes always fail
    struct ReadOnlyStore;

    #[async_trait]
    impl KeyValueStore for ReadOnlyStore {
        async fn get(&self, _key: &str) -> Result<Option<String>> {
            Ok(None)
        }

        async fn set(&self, _key: &str, _value: &str) -> Result<()> {
            Err(WalletError::StorageUnavailable("read-only".to_string()))
        }

        async fn remove(&self, _key: &str) -> Result<()> {
            Err(WalletError::StorageUnavailable("read-only".to_string()))
        }

        async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>> {
            Ok(Vec::new())
        }

        fn backend_name(&self) -> &'static str {
            "Read-only"
        }
    }

    #[tokio::test]
    async fn test_save_and_load_identical() {
        let storage = memory_storage();
        let blob = "AAECAwQFBgcICQoLDA0ODxAREhMUFRYXGBkaGxwdHh8=";

        storage.save_vault("Addr111", blob).await.unwrap();
        assert_eq!(storage.load_vault("Addr111").await.unwrap().as_deref(), Some(blob));
    }

    #[tokio::test]
    async fn test_missing_vault_is_none() {
        let storage = memory_storage();
        assert_eq!(storage.load_vault("nobody").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_last_write_wins() {
        let storage = memory_storage();
        storage.save_vault("Addr111", "first").await.unwrap();
        storage.save_vault("Addr111", "second").await.unwrap();

        assert_eq!(
            storage.load_vault("Addr111").await.unwrap().as_deref(),
            Some("second")
        );
    }

    #[tokio::test]
    async fn test_keys_are_namespaced() {
        let store = Arc::new(MemoryStore::new());
        let storage = VaultStorage::new(store.clone(), "solary");
        let other = VaultStorage::new(store.clone(), "other");

        storage.save_vault("Addr111", "blob").await.unwrap();

        assert_eq!(store.get("solary_vault_Addr111").await.unwrap().as_deref(), Some("blob"));
        assert_eq!(other.load_vault("Addr111").await.unwrap(), None);
        assert_eq!(
            store.list_keys("solary_vault_").await.unwrap(),
            vec!["solary_vault_Addr111".to_string()]
        );
    }

    #[tokio::test]
    async fn test_delete_vault() {
        let storage = memory_storage();
        storage.save_vault("Addr111", "blob").await.unwrap();
        storage.record_backup_metadata("Addr111", Utc::now()).await;
        storage
            .record_session_metadata(&SessionRecord::start("Addr111"))
            .await;

        storage.delete_vault("Addr111").await.unwrap();

        assert_eq!(storage.load_vault("Addr111").await.unwrap(), None);
        assert!(storage.backup_metadata("Addr111").await.is_none());
        assert!(storage.session_metadata("Addr111").await.is_none());
    }

    #[tokio::test]
    async fn test_session_record_replaced_not_appended() {
        let store = Arc::new(MemoryStore::new());
        let storage = VaultStorage::with_default_namespace(store.clone());

        for _ in 0..4 {
            storage
                .record_session_metadata(&SessionRecord::start("Addr111"))
                .await;
        }
        let latest = SessionRecord::start("Addr111");
        storage.record_session_metadata(&latest).await;
        storage
            .record_session_metadata(&SessionRecord::start("Addr222"))
            .await;

        assert_eq!(store.list_keys("solary_session_").await.unwrap().len(), 2);
        assert_eq!(storage.session_metadata("Addr111").await, Some(latest));
    }

    #[tokio::test]
    async fn test_active_wallet_pointer() {
        let storage = memory_storage();
        assert_eq!(storage.active_wallet().await.unwrap(), None);

        storage.set_active_wallet("Addr111").await.unwrap();
        assert_eq!(storage.active_wallet().await.unwrap().as_deref(), Some("Addr111"));

        storage.clear_active_wallet().await.unwrap();
        assert_eq!(storage.active_wallet().await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_metadata_roundtrip() {
        let storage = memory_storage();
        let now = Utc::now();
        storage.record_backup_metadata("Addr111", now).await;

        let record = storage.backup_metadata("Addr111").await.unwrap();
        assert_eq!(record.exported_at, now);

        let session = SessionRecord::start("Addr111");
        storage.record_session_metadata(&session).await;
        assert_eq!(storage.session_metadata("Addr111").await, Some(session));
    }

    #[tokio::test]
    async fn test_metadata_failures_swallowed_but_vault_writes_surface() {
        let storage = VaultStorage::with_default_namespace(Arc::new(ReadOnlyStore));

        // Bookkeeping never errors
        storage.record_backup_metadata("Addr111", Utc::now()).await;
        storage
            .record_session_metadata(&SessionRecord::start("Addr111"))
            .await;

        // Vault writes do
        assert!(matches!(
            storage.save_vault("Addr111", "blob").await,
            Err(WalletError::StorageUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_file_backed_roundtrip() {
        let temp = TempDir::new().unwrap();
        let blob = "c2FsdHNhbHRzYWx0c2FsdG5vbmNlbm9uY2VjaXBoZXJ0ZXh0";

        {
            let store = FileStore::open(temp.path()).await.unwrap();
            let storage = VaultStorage::with_default_namespace(Arc::new(store));
            storage.save_vault("Addr111", blob).await.unwrap();
        }

        let store = FileStore::open(temp.path()).await.unwrap();
        let storage = VaultStorage::with_default_namespace(Arc::new(store));
        assert_eq!(storage.load_vault("Addr111").await.unwrap().as_deref(), Some(blob));
    }
}
