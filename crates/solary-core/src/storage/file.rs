//! File storage backend
//!
//! Stores all entries in a single JSON file in the user's data directory.
//! Values written here are already vault ciphertext or plain bookkeeping,
//! so the file itself is not encrypted again.

use async_trait::async_trait;
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tokio::sync::RwLock;
use tracing::debug;

use super::KeyValueStore;
use crate::error::{Result, WalletError};

const STORAGE_FILE: &str = "wallet.json";
const STORAGE_VERSION: u32 = 1;

/// JSON-file storage backend
pub struct FileStore {
    /// Directory for storage files
    storage_dir: PathBuf,
    /// In-memory copy of the file; the write guard also serializes writers
    entries: RwLock<HashMap<String, String>>,
}

/// File format for persistent storage
#[derive(Debug, Serialize, Deserialize)]
struct StorageFile {
    version: u32,
    entries: HashMap<String, String>,
}

impl FileStore {
    /// Open (creating if needed) a store rooted at `storage_dir`
    pub async fn open(storage_dir: impl Into<PathBuf>) -> Result<Self> {
        let storage_dir = storage_dir.into();
        tokio::fs::create_dir_all(&storage_dir)
            .await
            .map_err(|e| unavailable(&storage_dir, e))?;

        let store = Self {
            storage_dir,
            entries: RwLock::new(HashMap::new()),
        };
        store.load().await?;

        debug!("File storage initialized at: {:?}", store.storage_dir);
        Ok(store)
    }

    /// Get the storage directory path
    pub fn storage_dir(&self) -> &Path {
        &self.storage_dir
    }

    fn storage_file_path(&self) -> PathBuf {
        self.storage_dir.join(STORAGE_FILE)
    }

    /// Reload entries from disk, discarding the in-memory copy
    pub async fn load(&self) -> Result<()> {
        let path = self.storage_file_path();

        let contents = match tokio::fs::read_to_string(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!("No existing storage file found");
                return Ok(());
            }
            Err(e) => return Err(unavailable(&path, e)),
        };

        let file: StorageFile = serde_json::from_str(&contents)
            .map_err(|e| WalletError::StorageUnavailable(format!("{:?}: {}", path, e)))?;

        let mut entries = self.entries.write().await;
        *entries = file.entries;

        debug!("Loaded {} entries from storage", entries.len());
        Ok(())
    }

    /// Write `entries` to disk atomically using a temp file and rename
    async fn persist(&self, entries: &HashMap<String, String>) -> Result<()> {
        let file = StorageFile {
            version: STORAGE_VERSION,
            entries: entries.clone(),
        };

        let contents = serde_json::to_string_pretty(&file)?;
        let path = self.storage_file_path();
        let temp_path = path.with_extension("tmp");

        tokio::fs::write(&temp_path, &contents)
            .await
            .map_err(|e| unavailable(&temp_path, e))?;
        tokio::fs::rename(&temp_path, &path)
            .await
            .map_err(|e| unavailable(&path, e))?;

        debug!("Saved {} entries to storage", entries.len());
        Ok(())
    }

    /// Apply `change` to a copy of the entries, persist, then commit
    ///
    /// A failed write leaves both the file and the cache untouched.
    async fn mutate<F>(&self, change: F) -> Result<()>
    where
        F: FnOnce(&mut HashMap<String, String>) -> bool,
    {
        let mut entries = self.entries.write().await;

        let mut next = entries.clone();
        if !change(&mut next) {
            return Ok(());
        }

        self.persist(&next).await?;
        *entries = next;
        Ok(())
    }
}

#[async_trait]
impl KeyValueStore for FileStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.mutate(|entries| {
            entries.insert(key.to_string(), value.to_string());
            true
        })
        .await?;

        debug!("Stored key: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        self.mutate(|entries| entries.remove(key).is_some()).await?;

        debug!("Removed key: {}", key);
        Ok(())
    }

    async fn list_keys(&self, prefix: &str) -> Result<Vec<String>> {
        let entries = self.entries.read().await;

        Ok(entries
            .keys()
            .filter(|k| k.starts_with(prefix))
            .cloned()
            .collect())
    }

    fn backend_name(&self) -> &'static str {
        "File Storage"
    }
}

/// Default data directory for the wallet
pub fn default_data_dir() -> Result<PathBuf> {
    ProjectDirs::from("com", "solary", "solary-wallet")
        .map(|dirs| dirs.data_dir().to_path_buf())
        .ok_or_else(|| {
            WalletError::StorageUnavailable("Could not determine data directory".to_string())
        })
}

fn unavailable(path: &Path, e: std::io::Error) -> WalletError {
    WalletError::StorageUnavailable(format!("{:?}: {}", path, e))
}
