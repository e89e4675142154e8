//! OS Keychain storage backend
//!
//! Uses the system keychain for vault blobs:
//! - macOS: Keychain
//! - Windows: Credential Manager (DPAPI)
//! - Linux: Secret Service (GNOME Keyring, KWallet)

use async_trait::async_trait;
use keyring::Entry;
use tracing::{debug, warn};

use super::KeyValueStore;
use crate::error::{Result, WalletError};

/// Service name used for keychain entries
const SERVICE_NAME: &str = "solary-wallet";

/// OS Keychain storage backend
pub struct KeychainStore {
    /// Whether keychain is available
    available: bool,
}

impl KeychainStore {
    pub fn new() -> Self {
        let available = Self::test_availability();

        if available {
            debug!("Keychain storage is available");
        } else {
            warn!("Keychain storage is not available");
        }

        Self { available }
    }

    /// Try to set and delete a throwaway entry
    fn test_availability() -> bool {
        match Entry::new(SERVICE_NAME, "__test_availability__") {
            Ok(entry) => {
                if entry.set_password("test").is_ok() {
                    let _ = entry.delete_password();
                    true
                } else {
                    false
                }
            }
            Err(_) => false,
        }
    }

    fn entry(&self, key: &str) -> Result<Entry> {
        if !self.available {
            return Err(WalletError::StorageUnavailable(
                "Keychain not available".to_string(),
            ));
        }
        Entry::new(SERVICE_NAME, key).map_err(|e| WalletError::KeychainError(e.to_string()))
    }

    pub fn is_available(&self) -> bool {
        self.available
    }
}

impl Default for KeychainStore {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl KeyValueStore for KeychainStore {
    async fn get(&self, key: &str) -> Result<Option<String>> {
        match self.entry(key)?.get_password() {
            Ok(value) => Ok(Some(value)),
            Err(keyring::Error::NoEntry) => {
                debug!("Key not found in keychain: {}", key);
                Ok(None)
            }
            Err(e) => Err(WalletError::KeychainError(e.to_string())),
        }
    }

    async fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entry(key)?
            .set_password(value)
            .map_err(|e| WalletError::StorageUnavailable(e.to_string()))?;

        debug!("Stored key in keychain: {}", key);
        Ok(())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        match self.entry(key)?.delete_password() {
            Ok(()) | Err(keyring::Error::NoEntry) => Ok(()),
            Err(e) => Err(WalletError::KeychainError(e.to_string())),
        }
    }

    async fn list_keys(&self, _prefix: &str) -> Result<Vec<String>> {
        // Keychain APIs do not enumerate entries for a service
        Err(WalletError::KeychainError(
            "Listing keys is not supported by keychain storage".to_string(),
        ))
    }

    fn backend_name(&self) -> &'static str {
        #[cfg(target_os = "macos")]
        return "macOS Keychain";

        #[cfg(target_os = "windows")]
        return "Windows Credential Manager";

        #[cfg(target_os = "linux")]
        return "Linux Secret Service";

        #[cfg(not(any(target_os = "macos", target_os = "windows", target_os = "linux")))]
        return "System Keychain";
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unavailable_keychain_reports_storage_unavailable() {
        let store = KeychainStore { available: false };

        assert!(matches!(
            store.set("solary_vault_x", "blob").await,
            Err(WalletError::StorageUnavailable(_))
        ));
        assert!(store.get("solary_vault_x").await.is_err());
        assert!(store.list_keys("solary_").await.is_err());
    }
}
