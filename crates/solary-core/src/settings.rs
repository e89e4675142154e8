//! Application settings management
//!
//! Stores non-sensitive configuration in a plain JSON file.
//! Settings are readable even when the wallet is locked.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

use crate::crypto::{KeyDerivationParams, SaltMode, DEFAULT_ITERATIONS};
use crate::error::{Result, WalletError};
use crate::storage::DEFAULT_NAMESPACE;
use crate::vault::VaultConfig;

const SETTINGS_FILE: &str = "settings.json";

/// Where vault blobs are kept
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum StorageBackend {
    /// `wallet.json` in the data directory
    #[default]
    File,
    /// OS keychain (macOS Keychain, Windows Credential Manager, Secret Service)
    Keychain,
}

/// Application settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    /// Settings file version
    pub version: u32,
    /// Storage key prefix
    pub namespace: String,
    /// Vault storage backend
    pub storage_backend: StorageBackend,
    /// PBKDF2 rounds for the vault key
    pub kdf_iterations: u32,
    /// Blob salt layout
    pub salt_mode: SaltMode,
    /// Auto-lock timeout in minutes (0 = never)
    pub auto_lock_timeout_minutes: u32,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            version: 1,
            namespace: DEFAULT_NAMESPACE.to_string(),
            storage_backend: StorageBackend::File,
            kdf_iterations: DEFAULT_ITERATIONS,
            salt_mode: SaltMode::PerVault,
            auto_lock_timeout_minutes: 15,
        }
    }
}

impl Settings {
    /// Vault parameters described by these settings
    pub fn vault_config(&self) -> VaultConfig {
        VaultConfig {
            kdf: KeyDerivationParams {
                iterations: self.kdf_iterations,
            },
            salt_mode: self.salt_mode,
        }
    }
}

/// Settings manager
pub struct SettingsManager {
    settings_file: PathBuf,
    settings: Settings,
}

impl SettingsManager {
    /// Load settings from `storage_dir`, falling back to defaults
    pub fn new(storage_dir: &Path) -> Self {
        let settings_file = storage_dir.join(SETTINGS_FILE);
        let settings = Self::load_from_file(&settings_file).unwrap_or_else(|e| {
            warn!("Could not read settings, using defaults: {}", e);
            Settings::default()
        });

        Self {
            settings_file,
            settings,
        }
    }

    fn load_from_file(path: &Path) -> Result<Settings> {
        if !path.exists() {
            debug!("No settings file found, using defaults");
            return Ok(Settings::default());
        }

        let contents = std::fs::read_to_string(path)?;
        let settings: Settings = serde_json::from_str(&contents)?;
        debug!("Loaded settings from {:?}", path);
        Ok(settings)
    }

    /// Save settings to file
    pub async fn save(&self) -> Result<()> {
        let contents = serde_json::to_string_pretty(&self.settings)?;

        // Write atomically using temp file
        let temp_path = self.settings_file.with_extension("tmp");
        tokio::fs::write(&temp_path, &contents).await?;
        tokio::fs::rename(&temp_path, &self.settings_file).await?;

        debug!("Saved settings to {:?}", self.settings_file);
        Ok(())
    }

    /// Get current settings
    pub fn get(&self) -> &Settings {
        &self.settings
    }

    /// Get mutable settings
    pub fn get_mut(&mut self) -> &mut Settings {
        &mut self.settings
    }

    /// Update settings and save
    pub async fn update(&mut self, settings: Settings) -> Result<()> {
        if settings.kdf_iterations == 0 {
            return Err(WalletError::KeyDerivationError(
                "kdfIterations must be at least 1".to_string(),
            ));
        }
        self.settings = settings;
        self.save().await
    }

    /// Set auto-lock timeout and save
    pub async fn set_auto_lock_timeout(&mut self, minutes: u32) -> Result<()> {
        self.settings.auto_lock_timeout_minutes = minutes;
        self.save().await
    }

    /// Reset settings to defaults and delete settings file
    pub async fn reset(&mut self) -> Result<()> {
        self.settings = Settings::default();

        if self.settings_file.exists() {
            tokio::fs::remove_file(&self.settings_file)
                .await
                .map_err(|e| WalletError::StorageUnavailable(e.to_string()))?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_settings_default() {
        let temp_dir = TempDir::new().unwrap();
        let manager = SettingsManager::new(temp_dir.path());

        let settings = manager.get();
        assert_eq!(settings.namespace, "solary");
        assert_eq!(settings.storage_backend, StorageBackend::File);
        assert_eq!(settings.kdf_iterations, 100_000);
        assert_eq!(settings.salt_mode, SaltMode::PerVault);
        assert_eq!(settings.auto_lock_timeout_minutes, 15);
    }

    #[tokio::test]
    async fn test_settings_persistence() {
        let temp_dir = TempDir::new().unwrap();

        {
            let mut manager = SettingsManager::new(temp_dir.path());
            manager.get_mut().auto_lock_timeout_minutes = 30;
            manager.get_mut().salt_mode = SaltMode::Fixed;
            manager.save().await.unwrap();
        }

        {
            let manager = SettingsManager::new(temp_dir.path());
            assert_eq!(manager.get().auto_lock_timeout_minutes, 30);
            assert_eq!(manager.get().salt_mode, SaltMode::Fixed);
        }
    }

    #[tokio::test]
    async fn test_partial_file_fills_defaults() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join("settings.json"),
            r#"{ "saltMode": "fixed", "kdfIterations": 5000, "storageBackend": "keychain" }"#,
        )
        .unwrap();

        let manager = SettingsManager::new(temp_dir.path());
        let config = manager.get().vault_config();
        assert_eq!(config.salt_mode, SaltMode::Fixed);
        assert_eq!(config.kdf.iterations, 5000);
        assert_eq!(manager.get().namespace, "solary");
        assert_eq!(manager.get().storage_backend, StorageBackend::Keychain);
    }

    #[tokio::test]
    async fn test_zero_iterations_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());

        let settings = Settings {
            kdf_iterations: 0,
            ..Settings::default()
        };
        assert!(manager.update(settings).await.is_err());
        assert_eq!(manager.get().kdf_iterations, 100_000);
    }

    #[tokio::test]
    async fn test_reset() {
        let temp_dir = TempDir::new().unwrap();
        let mut manager = SettingsManager::new(temp_dir.path());
        manager.set_auto_lock_timeout(5).await.unwrap();

        manager.reset().await.unwrap();

        assert_eq!(manager.get(), &Settings::default());
        assert!(!temp_dir.path().join("settings.json").exists());
    }
}
