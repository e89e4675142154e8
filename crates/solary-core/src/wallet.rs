//! Main wallet orchestration

use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};
use zeroize::Zeroizing;

use crate::account::{new_account, Account};
use crate::error::{Result, WalletError};
use crate::metadata::SessionRecord;
use crate::mnemonic::Mnemonic;
use crate::payload::{BackupBundle, VaultPayload, WalletBundle};
use crate::settings::{Settings, SettingsManager, StorageBackend};
use crate::storage::{FileStore, KeyValueStore, KeychainStore, VaultStorage};
use crate::vault::Vault;

/// Wallet state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WalletState {
    /// No wallet has been created or imported yet
    NotInitialized,
    /// Wallet is locked (password required)
    Locked,
    /// Wallet is unlocked and ready
    Unlocked,
}

/// Secrets held only while unlocked
struct UnlockedWallet {
    mnemonic: Mnemonic,
    bundle: WalletBundle,
    password: Zeroizing<String>,
    session: SessionRecord,
}

/// Main wallet struct that orchestrates all functionality
pub struct Wallet {
    /// Namespaced vault persistence
    storage: VaultStorage,
    /// Password-based encryption of the wallet bundle
    vault: Vault,
    settings: Settings,
    /// Present only while unlocked
    unlocked: Option<UnlockedWallet>,
    /// Current state
    state: WalletState,
}

impl Wallet {
    /// Open the wallet stored under `data_dir`, using its settings file
    pub async fn open_dir(data_dir: &Path) -> Result<Self> {
        let settings = SettingsManager::new(data_dir).get().clone();

        let store: Arc<dyn KeyValueStore> = match settings.storage_backend {
            StorageBackend::File => Arc::new(FileStore::open(data_dir).await?),
            StorageBackend::Keychain => {
                let keychain = KeychainStore::new();
                if !keychain.is_available() {
                    return Err(WalletError::StorageUnavailable(
                        "OS keychain is not available".to_string(),
                    ));
                }
                Arc::new(keychain)
            }
        };
        let storage = VaultStorage::new(store, settings.namespace.clone());
        let vault = Vault::from_settings(&settings);

        Self::open(storage, vault, settings).await
    }

    /// Open a wallet over explicit storage and vault
    pub async fn open(storage: VaultStorage, vault: Vault, settings: Settings) -> Result<Self> {
        vault.ensure_randomness()?;

        let state = match storage.active_wallet().await? {
            Some(address) if storage.load_vault(&address).await?.is_some() => WalletState::Locked,
            _ => WalletState::NotInitialized,
        };

        debug!("Opened wallet on {} ({:?})", storage.backend_name(), state);

        Ok(Self {
            storage,
            vault,
            settings,
            unlocked: None,
            state,
        })
    }

    /// Get the current wallet state
    pub fn state(&self) -> WalletState {
        self.state
    }

    /// Check if the wallet is unlocked
    pub fn is_unlocked(&self) -> bool {
        self.state == WalletState::Unlocked
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    /// Apply new settings and save them through `manager`
    ///
    /// `namespace` and `storageBackend` are read when the wallet is opened and
    /// cannot change here. `saltMode` and `kdfIterations` shape the stored
    /// vault, so they can only change before a wallet exists.
    pub async fn update_settings(
        &mut self,
        manager: &mut SettingsManager,
        settings: Settings,
    ) -> Result<()> {
        if settings.namespace != self.settings.namespace
            || settings.storage_backend != self.settings.storage_backend
        {
            return Err(WalletError::InvalidSettings(
                "namespace and storageBackend only apply when the wallet is opened".to_string(),
            ));
        }

        if self.state != WalletState::NotInitialized
            && settings.vault_config() != self.settings.vault_config()
        {
            return Err(WalletError::InvalidSettings(
                "saltMode and kdfIterations cannot change while a wallet exists".to_string(),
            ));
        }

        manager.update(settings.clone()).await?;
        self.vault = Vault::from_settings(&settings);
        self.settings = settings;
        Ok(())
    }

    fn unlocked(&self) -> Result<&UnlockedWallet> {
        self.unlocked.as_ref().ok_or(self.locked_error())
    }

    fn unlocked_mut(&mut self) -> Result<&mut UnlockedWallet> {
        let err = self.locked_error();
        let unlocked = self.unlocked.as_mut().ok_or(err)?;
        unlocked.session.touch();
        Ok(unlocked)
    }

    fn locked_error(&self) -> WalletError {
        match self.state {
            WalletState::NotInitialized => WalletError::WalletNotInitialized,
            _ => WalletError::WalletLocked,
        }
    }

    /// Create a brand new wallet; returns the phrase the user must write down
    pub async fn create(&mut self, password: &str) -> Result<Mnemonic> {
        self.ensure_not_initialized()?;

        info!("Creating new wallet");
        let mnemonic = Mnemonic::generate()?;
        let bundle = WalletBundle::new(new_account(&mnemonic, 0));

        self.install(mnemonic.clone(), bundle, password).await?;

        info!("Wallet created successfully");
        Ok(mnemonic)
    }

    /// Import an existing wallet from its recovery phrase
    pub async fn import(&mut self, phrase: &str, password: &str) -> Result<Account> {
        self.ensure_not_initialized()?;

        let mnemonic = Mnemonic::parse(phrase)?;
        let account = new_account(&mnemonic, 0);
        let bundle = WalletBundle::new(account.clone());

        info!("Importing wallet {}", account.public_key());
        self.install(mnemonic, bundle, password).await?;

        Ok(account)
    }

    fn ensure_not_initialized(&self) -> Result<()> {
        if self.state != WalletState::NotInitialized {
            return Err(WalletError::WalletAlreadyInitialized);
        }
        Ok(())
    }

    /// Persist a fresh bundle and leave the wallet unlocked
    async fn install(
        &mut self,
        mnemonic: Mnemonic,
        bundle: WalletBundle,
        password: &str,
    ) -> Result<()> {
        let password = Zeroizing::new(password.to_string());
        let address = bundle.wallet.public_key().to_string();

        let blob = self
            .seal_blob(VaultPayload::Wallet(bundle.clone()), &password)
            .await?;
        self.storage.save_vault(&address, &blob).await?;
        self.storage.set_active_wallet(&address).await?;

        self.begin_session(mnemonic, bundle, password).await;
        Ok(())
    }

    async fn begin_session(
        &mut self,
        mnemonic: Mnemonic,
        bundle: WalletBundle,
        password: Zeroizing<String>,
    ) {
        let session = SessionRecord::start(bundle.wallet.public_key());
        self.storage.record_session_metadata(&session).await;

        self.unlocked = Some(UnlockedWallet {
            mnemonic,
            bundle,
            password,
            session,
        });
        self.state = WalletState::Unlocked;
    }

    /// Unlock the wallet with a password
    pub async fn unlock(&mut self, password: &str) -> Result<()> {
        if self.state == WalletState::NotInitialized {
            return Err(WalletError::WalletNotInitialized);
        }

        if self.state == WalletState::Unlocked {
            debug!("Wallet already unlocked");
            return Ok(());
        }

        let password = Zeroizing::new(password.to_string());
        let (address, blob) = self.load_active_blob().await?;
        let payload = match self.open_blob(blob, &password).await {
            Ok(payload) => payload,
            Err(WalletError::DecryptionFailed) => {
                let config = self.vault.config();
                debug!(
                    "Vault for {} did not open with saltMode {:?} and {} rounds; \
                     a wrong password or changed vault settings cause this",
                    address, config.salt_mode, config.kdf.iterations
                );
                return Err(WalletError::DecryptionFailed);
            }
            Err(e) => return Err(e),
        };

        let bundle = match payload {
            VaultPayload::Wallet(bundle) if bundle.wallet.public_key() == address => bundle,
            _ => {
                debug!("Stored vault for {} does not hold that wallet", address);
                return Err(WalletError::DecryptionFailed);
            }
        };
        let mnemonic = Mnemonic::parse(bundle.wallet.seed_phrase())
            .map_err(|_| WalletError::DecryptionFailed)?;

        self.begin_session(mnemonic, bundle, password).await;

        info!("Wallet unlocked successfully");
        Ok(())
    }

    async fn load_active_blob(&self) -> Result<(String, String)> {
        let address = self
            .storage
            .active_wallet()
            .await?
            .ok_or(WalletError::WalletNotInitialized)?;
        let blob = self
            .storage
            .load_vault(&address)
            .await?
            .ok_or(WalletError::WalletNotInitialized)?;
        Ok((address, blob))
    }

    /// Lock the wallet (drop all secrets from memory)
    pub async fn lock(&mut self) -> Result<()> {
        if let Some(mut unlocked) = self.unlocked.take() {
            unlocked.session.touch();
            self.storage.record_session_metadata(&unlocked.session).await;
        }

        if self.state == WalletState::Unlocked {
            self.state = WalletState::Locked;
            info!("Wallet locked");
        }
        Ok(())
    }

    /// Lock if the session has been idle past the configured timeout
    pub async fn enforce_auto_lock(&mut self) -> Result<bool> {
        let timeout = self.settings.auto_lock_timeout_minutes;
        let idle = self
            .unlocked
            .as_ref()
            .map_or(false, |u| u.session.is_idle(timeout));

        if idle {
            debug!("Auto-lock timeout of {} minutes reached", timeout);
            self.lock().await?;
        }
        Ok(idle)
    }

    /// Current session, while unlocked
    pub fn session(&self) -> Option<&SessionRecord> {
        self.unlocked.as_ref().map(|u| &u.session)
    }

    /// Address of account 0
    pub fn primary_address(&self) -> Result<&str> {
        Ok(self.unlocked()?.bundle.wallet.public_key())
    }

    /// The recovery phrase, for display after re-authentication
    pub fn mnemonic(&self) -> Result<&Mnemonic> {
        Ok(&self.unlocked()?.mnemonic)
    }

    /// All accounts, primary first
    pub fn accounts(&self) -> Result<Vec<&Account>> {
        Ok(self.unlocked()?.bundle.all_accounts().collect())
    }

    pub fn account(&self, index: u32) -> Result<&Account> {
        self.unlocked()?
            .bundle
            .all_accounts()
            .find(|a| a.derivation_index() == index)
            .ok_or(WalletError::AccountNotFound(index))
    }

    /// Derive the next account and persist it
    pub async fn add_account(&mut self, name: Option<&str>) -> Result<Account> {
        let unlocked = self.unlocked_mut()?;

        let next_index = unlocked
            .bundle
            .all_accounts()
            .map(|a| a.derivation_index())
            .max()
            .map_or(0, |max| max + 1);

        let mut account = new_account(&unlocked.mnemonic, next_index);
        if let Some(name) = name {
            account.rename(name);
        }

        let mut bundle = unlocked.bundle.clone();
        bundle.accounts.push(account.clone());
        self.commit(bundle).await?;

        info!("Added account {} ({})", account.name, account.public_key());
        Ok(account)
    }

    /// Change the display name of an account and persist it
    pub async fn rename_account(&mut self, index: u32, name: &str) -> Result<()> {
        let mut bundle = self.unlocked_mut()?.bundle.clone();

        let account = if bundle.wallet.derivation_index() == index {
            &mut bundle.wallet
        } else {
            bundle
                .accounts
                .iter_mut()
                .find(|a| a.derivation_index() == index)
                .ok_or(WalletError::AccountNotFound(index))?
        };
        account.rename(name);

        self.commit(bundle).await
    }

    /// Sign a message with the account at `index`
    pub fn sign(&self, index: u32, message: &[u8]) -> Result<[u8; 64]> {
        let account = self.account(index)?;
        account.sign(message).ok_or_else(|| {
            WalletError::KeyDerivationError("stored key pair is inconsistent".to_string())
        })
    }

    /// Encrypt all accounts into a portable backup under `backup_password`
    pub async fn export_backup(&mut self, backup_password: &str) -> Result<String> {
        let unlocked = self.unlocked_mut()?;
        let address = unlocked.bundle.wallet.public_key().to_string();
        let backup = BackupBundle::new(unlocked.bundle.all_accounts().cloned().collect());
        let timestamp = backup.timestamp;

        let password = Zeroizing::new(backup_password.to_string());
        let blob = self.seal_blob(VaultPayload::Backup(backup), &password).await?;

        self.storage.record_backup_metadata(&address, timestamp).await;

        info!("Exported backup for {}", address);
        Ok(blob)
    }

    /// Restore a backup into an empty wallet, protecting it with `password`
    pub async fn restore_backup(
        &mut self,
        blob: &str,
        backup_password: &str,
        password: &str,
    ) -> Result<Account> {
        self.ensure_not_initialized()?;

        let backup_password = Zeroizing::new(backup_password.to_string());
        let mut accounts = match self.open_blob(blob.to_string(), &backup_password).await? {
            VaultPayload::Backup(backup) => backup.data,
            VaultPayload::Wallet(_) => {
                debug!("Blob is a wallet vault, not a backup");
                return Err(WalletError::DecryptionFailed);
            }
        };
        accounts.sort_by_key(|a| a.derivation_index());

        let phrase = accounts
            .first()
            .map(|a| a.seed_phrase())
            .ok_or(WalletError::DecryptionFailed)?;
        let mnemonic = Mnemonic::parse(phrase).map_err(|_| WalletError::DecryptionFailed)?;
        if accounts.iter().any(|a| !a.verify_derivation()) {
            debug!("Backup holds accounts that do not derive from its phrase");
            return Err(WalletError::DecryptionFailed);
        }

        let primary = if accounts.first().map(|a| a.derivation_index()) == Some(0) {
            accounts.remove(0)
        } else {
            new_account(&mnemonic, 0)
        };
        let mut bundle = WalletBundle::new(primary.clone());
        bundle.accounts = accounts;

        info!("Restoring wallet {} from backup", primary.public_key());
        self.install(mnemonic, bundle, password).await?;

        Ok(primary)
    }

    /// Change the wallet password
    pub async fn change_password(&mut self, old_password: &str, new_password: &str) -> Result<()> {
        if self.state == WalletState::NotInitialized {
            return Err(WalletError::WalletNotInitialized);
        }

        // Verify old password against what is on disk
        let (address, blob) = self.load_active_blob().await?;
        let old_password = Zeroizing::new(old_password.to_string());
        let payload = self.open_blob(blob, &old_password).await?;

        let new_password = Zeroizing::new(new_password.to_string());
        let blob = self.seal_blob(payload, &new_password).await?;
        self.storage.save_vault(&address, &blob).await?;

        if let Some(unlocked) = self.unlocked.as_mut() {
            unlocked.password = new_password;
        }

        info!("Password changed successfully");
        Ok(())
    }

    /// Delete the wallet vault completely
    /// WARNING: This is irreversible without the recovery phrase or a backup!
    pub async fn reset(&mut self) -> Result<()> {
        info!("Resetting wallet - deleting vault");

        if let Some(address) = self.storage.active_wallet().await? {
            self.storage.delete_vault(&address).await?;
        }
        self.storage.clear_active_wallet().await?;

        self.unlocked = None;
        self.state = WalletState::NotInitialized;

        info!("Wallet reset complete");
        Ok(())
    }

    /// Seal and save `bundle` under the session password, then adopt it
    ///
    /// On failure the unlocked bundle is left as it was.
    async fn commit(&mut self, bundle: WalletBundle) -> Result<()> {
        let password = self.unlocked()?.password.clone();
        let address = bundle.wallet.public_key().to_string();

        let blob = self
            .seal_blob(VaultPayload::Wallet(bundle.clone()), &password)
            .await?;
        self.storage.save_vault(&address, &blob).await?;

        if let Some(unlocked) = self.unlocked.as_mut() {
            unlocked.bundle = bundle;
        }
        Ok(())
    }

    /// Seal on the blocking pool
    async fn seal_blob(
        &self,
        payload: VaultPayload,
        password: &Zeroizing<String>,
    ) -> Result<String> {
        let vault = self.vault.clone();
        let password = password.clone();
        run_blocking(move || vault.seal_payload(&payload, &password)).await
    }

    async fn open_blob(
        &self,
        blob: String,
        password: &Zeroizing<String>,
    ) -> Result<VaultPayload> {
        let vault = self.vault.clone();
        let password = password.clone();
        run_blocking(move || vault.open_payload(&blob, &password)).await
    }
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| WalletError::EncryptionError(format!("crypto task failed: {}", e)))?
}

impl std::fmt::Debug for Wallet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Wallet")
            .field("state", &self.state)
            .field("namespace", &self.storage.namespace())
            .field(
                "address",
                &self.unlocked.as_ref().map(|u| u.bundle.wallet.public_key()),
            )
            .finish()
    }
}
