//! Password-based authenticated encryption of wallet payloads
//!
//! `encrypt` turns any serializable value plus a password into an opaque
//! base64 blob; `decrypt` reverses it. Every decryption failure (bad base64,
//! truncated blob, wrong password, flipped bit, unexpected JSON shape)
//! surfaces as the same `DecryptionFailed`. The underlying reason is logged
//! at debug level.

use serde::{de::DeserializeOwned, Serialize};
use tracing::debug;
use zeroize::Zeroizing;

use crate::crypto::{
    CryptoProvider, DefaultCryptoProvider, EncryptedBlob, KeyDerivationParams, SaltMode,
    FIXED_SALT, NONCE_LEN, SALT_LEN,
};
use crate::error::{Result, WalletError};
use crate::payload::VaultPayload;
use crate::settings::Settings;

/// Vault configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VaultConfig {
    pub kdf: KeyDerivationParams,
    pub salt_mode: SaltMode,
}

/// Encrypts and decrypts wallet payloads under a user password
#[derive(Debug, Clone, Default)]
pub struct Vault<P: CryptoProvider = DefaultCryptoProvider> {
    provider: P,
    config: VaultConfig,
}

impl Vault<DefaultCryptoProvider> {
    /// Vault with default parameters (100,000 PBKDF2 rounds, per-vault salt)
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_config(config: VaultConfig) -> Self {
        Self {
            provider: DefaultCryptoProvider,
            config,
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::with_config(settings.vault_config())
    }
}

impl<P: CryptoProvider> Vault<P> {
    /// Vault backed by a custom crypto provider
    pub fn with_provider(provider: P, config: VaultConfig) -> Self {
        Self { provider, config }
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    /// Fail fast when the provider cannot produce secure randomness
    pub fn ensure_randomness(&self) -> Result<()> {
        let mut scratch = [0u8; SALT_LEN];
        self.provider.secure_random(&mut scratch)
    }

    /// Serialize `payload` to JSON and seal it under `password`
    pub fn encrypt<T: Serialize + ?Sized>(&self, payload: &T, password: &str) -> Result<String> {
        let plaintext = Zeroizing::new(serde_json::to_vec(payload)?);

        let salt = match self.config.salt_mode {
            SaltMode::PerVault => {
                let mut salt = [0u8; SALT_LEN];
                self.provider.secure_random(&mut salt)?;
                Some(salt)
            }
            SaltMode::Fixed => None,
        };

        let mut nonce = [0u8; NONCE_LEN];
        self.provider.secure_random(&mut nonce)?;

        let key = self.provider.derive_key(
            password,
            salt.as_ref().map_or(FIXED_SALT, |s| s.as_slice()),
            self.config.kdf,
        )?;

        let ciphertext = self.provider.aead_seal(&key, &nonce, &plaintext)?;

        Ok(EncryptedBlob {
            salt,
            nonce,
            ciphertext,
        }
        .encode())
    }

    /// Open a blob and deserialize its JSON plaintext
    pub fn decrypt<T: DeserializeOwned>(&self, blob: &str, password: &str) -> Result<T> {
        let plaintext = self.decrypt_bytes(blob, password)?;

        serde_json::from_slice(&plaintext).map_err(|e| {
            debug!("Vault plaintext did not match the expected shape: {}", e);
            WalletError::DecryptionFailed
        })
    }

    /// Open a blob and return the raw plaintext bytes
    pub fn decrypt_bytes(&self, blob: &str, password: &str) -> Result<Zeroizing<Vec<u8>>> {
        let parsed = EncryptedBlob::decode(blob, self.config.salt_mode).map_err(|e| {
            debug!("Vault blob could not be parsed: {}", e);
            WalletError::DecryptionFailed
        })?;

        let key = self.provider.derive_key(
            password,
            parsed.salt.as_ref().map_or(FIXED_SALT, |s| s.as_slice()),
            self.config.kdf,
        )?;

        self.provider
            .aead_open(&key, &parsed.nonce, &parsed.ciphertext)
            .map(Zeroizing::new)
            .map_err(|_| {
                debug!("Vault authentication failed (wrong password or modified blob)");
                WalletError::DecryptionFailed
            })
    }

    /// Seal a typed wallet payload
    pub fn seal_payload(&self, payload: &VaultPayload, password: &str) -> Result<String> {
        self.encrypt(payload, password)
    }

    /// Open a blob and validate it as a wallet payload
    pub fn open_payload(&self, blob: &str, password: &str) -> Result<VaultPayload> {
        let payload: VaultPayload = self.decrypt(blob, password)?;

        if let Err(issue) = payload.validate() {
            debug!("Decrypted payload failed validation: {}", issue);
            return Err(WalletError::DecryptionFailed);
        }

        Ok(payload)
    }
}
