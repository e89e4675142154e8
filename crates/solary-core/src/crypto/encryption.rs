//! AES-256-GCM authenticated encryption and the persisted blob layout
//!
//! Blob format (base64, standard alphabet):
//! - per-vault salt: `salt(16) || nonce(12) || ciphertext || tag(16)`
//! - fixed salt:     `nonce(12) || ciphertext || tag(16)`

use aes_gcm::{
    aead::{Aead, KeyInit},
    Aes256Gcm, Nonce,
};
use base64::{engine::general_purpose::STANDARD, Engine};
use serde::{Deserialize, Serialize};

use super::key_derivation::SALT_LEN;
use super::VaultKey;
use crate::error::{Result, WalletError};

/// GCM nonce length (96 bits)
pub const NONCE_LEN: usize = 12;

/// GCM authentication tag length (128 bits)
pub const TAG_LEN: usize = 16;

/// How the PBKDF2 salt is handled for a blob
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SaltMode {
    /// Random salt generated per encryption and stored in the blob
    #[default]
    PerVault,
    /// Application-wide constant salt; blob carries only nonce and ciphertext
    Fixed,
}

/// Parsed encrypted blob
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncryptedBlob {
    /// PBKDF2 salt, present only in the per-vault layout
    pub salt: Option<[u8; SALT_LEN]>,
    /// GCM nonce
    pub nonce: [u8; NONCE_LEN],
    /// Ciphertext with the GCM tag appended
    pub ciphertext: Vec<u8>,
}

impl EncryptedBlob {
    /// Serialize to raw bytes
    pub fn to_bytes(&self) -> Vec<u8> {
        let salt_len = self.salt.map_or(0, |s| s.len());
        let mut out = Vec::with_capacity(salt_len + NONCE_LEN + self.ciphertext.len());
        if let Some(salt) = &self.salt {
            out.extend_from_slice(salt);
        }
        out.extend_from_slice(&self.nonce);
        out.extend_from_slice(&self.ciphertext);
        out
    }

    /// Parse raw bytes according to the expected salt mode
    pub fn from_bytes(bytes: &[u8], mode: SaltMode) -> Result<Self> {
        let (salt, rest) = match mode {
            SaltMode::PerVault => {
                if bytes.len() < SALT_LEN {
                    return Err(WalletError::DecryptionFailed);
                }
                let (salt_bytes, rest) = bytes.split_at(SALT_LEN);
                let mut salt = [0u8; SALT_LEN];
                salt.copy_from_slice(salt_bytes);
                (Some(salt), rest)
            }
            SaltMode::Fixed => (None, bytes),
        };

        if rest.len() < NONCE_LEN + TAG_LEN {
            return Err(WalletError::DecryptionFailed);
        }

        let (nonce_bytes, ciphertext) = rest.split_at(NONCE_LEN);
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(nonce_bytes);

        Ok(Self {
            salt,
            nonce,
            ciphertext: ciphertext.to_vec(),
        })
    }

    /// Encode as the transport-safe base64 string
    pub fn encode(&self) -> String {
        STANDARD.encode(self.to_bytes())
    }

    /// Decode from a base64 string
    pub fn decode(blob: &str, mode: SaltMode) -> Result<Self> {
        let bytes = STANDARD
            .decode(blob.trim())
            .map_err(|_| WalletError::DecryptionFailed)?;
        Self::from_bytes(&bytes, mode)
    }
}

/// Encrypt plaintext under `key` with the given nonce
///
/// Returns ciphertext with the 16-byte tag appended.
pub fn seal(plaintext: &[u8], key: &VaultKey, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher = Aes256Gcm::new_from_slice(key.as_bytes())
        .map_err(|e| WalletError::EncryptionError(e.to_string()))?;

    cipher
        .encrypt(Nonce::from_slice(nonce), plaintext)
        .map_err(|e| WalletError::EncryptionError(e.to_string()))
}

/// Decrypt and authenticate ciphertext produced by [`seal`]
///
/// Any failure is reported as `DecryptionFailed`.
pub fn open(ciphertext: &[u8], key: &VaultKey, nonce: &[u8; NONCE_LEN]) -> Result<Vec<u8>> {
    let cipher =
        Aes256Gcm::new_from_slice(key.as_bytes()).map_err(|_| WalletError::DecryptionFailed)?;

    cipher
        .decrypt(Nonce::from_slice(nonce), ciphertext)
        .map_err(|_| WalletError::DecryptionFailed)
}
