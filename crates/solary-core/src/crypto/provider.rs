//! Crypto provider seam
//!
//! The vault reaches its primitives only through [`CryptoProvider`].

use super::encryption::{self, NONCE_LEN};
use super::key_derivation::{self, KeyDerivationParams};
use super::random;
use super::VaultKey;
use crate::error::Result;

/// Primitives required by the vault
pub trait CryptoProvider: Send + Sync {
    /// Derive a 256-bit key from a password and salt
    fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
        params: KeyDerivationParams,
    ) -> Result<VaultKey>;

    /// AEAD-encrypt `plaintext`, returning ciphertext with tag appended
    fn aead_seal(
        &self,
        key: &VaultKey,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>>;

    /// AEAD-decrypt and authenticate; fails closed
    fn aead_open(
        &self,
        key: &VaultKey,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>>;

    /// Fill `buf` from a CSPRNG
    fn secure_random(&self, buf: &mut [u8]) -> Result<()>;
}

/// RustCrypto-backed provider: PBKDF2-HMAC-SHA256, AES-256-GCM, OS RNG
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultCryptoProvider;

impl CryptoProvider for DefaultCryptoProvider {
    fn derive_key(
        &self,
        password: &str,
        salt: &[u8],
        params: KeyDerivationParams,
    ) -> Result<VaultKey> {
        key_derivation::derive_key(password, salt, Some(params))
    }

    fn aead_seal(
        &self,
        key: &VaultKey,
        nonce: &[u8; NONCE_LEN],
        plaintext: &[u8],
    ) -> Result<Vec<u8>> {
        encryption::seal(plaintext, key, nonce)
    }

    fn aead_open(
        &self,
        key: &VaultKey,
        nonce: &[u8; NONCE_LEN],
        ciphertext: &[u8],
    ) -> Result<Vec<u8>> {
        encryption::open(ciphertext, key, nonce)
    }

    fn secure_random(&self, buf: &mut [u8]) -> Result<()> {
        random::fill_secure_random(buf)
    }
}
