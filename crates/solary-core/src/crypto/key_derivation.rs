//! Password-based key derivation using PBKDF2-HMAC-SHA256

use pbkdf2::pbkdf2_hmac;
use serde::{Deserialize, Serialize};
use sha2::Sha256;

use super::VaultKey;
use crate::error::{Result, WalletError};

/// Length of the per-vault random salt in bytes
pub const SALT_LEN: usize = 16;

/// Application-wide salt used by the fixed-salt blob layout
pub const FIXED_SALT: &[u8] = b"solary-wallet-salt";

/// Default PBKDF2 iteration count
pub const DEFAULT_ITERATIONS: u32 = 100_000;

/// Parameters for PBKDF2 key derivation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct KeyDerivationParams {
    /// Number of HMAC-SHA256 rounds (default: 100,000)
    pub iterations: u32,
}

impl Default for KeyDerivationParams {
    fn default() -> Self {
        Self {
            iterations: DEFAULT_ITERATIONS,
        }
    }
}

/// Derive a 256-bit vault key from a password
///
/// # Arguments
/// * `password` - The user's password
/// * `salt` - Per-vault salt, or [`FIXED_SALT`] for the fixed-salt layout
/// * `params` - Optional key derivation parameters
///
/// # Returns
/// A 32-byte key suitable for AES-256-GCM
pub fn derive_key(
    password: &str,
    salt: &[u8],
    params: Option<KeyDerivationParams>,
) -> Result<VaultKey> {
    let params = params.unwrap_or_default();

    if params.iterations == 0 {
        return Err(WalletError::KeyDerivationError(
            "Iteration count must be at least 1".to_string(),
        ));
    }

    let mut key_bytes = [0u8; 32];
    pbkdf2_hmac::<Sha256>(password.as_bytes(), salt, params.iterations, &mut key_bytes);

    let key = VaultKey::new(key_bytes);
    zeroize::Zeroize::zeroize(&mut key_bytes);
    Ok(key)
}
