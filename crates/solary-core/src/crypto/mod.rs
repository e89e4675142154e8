//! Cryptographic primitives for the wallet vault
//!
//! This module provides:
//! - AES-256-GCM authenticated encryption and the blob layout
//! - PBKDF2-HMAC-SHA256 key derivation from passwords
//! - OS CSPRNG access with no weak fallback
//! - Secret key material with zeroize-on-drop

mod encryption;
mod key_derivation;
mod provider;
mod random;
mod secure_memory;

pub use encryption::{open, seal, EncryptedBlob, SaltMode, NONCE_LEN, TAG_LEN};
pub use key_derivation::{derive_key, KeyDerivationParams, DEFAULT_ITERATIONS, FIXED_SALT, SALT_LEN};
pub use provider::{CryptoProvider, DefaultCryptoProvider};
pub use random::{ensure_randomness_available, fill_secure_random, secure_random};
pub use secure_memory::{MasterSeed, VaultKey};
