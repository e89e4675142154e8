//! # solary-core
//!
//! Key management and encrypted storage for the Solary Solana wallet:
//! - BIP-39 recovery phrases and ed25519 account derivation
//! - AES-256-GCM vault with PBKDF2-HMAC-SHA256 key derivation
//! - Pluggable storage (JSON file, OS keychain, in-memory)
//! - Wallet lifecycle with lock, unlock, backup and restore

pub mod account;
pub mod crypto;
pub mod error;
pub mod keys;
pub mod metadata;
pub mod mnemonic;
pub mod payload;
pub mod settings;
pub mod storage;
pub mod vault;
mod wallet;

pub use account::{default_account_name, import_account, new_account, Account};
pub use error::{Result, WalletError};
pub use keys::{derive_account_keypair, derive_keypair, verify_signature, Keypair};
pub use metadata::{BackupRecord, SessionRecord};
pub use mnemonic::{generate_mnemonic, mnemonic_to_seed, validate_mnemonic, Mnemonic};
pub use payload::{BackupBundle, VaultPayload, WalletBundle};
pub use settings::{Settings, SettingsManager, StorageBackend};
pub use storage::{FileStore, KeyValueStore, KeychainStore, MemoryStore, VaultStorage};
pub use vault::{Vault, VaultConfig};
pub use wallet::{Wallet, WalletState};
