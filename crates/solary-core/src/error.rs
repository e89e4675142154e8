//! Error types for solary-core

use thiserror::Error;

/// Result type alias for wallet operations
pub type Result<T> = std::result::Result<T, WalletError>;

/// Wallet error types
///
/// `InvalidMnemonic` and `DecryptionFailed` never say which word or byte was wrong.
#[derive(Error, Debug)]
pub enum WalletError {
    #[error("Invalid recovery phrase - check your words")]
    InvalidMnemonic,

    #[error("Unable to decrypt wallet - check your password")]
    DecryptionFailed,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Secure randomness unavailable: {0}")]
    RandomnessUnavailable(String),

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Wallet is locked - unlock with password first")]
    WalletLocked,

    #[error("Wallet is not initialized - create or import a wallet first")]
    WalletNotInitialized,

    #[error("Wallet is already initialized")]
    WalletAlreadyInitialized,

    #[error("Account not found: index {0}")]
    AccountNotFound(u32),

    #[error("Invalid settings: {0}")]
    InvalidSettings(String),

    #[error("Encryption failed: {0}")]
    EncryptionError(String),

    #[error("Key derivation failed: {0}")]
    KeyDerivationError(String),

    #[error("Keychain error: {0}")]
    KeychainError(String),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}
