//! Typed plaintext carried inside an encrypted vault blob

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::account::Account;

/// Backup wrapper version written by this crate
pub const BACKUP_VERSION: &str = "1.0";

/// A wallet as persisted at rest: the primary account plus any extra
/// accounts derived from the same phrase
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WalletBundle {
    pub wallet: Account,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub accounts: Vec<Account>,
    pub created_at: DateTime<Utc>,
}

impl WalletBundle {
    pub fn new(wallet: Account) -> Self {
        Self {
            wallet,
            accounts: Vec::new(),
            created_at: Utc::now(),
        }
    }

    /// All accounts, primary first
    pub fn all_accounts(&self) -> impl Iterator<Item = &Account> {
        std::iter::once(&self.wallet).chain(self.accounts.iter())
    }
}

/// Exported backup
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupBundle {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub data: Vec<Account>,
}

impl BackupBundle {
    pub fn new(accounts: Vec<Account>) -> Self {
        Self {
            version: BACKUP_VERSION.to_string(),
            timestamp: Utc::now(),
            data: accounts,
        }
    }
}

/// Everything the vault knows how to seal
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum VaultPayload {
    Wallet(WalletBundle),
    Backup(BackupBundle),
}

/// Why a decrypted payload was rejected
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PayloadIssue {
    UnsupportedVersion(String),
    Empty,
    KeyMismatch(String),
    MixedSeedPhrases,
    DuplicateAccount(String),
}

impl std::fmt::Display for PayloadIssue {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnsupportedVersion(v) => write!(f, "unsupported backup version {}", v),
            Self::Empty => write!(f, "payload contains no accounts"),
            Self::KeyMismatch(pk) => write!(f, "public key {} does not match its private key", pk),
            Self::MixedSeedPhrases => write!(f, "accounts come from different recovery phrases"),
            Self::DuplicateAccount(pk) => write!(f, "account {} appears twice", pk),
        }
    }
}

impl VaultPayload {
    /// All accounts in the payload
    pub fn accounts(&self) -> Vec<&Account> {
        match self {
            Self::Wallet(bundle) => bundle.all_accounts().collect(),
            Self::Backup(bundle) => bundle.data.iter().collect(),
        }
    }

    /// Structural checks applied after decryption
    pub fn validate(&self) -> std::result::Result<(), PayloadIssue> {
        if let Self::Backup(bundle) = self {
            if bundle.version != BACKUP_VERSION {
                return Err(PayloadIssue::UnsupportedVersion(bundle.version.clone()));
            }
        }

        let accounts = self.accounts();
        let Some(first) = accounts.first() else {
            return Err(PayloadIssue::Empty);
        };

        let mut seen = std::collections::HashSet::new();
        for account in &accounts {
            if !account.verify_integrity() {
                return Err(PayloadIssue::KeyMismatch(account.public_key().to_string()));
            }
            if account.seed_phrase() != first.seed_phrase() {
                return Err(PayloadIssue::MixedSeedPhrases);
            }
            if !seen.insert(account.public_key()) {
                return Err(PayloadIssue::DuplicateAccount(account.public_key().to_string()));
            }
        }

        Ok(())
    }
}
