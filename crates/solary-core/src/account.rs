//! Wallet accounts derived from a recovery phrase

use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

use crate::error::Result;
use crate::keys::{derive_account_keypair, Keypair};
use crate::mnemonic::Mnemonic;

/// A derived wallet account
///
/// Serialized with camelCase field names. Secret fields are wiped on drop
/// and never printed by `Debug`.
#[derive(Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Account {
    /// Display label
    pub name: String,
    /// Originating recovery phrase, shared by sibling accounts
    seed_phrase: String,
    /// 64-byte `seed || public` private key, base58 on the wire
    #[serde(with = "base58_secret")]
    private_key: [u8; 64],
    /// Base58 address
    public_key: String,
    /// Position in the derivation sequence
    derivation_index: u32,
}

impl Account {
    fn from_keypair(mnemonic: &Mnemonic, index: u32, keypair: &Keypair) -> Self {
        Self {
            name: default_account_name(index),
            seed_phrase: mnemonic.phrase().to_string(),
            private_key: *keypair.secret_bytes(),
            public_key: keypair.public_key_base58(),
            derivation_index: index,
        }
    }

    pub fn seed_phrase(&self) -> &str {
        &self.seed_phrase
    }

    pub fn private_key(&self) -> &[u8; 64] {
        &self.private_key
    }

    /// Private key in the base58 form Solana wallets import
    pub fn private_key_base58(&self) -> String {
        bs58::encode(self.private_key).into_string()
    }

    pub fn public_key(&self) -> &str {
        &self.public_key
    }

    pub fn derivation_index(&self) -> u32 {
        self.derivation_index
    }

    /// Change the display name; the only mutable field
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
    }

    /// Rebuild the signing keypair from the stored private key
    pub fn keypair(&self) -> Option<Keypair> {
        Keypair::from_secret_bytes(&self.private_key)
    }

    /// Sign a message with this account's key
    pub fn sign(&self, message: &[u8]) -> Option<[u8; 64]> {
        self.keypair().map(|kp| kp.sign(message))
    }

    /// Check that the public key is the one the private key implies
    pub fn verify_integrity(&self) -> bool {
        self.keypair()
            .map(|kp| kp.public_key_base58() == self.public_key)
            .unwrap_or(false)
    }

    /// Check that this account really is `derivation_index` of `seed_phrase`
    pub fn verify_derivation(&self) -> bool {
        match Mnemonic::parse(&self.seed_phrase) {
            Ok(mnemonic) => new_account(&mnemonic, self.derivation_index) == *self,
            Err(_) => false,
        }
    }
}

impl PartialEq for Account {
    fn eq(&self, other: &Self) -> bool {
        self.public_key == other.public_key
    }
}

impl Eq for Account {}

impl Drop for Account {
    fn drop(&mut self) {
        self.seed_phrase.zeroize();
        self.private_key.zeroize();
    }
}

impl std::fmt::Debug for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Account")
            .field("name", &self.name)
            .field("public_key", &self.public_key)
            .field("derivation_index", &self.derivation_index)
            .field("seed_phrase", &"[REDACTED]")
            .field("private_key", &"[REDACTED]")
            .finish()
    }
}

/// Default label for an account: index 0 is "Account 1"
pub fn default_account_name(index: u32) -> String {
    format!("Account {}", u64::from(index) + 1)
}

/// Derive the account at `index` from an already validated phrase
pub fn new_account(mnemonic: &Mnemonic, index: u32) -> Account {
    let seed = mnemonic.to_seed();
    let keypair = derive_account_keypair(&seed, index);
    Account::from_keypair(mnemonic, index, &keypair)
}

/// Validate a user-supplied phrase, then derive the account at `index`
pub fn import_account(phrase: &str, index: u32) -> Result<Account> {
    let mnemonic = Mnemonic::parse(phrase)?;
    Ok(new_account(&mnemonic, index))
}

mod base58_secret {
    use serde::{de::Error, Deserialize, Deserializer, Serializer};
    use zeroize::Zeroizing;

    pub fn serialize<S: Serializer>(key: &[u8; 64], serializer: S) -> Result<S::Ok, S::Error> {
        let encoded = Zeroizing::new(bs58::encode(key).into_string());
        serializer.serialize_str(&encoded)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<[u8; 64], D::Error> {
        let encoded = Zeroizing::new(String::deserialize(deserializer)?);
        let decoded = Zeroizing::new(
            bs58::decode(encoded.as_str())
                .into_vec()
                .map_err(|_| D::Error::custom("private key is not valid base58"))?,
        );

        let mut key = [0u8; 64];
        if decoded.len() != key.len() {
            return Err(D::Error::custom(format!(
                "private key must be 64 bytes, got {}",
                decoded.len()
            )));
        }
        key.copy_from_slice(&decoded);
        Ok(key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WalletError;
    use crate::keys::verify_signature;
    use crate::mnemonic::generate_mnemonic;

    #[test]
    fn test_new_account_defaults() {
        let mnemonic = generate_mnemonic().unwrap();
        let account = new_account(&mnemonic, 0);

        assert_eq!(account.name, "Account 1");
        assert_eq!(account.seed_phrase(), mnemonic.phrase());
        assert_eq!(account.derivation_index(), 0);
        assert_eq!(&account.private_key()[..32], &mnemonic.to_seed().as_bytes()[..32]);
        assert!(account.verify_integrity());
        assert!(account.verify_derivation());
    }

    #[test]
    fn test_new_account_deterministic() {
        let mnemonic = generate_mnemonic().unwrap();
        let a = new_account(&mnemonic, 2);
        let b = new_account(&mnemonic, 2);

        assert_eq!(a, b);
        assert_eq!(a.private_key(), b.private_key());
    }

    #[test]
    fn test_indices_give_distinct_accounts() {
        let mnemonic = generate_mnemonic().unwrap();
        let a = new_account(&mnemonic, 0);
        let b = new_account(&mnemonic, 1);

        assert_ne!(a.public_key(), b.public_key());
        assert_eq!(b.name, "Account 2");
    }

    #[test]
    fn test_import_invalid() {
        let bad = vec!["zoo"; 12].join(" ");
        assert!(matches!(import_account(&bad, 0), Err(WalletError::InvalidMnemonic)));
    }

    #[test]
    fn test_import_matches_new() {
        let mnemonic = generate_mnemonic().unwrap();
        let created = new_account(&mnemonic, 0);
        let imported = import_account(&mnemonic.phrase().to_uppercase(), 0).unwrap();

        assert_eq!(created, imported);
    }

    #[test]
    fn test_equality_by_public_key() {
        let mnemonic = generate_mnemonic().unwrap();
        let a = new_account(&mnemonic, 0);
        let mut b = a.clone();
        b.rename("Savings");

        assert_eq!(a, b);
    }

    #[test]
    fn test_serde_roundtrip_camel_case() {
        let mnemonic = generate_mnemonic().unwrap();
        let account = new_account(&mnemonic, 1);

        let json = serde_json::to_value(&account).unwrap();
        assert_eq!(json["publicKey"], account.public_key());
        assert_eq!(json["derivationIndex"], 1);
        assert_eq!(json["privateKey"], account.private_key_base58());
        assert!(json.get("seedPhrase").is_some());

        let back: Account = serde_json::from_value(json).unwrap();
        assert_eq!(back.private_key(), account.private_key());
        assert!(back.verify_integrity());
    }

    #[test]
    fn test_tampered_public_key_fails_integrity() {
        let mnemonic = generate_mnemonic().unwrap();
        let account = new_account(&mnemonic, 0);
        let other = new_account(&mnemonic, 1);

        let mut json = serde_json::to_value(&account).unwrap();
        json["publicKey"] = serde_json::Value::String(other.public_key().to_string());
        let forged: Account = serde_json::from_value(json).unwrap();

        assert!(!forged.verify_integrity());
    }

    #[test]
    fn test_bad_private_key_length_rejected() {
        let mnemonic = generate_mnemonic().unwrap();
        let mut json = serde_json::to_value(new_account(&mnemonic, 0)).unwrap();
        json["privateKey"] = serde_json::Value::String(bs58::encode([1u8; 32]).into_string());

        assert!(serde_json::from_value::<Account>(json).is_err());
    }

    #[test]
    fn test_sign() {
        let account = new_account(&generate_mnemonic().unwrap(), 0);
        let signature = account.sign(b"hello").unwrap();
        assert!(verify_signature(account.public_key(), b"hello", &signature));
    }

    #[test]
    fn test_debug_redacted() {
        let mnemonic = generate_mnemonic().unwrap();
        let account = new_account(&mnemonic, 0);
        let debug = format!("{:?}", account);

        assert!(debug.contains(account.public_key()));
        assert!(!debug.contains(mnemonic.phrase()));
        assert!(!debug.contains(&account.private_key_base58()));
    }
}
