//! BIP-39 recovery phrases
//!
//! Phrases are 12 English words (128 bits of entropy plus a 4-bit checksum).
//! Input is normalized before validation: surrounding whitespace is trimmed,
//! runs of whitespace collapse to a single space, and words are lowercased.

use bip39::Language;
use sha2::Sha512;
use zeroize::{Zeroize, Zeroizing};

use crate::crypto::{secure_random, MasterSeed};
use crate::error::{Result, WalletError};

/// Number of words in a wallet phrase
pub const MNEMONIC_WORD_COUNT: usize = 12;

/// Entropy size backing a 12-word phrase
const ENTROPY_LEN: usize = 16;

/// BIP-39 seed salt with an empty passphrase
const SEED_SALT: &[u8] = b"mnemonic";
const SEED_ROUNDS: u32 = 2048;

/// A checksum-validated 12-word recovery phrase
#[derive(Clone, PartialEq, Eq)]
pub struct Mnemonic {
    phrase: Zeroizing<String>,
}

impl Mnemonic {
    /// Generate a fresh phrase from 128 bits of OS randomness
    pub fn generate() -> Result<Self> {
        let entropy = Zeroizing::new(secure_random::<ENTROPY_LEN>()?);
        let inner = bip39::Mnemonic::from_entropy_in(Language::English, entropy.as_slice())
            .map_err(|_| WalletError::InvalidMnemonic)?;

        Ok(Self {
            phrase: Zeroizing::new(inner.to_string()),
        })
    }

    /// Parse and validate a user-supplied phrase
    pub fn parse(candidate: &str) -> Result<Self> {
        let normalized = normalize(candidate);

        if normalized.split(' ').count() != MNEMONIC_WORD_COUNT {
            return Err(WalletError::InvalidMnemonic);
        }

        bip39::Mnemonic::parse_in_normalized(Language::English, &normalized)
            .map_err(|_| WalletError::InvalidMnemonic)?;

        Ok(Self { phrase: normalized })
    }

    /// The canonical phrase (space-separated lowercase words)
    pub fn phrase(&self) -> &str {
        &self.phrase
    }

    /// Iterate over the words of the phrase
    pub fn words(&self) -> impl Iterator<Item = &str> {
        self.phrase.split(' ')
    }

    /// Derive the 64-byte BIP-39 seed (empty passphrase)
    pub fn to_seed(&self) -> MasterSeed {
        let mut seed = [0u8; 64];
        pbkdf2::pbkdf2_hmac::<Sha512>(self.phrase.as_bytes(), SEED_SALT, SEED_ROUNDS, &mut seed);

        let master = MasterSeed::new(seed);
        seed.zeroize();
        master
    }
}

impl std::fmt::Debug for Mnemonic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Mnemonic")
            .field("words", &MNEMONIC_WORD_COUNT)
            .field("phrase", &"[REDACTED]")
            .finish()
    }
}

/// Generate a new 12-word phrase
pub fn generate_mnemonic() -> Result<Mnemonic> {
    Mnemonic::generate()
}

/// Check word-list membership, word count and checksum
///
/// Never fails loudly: malformed input simply returns `false`.
pub fn validate_mnemonic(candidate: &str) -> bool {
    Mnemonic::parse(candidate).is_ok()
}

/// Derive the BIP-39 seed from a validated phrase
pub fn mnemonic_to_seed(mnemonic: &Mnemonic) -> MasterSeed {
    mnemonic.to_seed()
}

fn normalize(candidate: &str) -> Zeroizing<String> {
    Zeroizing::new(
        candidate
            .split_whitespace()
            .map(|w| w.to_lowercase())
            .collect::<Vec<_>>()
            .join(" "),
    )
}
