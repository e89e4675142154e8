//! Ed25519 key derivation for wallet accounts
//!
//! Account 0 uses the first half of the BIP-39 seed directly, so it matches
//! the address produced by single-account Solana wallets that do the same.
//! Every other index gets `HMAC-SHA256(key = seed, msg = index_be32)`.

use ed25519_dalek::{Signature, Signer, SigningKey, Verifier, VerifyingKey};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use zeroize::Zeroizing;

use crate::crypto::MasterSeed;

type HmacSha256 = Hmac<Sha256>;

/// Ed25519 keypair in the Solana layout
///
/// `secret` is `seed32 || public32`, 64 bytes.
pub struct Keypair {
    signing_key: SigningKey,
}

impl Keypair {
    /// The 64-byte private key (`seed || public`)
    pub fn secret_bytes(&self) -> Zeroizing<[u8; 64]> {
        Zeroizing::new(self.signing_key.to_keypair_bytes())
    }

    /// Raw 32-byte public key
    pub fn public_bytes(&self) -> [u8; 32] {
        self.signing_key.verifying_key().to_bytes()
    }

    /// Base58-encoded public key (the wallet address)
    pub fn public_key_base58(&self) -> String {
        bs58::encode(self.public_bytes()).into_string()
    }

    /// Sign an arbitrary message
    pub fn sign(&self, message: &[u8]) -> [u8; 64] {
        self.signing_key.sign(message).to_bytes()
    }

    /// Rebuild from a 64-byte private key, checking the public half matches
    pub fn from_secret_bytes(secret: &[u8; 64]) -> Option<Self> {
        SigningKey::from_keypair_bytes(secret)
            .ok()
            .map(|signing_key| Self { signing_key })
    }
}

impl std::fmt::Debug for Keypair {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Keypair")
            .field("public_key", &self.public_key_base58())
            .field("secret", &"[REDACTED]")
            .finish()
    }
}

/// Build an ed25519 keypair from a 32-byte seed
pub fn derive_keypair(seed32: &[u8; 32]) -> Keypair {
    Keypair {
        signing_key: SigningKey::from_bytes(seed32),
    }
}

/// Build a keypair from a seed slice
///
/// # Panics
/// If `seed` is not exactly 32 bytes. Seeds only come from
/// [`derive_account_seed`], so a wrong length is a bug in the caller.
pub fn derive_keypair_from_slice(seed: &[u8]) -> Keypair {
    assert_eq!(seed.len(), 32, "ed25519 seed must be 32 bytes, got {}", seed.len());
    let mut seed32 = Zeroizing::new([0u8; 32]);
    seed32.copy_from_slice(seed);
    derive_keypair(&seed32)
}

/// Per-account 32-byte seed
pub fn derive_account_seed(seed: &MasterSeed, account_index: u32) -> Zeroizing<[u8; 32]> {
    if account_index == 0 {
        return seed.primary_half();
    }

    let mut mac = <HmacSha256 as Mac>::new_from_slice(seed.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(&account_index.to_be_bytes());

    let mut out = Zeroizing::new([0u8; 32]);
    out.copy_from_slice(&mac.finalize().into_bytes());
    out
}

/// Derive the keypair for `account_index` straight from the master seed
pub fn derive_account_keypair(seed: &MasterSeed, account_index: u32) -> Keypair {
    let account_seed = derive_account_seed(seed, account_index);
    derive_keypair(&account_seed)
}

/// Verify an ed25519 signature against a base58 public key
///
/// Returns `false` for malformed keys or signatures.
pub fn verify_signature(public_key: &str, message: &[u8], signature: &[u8; 64]) -> bool {
    let Some(bytes) = decode_public_key(public_key) else {
        return false;
    };
    let Ok(verifying_key) = VerifyingKey::from_bytes(&bytes) else {
        return false;
    };

    verifying_key
        .verify(message, &Signature::from_bytes(signature))
        .is_ok()
}

/// Decode a base58 address into raw public key bytes
pub fn decode_public_key(public_key: &str) -> Option<[u8; 32]> {
    let bytes = bs58::decode(public_key).into_vec().ok()?;
    bytes.try_into().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mnemonic::Mnemonic;

    const ABANDON_ABOUT: &str = "abandon abandon abandon abandon abandon abandon \
                                 abandon abandon abandon abandon abandon about";

    fn master_seed() -> MasterSeed {
        Mnemonic::parse(ABANDON_ABOUT).unwrap().to_seed()
    }

    #[test]
    fn test_rfc8032_vector() {
        // RFC 8032 section 7.1, test 1
        let secret: [u8; 32] = [
            0x9d, 0x61, 0xb1, 0x9d, 0xef, 0xfd, 0x5a, 0x60, 0xba, 0x84, 0x4a, 0xf4, 0x92, 0xec,
            0x2c, 0xc4, 0x44, 0x49, 0xc5, 0x69, 0x7b, 0x32, 0x69, 0x19, 0x70, 0x3b, 0xac, 0x03,
            0x1c, 0xae, 0x7f, 0x60,
        ];
        let public: [u8; 32] = [
            0xd7, 0x5a, 0x98, 0x01, 0x82, 0xb1, 0x0a, 0xb7, 0xd5, 0x4b, 0xfe, 0xd3, 0xc9, 0x64,
            0x07, 0x3a, 0x0e, 0xe1, 0x72, 0xf3, 0xda, 0xa6, 0x23, 0x25, 0xaf, 0x02, 0x1a, 0x68,
            0xf7, 0x07, 0x51, 0x1a,
        ];

        let keypair = derive_keypair(&secret);
        assert_eq!(keypair.public_bytes(), public);

        let secret_bytes = keypair.secret_bytes();
        assert_eq!(&secret_bytes[..32], &secret);
        assert_eq!(&secret_bytes[32..], &public);
    }

    #[test]
    fn test_keypair_deterministic() {
        let seed = [5u8; 32];
        let a = derive_keypair(&seed);
        let b = derive_keypair(&seed);

        assert_eq!(a.public_bytes(), b.public_bytes());
        assert_eq!(*a.secret_bytes(), *b.secret_bytes());
    }

    #[test]
    fn test_index_zero_is_seed_prefix() {
        let seed = master_seed();
        let account_seed = derive_account_seed(&seed, 0);
        assert_eq!(&account_seed[..], &seed.as_bytes()[..32]);
    }

    #[test]
    fn test_account_seeds_distinct() {
        let seed = master_seed();
        let seeds: Vec<[u8; 32]> = (0..8).map(|i| *derive_account_seed(&seed, i)).collect();

        for i in 0..seeds.len() {
            for j in (i + 1)..seeds.len() {
                assert_ne!(seeds[i], seeds[j], "indices {} and {} collide", i, j);
            }
        }
    }

    #[test]
    fn test_account_seed_reproducible() {
        let a = derive_account_seed(&master_seed(), 7);
        let b = derive_account_seed(&master_seed(), 7);
        assert_eq!(*a, *b);
    }

    #[test]
    fn test_account_seed_is_hmac_of_index() {
        let seed = master_seed();
        let mut mac = <HmacSha256 as Mac>::new_from_slice(seed.as_bytes()).unwrap();
        mac.update(&[0, 0, 0, 3]);
        let expected = mac.finalize().into_bytes();

        assert_eq!(&derive_account_seed(&seed, 3)[..], expected.as_slice());
    }

    #[test]
    fn test_public_key_base58_roundtrip() {
        let keypair = derive_account_keypair(&master_seed(), 0);
        let address = keypair.public_key_base58();

        assert!(address.len() >= 32 && address.len() <= 44);
        assert_eq!(decode_public_key(&address), Some(keypair.public_bytes()));
    }

    #[test]
    fn test_from_secret_bytes() {
        let keypair = derive_keypair(&[9u8; 32]);
        let rebuilt = Keypair::from_secret_bytes(&keypair.secret_bytes()).unwrap();
        assert_eq!(rebuilt.public_bytes(), keypair.public_bytes());

        let mut mismatched = *keypair.secret_bytes();
        mismatched[40] ^= 0xFF;
        assert!(Keypair::from_secret_bytes(&mismatched).is_none());
    }

    #[test]
    fn test_sign_and_verify() {
        let keypair = derive_account_keypair(&master_seed(), 1);
        let address = keypair.public_key_base58();
        let signature = keypair.sign(b"transfer 1 SOL");

        assert!(verify_signature(&address, b"transfer 1 SOL", &signature));
        assert!(!verify_signature(&address, b"transfer 2 SOL", &signature));
        assert!(!verify_signature("not-base58-0OIl", b"transfer 1 SOL", &signature));
    }

    #[test]
    #[should_panic(expected = "ed25519 seed must be 32 bytes")]
    fn test_wrong_seed_length_panics() {
        derive_keypair_from_slice(&[0u8; 31]);
    }

    #[test]
    fn test_debug_redacted() {
        let keypair = derive_keypair(&[3u8; 32]);
        assert!(format!("{:?}", keypair).contains("REDACTED"));
    }
}
