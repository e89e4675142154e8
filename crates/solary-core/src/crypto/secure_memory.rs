//! Secret key material with automatic zeroization

use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

/// 256-bit symmetric vault key - automatically zeroed when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct VaultKey {
    key: [u8; 32],
}

impl VaultKey {
    /// Create a new vault key from raw bytes
    pub fn new(key: [u8; 32]) -> Self {
        Self { key }
    }

    /// Get the key bytes (use carefully - avoid copying)
    pub fn as_bytes(&self) -> &[u8; 32] {
        &self.key
    }
}

impl std::fmt::Debug for VaultKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("VaultKey")
            .field("key", &"[REDACTED]")
            .finish()
    }
}

/// 64-byte BIP-39 seed - automatically zeroed when dropped
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct MasterSeed {
    seed: [u8; 64],
}

impl MasterSeed {
    pub fn new(seed: [u8; 64]) -> Self {
        Self { seed }
    }

    pub fn as_bytes(&self) -> &[u8; 64] {
        &self.seed
    }

    /// First 32 bytes, the ed25519 key material of the primary account
    pub fn primary_half(&self) -> Zeroizing<[u8; 32]> {
        let mut half = Zeroizing::new([0u8; 32]);
        half.copy_from_slice(&self.seed[..32]);
        half
    }
}

impl std::fmt::Debug for MasterSeed {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MasterSeed")
            .field("seed", &"[REDACTED]")
            .finish()
    }
}
