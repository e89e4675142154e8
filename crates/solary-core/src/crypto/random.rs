//! Operating-system CSPRNG access
//!
//! There is no fallback generator: if the OS cannot supply randomness the
//! caller gets `RandomnessUnavailable` and must refuse to create or encrypt
//! a wallet.

use rand::{rngs::OsRng, RngCore};

use crate::error::{Result, WalletError};

/// Fill `buf` with cryptographically secure random bytes
pub fn fill_secure_random(buf: &mut [u8]) -> Result<()> {
    OsRng
        .try_fill_bytes(buf)
        .map_err(|e| WalletError::RandomnessUnavailable(e.to_string()))
}

/// Return `N` cryptographically secure random bytes
pub fn secure_random<const N: usize>() -> Result<[u8; N]> {
    let mut out = [0u8; N];
    fill_secure_random(&mut out)?;
    Ok(out)
}

/// Probe the OS generator once, so an application can fail fast at startup
pub fn ensure_randomness_available() -> Result<()> {
    secure_random::<16>().map(|_| ())
}
