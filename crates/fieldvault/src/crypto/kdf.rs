//! PBKDF2-HMAC-SHA256 derivation of purpose keys from the master key.

use hmac::Hmac;
use sha2::Sha256;
use thiserror::Error;

use super::key::{KeyMaterial, KEY_LEN};

/// Fixed PBKDF2 iteration count. Changing it changes every derived key, so it
/// is not configurable.
pub const PBKDF2_ITERATIONS: u32 = 100_000;

/// Errors produced by key derivation.
#[derive(Debug, Error)]
pub enum KdfError {
    /// The master key input was empty.
    #[error("master key must not be empty")]
    EmptyMaster,

    /// The salt (purpose label) was empty.
    #[error("derivation salt must not be empty")]
    EmptySalt,

    /// The HMAC primitive rejected its input. Not recoverable.
    #[error("PBKDF2-HMAC-SHA256 unavailable")]
    Unavailable,
}

/// Derive a 256-bit key from `master` using `salt` as the PBKDF2 salt.
///
/// Deterministic: the same `(master, salt)` always yields the same key, which
/// is what lets ciphertext be decrypted by a later process holding the same
/// master key.
///
/// # Errors
///
/// Returns [`KdfError::EmptyMaster`] or [`KdfError::EmptySalt`] on empty
/// inputs, and [`KdfError::Unavailable`] if the HMAC core fails.
pub fn derive_key(master: &[u8], salt: &[u8]) -> Result<KeyMaterial, KdfError> {
    if master.is_empty() {
        return Err(KdfError::EmptyMaster);
    }
    if salt.is_empty() {
        return Err(KdfError::EmptySalt);
    }

    let mut out = zeroize::Zeroizing::new([0u8; KEY_LEN]);
    pbkdf2::pbkdf2::<Hmac<Sha256>>(master, salt, PBKDF2_ITERATIONS, &mut out[..])
        .map_err(|_| KdfError::Unavailable)?;

    KeyMaterial::from_slice(&out[..]).map_err(|_| KdfError::Unavailable)
}
