//! [`KeyMaterial`]: fixed-size, self-wiping key buffer.

use aes_gcm_siv::aead::{rand_core::RngCore, OsRng};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use subtle::ConstantTimeEq;
use thiserror::Error;
use zeroize::{Zeroize, ZeroizeOnDrop};

/// Byte length of every key in the hierarchy (32 bytes = 256 bits).
pub const KEY_LEN: usize = 32;

/// Errors produced when importing key material.
#[derive(Debug, Error)]
pub enum KeyError {
    /// The key material has an unexpected length.
    #[error("key has invalid length: expected {KEY_LEN} bytes, got {0}")]
    InvalidLength(usize),

    /// The textual key is not valid base64url.
    #[error("key is not valid base64url")]
    InvalidEncoding,
}

/// Exactly [`KEY_LEN`] bytes of secret key material.
///
/// Used for both the master key and every derived purpose key. The buffer is
/// overwritten with zeroes when dropped, on every exit path.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct KeyMaterial([u8; KEY_LEN]);

impl KeyMaterial {
    /// Generate a fresh random key from the OS CSPRNG.
    pub fn generate() -> Self {
        let mut key = Self([0u8; KEY_LEN]);
        OsRng.fill_bytes(&mut key.0);
        key
    }

    /// Copy key material out of a slice.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidLength`] if the slice is not [`KEY_LEN`] bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, KeyError> {
        if bytes.len() != KEY_LEN {
            return Err(KeyError::InvalidLength(bytes.len()));
        }
        let mut key = Self([0u8; KEY_LEN]);
        key.0.copy_from_slice(bytes);
        Ok(key)
    }

    /// Parse a base64url key. Trailing `=` padding is accepted so that keys
    /// written by padded encoders import unchanged.
    ///
    /// # Errors
    ///
    /// Returns [`KeyError::InvalidEncoding`] or [`KeyError::InvalidLength`].
    pub fn from_base64(text: &str) -> Result<Self, KeyError> {
        let mut decoded = URL_SAFE_NO_PAD
            .decode(text.trim().trim_end_matches('='))
            .map_err(|_| KeyError::InvalidEncoding)?;
        let key = Self::from_slice(&decoded);
        decoded.zeroize();
        key
    }

    /// Encode as unpadded base64url, the format accepted by [`Self::from_base64`].
    pub fn to_base64(&self) -> String {
        URL_SAFE_NO_PAD.encode(self.0)
    }

    /// Borrow the raw key bytes.
    pub fn as_bytes(&self) -> &[u8; KEY_LEN] {
        &self.0
    }
}

impl PartialEq for KeyMaterial {
    fn eq(&self, other: &Self) -> bool {
        self.0.ct_eq(&other.0).into()
    }
}

impl Eq for KeyMaterial {}

impl std::fmt::Debug for KeyMaterial {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        // Never print key material, not even in debug builds.
        f.write_str("KeyMaterial([REDACTED])")
    }
}
