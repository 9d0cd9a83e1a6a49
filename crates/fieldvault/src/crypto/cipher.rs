//! AES-256-GCM-SIV sealing and opening of individual field values.
//!
//! Every call draws a fresh random nonce, so sealing the same plaintext twice
//! under the same key yields two different envelopes and ciphertexts never
//! reveal equality of the underlying values.
//!
//! **Do NOT substitute plain AES-256-GCM with a fixed nonce.** GCM nonce reuse
//! is catastrophic: it breaks both confidentiality and authentication.

use std::fmt;
use std::str::FromStr;

use aes_gcm_siv::{
    aead::{rand_core::RngCore, Aead, KeyInit, OsRng},
    Aes256GcmSiv, Nonce,
};
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use thiserror::Error;

use super::key::KeyMaterial;

/// Byte length of an AES-GCM-SIV nonce (12 bytes = 96 bits).
pub const NONCE_LEN: usize = 12;

/// Byte length of the authentication tag appended to every ciphertext.
pub const TAG_LEN: usize = 16;

/// Prefix that appears at the start of every envelope token.
pub const VERSION_PREFIX: &str = "v1";

/// A sealed field value: nonce plus ciphertext-and-tag.
///
/// The token representation is `v1.<base64url(nonce)>.<base64url(ciphertext+tag)>`,
/// which is already safe to embed in URLs, JSON, and command lines.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Envelope {
    /// Raw nonce bytes.
    pub nonce: [u8; NONCE_LEN],
    /// Raw ciphertext + authentication tag bytes.
    pub ciphertext: Vec<u8>,
}

impl fmt::Display for Envelope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}.{}.{}",
            VERSION_PREFIX,
            URL_SAFE_NO_PAD.encode(self.nonce),
            URL_SAFE_NO_PAD.encode(&self.ciphertext),
        )
    }
}

impl FromStr for Envelope {
    type Err = CipherError;

    /// Parse a token back into an [`Envelope`].
    ///
    /// Decoding is strict: padding, non-canonical trailing bits, a wrong nonce
    /// length, or a ciphertext shorter than the tag are all format errors.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.splitn(3, '.').collect();
        if parts.len() != 3 || parts[0] != VERSION_PREFIX {
            return Err(CipherError::InvalidFormat);
        }
        let nonce_bytes = URL_SAFE_NO_PAD
            .decode(parts[1])
            .map_err(|_| CipherError::InvalidFormat)?;
        if nonce_bytes.len() != NONCE_LEN {
            return Err(CipherError::InvalidFormat);
        }
        let mut nonce = [0u8; NONCE_LEN];
        nonce.copy_from_slice(&nonce_bytes);

        let ciphertext = URL_SAFE_NO_PAD
            .decode(parts[2])
            .map_err(|_| CipherError::InvalidFormat)?;
        if ciphertext.len() < TAG_LEN {
            return Err(CipherError::InvalidFormat);
        }

        Ok(Self { nonce, ciphertext })
    }
}

/// Errors produced by the cipher layer.
#[derive(Debug, Error)]
pub enum CipherError {
    /// The key could not be loaded into the cipher.
    #[error("invalid key length")]
    InvalidKeyLength,

    /// AES-GCM-SIV encryption failed, or decryption failed authentication.
    #[error("aead operation failed")]
    AeadFailure,

    /// The token does not match the `v1.<nonce>.<ciphertext>` structure.
    #[error("invalid envelope format")]
    InvalidFormat,
}

/// Seal `plaintext` under `key`.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] on an internal AEAD error (should be
/// unreachable with a valid key and nonce).
pub fn seal(key: &KeyMaterial, plaintext: &[u8]) -> Result<Envelope, CipherError> {
    let cipher = build_cipher(key)?;

    let mut nonce_bytes = [0u8; NONCE_LEN];
    OsRng.fill_bytes(&mut nonce_bytes);
    let nonce = Nonce::from_slice(&nonce_bytes);

    let ciphertext = cipher
        .encrypt(nonce, plaintext)
        .map_err(|_| CipherError::AeadFailure)?;

    Ok(Envelope {
        nonce: nonce_bytes,
        ciphertext,
    })
}

/// Open an [`Envelope`] back to plaintext bytes.
///
/// Fails closed: no bytes are returned unless the tag verifies.
///
/// # Errors
///
/// Returns [`CipherError::AeadFailure`] if authentication fails (wrong key or
/// tampered data).
pub fn open(key: &KeyMaterial, envelope: &Envelope) -> Result<Vec<u8>, CipherError> {
    let cipher = build_cipher(key)?;
    let nonce = Nonce::from_slice(&envelope.nonce);
    cipher
        .decrypt(nonce, envelope.ciphertext.as_ref())
        .map_err(|_| CipherError::AeadFailure)
}

/// Seal and render as a token in one step.
pub fn seal_to_token(key: &KeyMaterial, plaintext: &[u8]) -> Result<String, CipherError> {
    seal(key, plaintext).map(|envelope| envelope.to_string())
}

/// Parse a token and open it in one step.
pub fn open_token(key: &KeyMaterial, token: &str) -> Result<Vec<u8>, CipherError> {
    let envelope: Envelope = token.parse()?;
    open(key, &envelope)
}

fn build_cipher(key: &KeyMaterial) -> Result<Aes256GcmSiv, CipherError> {
    Aes256GcmSiv::new_from_slice(key.as_bytes()).map_err(|_| CipherError::InvalidKeyLength)
}
