//! Key material, key derivation, and AES-256-GCM-SIV envelope primitives.
//!
//! This module is free of logging, configuration, and result-rendering
//! concerns. It provides the low-level operations used by the keyring and the
//! data protection facade.
//!
//! # Envelope format
//!
//! ```text
//! v1.<base64url-no-pad(nonce)>.<base64url-no-pad(ciphertext+tag)>
//! ```
//!
//! The `v1` prefix enables future algorithm or key-version migration without
//! breaking existing ciphertext.

pub mod cipher;
pub mod kdf;
pub mod key;

pub use cipher::{open_token, seal_to_token, CipherError, Envelope};
pub use kdf::{derive_key, KdfError, PBKDF2_ITERATIONS};
pub use key::{KeyError, KeyMaterial, KEY_LEN};
