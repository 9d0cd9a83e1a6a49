//! [`Keyring`]: the master key plus every derived purpose key.

use std::{collections::HashMap, sync::Arc};

use thiserror::Error;

use crate::crypto::{derive_key, KdfError, KeyMaterial};

use super::PurposeSpec;

/// Errors produced by the keyring.
#[derive(Debug, Error)]
pub enum KeyringError {
    /// Two purpose specs share a name.
    #[error("purpose declared twice: {0}")]
    DuplicatePurpose(String),

    /// A purpose spec has an empty name or salt label.
    #[error("purpose name and salt label must not be empty")]
    EmptyPurpose,

    /// The purpose is not declared and fallback is disabled.
    #[error("unknown purpose: {0}")]
    UnknownPurpose(String),

    /// Key derivation failed. Not recoverable.
    #[error(transparent)]
    Derivation(#[from] KdfError),
}

/// What to do when asked for a purpose that was never declared.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FallbackPolicy {
    /// Use the master key itself. Lenient, and weakens key scoping for typos.
    #[default]
    MasterKey,
    /// Refuse with [`KeyringError::UnknownPurpose`].
    Reject,
}

/// Key chosen for a purpose lookup.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedKey<'a> {
    pub key: &'a KeyMaterial,
    /// `true` if the master key was substituted for an undeclared purpose.
    pub is_fallback: bool,
}

/// Read-only mapping of purpose name → derived key, plus the master key.
///
/// Built once; never mutated afterwards. Both maps are `Arc`-backed so clones
/// are cheap and can be shared across threads without locking.
#[derive(Clone, Debug)]
pub struct Keyring {
    master: Arc<KeyMaterial>,
    purposes: Arc<HashMap<String, KeyMaterial>>,
}

impl Keyring {
    /// Derive one key per spec from `master`.
    ///
    /// The PBKDF2 salt for each purpose is its salt label followed by
    /// `installation_salt` (which may be empty).
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::DuplicatePurpose`] or [`KeyringError::EmptyPurpose`]
    /// for malformed specs, and [`KeyringError::Derivation`] if PBKDF2 fails.
    pub fn derive(
        master: KeyMaterial,
        specs: &[PurposeSpec],
        installation_salt: &[u8],
    ) -> Result<Self, KeyringError> {
        let mut purposes = HashMap::with_capacity(specs.len());
        for spec in specs {
            if spec.name.is_empty() || spec.salt_label.is_empty() {
                return Err(KeyringError::EmptyPurpose);
            }
            if purposes.contains_key(&spec.name) {
                return Err(KeyringError::DuplicatePurpose(spec.name.clone()));
            }
            let mut salt = Vec::with_capacity(spec.salt_label.len() + installation_salt.len());
            salt.extend_from_slice(spec.salt_label.as_bytes());
            salt.extend_from_slice(installation_salt);

            let key = derive_key(master.as_bytes(), &salt)?;
            purposes.insert(spec.name.clone(), key);
        }

        Ok(Self {
            master: Arc::new(master),
            purposes: Arc::new(purposes),
        })
    }

    /// Number of derived purpose keys (the master key is not counted).
    pub fn len(&self) -> usize {
        self.purposes.len()
    }

    /// Returns `true` if no purposes were declared.
    pub fn is_empty(&self) -> bool {
        self.purposes.is_empty()
    }

    /// Returns `true` if `purpose` has its own derived key.
    pub fn contains(&self, purpose: &str) -> bool {
        self.purposes.contains_key(purpose)
    }

    /// Look up the key for `purpose`, applying `policy` if it is undeclared.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::UnknownPurpose`] only under [`FallbackPolicy::Reject`].
    pub fn resolve(
        &self,
        purpose: &str,
        policy: FallbackPolicy,
    ) -> Result<ResolvedKey<'_>, KeyringError> {
        if let Some(key) = self.purposes.get(purpose) {
            return Ok(ResolvedKey {
                key,
                is_fallback: false,
            });
        }
        match policy {
            FallbackPolicy::MasterKey => Ok(ResolvedKey {
                key: &self.master,
                is_fallback: true,
            }),
            FallbackPolicy::Reject => Err(KeyringError::UnknownPurpose(purpose.to_owned())),
        }
    }
}
