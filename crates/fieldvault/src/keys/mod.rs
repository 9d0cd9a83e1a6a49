//! Purpose-scoped key hierarchy.
//!
//! # Lifecycle
//!
//! 1. A [`Keyring`] is built once from the master key and a list of
//!    [`PurposeSpec`]s; each purpose key is derived with PBKDF2 using the
//!    purpose's salt label (plus an optional installation salt) as the salt.
//! 2. The keyring is immutable afterwards. Re-deriving from the same master
//!    key always reproduces the same purpose keys, so nothing but the master
//!    key needs to be persisted.
//! 3. All key buffers are zeroized when the last clone of the keyring drops.
//!
//! # Security invariants
//!
//! - Key material is **never** logged or included in errors.
//! - Purpose names and salt labels are not secrets. Two deployments sharing a
//!   master key and no installation salt derive identical purpose keys.

pub mod store;

pub use store::{FallbackPolicy, Keyring, KeyringError, ResolvedKey};

/// Name and PBKDF2 salt label of one declared purpose.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PurposeSpec {
    pub name: String,
    pub salt_label: String,
}

impl PurposeSpec {
    pub fn new(name: impl Into<String>, salt_label: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            salt_label: salt_label.into(),
        }
    }
}

/// Purpose for profile fields: phone, name, email.
pub const USER_PROFILE: &str = "user_profile";
/// Purpose for balances and other money amounts.
pub const FINANCIAL: &str = "financial";
/// Purpose for national identifiers such as the BVN.
pub const SENSITIVE: &str = "sensitive";

/// The purposes every facade declares. Salt labels are versioned so that a
/// future `_v2` label yields an independent key.
pub fn default_purposes() -> Vec<PurposeSpec> {
    vec![
        PurposeSpec::new(USER_PROFILE, "user_profile_v1"),
        PurposeSpec::new(FINANCIAL, "financial_data_v1"),
        PurposeSpec::new(SENSITIVE, "sensitive_info_v1"),
    ]
}
