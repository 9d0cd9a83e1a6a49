//! Data Protection Facade: purpose routing, envelope sealing, and result rendering.
//!
//! Callers name a purpose (`user_profile`, `financial`, `sensitive`, or any
//! purpose declared at construction). The facade picks the matching derived
//! key, seals or opens the value, and always answers with an
//! [`OperationResult`]. Errors never escape as `Err` or panics.
//!
//! # Logging invariants
//!
//! - Every operation emits one event with its type and purpose.
//! - **No plaintext, token, or key material** appears in any log field.
//! - Decryption failures are logged with their cause but rendered to the
//!   caller as one generic message, so the response cannot be used as an
//!   oracle for why a token was rejected.

use common::protocol::{DecryptedPayload, EncryptedPayload, OperationResult, StatusSnapshot};
use common::ServiceError;
use tracing::{info, warn};
use zeroize::Zeroize;

use crate::crypto::{open_token, seal_to_token, KeyMaterial};
use crate::keys::{
    default_purposes, FallbackPolicy, Keyring, KeyringError, PurposeSpec, ResolvedKey,
};
use crate::timestamp::now_iso8601;

/// Algorithm label returned with every encrypted field.
pub const FIELD_ALGORITHM: &str = "AES-256";

/// Full algorithm name reported by [`DataProtection::status`].
pub const STATUS_ALGORITHM: &str = "AES-256-GCM-SIV";

/// System name reported by [`DataProtection::status`].
pub const SYSTEM_NAME: &str = "DataProtection";

/// The only message a caller ever sees for a rejected token.
pub const DECRYPTION_FAILED: &str = "Decryption error: invalid token or key";

/// Construction options for [`DataProtection`].
#[derive(Debug, Clone, Default)]
pub struct ProtectionOptions {
    /// Appended to every purpose salt label before derivation.
    pub installation_salt: Vec<u8>,
    /// Behaviour for purposes that were never declared.
    pub fallback: FallbackPolicy,
}

/// Routes `(purpose, value)` pairs to purpose keys and seals/opens them.
///
/// Cheap to clone; clones share the same read-only keyring.
#[derive(Clone, Debug)]
pub struct DataProtection {
    keyring: Keyring,
    fallback: FallbackPolicy,
}

impl DataProtection {
    /// Build a facade over the default purposes.
    ///
    /// Runs PBKDF2 once per purpose.
    ///
    /// # Errors
    ///
    /// Returns [`KeyringError::Derivation`] if the hash primitive fails.
    pub fn new(master: KeyMaterial, options: ProtectionOptions) -> Result<Self, KeyringError> {
        Self::with_purposes(master, &default_purposes(), options)
    }

    /// Build a facade over an explicit purpose list.
    pub fn with_purposes(
        master: KeyMaterial,
        purposes: &[PurposeSpec],
        options: ProtectionOptions,
    ) -> Result<Self, KeyringError> {
        let keyring = Keyring::derive(master, purposes, &options.installation_salt)?;
        info!(
            keys_initialized = keyring.len(),
            fallback = ?options.fallback,
            "data protection initialised"
        );
        Ok(Self {
            keyring,
            fallback: options.fallback,
        })
    }

    /// Build a facade over a freshly generated master key.
    ///
    /// Anything sealed by this instance can only be opened by this instance.
    pub fn generate(options: ProtectionOptions) -> Result<Self, KeyringError> {
        Self::new(KeyMaterial::generate(), options)
    }

    /// Number of derived purpose keys.
    pub fn keys_initialized(&self) -> usize {
        self.keyring.len()
    }

    /// Seal `plaintext` under the key for `purpose`.
    pub fn encrypt_field(
        &self,
        purpose: &str,
        plaintext: impl AsRef<[u8]>,
    ) -> OperationResult<EncryptedPayload> {
        let plaintext = plaintext.as_ref();
        if plaintext.is_empty() {
            warn!(
                event = "encrypt_rejected",
                purpose = %purpose,
                reason = "empty_plaintext",
                "encryption rejected"
            );
            return ServiceError::Validation("No data to encrypt".into()).into();
        }

        let resolved = match self.select_key(purpose, "encrypt") {
            Ok(r) => r,
            Err(e) => return e.into(),
        };

        match seal_to_token(resolved.key, plaintext) {
            Ok(token) => {
                info!(event = "field_encrypted", purpose = %purpose, "data encrypted");
                OperationResult::success(EncryptedPayload {
                    encrypted_data: token,
                    data_type: purpose.to_owned(),
                    algorithm: FIELD_ALGORITHM.into(),
                    encrypted_at: now_iso8601(),
                })
            }
            Err(e) => {
                warn!(event = "encryption_failed", purpose = %purpose, error = %e, "encryption failed");
                ServiceError::System(format!("Encryption error: {e}")).into()
            }
        }
    }

    /// Open `token` with the key for `purpose`.
    pub fn decrypt_field(&self, purpose: &str, token: &str) -> OperationResult<DecryptedPayload> {
        if token.is_empty() {
            warn!(
                event = "decrypt_rejected",
                purpose = %purpose,
                reason = "empty_token",
                "decryption rejected"
            );
            return ServiceError::Validation("No encrypted data provided".into()).into();
        }

        let resolved = match self.select_key(purpose, "decrypt") {
            Ok(r) => r,
            Err(e) => return e.into(),
        };

        let bytes = match open_token(resolved.key, token) {
            Ok(b) => b,
            Err(e) => {
                warn!(event = "decryption_failed", purpose = %purpose, reason = %e, "decryption failed");
                return ServiceError::Cryptographic(DECRYPTION_FAILED.into()).into();
            }
        };

        match String::from_utf8(bytes) {
            Ok(text) => {
                info!(event = "field_decrypted", purpose = %purpose, "data decrypted");
                OperationResult::success(DecryptedPayload {
                    decrypted_data: text,
                    data_type: purpose.to_owned(),
                    decrypted_at: now_iso8601(),
                })
            }
            Err(e) => {
                e.into_bytes().zeroize();
                warn!(
                    event = "decryption_failed",
                    purpose = %purpose,
                    reason = "plaintext is not valid UTF-8",
                    "decryption failed"
                );
                ServiceError::Cryptographic(DECRYPTION_FAILED.into()).into()
            }
        }
    }

    /// Snapshot of the facade. No side effects beyond the log event.
    pub fn status(&self) -> OperationResult<StatusSnapshot> {
        info!(event = "status", keys_initialized = self.keyring.len(), "status requested");
        OperationResult::success(StatusSnapshot {
            system: SYSTEM_NAME.into(),
            status: "ACTIVE".into(),
            keys_initialized: self.keyring.len(),
            algorithm: STATUS_ALGORITHM.into(),
            timestamp: now_iso8601(),
        })
    }

    fn select_key(&self, purpose: &str, op: &'static str) -> Result<ResolvedKey<'_>, ServiceError> {
        match self.keyring.resolve(purpose, self.fallback) {
            Ok(resolved) => {
                if resolved.is_fallback {
                    warn!(
                        event = "purpose_fallback",
                        op,
                        purpose = %purpose,
                        "undeclared purpose; using master key"
                    );
                }
                Ok(resolved)
            }
            Err(e) => {
                warn!(event = "purpose_rejected", op, purpose = %purpose, "undeclared purpose rejected");
                Err(match e {
                    KeyringError::UnknownPurpose(p) => {
                        ServiceError::Validation(format!("Unknown data type: {p}"))
                    }
                    other => ServiceError::System(other.to_string()),
                })
            }
        }
    }
}
