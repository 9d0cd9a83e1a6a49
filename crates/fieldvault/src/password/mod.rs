//! Peppered bcrypt hashing and verification of credentials.
//!
//! The pepper is a second secret, injected at construction and independent of
//! bcrypt's per-hash salt. It is appended to the password before hashing so a
//! leaked hash store is useless for offline guessing without it.
//!
//! bcrypt ignores everything past [`BCRYPT_INPUT_LIMIT`] bytes. A peppered
//! password longer than that would hash without its pepper, so such passwords
//! are refused by `hash` and never verify.
//!
//! **No password, pepper, or hash is ever logged.**

use common::protocol::{OperationResult, PasswordRecord, Verification};
use common::ServiceError;
use thiserror::Error;
use tracing::{debug, info, warn};
use zeroize::Zeroizing;

use crate::timestamp::now_iso8601;

/// Work factor used in production.
pub const DEFAULT_COST: u32 = 14;

/// Lowest and highest work factors bcrypt accepts.
pub const MIN_COST: u32 = 4;
pub const MAX_COST: u32 = 31;

/// Shortest accepted password, in characters.
pub const MIN_PASSWORD_LEN: usize = 4;

/// Bytes of input bcrypt actually consumes.
pub const BCRYPT_INPUT_LIMIT: usize = 72;

/// Longest accepted pepper, leaving room for the shortest password.
pub const MAX_PEPPER_LEN: usize = BCRYPT_INPUT_LIMIT - MIN_PASSWORD_LEN;

/// Algorithm label returned with every hash.
pub const ALGORITHM: &str = "bcrypt";

/// Errors produced when constructing a [`PasswordSecurity`].
#[derive(Debug, Error)]
pub enum PasswordError {
    /// The pepper is empty.
    #[error("pepper must not be empty")]
    EmptyPepper,

    /// The pepper leaves no room for a password within bcrypt's input limit.
    #[error("pepper must be at most {MAX_PEPPER_LEN} bytes, got {0}")]
    PepperTooLong(usize),

    /// The cost is outside what bcrypt supports.
    #[error("bcrypt cost must be between {MIN_COST} and {MAX_COST}, got {0}")]
    InvalidCost(u32),
}

/// Hashes and verifies credentials with a pepper and a fixed bcrypt cost.
#[derive(Clone)]
pub struct PasswordSecurity {
    pepper: Zeroizing<String>,
    cost: u32,
}

impl std::fmt::Debug for PasswordSecurity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PasswordSecurity")
            .field("pepper", &"[REDACTED]")
            .field("cost", &self.cost)
            .finish()
    }
}

impl PasswordSecurity {
    /// # Errors
    ///
    /// Returns [`PasswordError::EmptyPepper`], [`PasswordError::PepperTooLong`]
    /// or [`PasswordError::InvalidCost`].
    pub fn new(pepper: impl Into<String>, cost: u32) -> Result<Self, PasswordError> {
        let pepper = Zeroizing::new(pepper.into());
        if pepper.is_empty() {
            return Err(PasswordError::EmptyPepper);
        }
        if pepper.len() > MAX_PEPPER_LEN {
            return Err(PasswordError::PepperTooLong(pepper.len()));
        }
        if !(MIN_COST..=MAX_COST).contains(&cost) {
            return Err(PasswordError::InvalidCost(cost));
        }
        Ok(Self { pepper, cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }

    /// Hash `password` with the pepper appended.
    ///
    /// Blocks for as long as the configured cost demands.
    pub fn hash(&self, password: &str) -> OperationResult<PasswordRecord> {
        if password.chars().count() < MIN_PASSWORD_LEN {
            warn!(event = "password_hash_rejected", reason = "too_short", "password rejected");
            return ServiceError::Validation(format!(
                "Password must be at least {MIN_PASSWORD_LEN} characters"
            ))
            .into();
        }
        if !self.fits(password) {
            warn!(event = "password_hash_rejected", reason = "too_long", "password rejected");
            return ServiceError::Validation("Password too long".into()).into();
        }

        let peppered = self.pepper(password);
        match bcrypt::hash(peppered.as_bytes(), self.cost) {
            Ok(hash) => {
                info!(event = "password_hashed", cost = self.cost, "password hashed");
                OperationResult::success(PasswordRecord {
                    hash,
                    algorithm: ALGORITHM.into(),
                    salt_rounds: self.cost,
                    created_at: now_iso8601(),
                })
            }
            Err(e) => {
                warn!(event = "password_hash_failed", error = %e, "password hashing failed");
                ServiceError::System(format!("Hashing system error: {e}")).into()
            }
        }
    }

    /// Check `password` against `stored_hash`.
    ///
    /// Never fails: empty input or a malformed hash verifies as `false`, the
    /// same as a wrong password. The two cases are only told apart in the logs.
    pub fn verify(&self, password: &str, stored_hash: &str) -> OperationResult<Verification> {
        let is_valid = if password.is_empty() || stored_hash.is_empty() {
            debug!(event = "password_verify_empty", "empty password or hash");
            false
        } else if !self.fits(password) {
            debug!(event = "password_verify_too_long", "password exceeds bcrypt input");
            false
        } else {
            let peppered = self.pepper(password);
            match bcrypt::verify(peppered.as_bytes(), stored_hash) {
                Ok(true) => {
                    info!(event = "password_verified", "password verified");
                    true
                }
                Ok(false) => {
                    debug!(event = "password_mismatch", "password mismatch");
                    false
                }
                Err(e) => {
                    warn!(event = "password_verify_error", error = %e, "stored hash rejected");
                    false
                }
            }
        };

        OperationResult::success(Verification {
            is_valid,
            verified_at: now_iso8601(),
        })
    }

    /// Whether the peppered password fits in bcrypt's input.
    fn fits(&self, password: &str) -> bool {
        password.len() + self.pepper.len() <= BCRYPT_INPUT_LIMIT
    }

    fn pepper(&self, password: &str) -> Zeroizing<String> {
        let mut peppered = Zeroizing::new(String::with_capacity(password.len() + self.pepper.len()));
        peppered.push_str(password);
        peppered.push_str(&self.pepper);
        peppered
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::telemetry::capture::Captured;

    const TEST_COST: u32 = MIN_COST;

    fn security() -> PasswordSecurity {
        PasswordSecurity::new("test-pepper", TEST_COST).unwrap()
    }

    #[test]
    fn hash_then_verify() {
        let sec = security();
        let record = sec.hash("1234").into_result().unwrap();
        assert!(sec.verify("1234", &record.hash).data().unwrap().is_valid);
        assert!(!sec.verify("4321", &record.hash).data().unwrap().is_valid);
    }

    #[test]
    fn record_fields() {
        let record = security().hash("secret").into_result().unwrap();
        assert_eq!(record.algorithm, "bcrypt");
        assert_eq!(record.salt_rounds, TEST_COST);
        assert!(record.hash.starts_with("$2"));
        assert!(record.hash.contains(&format!("${TEST_COST:02}$")));
    }

    #[test]
    fn length_boundaries() {
        let sec = security();
        assert_eq!(
            sec.hash("123").error(),
            Some("Password must be at least 4 characters")
        );
        assert!(sec.hash("1234").is_success());
        assert!(sec.hash("").error().is_some());
    }

    #[test]
    fn length_counts_characters_not_bytes() {
        // Three characters, six bytes.
        assert!(security().hash("ééé").error().is_some());
    }

    #[test]
    fn hashes_are_salted() {
        let sec = security();
        let a = sec.hash("1234").into_result().unwrap();
        let b = sec.hash("1234").into_result().unwrap();
        assert_ne!(a.hash, b.hash);
    }

    #[test]
    fn pepper_isolation() {
        let a = PasswordSecurity::new("pepper-a", TEST_COST).unwrap();
        let b = PasswordSecurity::new("pepper-b", TEST_COST).unwrap();
        let hash = a.hash("1234").into_result().unwrap().hash;
        assert!(!b.verify("1234", &hash).data().unwrap().is_valid);
        assert!(a.verify("1234", &hash).data().unwrap().is_valid);
    }

    #[test]
    fn pepper_is_applied() {
        let sec = security();
        let unpeppered = bcrypt::hash("1234", TEST_COST).unwrap();
        assert!(!sec.verify("1234", &unpeppered).data().unwrap().is_valid);
    }

    #[test]
    fn long_passwords_keep_pepper_isolation() {
        let a = PasswordSecurity::new("pepper-a", TEST_COST).unwrap();
        let b = PasswordSecurity::new("pepper-b", TEST_COST).unwrap();

        let longest = "x".repeat(BCRYPT_INPUT_LIMIT - "pepper-a".len());
        let hash = a.hash(&longest).into_result().unwrap().hash;
        assert!(a.verify(&longest, &hash).data().unwrap().is_valid);
        assert!(!b.verify(&longest, &hash).data().unwrap().is_valid);

        let too_long = "x".repeat(BCRYPT_INPUT_LIMIT);
        assert_eq!(a.hash(&too_long).error(), Some("Password too long"));
        // A pepper-less bcrypt hash of the truncated input must not verify.
        let truncated = bcrypt::hash(&too_long, TEST_COST).unwrap();
        assert!(!a.verify(&too_long, &truncated).data().unwrap().is_valid);
    }

    #[test]
    fn pepper_length_is_bounded() {
        assert!(PasswordSecurity::new("p".repeat(MAX_PEPPER_LEN), TEST_COST).is_ok());
        assert!(matches!(
            PasswordSecurity::new("p".repeat(MAX_PEPPER_LEN + 1), TEST_COST),
            Err(PasswordError::PepperTooLong(69))
        ));
    }

    #[test]
    fn rejected_passwords_are_logged_without_secrets() {
        let sec = security();
        let logs = Captured::default();
        logs.run(|| {
            assert!(!sec.hash("abc").is_success());
            assert!(!sec.hash(&"y".repeat(BCRYPT_INPUT_LIMIT)).is_success());
        });

        assert!(logs.has_event("password_hash_rejected"));
        assert!(logs.output().contains("too_short"));
        assert!(logs.output().contains("too_long"));
        assert!(!logs.output().contains("abc"));
        assert!(!logs.output().contains("test-pepper"));
    }

    #[test]
    fn verify_fails_soft() {
        let sec = security();
        for (pw, hash) in [("1234", "not-a-bcrypt-hash"), ("", "$2b$04$x"), ("1234", "")] {
            let result = sec.verify(pw, hash);
            assert!(result.is_success());
            assert!(!result.data().unwrap().is_valid);
        }
    }

    #[test]
    fn rejects_invalid_construction() {
        assert!(matches!(
            PasswordSecurity::new("", TEST_COST),
            Err(PasswordError::EmptyPepper)
        ));
        assert!(matches!(
            PasswordSecurity::new("p", 3),
            Err(PasswordError::InvalidCost(3))
        ));
        assert!(matches!(
            PasswordSecurity::new("p", 32),
            Err(PasswordError::InvalidCost(32))
        ));
    }

    #[test]
    fn pepper_redacted_in_debug() {
        let sec = PasswordSecurity::new("very-secret-pepper", TEST_COST).unwrap();
        assert!(!format!("{sec:?}").contains("very-secret-pepper"));
    }
}
