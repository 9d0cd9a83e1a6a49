//! Registration orchestrator: validate, hash the PIN, encrypt every sensitive
//! field under its purpose, and assemble the user record.
//!
//! The orchestrator only sees the two subsystems through the
//! [`FieldProtector`] and [`CredentialHasher`] traits.

pub mod validate;

use std::collections::BTreeMap;

use chrono::Utc;
use common::protocol::{
    EncryptedPayload, OperationResult, PasswordRecord, RegistrationRequest, RegistrationSummary,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::keys::{FINANCIAL, SENSITIVE, USER_PROFILE};
use crate::password::PasswordSecurity;
use crate::protection::DataProtection;
use crate::timestamp::{iso8601, registration_id};

/// Security level stamped on every record.
pub const SECURITY_LEVEL: &str = "enterprise";

/// Plaintext of the encrypted opening balance.
pub const INITIAL_BALANCE: &str = "0";

/// Encrypts one field value under a purpose.
#[cfg_attr(test, mockall::automock)]
pub trait FieldProtector {
    fn protect(&self, purpose: &str, plaintext: &str) -> OperationResult<EncryptedPayload>;
}

/// Hashes a credential for storage.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialHasher {
    fn hash_credential(&self, credential: &str) -> OperationResult<PasswordRecord>;
}

impl FieldProtector for DataProtection {
    fn protect(&self, purpose: &str, plaintext: &str) -> OperationResult<EncryptedPayload> {
        self.encrypt_field(purpose, plaintext)
    }
}

impl CredentialHasher for PasswordSecurity {
    fn hash_credential(&self, credential: &str) -> OperationResult<PasswordRecord> {
        self.hash(credential)
    }
}

/// The record a caller persists. Holds no plaintext.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UserRecord {
    pub user_id: String,
    pub pin_hash: String,
    /// Field name → envelope token.
    pub encrypted_fields: BTreeMap<String, String>,
    /// Envelope token of [`INITIAL_BALANCE`] under the `financial` purpose.
    pub initial_balance: String,
    pub registration_date: String,
    pub security_level: String,
    pub status: String,
}

/// Outcome of a successful registration.
#[derive(Debug, Clone)]
pub struct RegisteredUser {
    /// What the command bridge returns.
    pub summary: RegistrationSummary,
    /// What a persistence layer would store.
    pub record: UserRecord,
}

/// Drives one registration end to end.
#[derive(Debug, Clone)]
pub struct Registrar<P, H> {
    protector: P,
    hasher: H,
}

impl<P: FieldProtector, H: CredentialHasher> Registrar<P, H> {
    pub fn new(protector: P, hasher: H) -> Self {
        Self { protector, hasher }
    }

    /// Register a user. Any failure aborts the whole registration; no partial
    /// record is returned.
    pub fn register(&self, req: &RegistrationRequest) -> OperationResult<RegisteredUser> {
        let valid = match validate::validate(req) {
            Ok(v) => v,
            Err(e) => {
                warn!(
                    event = "registration_rejected",
                    kind = e.kind(),
                    reason = %e,
                    "registration rejected"
                );
                return e.into();
            }
        };

        let pin_hash = match self.hasher.hash_credential(valid.pin).into_result() {
            Ok(record) => record.hash,
            Err(message) => {
                warn!(event = "registration_failed", stage = "pin_hash", "PIN hashing failed");
                return OperationResult::failure(message);
            }
        };

        let candidates = [
            (USER_PROFILE, "phone", Some(valid.phone)),
            (USER_PROFILE, "name", Some(valid.name)),
            (USER_PROFILE, "email", valid.email),
            (SENSITIVE, "bvn", valid.bvn),
        ];

        let mut encrypted_names = Vec::with_capacity(candidates.len());
        let mut encrypted_fields = BTreeMap::new();
        for (purpose, field, value) in candidates {
            let Some(value) = value else { continue };
            match self.encrypt(purpose, field, value) {
                Ok(token) => {
                    encrypted_names.push(field.to_owned());
                    encrypted_fields.insert(field.to_owned(), token);
                }
                Err(message) => return OperationResult::failure(message),
            }
        }

        let initial_balance = match self.encrypt(FINANCIAL, "initial_balance", INITIAL_BALANCE) {
            Ok(token) => token,
            Err(message) => return OperationResult::failure(message),
        };

        let now = Utc::now();
        let registered_at = iso8601(now);
        // Phone is validated ASCII, so byte slicing is safe.
        let user_id = format!("user_{}", &valid.phone[valid.phone.len() - 8..]);

        let record = UserRecord {
            user_id: user_id.clone(),
            pin_hash,
            encrypted_fields,
            initial_balance,
            registration_date: registered_at.clone(),
            security_level: SECURITY_LEVEL.into(),
            status: "active".into(),
        };

        info!(event = "user_registered", user_id = %user_id, "user registered");

        OperationResult::success(RegisteredUser {
            summary: RegistrationSummary {
                user_id,
                registration_id: registration_id(now),
                security_level: SECURITY_LEVEL.into(),
                encrypted_fields: encrypted_names,
                registered_at,
            },
            record,
        })
    }

    fn encrypt(&self, purpose: &str, field: &str, value: &str) -> Result<String, String> {
        match self.protector.protect(purpose, value).into_result() {
            Ok(payload) => Ok(payload.encrypted_data),
            Err(_) => {
                warn!(event = "registration_failed", stage = "encrypt", field, "field encryption failed");
                Err(format!("Encryption failed for {field}"))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::crypto::{KeyMaterial, KEY_LEN};
    use crate::password::MIN_COST;
    use crate::protection::ProtectionOptions;

    fn request(json: &str) -> RegistrationRequest {
        serde_json::from_str(json).unwrap()
    }

    fn fake_payload(purpose: &str, plaintext: &str) -> OperationResult<EncryptedPayload> {
        OperationResult::success(EncryptedPayload {
            encrypted_data: format!("enc:{purpose}:{plaintext}"),
            data_type: purpose.to_owned(),
            algorithm: "AES-256".into(),
            encrypted_at: "t".into(),
        })
    }

    fn fake_hash(_: &str) -> OperationResult<PasswordRecord> {
        OperationResult::success(PasswordRecord {
            hash: "$2b$04$fake".into(),
            algorithm: "bcrypt".into(),
            salt_rounds: 4,
            created_at: "t".into(),
        })
    }

    #[test]
    fn end_to_end_with_real_subsystems() {
        let master = KeyMaterial::from_slice(&[0x24u8; KEY_LEN]).unwrap();
        let protection = DataProtection::new(master, ProtectionOptions::default()).unwrap();
        let passwords = PasswordSecurity::new("test-pepper", MIN_COST).unwrap();
        let registrar = Registrar::new(protection.clone(), passwords.clone());

        let user = registrar
            .register(&request(r#"{"phone":"+2348012345678","pin":"1234","name":"Ada"}"#))
            .into_result()
            .unwrap();

        assert_eq!(user.summary.user_id, "user_12345678");
        assert!(user.summary.registration_id.starts_with("reg_"));
        assert_eq!(user.summary.security_level, "enterprise");
        assert_eq!(user.summary.encrypted_fields, vec!["phone", "name"]);

        let balance = protection
            .decrypt_field(FINANCIAL, &user.record.initial_balance)
            .into_result()
            .unwrap();
        assert_eq!(balance.decrypted_data, "0");

        let phone = protection
            .decrypt_field(USER_PROFILE, &user.record.encrypted_fields["phone"])
            .into_result()
            .unwrap();
        assert_eq!(phone.decrypted_data, "+2348012345678");

        assert!(passwords.verify("1234", &user.record.pin_hash).data().unwrap().is_valid);
        assert_eq!(user.record.status, "active");
    }

    #[test]
    fn optional_fields_use_their_purposes() {
        let mut protector = MockFieldProtector::new();
        protector.expect_protect().times(5).returning(fake_payload);
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash_credential().times(1).returning(fake_hash);

        let user = Registrar::new(protector, hasher)
            .register(&request(
                r#"{"phone":"+2348012345678","pin":"123456","name":"Ada","email":"ada@example.com","bvn":"22334455667"}"#,
            ))
            .into_result()
            .unwrap();

        assert_eq!(user.summary.encrypted_fields, vec!["phone", "name", "email", "bvn"]);
        assert_eq!(user.record.encrypted_fields["email"], "enc:user_profile:ada@example.com");
        assert_eq!(user.record.encrypted_fields["bvn"], "enc:sensitive:22334455667");
        assert_eq!(user.record.initial_balance, "enc:financial:0");
        assert_eq!(user.record.pin_hash, "$2b$04$fake");
    }

    #[test]
    fn validation_failure_touches_nothing() {
        let mut protector = MockFieldProtector::new();
        protector.expect_protect().never();
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash_credential().never();

        let result = Registrar::new(protector, hasher)
            .register(&request(r#"{"phone":"08012345678","pin":"1234","name":"Ada"}"#));
        assert_eq!(result.error(), Some("Invalid Nigerian phone number"));
    }

    #[test]
    fn hashing_failure_is_propagated() {
        let mut protector = MockFieldProtector::new();
        protector.expect_protect().never();
        let mut hasher = MockCredentialHasher::new();
        hasher
            .expect_hash_credential()
            .returning(|_| OperationResult::failure("Hashing system error: boom"));

        let result = Registrar::new(protector, hasher)
            .register(&request(r#"{"phone":"+2348012345678","pin":"1234","name":"Ada"}"#));
        assert_eq!(result.error(), Some("Hashing system error: boom"));
    }

    #[test]
    fn field_encryption_failure_names_the_field() {
        let mut protector = MockFieldProtector::new();
        protector.expect_protect().returning(|purpose, plaintext| {
            if plaintext == "Ada" {
                OperationResult::failure("Encryption error: x")
            } else {
                fake_payload(purpose, plaintext)
            }
        });
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash_credential().returning(fake_hash);

        let result = Registrar::new(protector, hasher)
            .register(&request(r#"{"phone":"+2348012345678","pin":"1234","name":"Ada"}"#));
        assert_eq!(result.error(), Some("Encryption failed for name"));
    }

    #[test]
    fn balance_encryption_failure_aborts() {
        let mut protector = MockFieldProtector::new();
        protector.expect_protect().returning(|purpose, plaintext| {
            if purpose == FINANCIAL {
                OperationResult::failure("Encryption error: x")
            } else {
                fake_payload(purpose, plaintext)
            }
        });
        let mut hasher = MockCredentialHasher::new();
        hasher.expect_hash_credential().returning(fake_hash);

        let result = Registrar::new(protector, hasher)
            .register(&request(r#"{"phone":"+2348012345678","pin":"1234","name":"Ada"}"#));
        assert_eq!(result.error(), Some("Encryption failed for initial_balance"));
    }
}
