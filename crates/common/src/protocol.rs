//! Result envelope and payload types exchanged across the command bridge.
//!
//! Every public operation answers with an [`OperationResult`], serialised as
//! either `{"success":true,"data":{...}}` or `{"success":false,"error":"..."}`.

use std::fmt;

use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

use crate::error::ServiceError;

// ---------------------------------------------------------------------------
// Result envelope
// ---------------------------------------------------------------------------

/// Outcome of a public operation. Exactly one variant is populated; branch on
/// it before reading payload fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationResult<T> {
    /// The operation succeeded with `T` as its payload.
    Success(T),
    /// The operation failed; the message is safe to show to the caller.
    Failure(String),
}

impl<T> OperationResult<T> {
    /// Wrap a successful payload.
    pub fn success(data: T) -> Self {
        OperationResult::Success(data)
    }

    /// Build a failure from a caller-visible message.
    pub fn failure(message: impl Into<String>) -> Self {
        OperationResult::Failure(message.into())
    }

    /// Returns `true` for [`OperationResult::Success`].
    pub fn is_success(&self) -> bool {
        matches!(self, OperationResult::Success(_))
    }

    /// Borrow the success payload, if any.
    pub fn data(&self) -> Option<&T> {
        match self {
            OperationResult::Success(data) => Some(data),
            OperationResult::Failure(_) => None,
        }
    }

    /// Borrow the failure message, if any.
    pub fn error(&self) -> Option<&str> {
        match self {
            OperationResult::Success(_) => None,
            OperationResult::Failure(message) => Some(message),
        }
    }

    /// Transform the success payload, leaving failures untouched.
    pub fn map<U, F: FnOnce(T) -> U>(self, f: F) -> OperationResult<U> {
        match self {
            OperationResult::Success(data) => OperationResult::Success(f(data)),
            OperationResult::Failure(message) => OperationResult::Failure(message),
        }
    }

    /// Convert into a standard [`Result`] so `?` can be used by callers.
    pub fn into_result(self) -> Result<T, String> {
        match self {
            OperationResult::Success(data) => Ok(data),
            OperationResult::Failure(message) => Err(message),
        }
    }
}

impl<T> From<ServiceError> for OperationResult<T> {
    fn from(err: ServiceError) -> Self {
        OperationResult::Failure(err.to_string())
    }
}

#[derive(Serialize)]
struct SuccessWire<'a, T> {
    success: bool,
    data: &'a T,
}

#[derive(Serialize)]
struct FailureWire<'a> {
    success: bool,
    error: &'a str,
}

impl<T: Serialize> Serialize for OperationResult<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            OperationResult::Success(data) => SuccessWire {
                success: true,
                data,
            }
            .serialize(serializer),
            OperationResult::Failure(error) => FailureWire {
                success: false,
                error,
            }
            .serialize(serializer),
        }
    }
}

#[derive(Deserialize)]
struct Wire<T> {
    success: bool,
    data: Option<T>,
    error: Option<String>,
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for OperationResult<T> {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let wire = Wire::<T>::deserialize(deserializer)?;
        match (wire.success, wire.data) {
            (true, Some(data)) => Ok(OperationResult::Success(data)),
            (true, None) => Err(de::Error::missing_field("data")),
            (false, _) => Ok(OperationResult::Failure(wire.error.unwrap_or_default())),
        }
    }
}

// ---------------------------------------------------------------------------
// Data protection payloads
// ---------------------------------------------------------------------------

/// Success payload of `encrypt`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EncryptedPayload {
    /// Envelope token, `v1.<nonce>.<ciphertext>`.
    pub encrypted_data: String,
    /// Purpose the caller asked for, echoed back.
    pub data_type: String,
    pub algorithm: String,
    pub encrypted_at: String,
}

/// Success payload of `decrypt`.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DecryptedPayload {
    pub decrypted_data: String,
    pub data_type: String,
    pub decrypted_at: String,
}

impl fmt::Debug for DecryptedPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DecryptedPayload")
            .field("decrypted_data", &"[REDACTED]")
            .field("data_type", &self.data_type)
            .field("decrypted_at", &self.decrypted_at)
            .finish()
    }
}

/// Success payload of `status`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusSnapshot {
    pub system: String,
    /// Always `"ACTIVE"` for a constructed facade.
    pub status: String,
    /// Number of purpose keys derived at construction.
    pub keys_initialized: usize,
    pub algorithm: String,
    pub timestamp: String,
}

/// Success payload of `keygen`: a fresh base64url master key.
#[derive(Clone, Serialize, Deserialize)]
pub struct GeneratedKey {
    pub master_key: String,
}

impl fmt::Debug for GeneratedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("GeneratedKey([REDACTED])")
    }
}

// ---------------------------------------------------------------------------
// Password payloads
// ---------------------------------------------------------------------------

/// Success payload of `hash`. Only `hash` is meant to be persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PasswordRecord {
    /// Self-describing bcrypt string (`$2b$<cost>$<salt+digest>`).
    pub hash: String,
    pub algorithm: String,
    pub salt_rounds: u32,
    pub created_at: String,
}

/// Success payload of `verify`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Verification {
    pub is_valid: bool,
    pub verified_at: String,
}

// ---------------------------------------------------------------------------
// Registration
// ---------------------------------------------------------------------------

/// Input of the `register` command. Presence of the required fields is checked
/// by the orchestrator, not by deserialisation, so that a missing field yields
/// a specific message.
#[derive(Clone, Default, Serialize, Deserialize)]
pub struct RegistrationRequest {
    #[serde(default)]
    pub phone: Option<String>,
    #[serde(default)]
    pub pin: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub bvn: Option<String>,
}

impl fmt::Debug for RegistrationRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Every field is sensitive; show presence only.
        f.debug_struct("RegistrationRequest")
            .field("phone", &self.phone.is_some())
            .field("pin", &self.pin.is_some())
            .field("name", &self.name.is_some())
            .field("email", &self.email.is_some())
            .field("bvn", &self.bvn.is_some())
            .finish()
    }
}

/// Success payload of `register`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegistrationSummary {
    pub user_id: String,
    /// `reg_YYYYMMDD_HHMMSS`.
    pub registration_id: String,
    pub security_level: String,
    /// Names of the request fields that were encrypted, in request order.
    pub encrypted_fields: Vec<String>,
    pub registered_at: String,
}
