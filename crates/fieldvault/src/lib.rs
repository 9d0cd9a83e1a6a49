//! `fieldvault`: purpose-scoped field encryption and peppered credential
//! hashing for the registration workflow.
//!
//! Layers, leaves first:
//! - [`crypto`]: key material, PBKDF2 derivation, AES-256-GCM-SIV envelopes.
//! - [`keys`]: the read-only keyring of purpose keys.
//! - [`protection`]: the data protection facade.
//! - [`password`]: peppered bcrypt hashing and verification.
//! - [`registration`]: the orchestrator built on the two subsystems.
//! - [`bridge`]: the JSON command surface used by the binary.

pub mod bridge;
pub mod config;
pub mod crypto;
pub mod keys;
pub mod password;
pub mod protection;
pub mod registration;
pub mod telemetry;
pub mod timestamp;

pub use config::Config;
pub use password::PasswordSecurity;
pub use protection::{DataProtection, ProtectionOptions};
pub use registration::Registrar;
