//! Common error types shared across crates.

use thiserror::Error;

/// Top-level service error type.
///
/// Every variant is eventually rendered as an
/// [`OperationResult::Failure`](crate::protocol::OperationResult::Failure)
/// carrying the variant's message. The message must already be safe to show
/// to the caller; cryptographic detail belongs in the logs, not here.
#[derive(Debug, Error)]
pub enum ServiceError {
    /// Missing or malformed caller input.
    #[error("{0}")]
    Validation(String),

    /// Key derivation, encryption, decryption, or hashing failed.
    #[error("{0}")]
    Cryptographic(String),

    /// An unexpected internal error occurred.
    #[error("{0}")]
    System(String),
}

impl ServiceError {
    /// Short machine-readable kind, safe to use as a log field.
    pub fn kind(&self) -> &'static str {
        match self {
            ServiceError::Validation(_) => "validation",
            ServiceError::Cryptographic(_) => "cryptographic",
            ServiceError::System(_) => "system",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds() {
        assert_eq!(ServiceError::Validation("x".into()).kind(), "validation");
        assert_eq!(ServiceError::Cryptographic("x".into()).kind(), "cryptographic");
        assert_eq!(ServiceError::System("x".into()).kind(), "system");
    }

    #[test]
    fn display_is_bare_message() {
        let e = ServiceError::Validation("No data to encrypt".into());
        assert_eq!(e.to_string(), "No data to encrypt");
    }
}
