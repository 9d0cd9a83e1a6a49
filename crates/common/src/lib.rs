//! Common types, wire payloads, and errors shared across `fieldvault` crates.

pub mod error;
pub mod protocol;

pub use error::ServiceError;
pub use protocol::OperationResult;
