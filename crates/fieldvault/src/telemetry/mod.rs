//! Structured JSON logging.
//!
//! Log lines go to **stderr**. Stdout carries exactly one JSON response per
//! command and must stay machine-readable.
//!
//! # Telemetry invariants
//!
//! - **No plaintext, token, key material, pepper, password, or hash** may
//!   appear in any log field.
//! - Log level is configurable via `LOG_LEVEL` (default: `info`); `RUST_LOG`
//!   takes precedence when set.

#[cfg(test)]
pub(crate) mod capture;
pub mod init;

pub use init::init;
