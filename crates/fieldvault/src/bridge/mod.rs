//! Command bridge: one command in, one JSON document out.
//!
//! This is the compatibility surface for callers that shell out to the binary.
//! Every outcome, including argument and configuration errors, is rendered as
//! `{"success":true,"data":...}` or `{"success":false,"error":...}`; the
//! process exit code carries no meaning.
//!
//! Services are built per command, so `hash` and `verify` never pay for key
//! derivation and `keygen` needs no configuration at all.

use clap::{error::ErrorKind, Parser, Subcommand};
use common::protocol::{GeneratedKey, OperationResult, RegistrationRequest, RegistrationSummary};
use common::ServiceError;
use serde::Serialize;
use serde_json::{json, Value};
use tracing::warn;

use crate::config::Config;
use crate::crypto::KeyMaterial;
use crate::password::PasswordSecurity;
use crate::protection::DataProtection;
use crate::registration::Registrar;

/// Command-line interface.
#[derive(Parser)]
#[command(
    name = "fieldvault",
    version,
    about = "Purpose-scoped field encryption and credential hashing"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

/// One bridge operation. Secret-bearing arguments accept leading hyphens so
/// they are never mistaken for flags.
#[derive(Subcommand)]
pub enum Command {
    /// Encrypt a value under a purpose.
    Encrypt {
        purpose: String,
        #[arg(allow_hyphen_values = true)]
        plaintext: String,
    },
    /// Decrypt an envelope token under a purpose.
    Decrypt {
        purpose: String,
        #[arg(allow_hyphen_values = true)]
        token: String,
    },
    /// Report the data protection status.
    Status,
    /// Hash a password or PIN.
    Hash {
        #[arg(allow_hyphen_values = true)]
        password: String,
    },
    /// Verify a password or PIN against a stored hash.
    Verify {
        #[arg(allow_hyphen_values = true)]
        password: String,
        #[arg(allow_hyphen_values = true)]
        hash: String,
    },
    /// Register a user from a JSON object.
    Register {
        #[arg(default_value = "{}")]
        payload: String,
    },
    /// Generate a fresh master key.
    Keygen,
}

impl Command {
    /// Short name, safe to log.
    pub fn name(&self) -> &'static str {
        match self {
            Command::Encrypt { .. } => "encrypt",
            Command::Decrypt { .. } => "decrypt",
            Command::Status => "status",
            Command::Hash { .. } => "hash",
            Command::Verify { .. } => "verify",
            Command::Register { .. } => "register",
            Command::Keygen => "keygen",
        }
    }
}

/// Outcome of argument parsing.
pub enum Parsed {
    /// Run this command.
    Run(Command),
    /// Help or version was requested; print it and stop.
    Display(clap::Error),
    /// The arguments were unusable; print this response.
    Reject(Value),
}

/// Parse process arguments without ever exiting the process.
pub fn parse<I, T>(args: I) -> Parsed
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) => Parsed::Run(cli.command),
        Err(e) => match e.kind() {
            ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => Parsed::Display(e),
            kind => Parsed::Reject(render::<()>(OperationResult::failure(usage_message(kind)))),
        },
    }
}

/// Caller-facing message for an argument error. Clap's own messages can echo
/// argument values, which may be secrets, so they are never forwarded.
fn usage_message(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::MissingRequiredArgument
        | ErrorKind::MissingSubcommand
        | ErrorKind::DisplayHelpOnMissingArgumentOrSubcommand => "Missing parameters",
        ErrorKind::InvalidSubcommand => "Unknown command",
        _ => "Invalid arguments",
    }
}

/// Run `command` against services built from `cfg`.
pub fn execute(command: Command, cfg: &Config) -> Value {
    match command {
        Command::Encrypt { purpose, plaintext } => match protection(cfg) {
            Ok(dp) => render(dp.encrypt_field(&purpose, plaintext.as_bytes())),
            Err(e) => render::<()>(e.into()),
        },
        Command::Decrypt { purpose, token } => match protection(cfg) {
            Ok(dp) => render(dp.decrypt_field(&purpose, &token)),
            Err(e) => render::<()>(e.into()),
        },
        Command::Status => match protection(cfg) {
            Ok(dp) => render(dp.status()),
            Err(e) => render::<()>(e.into()),
        },
        Command::Hash { password } => match passwords(cfg) {
            Ok(ps) => render(ps.hash(&password)),
            Err(e) => render::<()>(e.into()),
        },
        Command::Verify { password, hash } => match passwords(cfg) {
            Ok(ps) => render(ps.verify(&password, &hash)),
            Err(e) => render::<()>(e.into()),
        },
        Command::Register { payload } => render(register(cfg, &payload)),
        Command::Keygen => render(keygen()),
    }
}

/// Build a fresh master key. Needs no configuration.
pub fn keygen() -> OperationResult<GeneratedKey> {
    OperationResult::success(GeneratedKey {
        master_key: KeyMaterial::generate().to_base64(),
    })
}

/// Render a configuration failure in the common error shape.
pub fn config_failure(err: &anyhow::Error) -> Value {
    render::<()>(OperationResult::failure(format!("Configuration error: {err:#}")))
}

/// Serialise a result; serialisation itself cannot fail for these payloads,
/// but if it ever does the caller still receives the error shape. Object keys
/// keep declaration order, so `success` always leads.
pub fn render<T: Serialize>(result: OperationResult<T>) -> Value {
    serde_json::to_value(&result).unwrap_or_else(
        |e| json!({"success": false, "error": format!("Serialization error: {e}")}),
    )
}

fn register(cfg: &Config, payload: &str) -> OperationResult<RegistrationSummary> {
    let request: RegistrationRequest = match serde_json::from_str(payload) {
        Ok(r) => r,
        Err(e) => {
            warn!(
                event = "registration_rejected",
                line = e.line(),
                column = e.column(),
                "registration payload is not a valid JSON object"
            );
            return ServiceError::Validation("Invalid registration payload".into()).into();
        }
    };

    let registrar = match (protection(cfg), passwords(cfg)) {
        (Ok(dp), Ok(ps)) => Registrar::new(dp, ps),
        (Err(e), _) | (_, Err(e)) => return e.into(),
    };
    registrar.register(&request).map(|user| user.summary)
}

fn protection(cfg: &Config) -> Result<DataProtection, ServiceError> {
    let master = cfg
        .master_key_material()
        .map_err(|e| ServiceError::System(format!("{e:#}")))?;
    let master = match master {
        Some(key) => key,
        None => {
            warn!(
                event = "ephemeral_master_key",
                "MASTER_KEY not set; generated a per-process key"
            );
            KeyMaterial::generate()
        }
    };
    DataProtection::new(master, cfg.protection_options())
        .map_err(|e| ServiceError::Cryptographic(format!("Key derivation unavailable: {e}")))
}

fn passwords(cfg: &Config) -> Result<PasswordSecurity, ServiceError> {
    PasswordSecurity::new(cfg.pepper(), cfg.bcrypt_cost)
        .map_err(|e| ServiceError::System(e.to_string()))
}
