//! Configuration loading and validation.
//!
//! All values are read from environment variables at startup. The process
//! reports a clear error if any required variable is missing or invalid.

use anyhow::{Context, Result};
use serde::Deserialize;
use zeroize::Zeroizing;

use crate::crypto::KeyMaterial;
use crate::keys::FallbackPolicy;
use crate::password::{DEFAULT_COST, MAX_COST, MAX_PEPPER_LEN};
use crate::protection::ProtectionOptions;

/// Lowest bcrypt cost accepted from configuration.
pub const MIN_CONFIGURED_COST: u32 = DEFAULT_COST;

/// Validated service configuration.
#[derive(Clone, Deserialize)]
pub struct Config {
    /// Secret appended to every password before hashing. **Required.**
    pub pepper: Zeroizing<String>,

    /// Base64url 32-byte master key. When absent a random key is generated
    /// per process and nothing sealed can be opened by another process.
    #[serde(default)]
    pub master_key: Option<Zeroizing<String>>,

    /// Secondary salt appended to every purpose salt label.
    #[serde(default)]
    pub installation_salt: String,

    /// Reject undeclared purposes instead of falling back to the master key.
    #[serde(default)]
    pub strict_purposes: bool,

    /// bcrypt work factor.
    #[serde(default = "default_bcrypt_cost")]
    pub bcrypt_cost: u32,

    /// Tracing log level (e.g. `"info"`, `"debug"`).
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_bcrypt_cost() -> u32 {
    DEFAULT_COST
}
fn default_log_level() -> String {
    "info".into()
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("pepper", &"[REDACTED]")
            .field("master_key", &self.master_key.as_ref().map(|_| "[REDACTED]"))
            .field("installation_salt", &self.installation_salt)
            .field("strict_purposes", &self.strict_purposes)
            .field("bcrypt_cost", &self.bcrypt_cost)
            .field("log_level", &self.log_level)
            .finish()
    }
}

impl Config {
    /// Load and validate configuration from environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if any required variable is absent or cannot be parsed.
    pub fn from_env() -> Result<Self> {
        Self::from_source(config::Environment::default())
    }

    /// Load and validate configuration from an explicit environment source.
    pub fn from_source(env: config::Environment) -> Result<Self> {
        let cfg = config::Config::builder()
            .add_source(env)
            .build()
            .context("failed to build configuration from environment")?;

        let c: Config = cfg
            .try_deserialize()
            .context("failed to deserialise configuration")?;

        c.validate()?;
        Ok(c)
    }

    /// Validate all fields, returning a descriptive error on the first failure.
    fn validate(&self) -> Result<()> {
        if self.pepper.trim().is_empty() {
            anyhow::bail!("PEPPER is required and must not be empty");
        }
        if self.pepper.len() > MAX_PEPPER_LEN {
            anyhow::bail!("PEPPER must be at most {MAX_PEPPER_LEN} bytes");
        }
        if self.master_key.is_some() {
            self.master_key_material()?;
        }
        if !(MIN_CONFIGURED_COST..=MAX_COST).contains(&self.bcrypt_cost) {
            anyhow::bail!("BCRYPT_COST must be between {MIN_CONFIGURED_COST} and {MAX_COST}");
        }
        Ok(())
    }

    /// Decode the configured master key, if one is set.
    ///
    /// # Errors
    ///
    /// Returns an error if `MASTER_KEY` is not base64url for exactly 32 bytes.
    pub fn master_key_material(&self) -> Result<Option<KeyMaterial>> {
        self.master_key
            .as_deref()
            .map(|text| KeyMaterial::from_base64(text).context("MASTER_KEY is invalid"))
            .transpose()
    }

    /// The configured pepper. Its buffer is wiped when the config drops.
    pub fn pepper(&self) -> &str {
        &self.pepper
    }

    pub fn protection_options(&self) -> ProtectionOptions {
        ProtectionOptions {
            installation_salt: self.installation_salt.as_bytes().to_vec(),
            fallback: if self.strict_purposes {
                FallbackPolicy::Reject
            } else {
                FallbackPolicy::MasterKey
            },
        }
    }
}
