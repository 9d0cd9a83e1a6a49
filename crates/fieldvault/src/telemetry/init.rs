//! Tracing subscriber initialisation.

use anyhow::{Context, Result};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global JSON subscriber writing to stderr.
///
/// `RUST_LOG` wins when set; otherwise `log_level` is used as the filter.
///
/// # Errors
///
/// Returns an error if `log_level` is not a valid filter directive or a
/// subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => level_filter(log_level)?,
    };

    let json = tracing_subscriber::fmt::layer()
        .json()
        .with_current_span(false)
        .with_span_list(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(filter)
        .with(json)
        .try_init()
        .context("failed to initialise tracing subscriber")
}

/// Parse the configured `LOG_LEVEL` into a filter.
fn level_filter(log_level: &str) -> Result<EnvFilter> {
    EnvFilter::try_new(log_level).with_context(|| format!("invalid LOG_LEVEL {log_level:?}"))
}
