//! Tracing subscriber setup for Groundlink binaries
//!
//! Libraries only emit events; the process entry point calls [`init_tracing`]
//! once. `RUST_LOG` takes precedence over the configured level.

use crate::link::LoggingSettings;
use anyhow::{Context, Result};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber from `[logging]` settings
pub fn init_tracing(settings: &LoggingSettings) -> Result<()> {
    init_tracing_with(&settings.level, settings.json)
}

/// Install the global subscriber with an explicit fallback filter
pub fn init_tracing_with(default_filter: &str, json: bool) -> Result<()> {
    let filter = match EnvFilter::try_from_default_env() {
        Ok(filter) => filter,
        Err(_) => EnvFilter::try_new(default_filter)
            .with_context(|| format!("Invalid log filter '{}'", default_filter))?,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(json.then(|| fmt::layer().json()))
        .with((!json).then(|| fmt::layer()))
        .try_init()
        .context("Tracing subscriber already installed")
}
