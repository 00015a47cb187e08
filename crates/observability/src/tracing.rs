//! Tracing/logging initialization.

use anyhow::Context;
use tracing_subscriber::EnvFilter;

use crate::config::{LogFormat, ObservabilityConfig};

/// Initialize tracing/logging for the process.
///
/// Safe to call multiple times (subsequent calls are no-ops). An unparsable filter
/// falls back to `info`.
pub fn init(config: &ObservabilityConfig) {
    if try_init(config).is_err() {
        let fallback = ObservabilityConfig {
            filter: "info".to_string(),
            ..config.clone()
        };
        let _ = try_init(&fallback);
    }
}

/// Install the subscriber described by `config`.
///
/// Fails if the filter does not parse or a global subscriber is already set.
pub fn try_init(config: &ObservabilityConfig) -> anyhow::Result<()> {
    let filter = EnvFilter::try_new(&config.filter)
        .with_context(|| format!("invalid log filter `{}`", config.filter))?;

    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(config.with_target);

    let installed = match config.format {
        LogFormat::Json => builder
            .json()
            .with_timer(tracing_subscriber::fmt::time::SystemTime)
            .try_init(),
        LogFormat::Pretty => builder.pretty().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
    };
    installed
        .map_err(anyhow::Error::msg)
        .context("a global tracing subscriber is already installed")?;

    ::tracing::debug!(
        filter = %config.filter,
        format = ?config.format,
        "tracing initialized"
    );
    Ok(())
}
