//! Tracing/logging setup shared by tests, benches and consuming binaries.
//!
//! The equality core only emits `tracing` events; installing a subscriber is left to
//! the process. This crate is the one place that does it.

/// Environment-driven configuration.
pub mod config;

/// Tracing configuration (filters, layers).
pub mod tracing;

pub use config::{ConfigError, LogFormat, ObservabilityConfig};

/// Initialize process-wide tracing from the environment.
///
/// This is safe to call multiple times; subsequent calls become no-ops.
pub fn init() {
    tracing::init(&ObservabilityConfig::from_env());
}
