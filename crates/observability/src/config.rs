//! Observability configuration read from the environment.
//!
//! | variable | values | default |
//! |---|---|---|
//! | `RUST_LOG` | any `EnvFilter` directive | `info` |
//! | `STRUCTEQ_LOG_FORMAT` | `json`, `pretty`, `compact` | `json` |
//! | `STRUCTEQ_LOG_TARGET` | `true`, `false` | `false` |

use core::str::FromStr;

use thiserror::Error;

pub const FILTER_VAR: &str = "RUST_LOG";
pub const FORMAT_VAR: &str = "STRUCTEQ_LOG_FORMAT";
pub const TARGET_VAR: &str = "STRUCTEQ_LOG_TARGET";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ConfigError {
    #[error("unknown log format `{0}` (expected json, pretty or compact)")]
    UnknownFormat(String),

    #[error("{key} must be `true` or `false`, got `{value}`")]
    InvalidFlag { key: &'static str, value: String },
}

/// Output format of the fmt subscriber.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default)]
pub enum LogFormat {
    #[default]
    Json,
    Pretty,
    Compact,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            "compact" => Ok(Self::Compact),
            _ => Err(ConfigError::UnknownFormat(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ObservabilityConfig {
    /// `EnvFilter` directives.
    pub filter: String,
    pub format: LogFormat,
    /// Print the event target (module path).
    pub with_target: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
            format: LogFormat::default(),
            with_target: false,
        }
    }
}

impl ObservabilityConfig {
    /// Read the configuration from the process environment, falling back to the
    /// defaults if any variable is malformed.
    pub fn from_env() -> Self {
        Self::try_from_env().unwrap_or_default()
    }

    pub fn try_from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build the configuration from an arbitrary variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(filter) = lookup(FILTER_VAR).filter(|f| !f.trim().is_empty()) {
            config.filter = filter;
        }
        if let Some(format) = lookup(FORMAT_VAR) {
            config.format = format.parse()?;
        }
        if let Some(value) = lookup(TARGET_VAR) {
            config.with_target = match value.trim() {
                "true" | "1" => true,
                "false" | "0" => false,
                _ => {
                    return Err(ConfigError::InvalidFlag {
                        key: TARGET_VAR,
                        value,
                    });
                }
            };
        }

        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = ObservabilityConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ObservabilityConfig::default());
        assert_eq!(config.filter, "info");
        assert_eq!(config.format, LogFormat::Json);
        assert!(!config.with_target);
    }

    #[test]
    fn variables_override_defaults() {
        let config = ObservabilityConfig::from_lookup(lookup(&[
            (FILTER_VAR, "structeq_core=trace"),
            (FORMAT_VAR, "Pretty"),
            (TARGET_VAR, "true"),
        ]))
        .unwrap();
        assert_eq!(config.filter, "structeq_core=trace");
        assert_eq!(config.format, LogFormat::Pretty);
        assert!(config.with_target);
    }

    #[test]
    fn blank_filter_keeps_default() {
        let config = ObservabilityConfig::from_lookup(lookup(&[(FILTER_VAR, "  ")])).unwrap();
        assert_eq!(config.filter, "info");
    }

    #[test]
    fn malformed_values_are_rejected() {
        let err = ObservabilityConfig::from_lookup(lookup(&[(FORMAT_VAR, "xml")])).unwrap_err();
        assert_eq!(err, ConfigError::UnknownFormat("xml".to_string()));

        let err = ObservabilityConfig::from_lookup(lookup(&[(TARGET_VAR, "yes")])).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidFlag { key: TARGET_VAR, .. }));
    }
}
