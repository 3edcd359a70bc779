//! Configuration loading from disk and environment.

use std::path::Path;
use std::fs;
use thiserror::Error;

use crate::config::schema::SupervisorConfig;
use crate::config::validation::{validate_config, ValidationError};

/// Error type for configuration loading. Always fatal at startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Invalid value '{value}' for environment variable {var}")]
    Env { var: &'static str, value: String },

    #[error("Invalid URL in {field}: {source}")]
    Url {
        field: &'static str,
        #[source]
        source: url::ParseError,
    },

    #[error("Validation failed: {}", join_errors(.0))]
    Validation(Vec<ValidationError>),
}

fn join_errors(errors: &[ValidationError]) -> String {
    errors
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Load configuration: defaults, then the optional TOML file, then
/// environment overrides, then validation.
pub fn load_config(path: Option<&Path>) -> Result<SupervisorConfig, ConfigError> {
    let mut config = match path {
        Some(path) => {
            let content = fs::read_to_string(path)?;
            toml::from_str(&content)?
        }
        None => SupervisorConfig::default(),
    };

    apply_env_overrides(&mut config, |var| std::env::var(var).ok())?;
    validate_config(&config).map_err(ConfigError::Validation)?;

    Ok(config)
}

/// Apply the environment-style overrides using the given lookup.
///
/// | Variable                  | Field                         |
/// |---------------------------|-------------------------------|
/// | `PRIMARY_URL`             | `nodes.primary_url`           |
/// | `SECONDARY_URL`           | `nodes.secondary_url`         |
/// | `HEALTH_INTERVAL_SECONDS` | `policy.health_interval_ms`   |
/// | `REQUEST_TIMEOUT_SECONDS` | `policy.request_timeout_ms`   |
/// | `PREFER_PRIMARY`          | `policy.prefer_primary`       |
/// | `REQUEST_LOG_MAX`         | `ledger.capacity`             |
/// | `BIND_ADDRESS`            | `listener.bind_address`       |
pub fn apply_env_overrides<F>(config: &mut SupervisorConfig, lookup: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(v) = lookup("PRIMARY_URL") {
        config.nodes.primary_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = lookup("SECONDARY_URL") {
        config.nodes.secondary_url = v.trim_end_matches('/').to_string();
    }
    if let Some(v) = lookup("HEALTH_INTERVAL_SECONDS") {
        config.policy.health_interval_ms = seconds_to_ms("HEALTH_INTERVAL_SECONDS", &v)?;
    }
    if let Some(v) = lookup("REQUEST_TIMEOUT_SECONDS") {
        config.policy.request_timeout_ms = seconds_to_ms("REQUEST_TIMEOUT_SECONDS", &v)?;
    }
    if let Some(v) = lookup("PREFER_PRIMARY") {
        // Anything other than "true" disables the preference.
        config.policy.prefer_primary = v.trim().eq_ignore_ascii_case("true");
    }
    if let Some(v) = lookup("REQUEST_LOG_MAX") {
        config.ledger.capacity = v
            .trim()
            .parse()
            .map_err(|_| ConfigError::Env { var: "REQUEST_LOG_MAX", value: v.clone() })?;
    }
    if let Some(v) = lookup("BIND_ADDRESS") {
        config.listener.bind_address = v;
    }
    Ok(())
}

fn seconds_to_ms(var: &'static str, raw: &str) -> Result<u64, ConfigError> {
    match raw.trim().parse::<f64>() {
        Ok(secs) if secs.is_finite() && secs >= 0.0 => Ok((secs * 1000.0).round() as u64),
        _ => Err(ConfigError::Env { var, value: raw.to_string() }),
    }
}
