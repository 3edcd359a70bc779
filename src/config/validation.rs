//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (intervals > 0, capacity > 0)
//! - Check node addresses are distinct plain-HTTP URLs
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is pure function: SupervisorConfig → Result<(), Vec<ValidationError>>
//! - Runs before config is accepted into the system

use std::fmt;
use std::net::SocketAddr;

use crate::config::schema::SupervisorConfig;

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self { field, message: message.into() }
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Validate a fully loaded configuration.
pub fn validate_config(config: &SupervisorConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.listener.bind_address.parse::<SocketAddr>().is_err() {
        errors.push(ValidationError::new(
            "listener.bind_address",
            format!("'{}' is not a socket address", config.listener.bind_address),
        ));
    }

    let primary = check_node_url("nodes.primary_url", &config.nodes.primary_url, &mut errors);
    let secondary = check_node_url("nodes.secondary_url", &config.nodes.secondary_url, &mut errors);
    if let (Some(p), Some(s)) = (primary, secondary) {
        if p == s {
            errors.push(ValidationError::new(
                "nodes.secondary_url",
                "primary and secondary must be different nodes",
            ));
        }
    }

    if config.policy.health_interval_ms == 0 {
        errors.push(ValidationError::new("policy.health_interval_ms", "must be greater than 0"));
    }
    if config.policy.request_timeout_ms == 0 {
        errors.push(ValidationError::new("policy.request_timeout_ms", "must be greater than 0"));
    }
    if !config.policy.health_path.starts_with('/') {
        errors.push(ValidationError::new("policy.health_path", "must start with '/'"));
    }
    if config.ledger.capacity == 0 {
        errors.push(ValidationError::new("ledger.capacity", "must be greater than 0"));
    }
    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_node_url(field: &'static str, raw: &str, errors: &mut Vec<ValidationError>) -> Option<url::Url> {
    let url = match url::Url::parse(raw.trim_end_matches('/')) {
        Ok(url) => url,
        Err(e) => {
            errors.push(ValidationError::new(field, format!("'{}' is not a valid URL: {}", raw, e)));
            return None;
        }
    };
    // The upstream connector speaks plain HTTP only.
    if url.scheme() != "http" {
        errors.push(ValidationError::new(field, format!("unsupported scheme '{}'", url.scheme())));
        return None;
    }
    if url.host_str().is_none() {
        errors.push(ValidationError::new(field, "missing host"));
        return None;
    }
    Some(url)
}
