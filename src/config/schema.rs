//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the supervisor.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use url::Url;

use crate::config::ConfigError;

/// Root configuration for the supervisor.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct SupervisorConfig {
    /// Listener configuration (bind address).
    pub listener: ListenerConfig,

    /// The redundant backend pair.
    pub nodes: NodesConfig,

    /// Routing and health probing policy.
    pub policy: PolicyConfig,

    /// Request ledger settings.
    pub ledger: LedgerConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
        }
    }
}

/// Addresses of the primary and secondary nodes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct NodesConfig {
    /// Base URL of the preferred node.
    pub primary_url: String,

    /// Base URL of the spare node.
    pub secondary_url: String,
}

impl NodesConfig {
    pub fn primary(&self) -> Result<Url, ConfigError> {
        parse_node_url("nodes.primary_url", &self.primary_url)
    }

    pub fn secondary(&self) -> Result<Url, ConfigError> {
        parse_node_url("nodes.secondary_url", &self.secondary_url)
    }
}

fn parse_node_url(field: &'static str, raw: &str) -> Result<Url, ConfigError> {
    Url::parse(raw.trim_end_matches('/')).map_err(|source| ConfigError::Url { field, source })
}

impl Default for NodesConfig {
    fn default() -> Self {
        Self {
            primary_url: "http://service-a:8000".to_string(),
            secondary_url: "http://service-b:8000".to_string(),
        }
    }
}

/// Routing and health probing policy.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Route to the primary whenever it is healthy.
    pub prefer_primary: bool,

    /// Delay between health probe cycles in milliseconds.
    pub health_interval_ms: u64,

    /// Deadline for every outbound call in milliseconds.
    pub request_timeout_ms: u64,

    /// Path probed on each node.
    pub health_path: String,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            prefer_primary: true,
            health_interval_ms: 2_000,
            request_timeout_ms: 1_000,
            health_path: "/health".to_string(),
        }
    }
}

/// Request ledger configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// Maximum retained entries; the oldest are evicted first.
    pub capacity: usize,
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self { capacity: 2_000 }
    }
}

/// Log output format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Log output format.
    pub log_format: LogFormat,

    /// Enable the Prometheus exporter.
    pub metrics_enabled: bool,

    /// Prometheus exporter bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            log_format: LogFormat::Pretty,
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
