//! Node identity and per-node health.
//!
//! # Responsibilities
//! - Name the two candidate nodes (primary / secondary)
//! - Hold each node's static base address
//! - Describe the health state written by the health monitor

use std::fmt;
use chrono::{DateTime, Utc};
use serde::Serialize;
use url::Url;

/// Role of a backend node in the redundant pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum NodeRole {
    Primary,
    Secondary,
}

impl NodeRole {
    /// Both roles, primary first.
    pub const ALL: [NodeRole; 2] = [NodeRole::Primary, NodeRole::Secondary];

    pub fn as_str(&self) -> &'static str {
        match self {
            NodeRole::Primary => "PRIMARY",
            NodeRole::Secondary => "SECONDARY",
        }
    }

    /// The redundant counterpart of this role.
    pub fn other(&self) -> NodeRole {
        match self {
            NodeRole::Primary => NodeRole::Secondary,
            NodeRole::Secondary => NodeRole::Primary,
        }
    }
}

impl fmt::Display for NodeRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Health state of a node as last observed by a probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthState {
    /// Never probed. Routed around like `Unhealthy`.
    #[default]
    Unknown,
    Healthy,
    Unhealthy,
}

impl HealthState {
    pub fn from_probe(healthy: bool) -> Self {
        if healthy {
            HealthState::Healthy
        } else {
            HealthState::Unhealthy
        }
    }

    /// Only a positive probe result counts; `Unknown` is not healthy.
    pub fn is_healthy(&self) -> bool {
        matches!(self, HealthState::Healthy)
    }
}

/// Static description of a candidate node.
#[derive(Debug, Clone)]
pub struct Node {
    pub role: NodeRole,
    /// Base URL, e.g. `http://service-a:8000`.
    pub base_url: Url,
}

impl Node {
    pub fn new(role: NodeRole, base_url: Url) -> Self {
        Self { role, base_url }
    }

    /// Base URL without a trailing slash.
    pub fn address(&self) -> &str {
        self.base_url.as_str().trim_end_matches('/')
    }

    /// Absolute URL of an endpoint on this node.
    pub fn endpoint(&self, path: &str) -> String {
        let base = self.address();
        if path.starts_with('/') {
            format!("{}{}", base, path)
        } else {
            format!("{}/{}", base, path)
        }
    }
}

/// Health of one node inside a snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct NodeHealth {
    pub state: HealthState,
    pub last_probe: Option<DateTime<Utc>>,
}

impl NodeHealth {
    pub fn observed(healthy: bool, at: DateTime<Utc>) -> Self {
        Self {
            state: HealthState::from_probe(healthy),
            last_probe: Some(at),
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.state.is_healthy()
    }
}
