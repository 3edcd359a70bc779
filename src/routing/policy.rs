//! Failover policy.
//!
//! # Responsibilities
//! - Choose a node from a health snapshot and the preference flag
//! - Explain the choice for status endpoints and logs
//!
//! # Design Decisions
//! - Pure function of (snapshot, policy); no hidden state
//! - Reacts only to the last completed probe cycle, never to the outcome
//!   of the previous business call

use std::time::Duration;
use thiserror::Error;

use crate::config::PolicyConfig;
use crate::registry::{HealthSnapshot, NodeRole};

/// Read-only routing policy, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutingPolicy {
    pub prefer_primary: bool,
    pub health_probe_interval: Duration,
    pub request_timeout: Duration,
    pub health_path: String,
}

impl Default for RoutingPolicy {
    fn default() -> Self {
        Self::from(&PolicyConfig::default())
    }
}

impl From<&PolicyConfig> for RoutingPolicy {
    fn from(config: &PolicyConfig) -> Self {
        Self {
            prefer_primary: config.prefer_primary,
            health_probe_interval: Duration::from_millis(config.health_interval_ms),
            request_timeout: Duration::from_millis(config.request_timeout_ms),
            health_path: config.health_path.clone(),
        }
    }
}

/// The node chosen for a request, with a human-readable reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Decision {
    pub role: NodeRole,
    pub reason: &'static str,
}

/// Neither node was healthy in the snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("No backend is healthy")]
pub struct NoHealthyNode;

/// Decide which node serves the next request.
pub fn decide(snapshot: &HealthSnapshot, policy: &RoutingPolicy) -> Result<Decision, NoHealthyNode> {
    let primary_up = snapshot.is_healthy(NodeRole::Primary);
    let secondary_up = snapshot.is_healthy(NodeRole::Secondary);

    if policy.prefer_primary && primary_up {
        return Ok(Decision { role: NodeRole::Primary, reason: "Primary is UP (preferred)" });
    }
    if secondary_up {
        let reason = if policy.prefer_primary {
            "Primary is DOWN -> failover to Secondary"
        } else {
            "Secondary is UP (preferred)"
        };
        return Ok(Decision { role: NodeRole::Secondary, reason });
    }
    if primary_up {
        return Ok(Decision { role: NodeRole::Primary, reason: "Secondary is DOWN -> fallback to Primary" });
    }
    Err(NoHealthyNode)
}
