//! Node registry.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     NodesConfig → Node (primary) + Node (secondary)
//!
//! Health monitor (writer):
//!     probe cycle results
//!     → build next HealthSnapshot
//!     → atomic pointer swap
//!
//! Router / handlers (readers):
//!     snapshot() → Arc<HealthSnapshot> (lock-free load)
//! ```
//!
//! # Design Decisions
//! - Node identities are static; only health changes at runtime
//! - Health lives in one immutable snapshot swapped per write (`arc-swap`),
//!   so readers never see cycle n for one node and n-1 for the other
//! - Unprobed nodes are `Unknown` and treated as unhealthy by routing

pub mod node;
pub mod snapshot;

use std::sync::Arc;
use arc_swap::ArcSwap;
use chrono::{DateTime, Utc};

use crate::config::{ConfigError, NodesConfig};
pub use node::{HealthState, Node, NodeHealth, NodeRole};
pub use snapshot::HealthSnapshot;

/// Outcome of probing one node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeResult {
    pub role: NodeRole,
    pub healthy: bool,
    pub observed_at: DateTime<Utc>,
}

/// A change of health state caused by a write.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub role: NodeRole,
    pub from: HealthState,
    pub to: HealthState,
}

/// Static node descriptions plus the current health snapshot.
#[derive(Debug)]
pub struct NodeRegistry {
    primary: Node,
    secondary: Node,
    state: ArcSwap<HealthSnapshot>,
}

impl NodeRegistry {
    pub fn new(primary: Node, secondary: Node) -> Self {
        Self {
            primary,
            secondary,
            state: ArcSwap::from_pointee(HealthSnapshot::initial()),
        }
    }

    /// Build the registry from (validated) node configuration.
    pub fn from_config(config: &NodesConfig) -> Result<Self, ConfigError> {
        Ok(Self::new(
            Node::new(NodeRole::Primary, config.primary()?),
            Node::new(NodeRole::Secondary, config.secondary()?),
        ))
    }

    pub fn node(&self, role: NodeRole) -> &Node {
        match role {
            NodeRole::Primary => &self.primary,
            NodeRole::Secondary => &self.secondary,
        }
    }

    pub fn nodes(&self) -> [&Node; 2] {
        [&self.primary, &self.secondary]
    }

    /// Current health snapshot. Never blocks.
    pub fn snapshot(&self) -> Arc<HealthSnapshot> {
        self.state.load_full()
    }

    /// Update a single node's health.
    pub fn set_health(&self, role: NodeRole, healthy: bool, observed_at: DateTime<Utc>) -> Option<Transition> {
        let health = NodeHealth::observed(healthy, observed_at);
        let previous = self.state.rcu(|current| current.with_node(role, health));
        let from = previous.health(role).state;
        (from != health.state).then_some(Transition { role, from, to: health.state })
    }

    /// Publish the results of a full probe cycle as one snapshot.
    pub fn record_cycle(&self, results: &[ProbeResult], completed_at: DateTime<Utc>) -> Vec<Transition> {
        let previous = self.state.rcu(|current| {
            let mut next = results.iter().fold(HealthSnapshot::clone(current), |snap, r| {
                snap.with_node(r.role, NodeHealth::observed(r.healthy, r.observed_at))
            });
            next.cycle = current.cycle + 1;
            next.last_cycle_at = Some(completed_at);
            next
        });

        results
            .iter()
            .filter_map(|r| {
                let from = previous.health(r.role).state;
                let to = HealthState::from_probe(r.healthy);
                (from != to).then_some(Transition { role: r.role, from, to })
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;
    use url::Url;

    fn registry() -> NodeRegistry {
        NodeRegistry::new(
            Node::new(NodeRole::Primary, Url::parse("http://127.0.0.1:8001").unwrap()),
            Node::new(NodeRole::Secondary, Url::parse("http://127.0.0.1:8002").unwrap()),
        )
    }

    fn result(role: NodeRole, healthy: bool) -> ProbeResult {
        ProbeResult { role, healthy, observed_at: Utc::now() }
    }

    #[test]
    fn test_initial_snapshot_is_unknown() {
        let reg = registry();
        let snap = reg.snapshot();
        assert_eq!(snap.primary.state, HealthState::Unknown);
        assert_eq!(snap.secondary.state, HealthState::Unknown);
        assert!(!snap.any_healthy());
        assert_eq!(snap.cycle, 0);
    }

    #[test]
    fn test_set_health_reports_transitions_once() {
        let reg = registry();
        let t = reg.set_health(NodeRole::Primary, true, Utc::now());
        assert_eq!(
            t,
            Some(Transition { role: NodeRole::Primary, from: HealthState::Unknown, to: HealthState::Healthy })
        );
        assert_eq!(reg.set_health(NodeRole::Primary, true, Utc::now()), None);
        assert!(reg.snapshot().is_healthy(NodeRole::Primary));
        assert!(!reg.snapshot().is_healthy(NodeRole::Secondary));
    }

    #[test]
    fn test_record_cycle_publishes_both_nodes() {
        let reg = registry();
        let transitions = reg.record_cycle(
            &[result(NodeRole::Primary, true), result(NodeRole::Secondary, false)],
            Utc::now(),
        );
        assert_eq!(transitions.len(), 2);

        let snap = reg.snapshot();
        assert_eq!(snap.cycle, 1);
        assert_eq!(snap.primary.state, HealthState::Healthy);
        assert_eq!(snap.secondary.state, HealthState::Unhealthy);
        assert!(snap.last_cycle_at.is_some());

        let transitions = reg.record_cycle(
            &[result(NodeRole::Primary, false), result(NodeRole::Secondary, false)],
            Utc::now(),
        );
        assert_eq!(
            transitions,
            vec![Transition { role: NodeRole::Primary, from: HealthState::Healthy, to: HealthState::Unhealthy }]
        );
        assert_eq!(reg.snapshot().cycle, 2);
    }

    #[test]
    fn test_snapshots_never_mix_cycles() {
        // Even cycles: both healthy. Odd cycles: both unhealthy.
        let reg = Arc::new(registry());
        let writer = {
            let reg = reg.clone();
            thread::spawn(move || {
                for i in 0..2_000 {
                    let healthy = i % 2 == 0;
                    reg.record_cycle(
                        &[result(NodeRole::Primary, healthy), result(NodeRole::Secondary, healthy)],
                        Utc::now(),
                    );
                }
            })
        };

        for _ in 0..2_000 {
            let snap = reg.snapshot();
            assert_eq!(snap.primary.state, snap.secondary.state, "torn snapshot at cycle {}", snap.cycle);
        }
        writer.join().unwrap();
        assert_eq!(reg.snapshot().cycle, 2_000);
    }
}
