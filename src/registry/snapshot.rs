//! Immutable health snapshots.

use chrono::{DateTime, Utc};
use serde::Serialize;
use crate::registry::node::{HealthState, NodeHealth, NodeRole};

/// A coherent view of both nodes' health at one point in time.
///
/// Snapshots are never mutated; the registry publishes a new one for every
/// write, so a reader always sees the results of a single probe cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct HealthSnapshot {
    pub primary: NodeHealth,
    pub secondary: NodeHealth,
    /// Number of completed probe cycles reflected in this snapshot.
    pub cycle: u64,
    pub last_cycle_at: Option<DateTime<Utc>>,
}

impl HealthSnapshot {
    /// Snapshot before any probe has completed.
    pub fn initial() -> Self {
        Self {
            primary: NodeHealth::default(),
            secondary: NodeHealth::default(),
            cycle: 0,
            last_cycle_at: None,
        }
    }

    /// Build a snapshot from explicit states, without probe timestamps.
    pub fn with_states(primary: HealthState, secondary: HealthState) -> Self {
        Self {
            primary: NodeHealth { state: primary, last_probe: None },
            secondary: NodeHealth { state: secondary, last_probe: None },
            cycle: 0,
            last_cycle_at: None,
        }
    }

    pub fn health(&self, role: NodeRole) -> NodeHealth {
        match role {
            NodeRole::Primary => self.primary,
            NodeRole::Secondary => self.secondary,
        }
    }

    pub fn is_healthy(&self, role: NodeRole) -> bool {
        self.health(role).is_healthy()
    }

    pub fn any_healthy(&self) -> bool {
        self.primary.is_healthy() || self.secondary.is_healthy()
    }

    pub(crate) fn with_node(&self, role: NodeRole, health: NodeHealth) -> Self {
        let mut next = self.clone();
        match role {
            NodeRole::Primary => next.primary = health,
            NodeRole::Secondary => next.secondary = health,
        }
        next
    }
}

impl Default for HealthSnapshot {
    fn default() -> Self {
        Self::initial()
    }
}
