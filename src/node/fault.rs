//! Simulated fault state machine.
//!
//! # States
//! - Normal: every endpoint behaves
//! - Degraded: health and business endpoints answer 500
//!
//! # State Transitions
//! ```text
//! Normal   → Degraded: arm(reason)
//! Degraded → Degraded: arm(reason)   (reason and since are replaced)
//! *        → Normal:   disarm()
//! ```

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
#[serde(tag = "mode", rename_all = "lowercase")]
pub enum FaultState {
    #[default]
    Normal,
    Degraded {
        since: DateTime<Utc>,
        reason: String,
    },
}

impl FaultState {
    pub fn is_degraded(&self) -> bool {
        matches!(self, FaultState::Degraded { .. })
    }
}

/// The only way to change a node's fault state.
#[derive(Debug, Default)]
pub struct FaultSwitch {
    state: RwLock<FaultState>,
}

impl FaultSwitch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Enter `Degraded`. Returns the new state.
    pub fn arm(&self, reason: impl Into<String>) -> FaultState {
        let next = FaultState::Degraded {
            since: Utc::now(),
            reason: reason.into(),
        };
        *self.state.write() = next.clone();
        next
    }

    /// Return to `Normal`. Returns the state that was left.
    pub fn disarm(&self) -> FaultState {
        std::mem::take(&mut *self.state.write())
    }

    pub fn current(&self) -> FaultState {
        self.state.read().clone()
    }

    pub fn is_degraded(&self) -> bool {
        self.state.read().is_degraded()
    }
}
