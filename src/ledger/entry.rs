//! Ledger entry types.

use std::time::Duration;
use chrono::{DateTime, Utc};

use crate::registry::NodeRole;

/// Outcome recorded for one routed request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LedgerStatus {
    /// The node answered with this HTTP status.
    Http(u16),
    /// The forwarding call hit its deadline.
    Timeout,
    /// The node could not be reached.
    Unreachable,
    /// No node was healthy when the request arrived.
    NoHealthyNode,
}

impl LedgerStatus {
    /// HTTP-equivalent code; synthetic failures map to gateway statuses.
    pub fn code(&self) -> u16 {
        match self {
            LedgerStatus::Http(code) => *code,
            LedgerStatus::Timeout => 504,
            LedgerStatus::Unreachable => 502,
            LedgerStatus::NoHealthyNode => 503,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, LedgerStatus::Http(code) if (200..300).contains(code))
    }
}

/// What the router knows about a request before it is stamped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outcome {
    pub target: Option<NodeRole>,
    pub status: LedgerStatus,
    pub latency: Duration,
    pub path: String,
    pub note: Option<&'static str>,
}

impl Outcome {
    pub fn new(target: Option<NodeRole>, status: LedgerStatus, latency: Duration) -> Self {
        Self {
            target,
            status,
            latency,
            path: String::new(),
            note: None,
        }
    }

    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    pub fn with_note(mut self, note: &'static str) -> Self {
        self.note = Some(note);
        self
    }
}

/// An immutable, timestamped ledger record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerEntry {
    /// Position in append order; unique for the life of the process.
    pub seq: u64,
    pub timestamp: DateTime<Utc>,
    pub target: Option<NodeRole>,
    pub status: LedgerStatus,
    pub latency: Duration,
    pub path: String,
    pub note: Option<&'static str>,
}

impl LedgerEntry {
    pub(crate) fn stamp(outcome: Outcome, seq: u64, timestamp: DateTime<Utc>) -> Self {
        Self {
            seq,
            timestamp,
            target: outcome.target,
            status: outcome.status,
            latency: outcome.latency,
            path: outcome.path,
            note: outcome.note,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status.is_success()
    }

    /// Closed-interval membership: `start <= timestamp <= end`.
    pub fn within(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> bool {
        start <= self.timestamp && self.timestamp <= end
    }
}
