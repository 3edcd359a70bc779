//! Request ledger.
//!
//! # Responsibilities
//! - Append one timestamped entry per routed request
//! - Answer closed-interval window queries in arrival order
//! - Clear atomically on metrics reset
//!
//! # Design Decisions
//! - Timestamp and sequence number are assigned under the same lock as the
//!   push, so append order and timestamp order agree
//! - Bounded: past `capacity` the oldest entries are evicted
//! - Reads copy out under the lock; callers never see a half-written window

pub mod entry;

use std::collections::VecDeque;
use chrono::{DateTime, Utc};
use parking_lot::Mutex;

pub use entry::{LedgerEntry, LedgerStatus, Outcome};

#[derive(Debug)]
struct LedgerInner {
    entries: VecDeque<LedgerEntry>,
    next_seq: u64,
}

/// Append-only, thread-safe log of routing outcomes.
#[derive(Debug)]
pub struct RequestLedger {
    inner: Mutex<LedgerInner>,
    capacity: usize,
}

impl RequestLedger {
    pub fn new(capacity: usize) -> Self {
        Self {
            inner: Mutex::new(LedgerInner {
                entries: VecDeque::with_capacity(capacity.min(4_096)),
                next_seq: 0,
            }),
            capacity: capacity.max(1),
        }
    }

    /// Append an outcome stamped with the current wall-clock time.
    pub fn record(&self, outcome: Outcome) -> LedgerEntry {
        let mut inner = self.inner.lock();
        let now = Utc::now();
        // Never let a later append carry an earlier timestamp.
        let timestamp = match inner.entries.back() {
            Some(last) if last.timestamp > now => last.timestamp,
            _ => now,
        };
        Self::push(&mut inner, self.capacity, outcome, timestamp)
    }

    /// Append an outcome observed at an explicit time.
    pub fn append(&self, timestamp: DateTime<Utc>, outcome: Outcome) -> LedgerEntry {
        let mut inner = self.inner.lock();
        Self::push(&mut inner, self.capacity, outcome, timestamp)
    }

    fn push(inner: &mut LedgerInner, capacity: usize, outcome: Outcome, timestamp: DateTime<Utc>) -> LedgerEntry {
        let entry = LedgerEntry::stamp(outcome, inner.next_seq, timestamp);
        inner.next_seq += 1;
        if inner.entries.len() == capacity {
            inner.entries.pop_front();
        }
        inner.entries.push_back(entry.clone());
        entry
    }

    /// Entries with `start <= timestamp <= end`, in arrival order.
    pub fn query(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> Vec<LedgerEntry> {
        self.inner
            .lock()
            .entries
            .iter()
            .filter(|e| e.within(start, end))
            .cloned()
            .collect()
    }

    /// Every retained entry, in arrival order.
    pub fn entries(&self) -> Vec<LedgerEntry> {
        self.inner.lock().entries.iter().cloned().collect()
    }

    /// Drop all entries. Returns how many were cleared.
    pub fn reset(&self) -> usize {
        let mut inner = self.inner.lock();
        let cleared = inner.entries.len();
        inner.entries.clear();
        cleared
    }

    pub fn len(&self) -> usize {
        self.inner.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
