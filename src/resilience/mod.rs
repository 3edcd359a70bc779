//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Outbound call (probe / forward / fault injection):
//!     → timeouts.rs (hard deadline, no retry)
//!
//! Resilience report (on demand):
//!     ledger snapshot + stimulus record
//!     → engine.rs (pure computation)
//!     → Tbascule (failover latency) + Ebascule (error rate)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every external call has a deadline
//! - Exactly one forwarding attempt per request, so measured failover delay
//!   is not masked by retries
//! - Metrics are always derived from the ledger, never stored

pub mod engine;
pub mod timeouts;

pub use engine::{compute, MetricsEngine, MetricsError, MetricsWindow, ResilienceReport};
