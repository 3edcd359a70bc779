//! Health checking subsystem.
//!
//! # Data Flow
//! ```text
//! Active health checks (active.rs):
//!     Periodic timer (health probe interval)
//!     → Probe both nodes concurrently, each under the request timeout
//!     → NodeRegistry::record_cycle (one atomic snapshot per cycle)
//! ```
//!
//! # Design Decisions
//! - Only active probing changes health; failed business calls do not
//! - One probe result flips state (no thresholds), so detection delay is
//!   bounded by one interval plus one timeout
//! - Probe errors are local: the node is marked unhealthy and logged

pub mod active;

pub use active::HealthMonitor;
