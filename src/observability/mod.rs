//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! All subsystems produce:
//!     → logging.rs (structured log events via `tracing`)
//!     → metrics.rs (counters, gauges, histograms)
//!
//! Consumers:
//!     → stdout (pretty or JSON)
//!     → Prometheus scrape on a separate listener (optional)
//! ```
//!
//! # Design Decisions
//! - Request ID flows from the HTTP layer into forwarded calls
//! - Metric updates are no-ops until a recorder is installed

pub mod logging;
pub mod metrics;
