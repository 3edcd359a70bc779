//! Failover supervisor library.
//!
//! Routes business calls to the preferred healthy node of a primary/secondary
//! pair, records every outcome, and measures resilience around an injected
//! primary failure.

pub mod config;
pub mod registry;
pub mod health;
pub mod routing;
pub mod ledger;
pub mod stimulus;
pub mod resilience;
pub mod http;
pub mod node;
pub mod lifecycle;
pub mod observability;

pub use config::SupervisorConfig;
pub use http::SupervisorServer;
pub use lifecycle::Shutdown;
