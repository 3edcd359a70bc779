//! Backend order node.
//!
//! The supervisor treats nodes as external collaborators; this module is the
//! node used by the `order-node` binary and by integration tests.
//!
//! # Endpoints
//! ```text
//! GET  /health               → {"status":"UP"} or 500 while degraded
//! GET  /orders/{order_id}    → order JSON, 404 if unknown, 500 while degraded
//! POST /stimulus/fail        → arm the simulated fault (?reason=)
//! POST /stimulus/recover     → disarm it
//! GET  /stimulus/status      → current fault state
//! ```

pub mod fault;
pub mod service;

pub use fault::{FaultState, FaultSwitch};
pub use service::{router, NodeConfig, NodeState};
