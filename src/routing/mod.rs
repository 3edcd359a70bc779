//! Routing subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming business request
//!     → router.rs (FailoverRouter::route)
//!     → NodeRegistry::snapshot()
//!     → policy.rs (decide: preferred healthy node or NoHealthyNode)
//!     → forward with deadline
//!     → RequestLedger::record(outcome)
//!     → Return: node response, transport error, or NoHealthyNode
//! ```
//!
//! # Design Decisions
//! - Policy is immutable at runtime
//! - Deterministic: same snapshot always yields the same decision
//! - Binary primary/secondary preference only, no load spreading

pub mod policy;
pub mod router;

pub use policy::{decide, Decision, NoHealthyNode, RoutingPolicy};
pub use router::{FailoverRouter, RequestContext, Routed};
