//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup (main.rs):
//!     Load config → Validate → Build registry/ledger/router → Spawn health loop → Listen
//!
//! Shutdown (shutdown.rs):
//!     Trigger → health loop exits (in-flight probe dropped) → server drains → Exit
//!
//! Signals (signals.rs):
//!     SIGTERM/SIGINT → Trigger graceful shutdown
//! ```
//!
//! # Design Decisions
//! - Fail fast: any startup error is fatal
//! - The health loop runs until shutdown and nothing else stops it

pub mod shutdown;
pub mod signals;

pub use shutdown::Shutdown;
