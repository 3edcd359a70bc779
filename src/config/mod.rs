//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! defaults
//!     → optional TOML file (loader.rs)
//!     → environment overrides (PRIMARY_URL, SECONDARY_URL, ...)
//!     → validation.rs (semantic checks)
//!     → SupervisorConfig (validated, immutable)
//!     → RoutingPolicy / NodeRegistry built once at startup
//! ```
//!
//! # Design Decisions
//! - Config is read once; nothing reloads at runtime
//! - All fields have defaults to allow minimal configs
//! - Validation separates syntactic (serde) from semantic checks
//! - Any configuration error is fatal

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, ConfigError};
pub use schema::SupervisorConfig;
pub use schema::ListenerConfig;
pub use schema::NodesConfig;
pub use schema::PolicyConfig;
pub use schema::LedgerConfig;
pub use schema::{LogFormat, ObservabilityConfig};
