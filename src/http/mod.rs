//! HTTP protocol handling subsystem.
//!
//! # Data Flow
//! ```text
//! Client request
//!     → server.rs (Axum setup, request ID, trace, timeout)
//!     → handlers.rs (status, stimulus, metrics, business passthrough)
//!     → routing::FailoverRouter (decide + forward)
//!     → upstream.rs (bounded call to the chosen node)
//!     → response.rs (error → status code mapping)
//!     → Send to client
//! ```

pub mod handlers;
pub mod request;
pub mod response;
pub mod server;
pub mod upstream;

pub use request::X_REQUEST_ID;
pub use server::{AppState, SupervisorServer};
pub use upstream::{UpstreamClient, UpstreamError, UpstreamResponse};
