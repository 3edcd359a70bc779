//! Timeout enforcement.
//!
//! # Responsibilities
//! - Wrap every outbound call (probe, forward, fault injection) with a deadline
//! - Cancel the wrapped future cleanly when the deadline passes
//!
//! # Design Decisions
//! - Uses Tokio's timeout facilities; dropping the future releases the timer
//! - Timeout errors are distinct from other upstream errors
//! - A timed-out forward surfaces as 504 Gateway Timeout

use std::future::Future;
use std::time::Duration;
use tokio::time;

use crate::http::upstream::UpstreamError;

/// Run `fut` with a hard deadline.
pub async fn with_deadline<F, T>(deadline: Duration, fut: F) -> Result<T, UpstreamError>
where
    F: Future<Output = Result<T, UpstreamError>>,
{
    match time::timeout(deadline, fut).await {
        Ok(result) => result,
        Err(_) => Err(UpstreamError::Timeout(deadline)),
    }
}
