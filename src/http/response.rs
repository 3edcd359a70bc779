//! Error-to-response mapping.
//!
//! # Status Codes
//! ```text
//! NoHealthyNode            → 503
//! forward timed out        → 504
//! node unreachable         → 502
//! node answered non-2xx    → the node's own status
//! NoStimulusRecorded       → 400
//! bad metrics window       → 422
//! primary unreachable      → 503 (stimulus still recorded)
//! primary rejected control → 502 (stimulus still recorded)
//! ```
//!
//! Error bodies are JSON with a `detail` field.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};

use crate::http::upstream::{UpstreamError, UpstreamResponse};
use crate::registry::NodeRole;
use crate::resilience::MetricsError;
use crate::routing::NoHealthyNode;
use crate::stimulus::StimulusError;

/// `{"detail": ...}` with the given status.
pub fn error_response(status: StatusCode, detail: impl Into<Value>) -> Response {
    (status, Json(json!({ "detail": detail.into() }))).into_response()
}

/// A forward that produced no response at all.
pub fn forward_failure(error: &UpstreamError, routed_to: NodeRole) -> Response {
    let status = match error {
        UpstreamError::Timeout(_) => StatusCode::GATEWAY_TIMEOUT,
        UpstreamError::Connect(_) | UpstreamError::Request(_) => StatusCode::BAD_GATEWAY,
    };
    error_response(
        status,
        json!({
            "message": format!("Upstream call failed: {}", error),
            "routed_to": routed_to,
        }),
    )
}

/// A node answer outside 2xx, passed through with its status.
pub fn node_error(response: &UpstreamResponse, routed_to: NodeRole) -> Response {
    let message = if response.status == StatusCode::NOT_FOUND {
        "Order not found"
    } else {
        "Backend error"
    };
    error_response(
        response.status,
        json!({
            "message": message,
            "routed_to": routed_to,
            "node_status": response.status.as_u16(),
            "node_body": response.json(),
        }),
    )
}

impl IntoResponse for NoHealthyNode {
    fn into_response(self) -> Response {
        error_response(StatusCode::SERVICE_UNAVAILABLE, self.to_string())
    }
}

impl IntoResponse for MetricsError {
    fn into_response(self) -> Response {
        error_response(StatusCode::BAD_REQUEST, self.to_string())
    }
}

impl IntoResponse for StimulusError {
    fn into_response(self) -> Response {
        let status = match &self {
            StimulusError::PrimaryUnreachable { .. } => StatusCode::SERVICE_UNAVAILABLE,
            StimulusError::PrimaryRejected { .. } => StatusCode::BAD_GATEWAY,
        };
        error_response(
            status,
            json!({
                "message": self.to_string(),
                "stimulus": self.record(),
            }),
        )
    }
}
