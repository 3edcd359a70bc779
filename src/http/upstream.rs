//! Outbound HTTP client for talking to backend nodes.
//!
//! # Responsibilities
//! - Issue health probes, forwarded business calls and fault-injection calls
//! - Bound every exchange (connect, headers and body) by one deadline
//! - Classify failures as timeout, connection or request errors

use std::fmt;
use std::time::Duration;
use axum::body::{Body, Bytes};
use axum::http::{header, Method, Request, StatusCode};
use hyper_util::{
    client::legacy::{Client, connect::HttpConnector},
    rt::TokioExecutor,
};
use thiserror::Error;

use crate::http::X_REQUEST_ID;
use crate::resilience::timeouts::with_deadline;

/// Largest upstream body the supervisor will buffer.
const MAX_BODY_BYTES: usize = 1024 * 1024;

const USER_AGENT: &str = concat!("failover-supervisor/", env!("CARGO_PKG_VERSION"));

/// Transport-level failure of an outbound call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UpstreamError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    #[error("connection failed: {0}")]
    Connect(String),

    #[error("request failed: {0}")]
    Request(String),
}

/// A fully buffered upstream response.
#[derive(Debug, Clone)]
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Bytes,
}

impl UpstreamResponse {
    /// Body decoded as JSON, if it is JSON.
    pub fn json(&self) -> Option<serde_json::Value> {
        serde_json::from_slice(&self.body).ok()
    }
}

/// Shared, cheaply clonable client over a pooled hyper connector.
#[derive(Clone)]
pub struct UpstreamClient {
    client: Client<HttpConnector, Body>,
}

impl UpstreamClient {
    pub fn new() -> Self {
        let client = Client::builder(TokioExecutor::new())
            .build(HttpConnector::new());
        Self { client }
    }

    pub async fn get(
        &self,
        url: &str,
        request_id: Option<&str>,
        deadline: Duration,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.send(Method::GET, url, request_id, deadline).await
    }

    pub async fn post(
        &self,
        url: &str,
        request_id: Option<&str>,
        deadline: Duration,
    ) -> Result<UpstreamResponse, UpstreamError> {
        self.send(Method::POST, url, request_id, deadline).await
    }

    async fn send(
        &self,
        method: Method,
        url: &str,
        request_id: Option<&str>,
        deadline: Duration,
    ) -> Result<UpstreamResponse, UpstreamError> {
        let mut builder = Request::builder()
            .method(method)
            .uri(url)
            .header(header::USER_AGENT, USER_AGENT);
        if let Some(id) = request_id {
            builder = builder.header(X_REQUEST_ID, id);
        }
        let request = builder
            .body(Body::empty())
            .map_err(|e| UpstreamError::Request(e.to_string()))?;

        with_deadline(deadline, async {
            let response: hyper::Response<hyper::body::Incoming> =
                self.client.request(request).await.map_err(|e| {
                    if e.is_connect() {
                        UpstreamError::Connect(e.to_string())
                    } else {
                        UpstreamError::Request(e.to_string())
                    }
                })?;
            let status = response.status();
            let body = axum::body::to_bytes(Body::new(response.into_body()), MAX_BODY_BYTES)
                .await
                .map_err(|e| UpstreamError::Request(e.to_string()))?;
            Ok(UpstreamResponse { status, body })
        })
        .await
    }
}

impl Default for UpstreamClient {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for UpstreamClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UpstreamClient").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_refused_connection_is_connect_error() {
        let client = UpstreamClient::new();
        // Port 9 (discard) is closed on loopback in test environments.
        let err = client
            .get("http://127.0.0.1:9/health", None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Connect(_)), "got {:?}", err);
    }

    #[tokio::test]
    async fn test_invalid_url_is_request_error() {
        let client = UpstreamClient::new();
        let err = client
            .get("not a url", None, Duration::from_secs(1))
            .await
            .unwrap_err();
        assert!(matches!(err, UpstreamError::Request(_)));
    }
}
