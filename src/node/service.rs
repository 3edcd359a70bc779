//! Order service endpoints.

use std::sync::Arc;
use std::time::Duration;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::{json, Value};

use crate::config::ConfigError;
use crate::node::fault::{FaultState, FaultSwitch};

/// Node settings, read from `SERVICE_NAME` and `SIMULATED_LATENCY_MS`.
#[derive(Debug, Clone)]
pub struct NodeConfig {
    pub service_name: String,
    /// Delay added to health and order responses.
    pub simulated_latency: Duration,
}

impl NodeConfig {
    pub fn new(service_name: impl Into<String>) -> Self {
        Self {
            service_name: service_name.into(),
            simulated_latency: Duration::ZERO,
        }
    }

    pub fn from_env() -> Result<Self, ConfigError> {
        let service_name = std::env::var("SERVICE_NAME").unwrap_or_else(|_| "Service".to_string());
        let simulated_latency = match std::env::var("SIMULATED_LATENCY_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<u64>()
                .map(Duration::from_millis)
                .map_err(|_| ConfigError::Env { var: "SIMULATED_LATENCY_MS", value: raw })?,
            Err(_) => Duration::ZERO,
        };
        Ok(Self { service_name, simulated_latency })
    }
}

#[derive(Debug, Clone, Copy)]
struct Order {
    order_id: u64,
    status: &'static str,
    amount: f64,
}

const ORDERS: [Order; 3] = [
    Order { order_id: 1001, status: "CREATED", amount: 59.99 },
    Order { order_id: 1002, status: "PAID", amount: 120.00 },
    Order { order_id: 1003, status: "SHIPPED", amount: 250.75 },
];

struct NodeInner {
    config: NodeConfig,
    fault: FaultSwitch,
}

/// Shared state of one node process.
#[derive(Clone)]
pub struct NodeState {
    inner: Arc<NodeInner>,
}

impl NodeState {
    pub fn new(config: NodeConfig) -> Self {
        Self {
            inner: Arc::new(NodeInner {
                config,
                fault: FaultSwitch::new(),
            }),
        }
    }

    pub fn service_name(&self) -> &str {
        &self.inner.config.service_name
    }

    pub fn fault(&self) -> &FaultSwitch {
        &self.inner.fault
    }

    async fn simulate_latency(&self) {
        if !self.inner.config.simulated_latency.is_zero() {
            tokio::time::sleep(self.inner.config.simulated_latency).await;
        }
    }

    /// 500 response while degraded.
    fn ensure_not_failed(&self) -> Result<(), Response> {
        match self.inner.fault.current() {
            FaultState::Normal => Ok(()),
            FaultState::Degraded { since, reason } => Err((
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "detail": {
                        "message": "Simulated failure",
                        "service": self.service_name(),
                        "since": since,
                        "reason": reason,
                    }
                })),
            )
                .into_response()),
        }
    }

    fn status_body(&self) -> Value {
        json!({
            "service": self.service_name(),
            "fault": self.inner.fault.current(),
        })
    }
}

/// Build the node's HTTP router.
pub fn router(state: NodeState) -> Router {
    Router::new()
        .route("/", get(home))
        .route("/health", get(health))
        .route("/info", get(info))
        .route("/orders/{order_id}", get(get_order))
        .route("/stimulus/status", get(stimulus_status))
        .route("/stimulus/fail", post(stimulus_fail))
        .route("/stimulus/recover", post(stimulus_recover))
        .with_state(state)
}

async fn home(State(state): State<NodeState>) -> Json<Value> {
    Json(json!({
        "message": format!("{} OK", state.service_name()),
        "try": ["/health", "/info", "/orders/1003", "/stimulus/status"],
    }))
}

async fn health(State(state): State<NodeState>) -> Response {
    state.simulate_latency().await;
    if let Err(failed) = state.ensure_not_failed() {
        return failed;
    }
    Json(json!({
        "status": "UP",
        "service": state.service_name(),
        "timestamp": Utc::now(),
    }))
    .into_response()
}

async fn info(State(state): State<NodeState>) -> Json<Value> {
    Json(json!({
        "service": state.service_name(),
        "simulated_latency_ms": state.inner.config.simulated_latency.as_millis() as u64,
        "endpoints": [
            "/",
            "/health",
            "/info",
            "/orders/{order_id}",
            "/stimulus/fail",
            "/stimulus/recover",
            "/stimulus/status",
        ],
    }))
}

async fn get_order(State(state): State<NodeState>, Path(order_id): Path<u64>) -> Response {
    state.simulate_latency().await;
    if let Err(failed) = state.ensure_not_failed() {
        return failed;
    }

    match ORDERS.iter().find(|o| o.order_id == order_id) {
        Some(order) => Json(json!({
            "order_id": order.order_id,
            "status": order.status,
            "amount": order.amount,
            "served_by": state.service_name(),
            "timestamp": Utc::now(),
        }))
        .into_response(),
        None => (StatusCode::NOT_FOUND, Json(json!({ "detail": "Order not found" }))).into_response(),
    }
}

async fn stimulus_status(State(state): State<NodeState>) -> Json<Value> {
    Json(state.status_body())
}

#[derive(Debug, Deserialize)]
struct FailParams {
    reason: Option<String>,
}

async fn stimulus_fail(State(state): State<NodeState>, Query(params): Query<FailParams>) -> Json<Value> {
    let reason = params.reason.unwrap_or_else(|| "manual".to_string());
    state.fault().arm(reason.clone());
    tracing::warn!(service = %state.service_name(), reason = %reason, "Simulated failure armed");

    let mut body = state.status_body();
    body["ok"] = Value::Bool(true);
    Json(body)
}

async fn stimulus_recover(State(state): State<NodeState>) -> Json<Value> {
    state.fault().disarm();
    tracing::info!(service = %state.service_name(), "Simulated failure cleared");

    let mut body = state.status_body();
    body["ok"] = Value::Bool(true);
    Json(body)
}
