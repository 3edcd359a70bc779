//! Supervisor endpoint handlers.
//!
//! # Endpoints
//! ```text
//! GET  /                         → endpoint index
//! GET  /status                   → nodes, policy, decision, stimulus, ledger size
//! GET  /route                    → decision a request would get now
//! GET  /health                   → UP if any node is healthy, else 503 DOWN
//! GET  /orders/{order_id}        → routed business call
//! POST /stimulus/fail-primary    → record t_panne, arm primary fault (?reason=)
//! POST /stimulus/recover-primary → disarm primary fault
//! POST /stimulus/reset-metrics   → clear stimulus and ledger
//! GET  /metrics                  → resilience report (?pre_window_s=&post_window_s=)
//! ```

use axum::{
    extract::{Path, Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::http::request::request_id;
use crate::http::response::{error_response, forward_failure, node_error};
use crate::http::server::AppState;
use crate::registry::NodeRole;
use crate::resilience::{MetricsWindow, ResilienceReport};
use crate::routing::{Decision, NoHealthyNode, RequestContext, Routed};

fn decision_body(state: &AppState, decision: Result<Decision, NoHealthyNode>) -> Value {
    match decision {
        Ok(d) => json!({
            "target": state.registry.node(d.role).address(),
            "routed_to": d.role,
            "reason": d.reason,
        }),
        Err(e) => json!({
            "target": null,
            "routed_to": null,
            "reason": e.to_string(),
        }),
    }
}

fn policy_body(state: &AppState) -> Value {
    let policy = state.router.policy();
    json!({
        "prefer_primary": policy.prefer_primary,
        "health_interval_seconds": policy.health_probe_interval.as_secs_f64(),
        "request_timeout_seconds": policy.request_timeout.as_secs_f64(),
        "health_path": policy.health_path,
    })
}

fn ledger_body(state: &AppState) -> Value {
    json!({
        "size": state.ledger.len(),
        "max": state.ledger.capacity(),
    })
}

pub async fn index() -> Json<Value> {
    Json(json!({
        "service": "failover-supervisor",
        "endpoints": [
            "/status",
            "/route",
            "/health",
            "/orders/{order_id}",
            "/stimulus/fail-primary",
            "/stimulus/recover-primary",
            "/stimulus/reset-metrics",
            "/metrics",
        ],
    }))
}

pub async fn status(State(state): State<AppState>) -> Json<Value> {
    let snapshot = state.registry.snapshot();
    let nodes: serde_json::Map<String, Value> = state
        .registry
        .nodes()
        .iter()
        .map(|node| {
            let health = snapshot.health(node.role);
            (
                node.role.as_str().to_lowercase(),
                json!({
                    "url": node.address(),
                    "up": health.is_healthy(),
                    "state": health.state,
                    "last_probe": health.last_probe,
                }),
            )
        })
        .collect();
    let last = state.router.last_route();

    Json(json!({
        "nodes": nodes,
        "policy": policy_body(&state),
        "current_decision": decision_body(&state, state.router.current_decision()),
        "last_route": last.map(|d| d.role),
        "last_route_reason": last.map(|d| d.reason),
        "last_check_ts": snapshot.last_cycle_at,
        "probe_cycle": snapshot.cycle,
        "stimulus": state.stimulus.current(),
        "log": ledger_body(&state),
    }))
}

pub async fn route(State(state): State<AppState>) -> Json<Value> {
    Json(decision_body(&state, state.router.current_decision()))
}

pub async fn health(State(state): State<AppState>) -> Response {
    let snapshot = state.registry.snapshot();
    let up = snapshot.any_healthy();
    let last = state.router.last_route();
    let body = json!({
        "status": if up { "UP" } else { "DOWN" },
        "primary_up": snapshot.is_healthy(NodeRole::Primary),
        "secondary_up": snapshot.is_healthy(NodeRole::Secondary),
        "policy": policy_body(&state),
        "last_check_ts": snapshot.last_cycle_at,
        "last_route": last.map(|d| d.role),
        "last_route_reason": last.map(|d| d.reason),
    });
    let status = if up { StatusCode::OK } else { StatusCode::SERVICE_UNAVAILABLE };
    (status, Json(body)).into_response()
}

pub async fn get_order(
    State(state): State<AppState>,
    Path(order_id): Path<u64>,
    headers: HeaderMap,
) -> Response {
    let mut ctx = RequestContext::new(format!("/orders/{}", order_id));
    if let Some(id) = request_id(&headers) {
        ctx = ctx.with_request_id(id);
    }

    let Routed { decision, result, .. } = match state.router.spawn_route(ctx).await {
        Ok(Ok(routed)) => routed,
        Ok(Err(e)) => return e.into_response(),
        Err(e) => {
            tracing::error!(order_id, error = %e, "Routing task failed");
            return error_response(StatusCode::INTERNAL_SERVER_ERROR, "Routing task failed");
        }
    };

    match result {
        Ok(response) if response.status.is_success() => match response.json() {
            Some(Value::Object(mut body)) => {
                body.insert("routed_to".into(), json!(decision.role));
                body.insert("route_reason".into(), json!(decision.reason));
                (response.status, Json(Value::Object(body))).into_response()
            }
            _ => (response.status, response.body).into_response(),
        },
        Ok(response) => node_error(&response, decision.role),
        Err(e) => forward_failure(&e, decision.role),
    }
}

#[derive(Debug, Deserialize)]
pub struct StimulusParams {
    reason: Option<String>,
}

pub async fn fail_primary(
    State(state): State<AppState>,
    Query(params): Query<StimulusParams>,
) -> Response {
    let reason = params.reason.unwrap_or_else(|| "manual".to_string());
    match state.stimulus.fail_primary(&reason).await {
        Ok(ack) => Json(json!({
            "ok": true,
            "stimulus": ack.record,
            "primary_response": ack.primary_response,
            "next": "Call /orders/{order_id} repeatedly, then read /metrics",
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn recover_primary(State(state): State<AppState>) -> Response {
    match state.stimulus.recover_primary().await {
        Ok(ack) => Json(json!({
            "ok": true,
            "primary_response": ack.primary_response,
        }))
        .into_response(),
        Err(e) => e.into_response(),
    }
}

pub async fn reset_metrics(State(state): State<AppState>) -> Json<Value> {
    let ack = state.stimulus.reset_metrics();
    Json(json!({
        "ok": true,
        "cleared_entries": ack.cleared_entries,
        "had_stimulus": ack.had_stimulus,
    }))
}

/// Window bounds arrive as raw strings so bad numbers get a JSON 422.
#[derive(Debug, Deserialize)]
pub struct MetricsParams {
    pre_window_s: Option<String>,
    post_window_s: Option<String>,
}

fn window_bound(raw: Option<&str>, default: f64) -> Option<f64> {
    match raw {
        Some(raw) => raw.trim().parse().ok(),
        None => Some(default),
    }
}

#[derive(Serialize)]
struct MetricsBody {
    #[serde(flatten)]
    report: ResilienceReport,
    log: Value,
}

pub async fn metrics(
    State(state): State<AppState>,
    Query(params): Query<MetricsParams>,
) -> Response {
    let defaults = MetricsWindow::default();
    let pre = window_bound(params.pre_window_s.as_deref(), defaults.pre.as_secs_f64());
    let post = window_bound(params.post_window_s.as_deref(), defaults.post.as_secs_f64());
    let window = match (pre, post) {
        (Some(pre), Some(post)) => MetricsWindow::from_secs(pre, post),
        _ => None,
    };
    let Some(window) = window else {
        return error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "pre_window_s and post_window_s must be finite numbers >= 0",
        );
    };

    match state.metrics.evaluate(window) {
        Ok(report) => Json(MetricsBody { report, log: ledger_body(&state) }).into_response(),
        Err(e) => e.into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_window_bound_parsing() {
        assert_eq!(window_bound(None, 2.0), Some(2.0));
        assert_eq!(window_bound(Some(" 1.5 "), 2.0), Some(1.5));
        assert_eq!(window_bound(Some("soon"), 2.0), None);
        assert_eq!(window_bound(Some(""), 2.0), None);
    }
}
