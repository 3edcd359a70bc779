//! Prometheus metrics.
//!
//! # Metrics
//! - `supervisor_requests_total` (counter): routed requests by node, status
//! - `supervisor_request_duration_seconds` (histogram): forwarding latency by node
//! - `supervisor_node_health` (gauge): 1=healthy, 0=unhealthy
//! - `supervisor_failovers_total` (counter): routing target switches
//! - `supervisor_stimuli_total` (counter): "fail primary" stimuli issued
//!
//! These are operational counters only. The resilience report served on
//! `/metrics` is computed from the request ledger, not from here.

use std::net::SocketAddr;
use std::time::Duration;
use metrics::{counter, gauge, histogram};
use metrics_exporter_prometheus::PrometheusBuilder;

use crate::registry::NodeRole;

/// Install the global recorder and serve it on `addr`.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Prometheus exporter listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install Prometheus exporter"),
    }
}

pub fn record_request(node: &'static str, status: u16, latency: Duration) {
    counter!("supervisor_requests_total", "node" => node, "status" => status.to_string()).increment(1);
    histogram!("supervisor_request_duration_seconds", "node" => node).record(latency.as_secs_f64());
}

pub fn record_node_health(node: NodeRole, healthy: bool) {
    gauge!("supervisor_node_health", "node" => node.as_str()).set(if healthy { 1.0 } else { 0.0 });
}

pub fn record_failover(from: NodeRole, to: NodeRole) {
    counter!("supervisor_failovers_total", "from" => from.as_str(), "to" => to.as_str()).increment(1);
}

pub fn record_stimulus() {
    counter!("supervisor_stimuli_total").increment(1);
}
