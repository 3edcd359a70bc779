//! Active health checking.
//!
//! # Responsibilities
//! - Periodically probe both nodes
//! - Publish each cycle's results to the registry as one snapshot

use std::sync::Arc;
use std::time::Duration;
use chrono::Utc;
use serde_json::Value;
use tokio::sync::broadcast;
use tokio::time::{self, MissedTickBehavior};

use crate::http::upstream::{UpstreamClient, UpstreamError, UpstreamResponse};
use crate::observability::metrics;
use crate::registry::{HealthState, Node, NodeRegistry, NodeRole, ProbeResult, Transition};
use crate::routing::RoutingPolicy;

pub struct HealthMonitor {
    registry: Arc<NodeRegistry>,
    client: UpstreamClient,
    interval: Duration,
    timeout: Duration,
    path: String,
}

impl HealthMonitor {
    pub fn new(registry: Arc<NodeRegistry>, client: UpstreamClient, policy: &RoutingPolicy) -> Self {
        Self {
            registry,
            client,
            interval: policy.health_probe_interval,
            timeout: policy.request_timeout,
            path: policy.health_path.clone(),
        }
    }

    /// Probe forever, until the shutdown signal fires.
    pub async fn run(self, mut shutdown: broadcast::Receiver<()>) {
        tracing::info!(
            interval_ms = self.interval.as_millis() as u64,
            timeout_ms = self.timeout.as_millis() as u64,
            path = %self.path,
            "Health monitor starting"
        );

        let mut ticker = time::interval(self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            // The in-flight cycle is part of the select, so shutdown drops it.
            tokio::select! {
                _ = shutdown.recv() => {
                    tracing::info!("Health monitor received shutdown signal, exiting loop");
                    break;
                }
                _ = async {
                    ticker.tick().await;
                    self.check_all().await
                } => {}
            }
        }
    }

    /// Run one probe cycle and publish it.
    pub async fn check_all(&self) -> Vec<Transition> {
        // Probes run concurrently so a slow node cannot delay the other's result.
        let (primary, secondary) = tokio::join!(
            self.probe(self.registry.node(NodeRole::Primary)),
            self.probe(self.registry.node(NodeRole::Secondary)),
        );

        let transitions = self.registry.record_cycle(&[primary, secondary], Utc::now());
        for t in &transitions {
            match t.to {
                HealthState::Healthy => {
                    tracing::info!(node = %t.role, from = ?t.from, "Node is healthy");
                }
                _ => {
                    tracing::warn!(node = %t.role, from = ?t.from, "Node marked unhealthy");
                }
            }
        }

        for result in [primary, secondary] {
            metrics::record_node_health(result.role, result.healthy);
        }
        transitions
    }

    async fn probe(&self, node: &Node) -> ProbeResult {
        let url = node.endpoint(&self.path);

        let healthy = match self.client.get(&url, None, self.timeout).await {
            Ok(response) => {
                let up = is_up(&response);
                if !up {
                    tracing::warn!(node = %node.role, status = %response.status, "Health check failed: node reports failure");
                }
                up
            }
            Err(UpstreamError::Timeout(_)) => {
                tracing::warn!(node = %node.role, url = %url, "Health check failed: timeout");
                false
            }
            Err(e) => {
                tracing::warn!(node = %node.role, url = %url, error = %e, "Health check failed: connection error");
                false
            }
        };

        ProbeResult {
            role: node.role,
            healthy,
            observed_at: Utc::now(),
        }
    }
}

/// A probe succeeds on a 2xx answer whose JSON `status`, when present, is `UP`.
pub fn is_up(response: &UpstreamResponse) -> bool {
    if !response.status.is_success() {
        return false;
    }
    match response.json() {
        Some(Value::Object(body)) => match body.get("status") {
            Some(Value::String(status)) => status.eq_ignore_ascii_case("UP"),
            Some(_) => false,
            None => true,
        },
        _ => true,
    }
}
