//! Failover router.
//!
//! # Responsibilities
//! - Decide the target node from the latest health snapshot
//! - Forward one business call with the configured deadline
//! - Record every outcome (including "no healthy node") in the ledger
//!
//! # Design Decisions
//! - Single attempt per request; no retry against the other node
//! - A failed forward does not trigger a re-probe; the next scheduled
//!   health cycle is what changes routing
//! - Target switches are logged and counted as failovers
//! - HTTP handlers go through `spawn_route`, so a client hanging up cannot
//!   cancel a forward before its outcome reaches the ledger

use std::sync::Arc;
use std::time::Instant;
use axum::http::StatusCode;
use parking_lot::Mutex;
use tokio::task::JoinHandle;

use crate::http::upstream::{UpstreamClient, UpstreamError, UpstreamResponse};
use crate::ledger::{LedgerEntry, LedgerStatus, Outcome, RequestLedger};
use crate::observability::metrics;
use crate::registry::{NodeRegistry, NodeRole};
use crate::routing::policy::{decide, Decision, NoHealthyNode, RoutingPolicy};

/// Per-request data the router needs.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    /// Path (and query) forwarded verbatim to the chosen node.
    pub path: String,
    pub request_id: Option<String>,
}

impl RequestContext {
    pub fn new(path: impl Into<String>) -> Self {
        Self { path: path.into(), request_id: None }
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

/// Result of a routed call that reached the forwarding stage.
#[derive(Debug)]
pub struct Routed {
    pub decision: Decision,
    /// The node's response, or why there was none.
    pub result: Result<UpstreamResponse, UpstreamError>,
    /// The ledger entry written for this call.
    pub entry: LedgerEntry,
}

/// Routes business calls to the preferred healthy node.
#[derive(Debug)]
pub struct FailoverRouter {
    registry: Arc<NodeRegistry>,
    ledger: Arc<RequestLedger>,
    client: UpstreamClient,
    policy: RoutingPolicy,
    /// Target of the most recent forward, for failover detection.
    last_target: Mutex<Option<NodeRole>>,
    /// Decision behind the most recent successful call.
    last_route: Mutex<Option<Decision>>,
}

impl FailoverRouter {
    pub fn new(
        registry: Arc<NodeRegistry>,
        ledger: Arc<RequestLedger>,
        client: UpstreamClient,
        policy: RoutingPolicy,
    ) -> Self {
        Self {
            registry,
            ledger,
            client,
            policy,
            last_target: Mutex::new(None),
            last_route: Mutex::new(None),
        }
    }

    pub fn policy(&self) -> &RoutingPolicy {
        &self.policy
    }

    /// The decision a request arriving now would get. No ledger side effect.
    pub fn current_decision(&self) -> Result<Decision, NoHealthyNode> {
        decide(&self.registry.snapshot(), &self.policy)
    }

    pub fn last_route(&self) -> Option<Decision> {
        *self.last_route.lock()
    }

    /// Route one business call on its own task.
    ///
    /// The forward and its ledger write complete even if the returned handle
    /// is dropped.
    pub fn spawn_route(self: &Arc<Self>, ctx: RequestContext) -> JoinHandle<Result<Routed, NoHealthyNode>> {
        let router = Arc::clone(self);
        tokio::spawn(async move { router.route(&ctx).await })
    }

    /// Route one business call.
    pub async fn route(&self, ctx: &RequestContext) -> Result<Routed, NoHealthyNode> {
        let start = Instant::now();
        let snapshot = self.registry.snapshot();

        let decision = match decide(&snapshot, &self.policy) {
            Ok(decision) => decision,
            Err(e) => {
                tracing::warn!(
                    request_id = ?ctx.request_id,
                    path = %ctx.path,
                    cycle = snapshot.cycle,
                    "No healthy node; rejecting request"
                );
                let outcome = Outcome::new(None, LedgerStatus::NoHealthyNode, start.elapsed())
                    .with_path(&ctx.path)
                    .with_note("no_healthy_node");
                self.ledger.record(outcome);
                metrics::record_request("none", LedgerStatus::NoHealthyNode.code(), start.elapsed());
                return Err(e);
            }
        };

        self.note_target(decision.role);
        let node = self.registry.node(decision.role);
        let url = node.endpoint(&ctx.path);

        tracing::debug!(
            request_id = ?ctx.request_id,
            node = %decision.role,
            url = %url,
            reason = decision.reason,
            "Forwarding request"
        );

        let result = self
            .client
            .get(&url, ctx.request_id.as_deref(), self.policy.request_timeout)
            .await;
        let latency = start.elapsed();

        let (status, note) = classify(&result);
        let mut outcome = Outcome::new(Some(decision.role), status, latency).with_path(&ctx.path);
        if let Some(note) = note {
            outcome = outcome.with_note(note);
        }
        let entry = self.ledger.record(outcome);

        match &result {
            Ok(_) if entry.is_success() => {
                *self.last_route.lock() = Some(decision);
            }
            Ok(response) => {
                tracing::warn!(
                    request_id = ?ctx.request_id,
                    node = %decision.role,
                    status = %response.status,
                    "Node answered with an error"
                );
            }
            Err(e) => {
                tracing::warn!(
                    request_id = ?ctx.request_id,
                    node = %decision.role,
                    error = %e,
                    "Forwarding failed"
                );
            }
        }
        metrics::record_request(decision.role.as_str(), status.code(), latency);

        Ok(Routed { decision, result, entry })
    }

    fn note_target(&self, role: NodeRole) {
        let previous = self.last_target.lock().replace(role);
        if let Some(from) = previous.filter(|from| *from != role) {
            tracing::info!(from = %from, to = %role, "Routing switched");
            metrics::record_failover(from, role);
        }
    }
}

fn classify(result: &Result<UpstreamResponse, UpstreamError>) -> (LedgerStatus, Option<&'static str>) {
    match result {
        Ok(r) if r.status.is_success() => (LedgerStatus::Http(r.status.as_u16()), None),
        Ok(r) if r.status == StatusCode::NOT_FOUND => (LedgerStatus::Http(404), Some("not_found")),
        Ok(r) => (LedgerStatus::Http(r.status.as_u16()), Some("backend_error")),
        Err(UpstreamError::Timeout(_)) => (LedgerStatus::Timeout, Some("timeout")),
        Err(_) => (LedgerStatus::Unreachable, Some("unreachable")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use url::Url;
    use crate::registry::Node;

    fn router() -> (FailoverRouter, Arc<NodeRegistry>, Arc<RequestLedger>) {
        let registry = Arc::new(NodeRegistry::new(
            Node::new(NodeRole::Primary, Url::parse("http://127.0.0.1:9").unwrap()),
            Node::new(NodeRole::Secondary, Url::parse("http://127.0.0.1:9").unwrap()),
        ));
        let ledger = Arc::new(RequestLedger::new(100));
        let router = FailoverRouter::new(
            registry.clone(),
            ledger.clone(),
            UpstreamClient::new(),
            RoutingPolicy::default(),
        );
        (router, registry, ledger)
    }

    #[tokio::test]
    async fn test_no_healthy_node_is_recorded() {
        let (router, _registry, ledger) = router();

        let err = router.route(&RequestContext::new("/orders/1003")).await.unwrap_err();
        assert_eq!(err, NoHealthyNode);

        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].status, LedgerStatus::NoHealthyNode);
        assert_eq!(entries[0].target, None);
        assert_eq!(entries[0].path, "/orders/1003");
        assert_eq!(entries[0].note, Some("no_healthy_node"));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_recorded_without_retry() {
        let (router, registry, ledger) = router();
        registry.set_health(NodeRole::Primary, true, Utc::now());
        registry.set_health(NodeRole::Secondary, true, Utc::now());

        let routed = router.route(&RequestContext::new("/orders/1")).await.unwrap();
        assert_eq!(routed.decision.role, NodeRole::Primary);
        assert!(routed.result.is_err());
        assert_eq!(routed.entry.status, LedgerStatus::Unreachable);

        // One attempt, one entry; the secondary is not tried.
        assert_eq!(ledger.len(), 1);
        assert!(router.last_route().is_none());
    }

    #[tokio::test]
    async fn test_spawned_route_is_recorded_when_handle_is_dropped() {
        let (router, registry, ledger) = router();
        registry.set_health(NodeRole::Primary, true, Utc::now());
        let router = Arc::new(router);

        drop(router.spawn_route(RequestContext::new("/orders/1001")));

        let deadline = Instant::now() + std::time::Duration::from_secs(2);
        while ledger.is_empty() && Instant::now() < deadline {
            tokio::time::sleep(std::time::Duration::from_millis(10)).await;
        }
        let entries = ledger.entries();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].target, Some(NodeRole::Primary));
        assert_eq!(entries[0].status, LedgerStatus::Unreachable);
    }

    #[test]
    fn test_current_decision_has_no_side_effects() {
        let (router, registry, ledger) = router();
        assert_eq!(router.current_decision(), Err(NoHealthyNode));
        registry.set_health(NodeRole::Secondary, true, Utc::now());
        assert_eq!(router.current_decision().unwrap().role, NodeRole::Secondary);
        assert!(ledger.is_empty());
    }
}
