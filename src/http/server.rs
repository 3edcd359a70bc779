//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Build every supervisor component from the loaded config
//! - Create the Axum router with all handlers
//! - Wire up middleware (tracing, timeout, request ID)
//! - Run the health monitor beside the server and stop both on shutdown

use std::sync::Arc;
use std::time::Duration;
use axum::{
    routing::{get, post},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::{ConfigError, SupervisorConfig};
use crate::health::HealthMonitor;
use crate::http::handlers;
use crate::http::request::{propagate_request_id_layer, set_request_id_layer};
use crate::http::upstream::UpstreamClient;
use crate::ledger::RequestLedger;
use crate::lifecycle::shutdown;
use crate::registry::{NodeRegistry, NodeRole};
use crate::resilience::MetricsEngine;
use crate::routing::{FailoverRouter, RoutingPolicy};
use crate::stimulus::StimulusGateway;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<NodeRegistry>,
    pub ledger: Arc<RequestLedger>,
    pub router: Arc<FailoverRouter>,
    pub stimulus: Arc<StimulusGateway>,
    pub metrics: MetricsEngine,
}

/// The supervisor's HTTP service.
pub struct SupervisorServer {
    router: Router,
    state: AppState,
    client: UpstreamClient,
    policy: RoutingPolicy,
}

impl SupervisorServer {
    /// Create the server and its components. Nothing runs until `run`.
    pub fn new(config: &SupervisorConfig) -> Result<Self, ConfigError> {
        let policy = RoutingPolicy::from(&config.policy);
        let registry = Arc::new(NodeRegistry::from_config(&config.nodes)?);
        let ledger = Arc::new(RequestLedger::new(config.ledger.capacity));
        let client = UpstreamClient::new();

        let router = Arc::new(FailoverRouter::new(
            registry.clone(),
            ledger.clone(),
            client.clone(),
            policy.clone(),
        ));
        let stimulus = Arc::new(StimulusGateway::new(
            registry.clone(),
            ledger.clone(),
            client.clone(),
            policy.request_timeout,
        ));
        let metrics = MetricsEngine::new(stimulus.clone());

        let state = AppState {
            registry,
            ledger,
            router,
            stimulus,
            metrics,
        };

        let router = Self::build_router(&policy, state.clone());
        Ok(Self {
            router,
            state,
            client,
            policy,
        })
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(policy: &RoutingPolicy, state: AppState) -> Router {
        // Stimulus calls and forwards are each bounded by request_timeout;
        // this only catches a handler that never finishes.
        let handler_timeout = policy.request_timeout.saturating_mul(3).max(Duration::from_secs(1));

        Router::new()
            .route("/", get(handlers::index))
            .route("/status", get(handlers::status))
            .route("/route", get(handlers::route))
            .route("/health", get(handlers::health))
            .route("/orders/{order_id}", get(handlers::get_order))
            .route("/stimulus/fail-primary", post(handlers::fail_primary))
            .route("/stimulus/recover-primary", post(handlers::recover_primary))
            .route("/stimulus/reset-metrics", post(handlers::reset_metrics))
            .route("/metrics", get(handlers::metrics))
            .with_state(state)
            .layer(TimeoutLayer::new(handler_timeout))
            .layer(propagate_request_id_layer())
            .layer(TraceLayer::new_for_http())
            .layer(set_request_id_layer())
    }

    /// Shared components, for embedding and tests.
    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Spawn the health monitor, then serve until `shutdown` fires.
    pub async fn run(
        self,
        listener: TcpListener,
        shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(
            address = %addr,
            primary = %self.state.registry.node(NodeRole::Primary).address(),
            secondary = %self.state.registry.node(NodeRole::Secondary).address(),
            prefer_primary = self.policy.prefer_primary,
            "Supervisor starting"
        );

        let monitor = HealthMonitor::new(self.state.registry.clone(), self.client.clone(), &self.policy);
        let monitor_handle = tokio::spawn(monitor.run(shutdown.resubscribe()));

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown::wait(shutdown))
            .await?;

        if let Err(e) = monitor_handle.await {
            tracing::error!(error = %e, "Health monitor task failed");
        }
        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
