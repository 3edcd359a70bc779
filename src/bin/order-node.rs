//! Backend order node.
//!
//! Env: `SERVICE_NAME`, `BIND_ADDRESS` (default `0.0.0.0:8000`),
//! `SIMULATED_LATENCY_MS`, `RUST_LOG`.

use tokio::net::TcpListener;

use failover_supervisor::config::ObservabilityConfig;
use failover_supervisor::lifecycle::{shutdown, signals, Shutdown};
use failover_supervisor::node::{router, NodeConfig, NodeState};
use failover_supervisor::observability::logging;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    logging::init("failover_supervisor", &ObservabilityConfig::default());

    let config = match NodeConfig::from_env() {
        Ok(config) => config,
        Err(e) => {
            eprintln!("order-node: {}", e);
            std::process::exit(1);
        }
    };
    let bind_address = std::env::var("BIND_ADDRESS").unwrap_or_else(|_| "0.0.0.0:8000".to_string());

    let listener = TcpListener::bind(&bind_address).await?;
    tracing::info!(
        service = %config.service_name,
        address = %listener.local_addr()?,
        simulated_latency_ms = config.simulated_latency.as_millis() as u64,
        "Order node listening"
    );

    let shutdown_coordinator = Shutdown::new();
    let rx = shutdown_coordinator.subscribe();
    signals::spawn_signal_listener(shutdown_coordinator);

    axum::serve(listener, router(NodeState::new(config)))
        .with_graceful_shutdown(shutdown::wait(rx))
        .await?;

    tracing::info!("Order node stopped");
    Ok(())
}
