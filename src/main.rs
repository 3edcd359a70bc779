//! Failover supervisor (v1)
//!
//! Sits in front of a redundant order-service pair and keeps clients on a
//! healthy node.
//!
//! # Architecture Overview
//!
//! ```text
//!                        ┌──────────────────────────────────────────────┐
//!                        │               FAILOVER SUPERVISOR            │
//!   Client request       │  ┌────────┐   ┌───────────────┐              │
//!   ─────────────────────┼─▶│  http  │──▶│ FailoverRouter│──────────────┼──▶ Primary
//!                        │  │ server │   │ decide+forward│              │
//!                        │  └───┬────┘   └───────┬───────┘          ┌───┼──▶ Secondary
//!                        │      │                │ record           │   │
//!                        │      │                ▼                  │   │
//!                        │      │        ┌───────────────┐          │   │
//!                        │      │        │ RequestLedger │          │   │
//!                        │      │        └───────▲───────┘          │   │
//!                        │      ▼                │ view             │   │
//!                        │  ┌─────────────┐  ┌───┴───────────┐      │   │
//!                        │  │  Stimulus   │─▶│ MetricsEngine │      │   │
//!                        │  │  Gateway    │  └───────────────┘      │   │
//!                        │  └─────────────┘                         │   │
//!                        │  ┌──────────────┐ snapshot ┌──────────┐  │   │
//!                        │  │ NodeRegistry │◀─────────│  Health  │──┘   │
//!                        │  └──────────────┘          │  Monitor │      │
//!                        │                            └──────────┘      │
//!                        └──────────────────────────────────────────────┘
//! ```

use std::path::PathBuf;
use clap::Parser;
use tokio::net::TcpListener;

use failover_supervisor::config::load_config;
use failover_supervisor::lifecycle::{signals, Shutdown};
use failover_supervisor::observability::{logging, metrics};
use failover_supervisor::SupervisorServer;

#[derive(Parser)]
#[command(name = "failover-supervisor")]
#[command(about = "Health-aware failover router for a primary/secondary pair", long_about = None)]
struct Args {
    /// Optional TOML config file; environment variables override it.
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();

    let config = match load_config(args.config.as_deref()) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("failover-supervisor: {}", e);
            std::process::exit(1);
        }
    };

    logging::init("failover_supervisor", &config.observability);
    tracing::info!("failover-supervisor v{} starting", env!("CARGO_PKG_VERSION"));
    tracing::info!(
        bind_address = %config.listener.bind_address,
        primary = %config.nodes.primary_url,
        secondary = %config.nodes.secondary_url,
        health_interval_ms = config.policy.health_interval_ms,
        request_timeout_ms = config.policy.request_timeout_ms,
        ledger_capacity = config.ledger.capacity,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(e) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                error = %e,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = SupervisorServer::new(&config)?;
    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let rx = shutdown.subscribe();
    signals::spawn_signal_listener(shutdown);

    server.run(listener, rx).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
