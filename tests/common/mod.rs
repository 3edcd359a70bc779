//! Shared utilities for integration testing.

#![allow(dead_code)]

use std::net::SocketAddr;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpListener;

use failover_supervisor::config::SupervisorConfig;
use failover_supervisor::lifecycle::Shutdown;
use failover_supervisor::node::{router, NodeConfig, NodeState};
use failover_supervisor::SupervisorServer;

/// An address nothing listens on.
pub const DEAD_ADDR: &str = "127.0.0.1:28999";

/// Start an in-process order node. The returned state controls its fault.
pub async fn start_node(addr: SocketAddr, name: &str) -> NodeState {
    let listener = TcpListener::bind(addr).await.unwrap();
    let state = NodeState::new(NodeConfig::new(name));
    let app = router(state.clone());
    tokio::spawn(async move {
        let _ = axum::serve(listener, app).await;
    });
    state
}

/// Start a programmable raw-TCP backend. `f` gets the request path and
/// returns status and body.
pub async fn start_programmable_backend<F, Fut>(addr: SocketAddr, f: F)
where
    F: Fn(String) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = (u16, String)> + Send + 'static,
{
    let listener = TcpListener::bind(addr).await.unwrap();
    let f = Arc::new(f);

    tokio::spawn(async move {
        loop {
            match listener.accept().await {
                Ok((mut socket, _)) => {
                    let f = f.clone();
                    tokio::spawn(async move {
                        let path = match read_request_path(&mut socket).await {
                            Some(path) => path,
                            None => return,
                        };
                        let (status, body) = f(path).await;
                        let status_text = match status {
                            200 => "200 OK",
                            404 => "404 Not Found",
                            500 => "500 Internal Server Error",
                            503 => "503 Service Unavailable",
                            _ => "200 OK",
                        };

                        let response_str = format!(
                            "HTTP/1.1 {}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{}",
                            status_text,
                            body.len(),
                            body
                        );
                        let _ = socket.write_all(response_str.as_bytes()).await;
                        let _ = socket.shutdown().await;
                    });
                }
                Err(_) => break,
            }
        }
    });
}

async fn read_request_path(socket: &mut tokio::net::TcpStream) -> Option<String> {
    let mut buf = Vec::with_capacity(1024);
    let mut chunk = [0u8; 1024];
    while !buf.windows(4).any(|w| w == b"\r\n\r\n") {
        let n = socket.read(&mut chunk).await.ok()?;
        if n == 0 {
            return None;
        }
        buf.extend_from_slice(&chunk[..n]);
    }
    let head = String::from_utf8_lossy(&buf);
    head.lines()
        .next()
        .and_then(|line| line.split_whitespace().nth(1))
        .map(str::to_owned)
}

/// Supervisor config with fast probes, pointed at the given nodes.
pub fn supervisor_config(addr: SocketAddr, primary: &str, secondary: &str) -> SupervisorConfig {
    let mut config = SupervisorConfig::default();
    config.listener.bind_address = addr.to_string();
    config.nodes.primary_url = format!("http://{}", primary);
    config.nodes.secondary_url = format!("http://{}", secondary);
    config.policy.health_interval_ms = 100;
    config.policy.request_timeout_ms = 500;
    config
}

/// Start a supervisor. Trigger the returned coordinator to stop it.
pub async fn start_supervisor(config: SupervisorConfig) -> Shutdown {
    let shutdown = Shutdown::new();
    let server = SupervisorServer::new(&config).unwrap();
    let listener = TcpListener::bind(&config.listener.bind_address).await.unwrap();
    let rx = shutdown.subscribe();
    tokio::spawn(async move {
        let _ = server.run(listener, rx).await;
    });
    shutdown
}

pub fn client() -> reqwest::Client {
    reqwest::Client::builder()
        .pool_max_idle_per_host(0)
        .no_proxy()
        .build()
        .unwrap()
}

/// Poll `check` until it holds or `timeout` passes.
pub async fn eventually<F, Fut>(timeout: Duration, mut check: F) -> bool
where
    F: FnMut() -> Fut,
    Fut: Future<Output = bool>,
{
    let deadline = tokio::time::Instant::now() + timeout;
    while tokio::time::Instant::now() < deadline {
        if check().await {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(50)).await;
    }
    false
}

/// `routed_to` of `GET /route`, if any node is selectable.
pub async fn routed_to(client: &reqwest::Client, supervisor: SocketAddr) -> Option<String> {
    let body: serde_json::Value = client
        .get(format!("http://{}/route", supervisor))
        .send()
        .await
        .ok()?
        .json()
        .await
        .ok()?;
    body["routed_to"].as_str().map(str::to_owned)
}
