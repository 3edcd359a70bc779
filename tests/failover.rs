//! End-to-end failover tests against in-process nodes.

use std::net::SocketAddr;
use std::time::Duration;
use axum::http::StatusCode;
use serde_json::Value;

mod common;

#[tokio::test]
async fn test_routes_to_primary_when_healthy() {
    let a: SocketAddr = "127.0.0.1:28101".parse().unwrap();
    let b: SocketAddr = "127.0.0.1:28102".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28103".parse().unwrap();

    common::start_node(a, "Service A").await;
    common::start_node(b, "Service B").await;
    let shutdown = common::start_supervisor(common::supervisor_config(sup, &a.to_string(), &b.to_string())).await;
    let client = &common::client();

    let up = common::eventually(Duration::from_secs(3), || async move {
        common::routed_to(client, sup).await.as_deref() == Some("PRIMARY")
    })
    .await;
    assert!(up, "primary should be selected once probed healthy");

    let res = client.get(format!("http://{}/orders/1003", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(res.headers().contains_key("x-request-id"));
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["served_by"], "Service A");
    assert_eq!(body["routed_to"], "PRIMARY");
    assert_eq!(body["route_reason"], "Primary is UP (preferred)");

    let res = client.get(format!("http://{}/orders/42", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    let status: Value = client
        .get(format!("http://{}/status", sup))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["nodes"]["primary"]["up"], true);
    assert_eq!(status["nodes"]["secondary"]["up"], true);
    assert_eq!(status["last_route"], "PRIMARY");
    assert_eq!(status["log"]["size"], 2);
    assert_eq!(status["log"]["max"], 2000);

    shutdown.trigger();
}

#[tokio::test]
async fn test_failover_after_stimulus_and_metrics() {
    let a: SocketAddr = "127.0.0.1:28111".parse().unwrap();
    let b: SocketAddr = "127.0.0.1:28112".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28113".parse().unwrap();

    let primary = common::start_node(a, "Service A").await;
    common::start_node(b, "Service B").await;
    let shutdown = common::start_supervisor(common::supervisor_config(sup, &a.to_string(), &b.to_string())).await;
    let client = &common::client();

    assert!(
        common::eventually(Duration::from_secs(3), || async move {
            common::routed_to(client, sup).await.as_deref() == Some("PRIMARY")
        })
        .await
    );

    let res = client
        .post(format!("http://{}/stimulus/fail-primary?reason=power%20cut", sup))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ack: Value = res.json().await.unwrap();
    assert_eq!(ack["stimulus"]["reason"], "power cut");
    assert!(primary.fault().is_degraded());

    // Keep calling until the secondary serves.
    let served_by_secondary = common::eventually(Duration::from_secs(5), || async move {
        let res = match client.get(format!("http://{}/orders/1003", sup)).send().await {
            Ok(res) => res,
            Err(_) => return false,
        };
        let ok = res.status() == StatusCode::OK;
        let body: Value = res.json().await.unwrap_or(Value::Null);
        ok && body["routed_to"] == "SECONDARY"
    })
    .await;
    assert!(served_by_secondary);

    let res = client.get(format!("http://{}/metrics", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["stimulus"]["reason"], "power cut");
    assert!(report["Tbascule"]["tbascule_200_spare_s"].as_f64().unwrap() >= 0.0);
    assert!(!report["Tbascule"]["t_first_success_spare"].is_null());
    assert!(report["Ebascule"]["total_requests_in_window"].as_u64().unwrap() >= 1);

    let res = client
        .post(format!("http://{}/stimulus/recover-primary", sup))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    assert!(!primary.fault().is_degraded());
    assert!(
        common::eventually(Duration::from_secs(3), || async move {
            common::routed_to(client, sup).await.as_deref() == Some("PRIMARY")
        })
        .await,
        "routing should return to the recovered primary"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_no_healthy_node_is_rejected_and_logged() {
    let sup: SocketAddr = "127.0.0.1:28123".parse().unwrap();
    let shutdown = common::start_supervisor(common::supervisor_config(
        sup,
        common::DEAD_ADDR,
        "127.0.0.1:28998",
    ))
    .await;
    let client = &common::client();

    let probed = common::eventually(Duration::from_secs(3), || async move {
        let status: Value = match client.get(format!("http://{}/status", sup)).send().await {
            Ok(res) => res.json().await.unwrap_or(Value::Null),
            Err(_) => return false,
        };
        status["probe_cycle"].as_u64().unwrap_or(0) >= 1
    })
    .await;
    assert!(probed);

    let res = client.get(format!("http://{}/orders/1001", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);

    let res = client.get(format!("http://{}/health", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let health: Value = res.json().await.unwrap();
    assert_eq!(health["status"], "DOWN");

    let route: Value = client
        .get(format!("http://{}/route", sup))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert!(route["routed_to"].is_null());

    let status: Value = client
        .get(format!("http://{}/status", sup))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["log"]["size"], 1);

    shutdown.trigger();
}

#[tokio::test]
async fn test_metrics_require_stimulus_and_reset_clears_it() {
    let a: SocketAddr = "127.0.0.1:28131".parse().unwrap();
    let b: SocketAddr = "127.0.0.1:28132".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28133".parse().unwrap();

    common::start_node(a, "Service A").await;
    common::start_node(b, "Service B").await;
    let shutdown = common::start_supervisor(common::supervisor_config(sup, &a.to_string(), &b.to_string())).await;
    let client = &common::client();
    tokio::time::sleep(Duration::from_millis(300)).await;

    let res = client.get(format!("http://{}/metrics", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("fail-primary"));

    let res = client
        .get(format!("http://{}/metrics?pre_window_s=-1", sup))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);

    let res = client
        .get(format!("http://{}/metrics?post_window_s=later", sup))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body: Value = res.json().await.unwrap();
    assert!(body["detail"].as_str().unwrap().contains("post_window_s"));

    let res = client.post(format!("http://{}/stimulus/fail-primary", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let _ = client.get(format!("http://{}/orders/1001", sup)).send().await.unwrap();

    let res = client.get(format!("http://{}/metrics", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let report: Value = res.json().await.unwrap();
    assert_eq!(report["stimulus"]["reason"], "manual");

    let res = client.post(format!("http://{}/stimulus/reset-metrics", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let ack: Value = res.json().await.unwrap();
    assert_eq!(ack["had_stimulus"], true);
    assert!(ack["cleared_entries"].as_u64().unwrap() >= 1);

    let res = client.get(format!("http://{}/metrics", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);

    shutdown.trigger();
}

#[tokio::test]
async fn test_forward_timeout_returns_504() {
    let a: SocketAddr = "127.0.0.1:28141".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28143".parse().unwrap();

    common::start_programmable_backend(a, |path| async move {
        if path.starts_with("/orders") {
            tokio::time::sleep(Duration::from_secs(2)).await;
        }
        (200, r#"{"status":"UP"}"#.to_string())
    })
    .await;

    let shutdown = common::start_supervisor(common::supervisor_config(sup, &a.to_string(), common::DEAD_ADDR)).await;
    let client = &common::client();

    assert!(
        common::eventually(Duration::from_secs(3), || async move {
            common::routed_to(client, sup).await.as_deref() == Some("PRIMARY")
        })
        .await
    );

    let res = client.get(format!("http://{}/orders/1001", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::GATEWAY_TIMEOUT);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"]["routed_to"], "PRIMARY");

    shutdown.trigger();
}

#[tokio::test]
async fn test_probe_rejects_body_reporting_down() {
    let a: SocketAddr = "127.0.0.1:28151".parse().unwrap();
    let b: SocketAddr = "127.0.0.1:28152".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28153".parse().unwrap();

    common::start_programmable_backend(a, |_| async { (200, r#"{"status":"DOWN"}"#.to_string()) }).await;
    common::start_node(b, "Service B").await;
    let shutdown = common::start_supervisor(common::supervisor_config(sup, &a.to_string(), &b.to_string())).await;
    let client = &common::client();

    assert!(
        common::eventually(Duration::from_secs(3), || async move {
            common::routed_to(client, sup).await.as_deref() == Some("SECONDARY")
        })
        .await,
        "a 200 that reports DOWN must not count as healthy"
    );

    shutdown.trigger();
}

#[tokio::test]
async fn test_unreachable_primary_still_records_stimulus() {
    let b: SocketAddr = "127.0.0.1:28162".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28163".parse().unwrap();

    common::start_node(b, "Service B").await;
    let shutdown = common::start_supervisor(common::supervisor_config(sup, common::DEAD_ADDR, &b.to_string())).await;
    let client = &common::client();

    let res = client
        .post(format!("http://{}/stimulus/fail-primary?reason=cable", sup))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::SERVICE_UNAVAILABLE);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["detail"]["stimulus"]["reason"], "cable");

    let res = client.get(format!("http://{}/metrics", sup)).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    shutdown.trigger();
}

#[tokio::test]
async fn test_forward_is_recorded_after_client_disconnects() {
    let a: SocketAddr = "127.0.0.1:28171".parse().unwrap();
    let sup: SocketAddr = "127.0.0.1:28173".parse().unwrap();

    common::start_programmable_backend(a, |path| async move {
        if path.starts_with("/orders") {
            tokio::time::sleep(Duration::from_millis(400)).await;
            return (500, r#"{"detail":"Simulated failure"}"#.to_string());
        }
        (200, r#"{"status":"UP"}"#.to_string())
    })
    .await;

    let shutdown = common::start_supervisor(common::supervisor_config(sup, &a.to_string(), common::DEAD_ADDR)).await;
    let client = &common::client();

    assert!(
        common::eventually(Duration::from_secs(3), || async move {
            common::routed_to(client, sup).await.as_deref() == Some("PRIMARY")
        })
        .await
    );

    let impatient = reqwest::Client::builder()
        .timeout(Duration::from_millis(100))
        .no_proxy()
        .build()
        .unwrap();
    let res = impatient.get(format!("http://{}/orders/1001", sup)).send().await;
    assert!(res.is_err(), "client should give up before the node answers");

    tokio::time::sleep(Duration::from_millis(800)).await;
    let status: Value = client
        .get(format!("http://{}/status", sup))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(status["log"]["size"], 1);

    shutdown.trigger();
}
