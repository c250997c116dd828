//! End-to-end forwarding through a live gateway.

use std::time::{Duration, Instant};
use axum::http::StatusCode;
use serde_json::json;

use msa_gateway::config::{RouteConfig, ServiceConfig};
use msa_gateway::discovery::ServiceStatus;

mod common;

use common::{client, closed_port, gateway_config, json_body, spawn_gateway, start_echo_backend};

#[tokio::test]
async fn forwards_method_path_query_and_body() {
    let backend = start_echo_backend(StatusCode::OK).await;
    let gateway = spawn_gateway(gateway_config(
        vec![ServiceConfig::new("user-service", backend.url())],
        vec![RouteConfig::new("/api/users", "user-service")],
    ))
    .await;

    let res = client()
        .post(gateway.url("/api/users/42?expand=orders&page=2"))
        .header("x-custom", "kept")
        .body("hello backend")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    assert!(res.headers().contains_key("x-request-id"));
    let echo = json_body(res).await;
    assert_eq!(echo["method"], "POST");
    assert_eq!(echo["path"], "/api/users/42");
    assert_eq!(echo["query"], "expand=orders&page=2");
    assert_eq!(echo["body"], "hello backend");
    assert_eq!(echo["headers"]["x-custom"], "kept");
    // Host is rewritten to the backend, and the request ID travels along.
    assert_ne!(echo["headers"]["host"], gateway.addr.to_string());
    assert!(echo["headers"]["x-request-id"].is_string());
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn client_request_id_is_preserved() {
    let backend = start_echo_backend(StatusCode::OK).await;
    let gateway = spawn_gateway(gateway_config(
        vec![ServiceConfig::new("user-service", backend.url())],
        vec![RouteConfig::new("/users", "user-service")],
    ))
    .await;

    let res = client()
        .get(gateway.url("/users"))
        .header("x-request-id", "trace-me-123")
        .send()
        .await
        .unwrap();

    assert_eq!(res.headers()["x-request-id"], "trace-me-123");
    let echo = json_body(res).await;
    assert_eq!(echo["headers"]["x-request-id"], "trace-me-123");
}

#[tokio::test]
async fn unknown_path_is_404() {
    let gateway = spawn_gateway(gateway_config(vec![], vec![RouteConfig::new("/api", "api")])).await;

    let res = client().get(gateway.url("/static/logo.png")).send().await.unwrap();

    assert_eq!(res.status(), 404);
    let body = json_body(res).await;
    assert_eq!(body["error"], "not_found");
    assert!(body["detail"].as_str().unwrap().contains("/static/logo.png"));
}

#[tokio::test]
async fn route_to_unregistered_service_is_404() {
    let gateway = spawn_gateway(gateway_config(vec![], vec![RouteConfig::new("/api/ghosts", "ghost-service")])).await;

    let res = client().get(gateway.url("/api/ghosts/1")).send().await.unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(json_body(res).await["error"], "not_found");
}

#[tokio::test]
async fn unhealthy_service_is_never_forwarded() {
    let backend = start_echo_backend(StatusCode::INTERNAL_SERVER_ERROR).await;
    let gateway = spawn_gateway(gateway_config(
        vec![ServiceConfig::new("order-service", backend.url())],
        vec![RouteConfig::new("/api/orders", "order-service")],
    ))
    .await;

    let res = client()
        .post(gateway.url("/api/orders"))
        .body("{\"item\": 1}")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 503);
    assert_eq!(json_body(res).await["error"], "service_unavailable");
    assert_eq!(backend.hits(), 0);
    assert_eq!(
        gateway.state.registry.get("order-service").unwrap().status,
        ServiceStatus::Unhealthy
    );
}

#[tokio::test]
async fn closed_port_is_503() {
    let gateway = spawn_gateway(gateway_config(
        vec![ServiceConfig::new("order-service", closed_port().await)],
        vec![RouteConfig::new("/api/orders", "order-service")],
    ))
    .await;

    let res = client().get(gateway.url("/api/orders")).send().await.unwrap();

    assert_eq!(res.status(), 503);
}

#[tokio::test]
async fn upstream_error_status_is_relayed() {
    let base = common::start_programmable_backend(|path| async move {
        if path == "/health" {
            (200, "text/plain", "ok".to_string())
        } else {
            (404, "text/plain", "no such order".to_string())
        }
    })
    .await;
    let gateway = spawn_gateway(gateway_config(
        vec![ServiceConfig::new("order-service", base)],
        vec![RouteConfig::new("/api/orders", "order-service")],
    ))
    .await;

    let res = client().get(gateway.url("/api/orders/999")).send().await.unwrap();

    assert_eq!(res.status(), 404);
    assert_eq!(res.text().await.unwrap(), "no such order");
}

#[tokio::test]
async fn longest_prefix_selects_the_service() {
    let general = start_echo_backend(StatusCode::OK).await;
    let users = start_echo_backend(StatusCode::OK).await;
    let gateway = spawn_gateway(gateway_config(
        vec![
            ServiceConfig::new("general", general.url()),
            ServiceConfig::new("users", users.url()),
        ],
        vec![
            RouteConfig::new("/api", "general"),
            RouteConfig::new("/api/users", "users"),
        ],
    ))
    .await;
    let client = client();

    client.get(gateway.url("/api/users/1")).send().await.unwrap();
    client.get(gateway.url("/api/orders/1")).send().await.unwrap();

    assert_eq!(users.hits(), 1);
    assert_eq!(general.hits(), 1);
}

#[tokio::test]
async fn json_bodies_are_opaque_unless_normalization_is_enabled() {
    let pretty = "{\n  \"id\" : 7,\n  \"name\" : \"widget\"\n}";
    let base = common::start_programmable_backend(move |_| async move {
        (200, "application/json", pretty.to_string())
    })
    .await;

    let mut config = gateway_config(
        vec![ServiceConfig::new("product-service", base)],
        vec![RouteConfig::new("/api/products", "product-service")],
    );
    let opaque = spawn_gateway(config.clone()).await;
    config.proxy.normalize_json = true;
    let normalizing = spawn_gateway(config).await;

    let raw = client().get(opaque.url("/api/products/7")).send().await.unwrap();
    assert_eq!(raw.text().await.unwrap(), pretty);

    let res = client().get(normalizing.url("/api/products/7")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(res.text().await.unwrap(), "{\"id\":7,\"name\":\"widget\"}");
}

#[tokio::test]
async fn registered_prefixes_route_until_unregistered() {
    let backend = start_echo_backend(StatusCode::OK).await;
    let gateway = spawn_gateway(gateway_config(vec![], vec![])).await;
    let client = client();

    let res = client
        .post(gateway.url("/discovery/services"))
        .json(&json!({
            "name": "billing",
            "base_address": backend.url(),
            "path_prefixes": ["/billing"]
        }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(gateway.url("/billing/invoices/3")).send().await.unwrap();
    assert_eq!(res.status(), 200);
    assert_eq!(json_body(res).await["path"], "/billing/invoices/3");

    let res = client.delete(gateway.url("/discovery/services/billing")).send().await.unwrap();
    assert_eq!(res.status(), 200);

    let res = client.get(gateway.url("/billing/invoices/3")).send().await.unwrap();
    assert_eq!(res.status(), 404);
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn dropped_upstream_connection_is_502() {
    let gateway = spawn_gateway(gateway_config(
        vec![ServiceConfig::new("order-service", common::start_dropping_backend().await)],
        vec![RouteConfig::new("/api/orders", "order-service")],
    ))
    .await;

    let res = client().get(gateway.url("/api/orders/1")).send().await.unwrap();

    assert_eq!(res.status(), 502);
    let body = json_body(res).await;
    assert_eq!(body["error"], "bad_gateway");
    assert!(body["detail"].as_str().unwrap().contains("order-service"));
}

#[tokio::test]
async fn slow_upstream_times_out_as_502() {
    let base = common::start_programmable_backend(|path| async move {
        if path != "/health" {
            tokio::time::sleep(Duration::from_secs(5)).await;
        }
        (200, "text/plain", "ok".to_string())
    })
    .await;
    let mut config = gateway_config(
        vec![ServiceConfig::new("order-service", base)],
        vec![RouteConfig::new("/api/orders", "order-service")],
    );
    config.proxy.timeout_secs = 1;
    let gateway = spawn_gateway(config).await;

    let started = Instant::now();
    let res = client().get(gateway.url("/api/orders/1")).send().await.unwrap();

    assert_eq!(res.status(), 502);
    assert!(started.elapsed() < Duration::from_secs(4));
    let body = json_body(res).await;
    assert_eq!(body["error"], "bad_gateway");
    assert!(body["detail"].as_str().unwrap().contains("timed out"));
}

#[tokio::test]
async fn detached_forwarding_relays_the_request() {
    let backend = start_echo_backend(StatusCode::OK).await;
    let mut config = gateway_config(
        vec![ServiceConfig::new("user-service", backend.url())],
        vec![RouteConfig::new("/users", "user-service")],
    );
    config.proxy.cancel_on_disconnect = false;
    let gateway = spawn_gateway(config).await;

    let res = client()
        .put(gateway.url("/users/9?x=1"))
        .body("abc")
        .send()
        .await
        .unwrap();

    assert_eq!(res.status(), 200);
    let echo = json_body(res).await;
    assert_eq!(echo["method"], "PUT");
    assert_eq!(echo["path"], "/users/9");
    assert_eq!(echo["query"], "x=1");
    assert_eq!(echo["body"], "abc");
    assert_eq!(backend.hits(), 1);
}

#[tokio::test]
async fn oversized_json_is_502_when_normalizing() {
    let large = format!("{{\"data\": \"{}\"}}", "x".repeat(4096));
    let base = common::start_programmable_backend(move |_| {
        let large = large.clone();
        async move { (200, "application/json", large) }
    })
    .await;
    let mut config = gateway_config(
        vec![ServiceConfig::new("product-service", base)],
        vec![RouteConfig::new("/api/products", "product-service")],
    );
    config.proxy.normalize_json = true;
    config.proxy.max_body_bytes = 1024;
    let gateway = spawn_gateway(config).await;

    let res = client().get(gateway.url("/api/products")).send().await.unwrap();

    assert_eq!(res.status(), 502);
    assert_eq!(json_body(res).await["error"], "bad_gateway");
}
