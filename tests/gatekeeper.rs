//! End-to-end tests for the gatekeeping pipeline over a real listener.

use std::time::{Duration, Instant};

use axum::routing::get;
use axum::Router;
use reqwest::StatusCode;
use tokio::net::TcpListener;

use edge_gatekeeper::config::schema::RuntimeMode;
use edge_gatekeeper::config::GatekeeperConfig;
use edge_gatekeeper::{HttpServer, Shutdown};

mod common;
use common::spawn_gatekeeper;

fn directive<'a>(csp: &'a str, name: &str) -> Option<&'a str> {
    csp.split("; ").find(|d| {
        d.strip_prefix(name)
            .is_some_and(|rest| rest.is_empty() || rest.starts_with(' '))
    })
}

#[tokio::test]
async fn baseline_pages_get_security_headers_and_csp() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let response = reqwest::get(format!("{}/", server.base_url)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert_eq!(headers["x-frame-options"], "DENY");
    assert_eq!(headers["x-content-type-options"], "nosniff");
    assert_eq!(headers["referrer-policy"], "strict-origin-when-cross-origin");
    assert_eq!(
        headers["strict-transport-security"],
        "max-age=63072000; includeSubDomains; preload"
    );
    assert_eq!(headers["x-permitted-cross-domain-policies"], "none");

    let csp = headers["content-security-policy"].to_str().unwrap();
    assert_eq!(directive(csp, "object-src"), Some("object-src 'none'"));
    assert_eq!(directive(csp, "default-src"), Some("default-src 'self'"));
}

#[tokio::test]
async fn nonce_matches_csp_and_rotates_per_request() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let client = reqwest::Client::new();

    let first = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    let nonce = first.headers()["x-nonce"].to_str().unwrap().to_string();
    let csp = first.headers()["content-security-policy"]
        .to_str()
        .unwrap();
    let script_src = directive(csp, "script-src").unwrap();
    assert!(
        script_src.contains(&format!("'nonce-{nonce}'")),
        "CSP nonce must be byte-identical to the x-nonce header"
    );

    let second = client
        .get(format!("{}/", server.base_url))
        .send()
        .await
        .unwrap();
    let second_nonce = second.headers()["x-nonce"].to_str().unwrap();
    assert_ne!(nonce, second_nonce, "nonce must differ between requests");
}

#[tokio::test]
async fn admin_paths_force_cache_suppression() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let response = reqwest::get(format!("{}/admin/dashboard", server.base_url))
        .await
        .unwrap();

    // The downstream handler set `public, max-age=3600`; the gatekeeper
    // must have replaced it.
    let headers = response.headers();
    assert_eq!(
        headers["cache-control"],
        "no-store, no-cache, must-revalidate, private"
    );
    assert_eq!(headers["pragma"], "no-cache");
    assert_eq!(headers["expires"], "0");
    // Admin pages still get the baseline.
    assert_eq!(headers["x-frame-options"], "DENY");
    assert!(headers.contains_key("content-security-policy"));
}

#[tokio::test]
async fn non_api_paths_never_get_cors_or_cache_suppression() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let response = reqwest::get(format!("{}/case-studies", server.base_url))
        .await
        .unwrap();

    let headers = response.headers();
    assert!(!headers.contains_key("access-control-allow-origin"));
    assert!(!headers.contains_key("pragma"));
    assert!(headers.contains_key("x-nonce"));
    assert!(headers.contains_key("content-security-policy"));
    assert_eq!(headers["x-frame-options"], "DENY");
}

#[tokio::test]
async fn lookalike_prefixes_do_not_get_api_or_admin_treatment() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;

    let response = reqwest::get(format!("{}/apichat", server.base_url))
        .await
        .unwrap();
    assert!(
        !response.headers().contains_key("access-control-allow-origin"),
        "/apichat is not an API path and must not be CORS-stamped"
    );

    let response = reqwest::get(format!("{}/administrator", server.base_url))
        .await
        .unwrap();
    assert!(
        !response.headers().contains_key("pragma"),
        "/administrator is not an admin path and must not be cache-suppressed"
    );
}

#[tokio::test]
async fn post_without_json_content_type_is_rejected() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/leads", server.base_url))
        .header("content-type", "text/plain")
        .body("name=prospect")
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let no_cors = !response.headers().contains_key("access-control-allow-origin");
    assert!(no_cors, "rejections must not carry CORS headers");
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Content-Type must be application/json");
}

#[tokio::test]
async fn oversized_post_is_rejected_with_413() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let client = reqwest::Client::new();

    let oversized = vec![b'a'; 10 * 1024 * 1024 + 1];
    let response = client
        .post(format!("{}/api/leads", server.base_url))
        .header("content-type", "application/json")
        .body(oversized)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::PAYLOAD_TOO_LARGE);
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Request too large");
}

#[tokio::test]
async fn request_101_in_one_window_gets_429_with_retry_hint() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let client = reqwest::Client::new();

    for i in 1..=100u32 {
        let response = client
            .get(format!("{}/api/leads", server.base_url))
            .header("x-forwarded-for", "203.0.113.50")
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "request {i} should pass");
    }

    let response = client
        .get(format!("{}/api/leads", server.base_url))
        .header("x-forwarded-for", "203.0.113.50")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);

    let retry_header: u64 = response.headers()["retry-after"]
        .to_str()
        .unwrap()
        .parse()
        .unwrap();
    let body: serde_json::Value = response.json().await.unwrap();
    assert_eq!(body["error"], "Too many requests");
    let retry_after = body["retryAfter"].as_u64().unwrap();
    assert_eq!(retry_after, retry_header);
    assert!(
        (1..=60).contains(&retry_after),
        "retry hint must fall inside the window: {retry_after}"
    );
}

#[tokio::test]
async fn distinct_identifiers_do_not_share_a_budget() {
    let mut config = GatekeeperConfig::default();
    config.rate_limit.max_requests = 1;
    let server = spawn_gatekeeper(config).await;
    let client = reqwest::Client::new();

    for ip in ["198.51.100.1", "198.51.100.2", "198.51.100.3"] {
        let response = client
            .get(format!("{}/api/leads", server.base_url))
            .header("x-forwarded-for", ip)
            .send()
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "first hit from {ip}");
    }
}

#[tokio::test]
async fn admitted_api_responses_carry_single_origin_cors() {
    let server = spawn_gatekeeper(GatekeeperConfig::default()).await;
    let client = reqwest::Client::new();

    let response = client
        .post(format!("{}/api/newsletter", server.base_url))
        .header("content-type", "application/json")
        .header("x-forwarded-for", "203.0.113.9")
        .body(r#"{"email":"prospect@example.com"}"#)
        .send()
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let origin = response.headers()["access-control-allow-origin"]
        .to_str()
        .unwrap();
    assert_eq!(origin, "https://www.strategiq.consulting");
    assert_ne!(origin, "*");
    assert!(response
        .headers()
        .contains_key("access-control-allow-methods"));
}

#[tokio::test]
async fn development_mode_loosens_script_src() {
    let mut dev_config = GatekeeperConfig::default();
    dev_config.mode = RuntimeMode::Development;
    let dev = spawn_gatekeeper(dev_config).await;
    let prod = spawn_gatekeeper(GatekeeperConfig::default()).await;

    let dev_csp = reqwest::get(format!("{}/", dev.base_url))
        .await
        .unwrap()
        .headers()["content-security-policy"]
        .to_str()
        .unwrap()
        .to_string();
    let prod_csp = reqwest::get(format!("{}/", prod.base_url))
        .await
        .unwrap()
        .headers()["content-security-policy"]
        .to_str()
        .unwrap()
        .to_string();

    assert!(directive(&dev_csp, "script-src").unwrap().contains("'unsafe-eval'"));
    assert!(!directive(&prod_csp, "script-src").unwrap().contains("'unsafe-eval'"));
    assert!(prod_csp.contains("upgrade-insecure-requests"));
    assert!(!dev_csp.contains("upgrade-insecure-requests"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn in_flight_cap_queues_excess_requests() {
    let mut config = GatekeeperConfig::default();
    config.listener.max_connections = 1;
    let server = spawn_gatekeeper(config).await;
    let client = reqwest::Client::new();

    // The downstream page takes ~150ms; with one permit the second request
    // must wait for the first to finish.
    let fetch = |client: reqwest::Client, base_url: String| async move {
        client
            .get(format!("{base_url}/slow"))
            .send()
            .await
            .unwrap()
            .status()
    };

    let start = Instant::now();
    let (a, b) = tokio::join!(
        fetch(client.clone(), server.base_url.clone()),
        fetch(client.clone(), server.base_url.clone()),
    );
    let elapsed = start.elapsed();

    assert_eq!(a, StatusCode::OK);
    assert_eq!(b, StatusCode::OK);
    assert!(
        elapsed >= Duration::from_millis(250),
        "requests should have been serialized by the permit cap: {elapsed:?}"
    );
}

#[tokio::test]
async fn shutdown_signal_drains_server_and_sweeper() {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let downstream = Router::new().route("/", get(|| async { "ok" }));
    let server = HttpServer::new(GatekeeperConfig::default(), downstream).unwrap();
    let handle = tokio::spawn(async move { server.run(listener, server_shutdown).await });

    let response = reqwest::get(format!("http://{addr}/")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert!(
        shutdown.receiver_count() > 0,
        "server and sweeper should be subscribed while running"
    );

    shutdown.trigger();
    handle.await.unwrap().unwrap();

    // The sweeper task may still be unwinding right after the server
    // returns; give its receiver a moment to drop.
    let deadline = Instant::now() + Duration::from_secs(1);
    while shutdown.receiver_count() > 0 && Instant::now() < deadline {
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(shutdown.receiver_count(), 0, "all tasks should have drained");

    let refused = reqwest::get(format!("http://{addr}/")).await;
    assert!(refused.is_err(), "listener should be closed after shutdown");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_requests_for_last_slot_admit_exactly_one() {
    let mut config = GatekeeperConfig::default();
    config.rate_limit.max_requests = 1;
    let server = spawn_gatekeeper(config).await;
    let client = reqwest::Client::new();

    let race = |client: reqwest::Client, base_url: String| async move {
        client
            .get(format!("{base_url}/api/leads"))
            .header("x-forwarded-for", "203.0.113.99")
            .send()
            .await
            .unwrap()
            .status()
    };

    let (a, b) = tokio::join!(
        race(client.clone(), server.base_url.clone()),
        race(client.clone(), server.base_url.clone()),
    );

    let statuses = [a, b];
    let admitted = statuses.iter().filter(|s| **s == StatusCode::OK).count();
    let limited = statuses
        .iter()
        .filter(|s| **s == StatusCode::TOO_MANY_REQUESTS)
        .count();
    assert_eq!(admitted, 1, "exactly one racer may win: {statuses:?}");
    assert_eq!(limited, 1, "the other must be limited: {statuses:?}");
}
