//! Shared utilities for integration testing.

use axum::http::header;
use axum::response::{Html, IntoResponse};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::json;

use edge_gatekeeper::{GatekeeperConfig, HttpServer, Shutdown};

/// A gatekeeper instance running on an ephemeral port.
///
/// Holds the shutdown coordinator so the server stays up for the test's
/// lifetime; dropping it closes the broadcast channel and drains the server.
pub struct TestServer {
    pub base_url: String,
    _shutdown: Shutdown,
}

/// Spawn a gatekeeper wrapping the demo downstream site.
///
/// Binds an ephemeral port directly; the configured bind address is only
/// used by the binary's startup path.
pub async fn spawn_gatekeeper(config: GatekeeperConfig) -> TestServer {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    let server = HttpServer::new(config, demo_site()).unwrap();

    tokio::spawn(async move {
        let _ = server.run(listener, server_shutdown).await;
    });

    TestServer {
        base_url: format!("http://{addr}"),
        _shutdown: shutdown,
    }
}

/// Stand-in for the real downstream site: content pages, an admin page that
/// tries to set its own caching, and a couple of API handlers.
fn demo_site() -> Router {
    Router::new()
        .route("/", get(|| async { Html("<h1>StrategIQ Consulting</h1>") }))
        .route("/case-studies", get(|| async { Html("<h1>Case Studies</h1>") }))
        .route("/slow", get(slow_page))
        .route("/admin/dashboard", get(admin_dashboard))
        .route("/api/leads", get(list_leads).post(create_lead))
        .route("/api/newsletter", post(subscribe))
}

async fn slow_page() -> Html<&'static str> {
    tokio::time::sleep(std::time::Duration::from_millis(150)).await;
    Html("<h1>Slow</h1>")
}

async fn admin_dashboard() -> impl IntoResponse {
    // Downstream tries to allow caching; the gatekeeper must override it.
    (
        [(header::CACHE_CONTROL, "public, max-age=3600")],
        Html("<h1>Dashboard</h1>"),
    )
}

async fn list_leads() -> Json<serde_json::Value> {
    Json(json!({ "leads": [] }))
}

async fn create_lead() -> Json<serde_json::Value> {
    Json(json!({ "received": true }))
}

async fn subscribe() -> Json<serde_json::Value> {
    Json(json!({ "subscribed": true }))
}
