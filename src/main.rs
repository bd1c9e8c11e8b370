//! Edge Request-Gatekeeper
//!
//! Every inbound request passes through one pipeline before any page or API
//! handler runs:
//!
//! ```text
//!                 ┌──────────────────────────────────────────────────┐
//!                 │                  GATEKEEPER                      │
//!                 │                                                  │
//!  Request ───────┼─▶ classify ─▶ nonce ─▶ admission ─▶ rate limit ──┼─▶ downstream
//!                 │   (api/admin/   │      (API only)    (API only)  │   (pages, API)
//!                 │    other)       │                                │
//!                 │                 ▼                                │
//!  Response ◀─────┼── decorate: nonce header, CSP, security headers, │
//!                 │   CORS (API), cache suppression (admin)          │
//!                 └──────────────────────────────────────────────────┘
//! ```
//!
//! Rejections (413 / 400 / 429) terminate at this layer with minimal JSON
//! bodies; everything else passes through with headers attached.

use std::path::PathBuf;

use axum::routing::get;
use axum::{Json, Router};
use clap::Parser;
use serde_json::json;
use tokio::net::TcpListener;

use edge_gatekeeper::config::loader::load_config;
use edge_gatekeeper::config::GatekeeperConfig;
use edge_gatekeeper::observability::{logging, metrics};
use edge_gatekeeper::{HttpServer, Shutdown};

#[derive(Parser)]
#[command(name = "edge-gatekeeper", version, about = "Edge request-gatekeeping server")]
struct Cli {
    /// Path to a TOML configuration file. Defaults apply when omitted.
    #[arg(long)]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => GatekeeperConfig::default(),
    };

    logging::init_logging(&config.observability.log_level);

    tracing::info!(
        bind_address = %config.listener.bind_address,
        mode = ?config.mode,
        rate_limit_budget = config.rate_limit.max_requests,
        rate_limit_window_secs = config.rate_limit.window_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => metrics::init_metrics(addr),
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let listener = TcpListener::bind(&config.listener.bind_address).await?;

    let shutdown = Shutdown::new();
    let server_shutdown = shutdown.subscribe();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            shutdown.trigger();
        }
    });

    // The downstream router stands in for the real site: page rendering and
    // API business logic live behind this layer, not in it.
    let server = HttpServer::new(config, placeholder_routes())?;
    server.run(listener, server_shutdown).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}

fn placeholder_routes() -> Router {
    Router::new()
        .route("/", get(|| async { "ok" }))
        .route(
            "/api/health",
            get(|| async { Json(json!({ "status": "ok" })) }),
        )
}
