//! HTTP server setup.
//!
//! # Responsibilities
//! - Wrap the downstream router with the gatekeeping pipeline
//! - Wire up middleware (tracing, timeout, request ID, gatekeeper)
//! - Serve with graceful shutdown and run the rate-limit GC sweeper
//!
//! The downstream router (page rendering, API handlers) is a collaborator
//! supplied by the caller; this layer only decides what reaches it and what
//! headers leave with it.

use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::http::header::InvalidHeaderValue;
use axum::{middleware, Router};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower::limit::ConcurrencyLimitLayer;
use tower::ServiceBuilder;
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use crate::config::GatekeeperConfig;
use crate::http::middleware::{gatekeeper_middleware, Gatekeeper};
use crate::http::request::request_id_middleware;
use crate::security::RateLimiter;

/// HTTP server wrapping a downstream router with the gatekeeping layer.
pub struct HttpServer {
    router: Router,
    config: GatekeeperConfig,
    gatekeeper: Arc<Gatekeeper>,
}

impl HttpServer {
    /// Build the server around a downstream router.
    ///
    /// Fails only if the configured CORS values cannot form valid header
    /// values; config validation catches everything else earlier.
    pub fn new(
        config: GatekeeperConfig,
        downstream: Router,
    ) -> Result<Self, InvalidHeaderValue> {
        let limiter = Arc::new(RateLimiter::new(&config.rate_limit));
        let gatekeeper = Arc::new(Gatekeeper::new(&config, limiter)?);
        let router = Self::build_router(&config, gatekeeper.clone(), downstream);
        Ok(Self {
            router,
            config,
            gatekeeper,
        })
    }

    /// Layer order, outermost first: trace → concurrency limit → timeout →
    /// request ID → gatekeeper → downstream.
    fn build_router(
        config: &GatekeeperConfig,
        gatekeeper: Arc<Gatekeeper>,
        downstream: Router,
    ) -> Router {
        downstream.layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                // Backpressure: requests past the cap wait for a permit
                // instead of stacking unbounded work.
                .layer(ConcurrencyLimitLayer::new(config.listener.max_connections))
                .layer(TimeoutLayer::new(Duration::from_secs(
                    config.timeouts.request_secs,
                )))
                .layer(middleware::from_fn(request_id_middleware))
                .layer(middleware::from_fn_with_state(
                    gatekeeper,
                    gatekeeper_middleware,
                )),
        )
    }

    /// Run the server, accepting connections on the given listener.
    ///
    /// The GC sweeper subscribes to the same shutdown signal, so one trigger
    /// drains the server and stops the background task together.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, mode = ?self.config.mode, "Gatekeeper listening");

        let sweep_interval = Duration::from_secs(self.config.rate_limit.sweep_interval_secs);
        let sweeper = self
            .gatekeeper
            .limiter()
            .spawn_sweeper(sweep_interval, shutdown.resubscribe());

        let app = self
            .router
            .into_make_service_with_connect_info::<SocketAddr>();

        let result = axum::serve(listener, app)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received, draining connections");
            })
            .await;

        // The sweeper exits on the broadcast; abort covers the error path
        // where serve returned without a signal.
        sweeper.abort();
        result?;

        tracing::info!("Gatekeeper stopped");
        Ok(())
    }
}
