//! Edge Request-Gatekeeping Library
//!
//! Intercepts every inbound request before page rendering or API handlers
//! run: per-request CSP nonce, static security headers, a deterministic
//! Content-Security-Policy, fixed-window rate limiting, and admission
//! control for mutating API calls.

pub mod config;
pub mod http;
pub mod lifecycle;
pub mod observability;
pub mod routing;
pub mod security;

pub use config::GatekeeperConfig;
pub use http::HttpServer;
pub use lifecycle::Shutdown;
