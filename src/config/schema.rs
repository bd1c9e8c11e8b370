//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the
//! gatekeeper. All types derive Serde traits for deserialization from
//! config files, and every field has a default so a minimal (or empty)
//! config is valid.

use serde::{Deserialize, Serialize};

/// Root configuration for the edge gatekeeper.
#[derive(Debug, Clone, Deserialize, Serialize, Default)]
#[serde(default)]
pub struct GatekeeperConfig {
    /// Listener configuration (bind address, connection cap).
    pub listener: ListenerConfig,

    /// Runtime mode; loosens the CSP in development.
    pub mode: RuntimeMode,

    /// Path prefixes used for route classification.
    pub routes: RoutesConfig,

    /// CORS policy stamped onto API responses.
    pub cors: CorsConfig,

    /// Fixed-window rate limiting.
    pub rate_limit: RateLimitConfig,

    /// Request admission limits.
    pub admission: AdmissionConfig,

    /// CSP source allow-lists.
    pub csp: CspConfig,

    /// Timeout configuration.
    pub timeouts: TimeoutConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Listener configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListenerConfig {
    /// Bind address (e.g., "0.0.0.0:8080").
    pub bind_address: String,

    /// Maximum concurrent in-flight requests (backpressure).
    pub max_connections: usize,
}

impl Default for ListenerConfig {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8080".to_string(),
            max_connections: 10_000,
        }
    }
}

/// Runtime environment mode.
#[derive(Debug, Clone, Copy, Deserialize, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum RuntimeMode {
    Development,
    #[default]
    Production,
}

/// Path prefixes used by the route classifier.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RoutesConfig {
    /// Prefix receiving admission control, rate limiting, and CORS.
    pub api_prefix: String,

    /// Prefix receiving forced cache suppression.
    pub admin_prefix: String,
}

impl Default for RoutesConfig {
    fn default() -> Self {
        Self {
            api_prefix: "/api".to_string(),
            admin_prefix: "/admin".to_string(),
        }
    }
}

/// CORS policy for API routes. A single origin, never a wildcard.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CorsConfig {
    /// The one origin allowed to call the API from a browser.
    pub allowed_origin: String,

    /// Methods advertised for preflight.
    pub allowed_methods: String,

    /// Headers advertised for preflight.
    pub allowed_headers: String,

    /// Preflight cache lifetime in seconds.
    pub max_age_secs: u64,
}

impl Default for CorsConfig {
    fn default() -> Self {
        Self {
            allowed_origin: "https://www.strategiq.consulting".to_string(),
            allowed_methods: "GET, POST, PUT, PATCH, DELETE, OPTIONS".to_string(),
            allowed_headers: "Content-Type, Authorization".to_string(),
            max_age_secs: 86_400,
        }
    }
}

/// Fixed-window rate limiting configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct RateLimitConfig {
    /// Window length in seconds.
    pub window_secs: u64,

    /// Admissions allowed per identifier per window.
    pub max_requests: u32,

    /// Interval between GC sweeps of expired records, in seconds.
    pub sweep_interval_secs: u64,
}

impl Default for RateLimitConfig {
    fn default() -> Self {
        Self {
            window_secs: 60,
            max_requests: 100,
            sweep_interval_secs: 60,
        }
    }
}

/// Request admission limits for API routes.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AdmissionConfig {
    /// Maximum declared body size in bytes.
    pub max_body_bytes: u64,
}

impl Default for AdmissionConfig {
    fn default() -> Self {
        Self {
            max_body_bytes: 10 * 1024 * 1024, // 10 MiB
        }
    }
}

/// CSP source allow-lists. Defaults cover the analytics, font, and
/// scheduling-widget hosts the site embeds.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct CspConfig {
    /// Additional `script-src` hosts (analytics, tag manager).
    pub script_hosts: Vec<String>,

    /// Additional `style-src` hosts (font CSS).
    pub style_hosts: Vec<String>,

    /// Additional `img-src` hosts (asset CDN, analytics pixels).
    pub img_hosts: Vec<String>,

    /// Additional `font-src` hosts.
    pub font_hosts: Vec<String>,

    /// Additional `connect-src` hosts (analytics collectors).
    pub connect_hosts: Vec<String>,

    /// Realtime backend endpoints added to `connect-src`.
    pub realtime_hosts: Vec<String>,

    /// External hosts allowed in `frame-src` (scheduling widget).
    pub frame_hosts: Vec<String>,
}

impl Default for CspConfig {
    fn default() -> Self {
        Self {
            script_hosts: vec![
                "https://www.googletagmanager.com".to_string(),
                "https://www.google-analytics.com".to_string(),
            ],
            style_hosts: vec!["https://fonts.googleapis.com".to_string()],
            img_hosts: vec![
                "https://www.google-analytics.com".to_string(),
                "https://www.googletagmanager.com".to_string(),
            ],
            font_hosts: vec!["https://fonts.gstatic.com".to_string()],
            connect_hosts: vec![
                "https://www.google-analytics.com".to_string(),
                "https://region1.google-analytics.com".to_string(),
            ],
            realtime_hosts: Vec::new(),
            frame_hosts: vec!["https://calendly.com".to_string()],
        }
    }
}

/// Timeout configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Request timeout (total time for request/response) in seconds.
    pub request_secs: u64,
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self { request_secs: 30 }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
