//! Content-Security-Policy construction.
//!
//! # Responsibilities
//! - Compose the CSP directive map from the per-request nonce, the runtime
//!   mode, and the configured source allow-lists
//! - Serialize it deterministically (fixed directive order, space-joined
//!   tokens, `"; "` between directives)
//!
//! # Design Decisions
//! - Determinism is load-bearing: tests compare full policy strings
//! - A directive whose source list ends up empty is omitted entirely
//! - Valueless directives (`upgrade-insecure-requests`) render bare and are
//!   suppressed in development, where pages are served over plain HTTP

use crate::config::schema::{CspConfig, RuntimeMode};

/// Builds the `Content-Security-Policy` header value for each request.
#[derive(Clone, Debug)]
pub struct CspBuilder {
    mode: RuntimeMode,
    config: CspConfig,
}

impl CspBuilder {
    pub fn new(mode: RuntimeMode, config: CspConfig) -> Self {
        Self { mode, config }
    }

    /// Render the full policy string for one request.
    ///
    /// The nonce token embedded here must be byte-identical to the value
    /// exposed in the `x-nonce` response header.
    pub fn build(&self, nonce: &str) -> String {
        let dev = self.mode == RuntimeMode::Development;
        let nonce_token = format!("'nonce-{nonce}'");

        let mut script_src = vec!["'self'".to_string(), nonce_token.clone()];
        script_src.push("'strict-dynamic'".to_string());
        if dev {
            script_src.push("'unsafe-eval'".to_string());
        }
        script_src.extend(self.config.script_hosts.iter().cloned());

        // 'unsafe-inline' stays: component libraries inject inline styles
        // that cannot carry a nonce.
        let mut style_src = vec![
            "'self'".to_string(),
            nonce_token,
            "'unsafe-inline'".to_string(),
        ];
        style_src.extend(self.config.style_hosts.iter().cloned());

        let mut img_src = vec![
            "'self'".to_string(),
            "data:".to_string(),
            "blob:".to_string(),
        ];
        img_src.extend(self.config.img_hosts.iter().cloned());

        let mut font_src = vec!["'self'".to_string(), "data:".to_string()];
        font_src.extend(self.config.font_hosts.iter().cloned());

        let mut connect_src = vec!["'self'".to_string()];
        connect_src.extend(self.config.connect_hosts.iter().cloned());
        connect_src.extend(self.config.realtime_hosts.iter().cloned());
        if dev {
            connect_src.push("http://localhost:*".to_string());
            connect_src.push("ws://localhost:*".to_string());
        }

        let mut frame_src = vec!["'self'".to_string()];
        frame_src.extend(self.config.frame_hosts.iter().cloned());

        let self_only = || vec!["'self'".to_string()];

        let directives: Vec<(&str, Vec<String>)> = vec![
            ("default-src", self_only()),
            ("script-src", script_src),
            ("style-src", style_src),
            ("img-src", img_src),
            ("font-src", font_src),
            ("connect-src", connect_src),
            ("frame-src", frame_src),
            ("object-src", vec!["'none'".to_string()]),
            ("base-uri", self_only()),
            ("form-action", self_only()),
            ("manifest-src", self_only()),
            ("worker-src", vec!["'self'".to_string(), "blob:".to_string()]),
            ("media-src", self_only()),
            ("child-src", self_only()),
        ];

        let mut parts: Vec<String> = directives
            .into_iter()
            .filter(|(_, sources)| !sources.is_empty())
            .map(|(name, sources)| format!("{} {}", name, sources.join(" ")))
            .collect();

        if !dev {
            parts.push("upgrade-insecure-requests".to_string());
        }

        parts.join("; ")
    }
}
