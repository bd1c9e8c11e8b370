//! Admission control for API requests.
//!
//! # Responsibilities
//! - Reject oversized requests before the body is read
//! - Require a JSON content type on mutating API calls
//! - Define the terminal rejection responses for all gatekeeping checks
//!
//! # Design Decisions
//! - Checks run in order (size, then content type) and short-circuit;
//!   both run before the rate limiter is consulted
//! - Rejection bodies are minimal JSON, no internals leaked

use axum::http::header::{CONTENT_LENGTH, CONTENT_TYPE, RETRY_AFTER};
use axum::http::{HeaderMap, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::config::schema::AdmissionConfig;

/// Terminal rejection at the gatekeeping layer. No retry, no partial
/// admission: the request never reaches a downstream handler.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Rejection {
    /// Declared content length over the admission cap.
    PayloadTooLarge,
    /// Mutating API call without a JSON content type.
    UnsupportedContentType,
    /// Identifier over its fixed-window budget.
    RateLimited { retry_after_secs: u64 },
}

impl Rejection {
    /// Stable label for logs and metrics.
    pub fn reason(&self) -> &'static str {
        match self {
            Rejection::PayloadTooLarge => "payload_too_large",
            Rejection::UnsupportedContentType => "unsupported_content_type",
            Rejection::RateLimited { .. } => "rate_limited",
        }
    }
}

impl IntoResponse for Rejection {
    fn into_response(self) -> Response {
        match self {
            Rejection::PayloadTooLarge => (
                StatusCode::PAYLOAD_TOO_LARGE,
                Json(json!({ "error": "Request too large" })),
            )
                .into_response(),
            Rejection::UnsupportedContentType => (
                StatusCode::BAD_REQUEST,
                Json(json!({ "error": "Content-Type must be application/json" })),
            )
                .into_response(),
            Rejection::RateLimited { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(json!({
                        "error": "Too many requests",
                        "retryAfter": retry_after_secs,
                    })),
                )
                    .into_response();
                response
                    .headers_mut()
                    .insert(RETRY_AFTER, HeaderValue::from(retry_after_secs));
                response
            }
        }
    }
}

/// Size and content-type validation for API routes.
#[derive(Clone, Debug)]
pub struct AdmissionPolicy {
    max_body_bytes: u64,
}

impl AdmissionPolicy {
    pub fn new(config: &AdmissionConfig) -> Self {
        Self {
            max_body_bytes: config.max_body_bytes,
        }
    }

    /// Validate one API request. Ordered, short-circuiting.
    pub fn check(&self, method: &Method, headers: &HeaderMap) -> Result<(), Rejection> {
        if let Some(length) = headers
            .get(CONTENT_LENGTH)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u64>().ok())
        {
            if length > self.max_body_bytes {
                return Err(Rejection::PayloadTooLarge);
            }
        }

        if is_mutating(method) {
            let json = headers
                .get(CONTENT_TYPE)
                .and_then(|v| v.to_str().ok())
                .map(is_json_media_type)
                .unwrap_or(false);
            if !json {
                return Err(Rejection::UnsupportedContentType);
            }
        }

        Ok(())
    }
}

fn is_mutating(method: &Method) -> bool {
    matches!(*method, Method::POST | Method::PUT | Method::PATCH)
}

/// `application/json`, with or without parameters, plus `+json` suffixes.
fn is_json_media_type(value: &str) -> bool {
    let essence = value
        .split(';')
        .next()
        .unwrap_or("")
        .trim()
        .to_ascii_lowercase();
    essence == "application/json" || essence.ends_with("+json")
}
