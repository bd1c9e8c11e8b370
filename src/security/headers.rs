//! Static security response headers.
//!
//! # Responsibilities
//! - Define the fixed header table applied to every response
//! - Define the forced cache-suppression set for admin paths
//!
//! # Design Decisions
//! - Table is environment-independent; only admin cache overrides vary by route
//! - Applied additively, never clobbering downstream values
//!   (admin cache suppression is the one exception)

use axum::http::header::{HeaderMap, HeaderName, HeaderValue};

/// Fixed security headers stamped on every response, regardless of route.
pub const SECURITY_HEADERS: &[(&str, &str)] = &[
    ("x-frame-options", "DENY"),
    ("x-content-type-options", "nosniff"),
    ("x-xss-protection", "1; mode=block"),
    ("referrer-policy", "strict-origin-when-cross-origin"),
    (
        "permissions-policy",
        "camera=(), microphone=(), geolocation=(), interest-cohort=()",
    ),
    (
        "strict-transport-security",
        "max-age=63072000; includeSubDomains; preload",
    ),
    ("x-dns-prefetch-control", "on"),
    ("x-download-options", "noopen"),
    ("x-permitted-cross-domain-policies", "none"),
];

/// Cache-suppression headers forced onto admin responses.
pub const ADMIN_CACHE_HEADERS: &[(&str, &str)] = &[
    ("cache-control", "no-store, no-cache, must-revalidate, private"),
    ("pragma", "no-cache"),
    ("expires", "0"),
];

/// Insert the static table into `headers` without overwriting values a
/// downstream handler already set.
pub fn apply_security_headers(headers: &mut HeaderMap) {
    for (name, value) in SECURITY_HEADERS {
        let name = HeaderName::from_static(name);
        if !headers.contains_key(&name) {
            headers.insert(name, HeaderValue::from_static(value));
        }
    }
}

/// Force cache suppression onto `headers`, overwriting anything downstream set.
pub fn apply_admin_cache_headers(headers: &mut HeaderMap) {
    for (name, value) in ADMIN_CACHE_HEADERS {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
}
