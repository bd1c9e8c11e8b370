//! Request-gatekeeping middleware.
//!
//! Runs the full pipeline for every inbound request:
//! classify → nonce → (API: admission → rate limit) → downstream → decorate.
//!
//! A request is either fully admitted (all headers attached, downstream ran)
//! or fully rejected with a terminal JSON response; there is no partial
//! admission. Rejections still carry the nonce, CSP, and static security
//! headers, but never CORS.

use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::{
        header::{
            HeaderMap, HeaderName, HeaderValue, InvalidHeaderValue,
            ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN, ACCESS_CONTROL_MAX_AGE, CONTENT_SECURITY_POLICY,
        },
        Request, StatusCode,
    },
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::config::GatekeeperConfig;
use crate::observability::metrics;
use crate::routing::{RouteClass, RouteClassifier};
use crate::security::{
    client_identifier, headers, AdmissionPolicy, CspBuilder, Decision, Nonce, RateLimiter,
    Rejection,
};

/// Response header exposing the per-request nonce to downstream renderers.
pub const NONCE_HEADER: &str = "x-nonce";

/// CORS headers stamped onto admitted API responses. A single configured
/// origin; the wildcard is rejected at config validation.
#[derive(Clone, Debug)]
pub struct CorsPolicy {
    origin: HeaderValue,
    methods: HeaderValue,
    headers: HeaderValue,
    max_age: HeaderValue,
}

impl CorsPolicy {
    fn from_config(config: &GatekeeperConfig) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            origin: HeaderValue::from_str(&config.cors.allowed_origin)?,
            methods: HeaderValue::from_str(&config.cors.allowed_methods)?,
            headers: HeaderValue::from_str(&config.cors.allowed_headers)?,
            max_age: HeaderValue::from(config.cors.max_age_secs),
        })
    }

    fn apply(&self, headers: &mut HeaderMap) {
        let pairs = [
            (ACCESS_CONTROL_ALLOW_ORIGIN, &self.origin),
            (ACCESS_CONTROL_ALLOW_METHODS, &self.methods),
            (ACCESS_CONTROL_ALLOW_HEADERS, &self.headers),
            (ACCESS_CONTROL_MAX_AGE, &self.max_age),
        ];
        for (name, value) in pairs {
            if !headers.contains_key(&name) {
                headers.insert(name, value.clone());
            }
        }
    }
}

/// Shared state for the gatekeeping pipeline.
///
/// The rate-limit table is the only piece shared mutably across requests;
/// everything else here is immutable policy.
pub struct Gatekeeper {
    classifier: RouteClassifier,
    csp: CspBuilder,
    admission: AdmissionPolicy,
    cors: CorsPolicy,
    limiter: Arc<RateLimiter>,
}

impl Gatekeeper {
    pub fn new(
        config: &GatekeeperConfig,
        limiter: Arc<RateLimiter>,
    ) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            classifier: RouteClassifier::new(&config.routes),
            csp: CspBuilder::new(config.mode, config.csp.clone()),
            admission: AdmissionPolicy::new(&config.admission),
            cors: CorsPolicy::from_config(config)?,
            limiter,
        })
    }

    /// The shared rate limiter, for spawning the GC sweeper.
    pub fn limiter(&self) -> &Arc<RateLimiter> {
        &self.limiter
    }
}

fn class_label(class: RouteClass) -> &'static str {
    match class {
        RouteClass::Api => "api",
        RouteClass::Admin => "admin",
        RouteClass::Other => "other",
    }
}

/// Middleware entry point; wired via `middleware::from_fn_with_state`.
pub async fn gatekeeper_middleware(
    State(state): State<Arc<Gatekeeper>>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let path = request.uri().path().to_string();
    let class = state.classifier.classify(&path);
    metrics::record_request(class_label(class));

    // No nonce, no response: a request that cannot get a secure nonce is
    // aborted rather than served with a guessable one.
    let nonce = match Nonce::generate() {
        Ok(nonce) => nonce,
        Err(e) => {
            tracing::error!(error = %e, path = %path, "Nonce generation failed, aborting request");
            let mut response = StatusCode::INTERNAL_SERVER_ERROR.into_response();
            headers::apply_security_headers(response.headers_mut());
            return response;
        }
    };

    let mut admitted = true;
    let mut response = match class {
        RouteClass::Api => run_api_checks(&state, request, next, &path, &mut admitted).await,
        RouteClass::Admin | RouteClass::Other => next.run(request).await,
    };

    decorate(&state, &mut response, &nonce, class, admitted);
    response
}

/// Admission control, then the rate limiter. Short-circuits on the first
/// failure; a rejection never consults the limiter.
async fn run_api_checks(
    state: &Gatekeeper,
    request: Request<Body>,
    next: Next,
    path: &str,
    admitted: &mut bool,
) -> Response {
    if let Err(rejection) = state.admission.check(request.method(), request.headers()) {
        tracing::warn!(
            path = %path,
            method = %request.method(),
            reason = rejection.reason(),
            "Request rejected by admission control"
        );
        metrics::record_rejection(rejection.reason());
        *admitted = false;
        return rejection.into_response();
    }

    let identifier = client_identifier(request.headers());
    match state.limiter.check(&identifier) {
        Decision::Admitted => next.run(request).await,
        Decision::Limited { retry_after_secs } => {
            tracing::warn!(
                client = %identifier,
                path = %path,
                retry_after_secs,
                "Rate limit exceeded"
            );
            metrics::record_rejection("rate_limited");
            *admitted = false;
            Rejection::RateLimited { retry_after_secs }.into_response()
        }
    }
}

/// Attach all header contributions to the outgoing response.
///
/// Additive by default: a header the downstream handler already set is left
/// alone. Admin cache suppression is the one override.
fn decorate(
    state: &Gatekeeper,
    response: &mut Response,
    nonce: &Nonce,
    class: RouteClass,
    admitted: bool,
) {
    let csp_value = state.csp.build(nonce.value());
    let response_headers = response.headers_mut();

    let nonce_name = HeaderName::from_static(NONCE_HEADER);
    if !response_headers.contains_key(&nonce_name) {
        if let Ok(value) = HeaderValue::from_str(nonce.value()) {
            response_headers.insert(nonce_name, value);
        }
    }
    if !response_headers.contains_key(CONTENT_SECURITY_POLICY) {
        if let Ok(value) = HeaderValue::from_str(&csp_value) {
            response_headers.insert(CONTENT_SECURITY_POLICY, value);
        }
    }
    headers::apply_security_headers(response_headers);

    if class == RouteClass::Api && admitted {
        state.cors.apply(response_headers);
    }
    if class == RouteClass::Admin {
        headers::apply_admin_cache_headers(response_headers);
    }
}
