//! Request identity.
//!
//! # Responsibilities
//! - Ensure every request carries an `x-request-id` (UUID v4)
//! - Echo the ID on the response for log correlation
//!
//! # Design Decisions
//! - An incoming ID from a trusted front proxy is kept, not replaced

use axum::{
    body::Body,
    http::{HeaderValue, Request},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

pub const X_REQUEST_ID: &str = "x-request-id";

pub async fn request_id_middleware(mut request: Request<Body>, next: Next) -> Response {
    let id = match request.headers().get(X_REQUEST_ID) {
        Some(existing) => existing.clone(),
        None => {
            let generated = HeaderValue::from_str(&Uuid::new_v4().to_string())
                .expect("uuid is a valid header value");
            request
                .headers_mut()
                .insert(X_REQUEST_ID, generated.clone());
            generated
        }
    };

    let mut response = next.run(request).await;
    response.headers_mut().insert(X_REQUEST_ID, id);
    response
}
