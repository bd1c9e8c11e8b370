//! Middleware layers applied around the downstream router.

pub mod gatekeeper;

pub use gatekeeper::{gatekeeper_middleware, Gatekeeper, CorsPolicy, NONCE_HEADER};
