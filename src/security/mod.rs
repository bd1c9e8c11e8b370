//! Security subsystem.
//!
//! # Data Flow
//! ```text
//! Incoming request:
//!     → nonce.rs (per-request CSP nonce)
//!     → admission.rs (API only: size, content type)
//!     → rate_limit.rs (API only: per-identifier budget)
//!     → headers.rs + csp.rs (stamped onto the outgoing response)
//! ```
//!
//! # Design Decisions
//! - Fail closed: any check failure terminates the request at this layer
//! - No trust in client input; forwarded-address headers are identifiers,
//!   never authorization
//! - No silent degradation: an unreadable random source aborts the request

pub mod admission;
pub mod csp;
pub mod headers;
pub mod nonce;
pub mod rate_limit;

pub use admission::{AdmissionPolicy, Rejection};
pub use csp::CspBuilder;
pub use nonce::{Nonce, NonceError};
pub use rate_limit::{client_identifier, Decision, RateLimiter};
