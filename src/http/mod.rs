//! HTTP layer.
//!
//! # Data Flow
//! ```text
//! TCP connection
//!     → server.rs (axum setup, trace, timeout)
//!     → request.rs (request ID)
//!     → middleware/gatekeeper.rs (classify, nonce, admission, rate limit)
//!     → [downstream router: pages, API handlers — out of scope]
//!     → middleware/gatekeeper.rs (header decoration)
//!     → Send to client
//! ```

pub mod middleware;
pub mod request;
pub mod server;

pub use request::{request_id_middleware, X_REQUEST_ID};
pub use server::HttpServer;
