//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Pipeline produces:
//!     → logging.rs (structured rejection/admission events)
//!     → metrics.rs (counters and gauges)
//!
//! Consumers:
//!     → Log aggregation (stdout)
//!     → Metrics endpoint (Prometheus scrape)
//! ```

pub mod logging;
pub mod metrics;
