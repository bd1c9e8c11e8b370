//! Route classification subsystem.
//!
//! The gatekeeper does not route requests itself; it only decides which
//! checks apply. Actual dispatch belongs to the downstream router.

pub mod classifier;

pub use classifier::{RouteClass, RouteClassifier};
