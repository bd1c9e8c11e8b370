//! Lifecycle management subsystem.
//!
//! # Data Flow
//! ```text
//! Startup:
//!     Load config → Validate → Build pipeline → Spawn sweeper → Serve
//!
//! Shutdown:
//!     Signal received → broadcast → server drains, sweeper exits
//! ```

pub mod shutdown;

pub use shutdown::Shutdown;
