//! Fixed-window rate limiting keyed by client identifier.
//!
//! # Responsibilities
//! - Resolve a client identifier from forwarded-address headers
//! - Enforce a per-identifier admission budget over a fixed window
//! - Sweep expired window records in the background to bound memory
//!
//! # Design Decisions
//! - Check-and-increment happens under the dashmap entry lock, so two
//!   concurrent requests can never both take the last admission slot
//! - The sweep uses `retain`, which takes the same shard locks as the entry
//!   API: deletion never races a live admit-check on the same key
//! - All unattributable traffic shares one bucket. Known weakness, kept
//!   deliberately: the alternative is admitting it unmetered.

use std::sync::Arc;
use std::time::{Duration, Instant};

use axum::http::HeaderMap;
use dashmap::DashMap;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::config::schema::RateLimitConfig;

/// Bucket key for traffic with no usable client-address header.
pub const UNATTRIBUTABLE: &str = "unattributable";

/// Outcome of an admission check.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Decision {
    Admitted,
    /// Over budget for the current window; retry hint in whole seconds,
    /// rounded up from the window's remaining lifetime.
    Limited { retry_after_secs: u64 },
}

/// One identifier's window state. Lives only while the window is open or
/// until the sweeper removes it.
#[derive(Debug)]
struct WindowRecord {
    count: u32,
    reset_at: Instant,
}

/// Process-wide fixed-window rate limiter.
///
/// Shared across all request handlers via `Arc`; the table is the only
/// cross-request mutable state in the gatekeeping layer.
pub struct RateLimiter {
    table: DashMap<String, WindowRecord>,
    window: Duration,
    budget: u32,
}

impl RateLimiter {
    pub fn new(config: &RateLimitConfig) -> Self {
        Self {
            table: DashMap::new(),
            window: Duration::from_secs(config.window_secs),
            budget: config.max_requests,
        }
    }

    /// Check-and-increment for one identifier, atomic per key.
    ///
    /// The entry guard holds the shard write lock for the whole read-modify-
    /// write, which is what makes the last-slot race impossible.
    pub fn check(&self, identifier: &str) -> Decision {
        let now = Instant::now();
        let mut record = self
            .table
            .entry(identifier.to_string())
            .or_insert_with(|| WindowRecord {
                count: 0,
                reset_at: now + self.window,
            });

        if record.reset_at <= now {
            // Window expired but not yet swept: reset in place.
            record.count = 1;
            record.reset_at = now + self.window;
            return Decision::Admitted;
        }

        record.count += 1;
        if record.count <= self.budget {
            Decision::Admitted
        } else {
            let remaining = record.reset_at.saturating_duration_since(now);
            let mut retry_after_secs = remaining.as_secs();
            if remaining.subsec_nanos() > 0 || retry_after_secs == 0 {
                retry_after_secs += 1;
            }
            Decision::Limited { retry_after_secs }
        }
    }

    /// Remove records whose window has passed. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let before = self.table.len();
        let now = Instant::now();
        self.table.retain(|_, record| record.reset_at > now);
        before.saturating_sub(self.table.len())
    }

    /// Number of live identifier buckets (for tests and metrics).
    pub fn bucket_count(&self) -> usize {
        self.table.len()
    }

    /// Spawn the periodic GC sweep.
    ///
    /// Runs until the shutdown signal fires, so restarts do not leak a
    /// perpetual background task.
    pub fn spawn_sweeper(
        self: &Arc<Self>,
        interval: Duration,
        mut shutdown: broadcast::Receiver<()>,
    ) -> JoinHandle<()> {
        let limiter = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            // First tick completes immediately; skip it so the first real
            // sweep happens one full interval in.
            ticker.tick().await;
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = limiter.sweep();
                        crate::observability::metrics::record_bucket_count(limiter.bucket_count());
                        if removed > 0 {
                            tracing::debug!(removed, "swept expired rate-limit records");
                        }
                    }
                    _ = shutdown.recv() => {
                        tracing::debug!("rate-limit sweeper stopping");
                        break;
                    }
                }
            }
        })
    }
}

/// Resolve the rate-limit identifier from request headers.
///
/// Precedence: first `x-forwarded-for` entry, then `x-real-ip`, then
/// `cf-connecting-ip`, then the shared [`UNATTRIBUTABLE`] bucket. Values are
/// trusted verbatim; anchoring to a trusted proxy hop count is a deployment
/// decision this layer does not make.
pub fn client_identifier(headers: &HeaderMap) -> String {
    if let Some(forwarded) = headers.get("x-forwarded-for").and_then(|v| v.to_str().ok()) {
        if let Some(first) = forwarded.split(',').next() {
            let first = first.trim();
            if !first.is_empty() {
                return first.to_string();
            }
        }
    }
    for name in ["x-real-ip", "cf-connecting-ip"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            let value = value.trim();
            if !value.is_empty() {
                return value.to_string();
            }
        }
    }
    UNATTRIBUTABLE.to_string()
}
