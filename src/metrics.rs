//! Vendor-agnostic metrics collection via a pluggable sink.
//!
//! The resolver reports every label lookup and the cache reports every expiry
//! sweep to a process-wide [`MetricsSink`]. Until a sink is installed, events
//! are dropped. The crate stays free of any particular metrics backend.
//!
//! ## Usage
//!
//! ```
//! use cg_owner_labels::metrics::{LookupOutcome, LookupStats, MetricsSink, SweepStats};
//! use std::sync::atomic::{AtomicU64, Ordering};
//! use std::sync::Arc;
//!
//! struct Counter {
//!     hits: AtomicU64,
//! }
//!
//! impl MetricsSink for Counter {
//!     fn on_lookup(&self, stats: &LookupStats) {
//!         if stats.outcome == LookupOutcome::Hit {
//!             self.hits.fetch_add(1, Ordering::Relaxed);
//!         }
//!     }
//!
//!     fn on_sweep(&self, _stats: &SweepStats) {}
//! }
//!
//! cg_owner_labels::metrics::set_sink(Arc::new(Counter { hits: AtomicU64::new(0) }));
//! ```

use std::sync::{Arc, OnceLock};
use std::time::{Duration, Instant};

use serde::Serialize;
use strum::{Display, EnumString};
use tracing::warn;

/// How a single `fetch_label` call was answered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Display, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum LookupOutcome {
    /// Served from the cache; the entry's TTL was renewed.
    Hit,
    /// Cache miss, resolved by the prefix table and cached.
    Matched,
    /// No prefix applies; nothing was cached.
    Unmatched,
}

/// Snapshot of one lookup, passed to [`MetricsSink::on_lookup`].
#[derive(Debug, Clone, Serialize)]
pub struct LookupStats {
    pub outcome: LookupOutcome,
    pub duration: Duration,
}

/// Snapshot of one expiry sweep, passed to [`MetricsSink::on_sweep`].
#[derive(Debug, Clone, Serialize)]
pub struct SweepStats {
    /// Entries removed because their expiration had passed
    pub removed: usize,
    /// Entries left in the cache after the sweep
    pub remaining: usize,
    pub duration: Duration,
}

/// Consumer of resolver and cache metrics.
///
/// Called synchronously from `fetch_label` and from the sweeper thread, so
/// implementations must be thread-safe and should return quickly.
pub trait MetricsSink: Send + Sync {
    fn on_lookup(&self, stats: &LookupStats);

    fn on_sweep(&self, stats: &SweepStats);
}

static SINK: OnceLock<Arc<dyn MetricsSink>> = OnceLock::new();

/// Set the global metrics sink.
///
/// The sink can be installed once; call this at startup before building any
/// resolver. Later calls are ignored with a warning. Until a sink is set,
/// events are dropped.
pub fn set_sink(sink: Arc<dyn MetricsSink>) {
    if SINK.set(sink).is_err() {
        warn!(
            "Metrics sink was already initialized. Ignoring subsequent set_sink call. Set the sink before the first lookup."
        );
    }
}

/// Whole milliseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn as_millis_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}

/// Whole microseconds in `duration`, saturating at `u64::MAX`.
pub(crate) fn as_micros_u64(duration: Duration) -> u64 {
    u64::try_from(duration.as_micros()).unwrap_or(u64::MAX)
}

pub(crate) fn record_sweep(removed: usize, remaining: usize, duration: Duration) {
    if let Some(sink) = SINK.get() {
        sink.on_sweep(&SweepStats {
            removed,
            remaining,
            duration,
        });
    }
}

/// RAII timer for one lookup. Reports to the sink on drop, once an outcome
/// has been set with [`LookupTimer::finish`].
pub(crate) struct LookupTimer {
    start: Instant,
    outcome: Option<LookupOutcome>,
}

impl LookupTimer {
    pub(crate) fn start() -> Self {
        LookupTimer {
            start: Instant::now(),
            outcome: None,
        }
    }

    pub(crate) fn finish(&mut self, outcome: LookupOutcome) {
        self.outcome = Some(outcome);
    }
}

impl Drop for LookupTimer {
    fn drop(&mut self) {
        if let (Some(outcome), Some(sink)) = (self.outcome, SINK.get()) {
            sink.on_lookup(&LookupStats {
                outcome,
                duration: self.start.elapsed(),
            });
        }
    }
}
