//! In-memory key/value cache with sliding expiration.
//!
//! Entries carry their own expiration instant. Reads never extend it; callers
//! that want renew-on-hit semantics call [`SlidingCache::renew`] after a
//! successful [`SlidingCache::get`]. Expired entries are invisible to reads and
//! are reclaimed by a background sweeper thread on a fixed interval.
//!
//! There is no capacity bound: memory is limited to the entries touched within
//! one TTL, plus whatever expired since the last sweep.

use std::collections::HashMap;
use std::sync::mpsc::{self, RecvTimeoutError, Sender};
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::error::LabelError;
use crate::metrics;

const SWEEPER_THREAD_NAME: &str = "label-cache-sweeper";

/// A cached value and the instant it stops being visible.
///
/// `expires_at` is `None` for entries stored with a zero TTL, which never
/// expire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CacheEntry {
    value: String,
    expires_at: Option<Instant>,
}

impl CacheEntry {
    fn new(value: String, now: Instant, ttl: Duration) -> Self {
        CacheEntry {
            value,
            expires_at: expiry(now, ttl),
        }
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn expires_at(&self) -> Option<Instant> {
        self.expires_at
    }

    pub fn is_expired(&self, now: Instant) -> bool {
        self.expires_at.is_some_and(|at| now >= at)
    }
}

fn expiry(now: Instant, ttl: Duration) -> Option<Instant> {
    if ttl.is_zero() {
        None
    } else {
        now.checked_add(ttl)
    }
}

#[derive(Debug, Default)]
struct Store {
    entries: RwLock<HashMap<String, CacheEntry>>,
}

impl Store {
    // A panic while holding the lock cannot leave an entry half-written, so a
    // poisoned map is still consistent.
    fn read(&self) -> RwLockReadGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, HashMap<String, CacheEntry>> {
        self.entries.write().unwrap_or_else(PoisonError::into_inner)
    }

    fn sweep(&self) -> usize {
        let started = Instant::now();
        let (removed, remaining) = {
            let mut entries = self.write();
            let before = entries.len();
            entries.retain(|_, entry| !entry.is_expired(started));
            (before - entries.len(), entries.len())
        };
        let elapsed = started.elapsed();

        debug!(
            event = "CacheSweep",
            phase = "Swept",
            removed,
            remaining,
            duration_us = metrics::as_micros_u64(elapsed)
        );
        metrics::record_sweep(removed, remaining, elapsed);
        removed
    }
}

/// Background thread that periodically drops expired entries.
///
/// Dropping the stop sender wakes the thread immediately, so shutdown never
/// waits for a full interval.
#[derive(Debug)]
struct Sweeper {
    stop: Option<Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl Sweeper {
    fn spawn(store: Arc<Store>, interval: Duration) -> Result<Self, LabelError> {
        let (stop, stopped) = mpsc::channel::<()>();
        let handle = thread::Builder::new()
            .name(SWEEPER_THREAD_NAME.to_string())
            .spawn(move || {
                debug!(
                    event = "CacheSweep",
                    phase = "Start",
                    interval_ms = metrics::as_millis_u64(interval)
                );
                while let Err(RecvTimeoutError::Timeout) = stopped.recv_timeout(interval) {
                    store.sweep();
                }
                debug!(event = "CacheSweep", phase = "Stop");
            })?;

        Ok(Sweeper {
            stop: Some(stop),
            handle: Some(handle),
        })
    }

    fn stop(&mut self) {
        drop(self.stop.take());
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!(event = "CacheSweep", phase = "Stop", "sweeper thread panicked");
            }
        }
    }
}

impl Drop for Sweeper {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Thread-safe TTL cache with explicit renewal and periodic expiry sweeps.
#[derive(Debug)]
pub struct SlidingCache {
    store: Arc<Store>,
    default_ttl: Duration,
    cleanup_interval: Duration,
    sweeper: Option<Sweeper>,
}

impl SlidingCache {
    /// Create a cache and start its sweeper.
    ///
    /// A zero `cleanup_interval` starts no sweeper; expired entries then stay
    /// in memory until [`SlidingCache::delete_expired`] is called.
    pub fn new(default_ttl: Duration, cleanup_interval: Duration) -> Result<Self, LabelError> {
        let store = Arc::new(Store::default());
        let sweeper = if cleanup_interval.is_zero() {
            None
        } else {
            Some(Sweeper::spawn(Arc::clone(&store), cleanup_interval)?)
        };

        Ok(SlidingCache {
            store,
            default_ttl,
            cleanup_interval,
            sweeper,
        })
    }

    /// The value stored under `key`, if present and not expired.
    pub fn get(&self, key: &str) -> Option<String> {
        let now = Instant::now();
        self.store
            .read()
            .get(key)
            .filter(|entry| !entry.is_expired(now))
            .map(|entry| entry.value.clone())
    }

    /// The raw entry under `key`, expired or not.
    pub fn entry(&self, key: &str) -> Option<CacheEntry> {
        self.store.read().get(key).cloned()
    }

    /// Insert or fully replace the entry under `key`.
    pub fn set(&self, key: impl Into<String>, value: impl Into<String>, ttl: Duration) {
        let entry = CacheEntry::new(value.into(), Instant::now(), ttl);
        self.store.write().insert(key.into(), entry);
    }

    /// Push the expiration of a live entry to `now + ttl`.
    ///
    /// Returns `false` if there was no live entry to renew.
    pub fn renew(&self, key: &str, ttl: Duration) -> bool {
        let now = Instant::now();
        match self.store.write().get_mut(key) {
            Some(entry) if !entry.is_expired(now) => {
                entry.expires_at = expiry(now, ttl);
                true
            }
            _ => false,
        }
    }

    /// Whether `key` holds a live entry.
    pub fn contains(&self, key: &str) -> bool {
        let now = Instant::now();
        self.store
            .read()
            .get(key)
            .is_some_and(|entry| !entry.is_expired(now))
    }

    /// Remove every expired entry now, returning how many were dropped.
    pub fn delete_expired(&self) -> usize {
        self.store.sweep()
    }

    /// Number of stored entries, including expired ones not yet swept.
    pub fn len(&self) -> usize {
        self.store.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn default_ttl(&self) -> Duration {
        self.default_ttl
    }

    pub fn cleanup_interval(&self) -> Duration {
        self.cleanup_interval
    }

    pub fn has_sweeper(&self) -> bool {
        self.sweeper.is_some()
    }

    /// Stop the background sweeper and wait for it to exit.
    pub fn stop_sweeper(&mut self) {
        if let Some(mut sweeper) = self.sweeper.take() {
            sweeper.stop();
        }
    }
}
