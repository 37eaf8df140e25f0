//! In-memory expiring store shared by the caching resolvers.
//!
//! ## TTL classes
//!
//! | Key suffix            | TTL      | Reason                       |
//! |-----------------------|----------|------------------------------|
//! | `/@latest`, `/@v/list`| 1 hour   | volatile, new tags appear    |
//! | everything else       | 24 hours | immutable `.info/.mod/.zip`  |
//!
//! ## Expiry
//!
//! An entry answers reads only while `now < expires_at`. Lookups treat
//! expiry as a filter and never delete; the [`Sweeper`] task is the only
//! path that physically frees memory.
//!
//! ## Locking
//!
//! A single `RwLock` guards the map: reads run concurrently, writes and
//! sweeps are exclusive. A sweep collects expired keys under the read lock
//! and only holds the write lock while deleting them.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::RwLock;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::types::Fetched;

/// TTL for volatile keys (`@latest`, version lists).
pub const SHORT_TTL: Duration = Duration::from_secs(60 * 60);

/// TTL for immutable content.
pub const LONG_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default period of the expiry sweep.
pub const SWEEP_INTERVAL: Duration = Duration::from_secs(60);

/// Chooses a TTL from the key's suffix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TtlPolicy {
    pub short: Duration,
    pub long: Duration,
}

impl Default for TtlPolicy {
    fn default() -> Self {
        Self {
            short: SHORT_TTL,
            long: LONG_TTL,
        }
    }
}

impl TtlPolicy {
    pub fn new(short: Duration, long: Duration) -> Self {
        Self { short, long }
    }

    /// Returns the TTL class for `key`.
    pub fn ttl_for(&self, key: &str) -> Duration {
        if key.ends_with("/@latest") || key.ends_with("/@v/list") {
            self.short
        } else {
            self.long
        }
    }
}

#[derive(Debug, Clone)]
struct CacheEntry {
    value: Fetched,
    expires_at: Instant,
}

impl CacheEntry {
    fn is_live(&self, now: Instant) -> bool {
        now < self.expires_at
    }
}

/// Expiring key → response map.
#[derive(Debug, Default)]
pub struct TtlCache {
    entries: RwLock<HashMap<String, CacheEntry>>,
    policy: TtlPolicy,
}

impl TtlCache {
    /// Creates an empty cache using `policy` for TTL selection.
    pub fn new(policy: TtlPolicy) -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
            policy,
        }
    }

    /// Returns a live entry for `key`.
    ///
    /// Presence is decided by the entry, not the payload: an empty body with
    /// a status is a hit.
    pub fn get(&self, key: &str) -> Option<Fetched> {
        let now = Instant::now();
        self.entries
            .read()
            .get(key)
            .filter(|entry| entry.is_live(now))
            .map(|entry| entry.value.clone())
    }

    /// Stores `value` under `key` with the TTL class of the key.
    pub fn set(&self, key: &str, value: Fetched) {
        let ttl = self.policy.ttl_for(key);
        self.set_with_ttl(key, value, ttl);
    }

    /// Stores `value` under `key`, replacing any previous entry.
    pub fn set_with_ttl(&self, key: &str, value: Fetched, ttl: Duration) {
        let entry = CacheEntry {
            value,
            expires_at: Instant::now() + ttl,
        };
        self.entries.write().insert(key.to_string(), entry);
    }

    /// Removes every expired entry. Returns the number removed.
    pub fn sweep(&self) -> usize {
        let now = Instant::now();
        let expired: Vec<String> = self
            .entries
            .read()
            .iter()
            .filter(|(_, entry)| !entry.is_live(now))
            .map(|(key, _)| key.clone())
            .collect();

        if expired.is_empty() {
            return 0;
        }

        let mut entries = self.entries.write();
        let mut removed = 0;
        for key in expired {
            // Re-check: the key may have been refreshed between the two locks.
            if entries.get(&key).is_some_and(|entry| !entry.is_live(now)) {
                entries.remove(&key);
                removed += 1;
            }
        }
        removed
    }

    /// Number of physically stored entries, expired ones included.
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Starts the background expiry sweep for this cache.
    pub fn start_sweeper(self: &Arc<Self>, period: Duration) -> Sweeper {
        Sweeper::start(Arc::clone(self), period)
    }
}

/// Handle to a running expiry sweep.
///
/// The task runs until [`Sweeper::stop`] is called or the handle is dropped.
#[derive(Debug)]
pub struct Sweeper {
    shutdown_tx: watch::Sender<bool>,
    handle: JoinHandle<()>,
}

impl Sweeper {
    fn start(cache: Arc<TtlCache>, period: Duration) -> Self {
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);

        let handle = tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let removed = cache.sweep();
                        if removed > 0 {
                            tracing::debug!(
                                removed,
                                remaining = cache.len(),
                                "cache sweep completed"
                            );
                        }
                    }
                    changed = shutdown_rx.changed() => {
                        // A dropped sender also ends the loop.
                        if changed.is_err() || *shutdown_rx.borrow() {
                            tracing::debug!("cache sweeper stopped");
                            break;
                        }
                    }
                }
            }
        });

        Self {
            shutdown_tx,
            handle,
        }
    }

    /// Stops the sweep and waits for the task to finish.
    pub async fn stop(self) {
        let _ = self.shutdown_tx.send(true);
        if let Err(e) = self.handle.await {
            tracing::warn!(error = %e, "cache sweeper task failed");
        }
    }
}
