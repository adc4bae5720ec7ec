//! Time-bounded credit report cache.

use std::sync::Arc;
use std::time::{Duration, SystemTime};

use crate::cache::store::{CacheStore, DashMapStore};
use crate::clock::elapsed_between;
use crate::credit::{CreditReport, SubjectKey};

/// The most recent report for a subject and when it was cached.
#[derive(Debug, Clone, PartialEq)]
pub struct CacheEntry {
    pub report: Arc<CreditReport>,
    pub cached_at: SystemTime,
}

impl CacheEntry {
    /// Age of the entry at `now`; zero if `now` precedes `cached_at`.
    pub fn age(&self, now: SystemTime) -> Duration {
        elapsed_between(self.cached_at, now)
    }

    /// Check whether the entry is younger than `ttl` at `now`.
    pub fn is_fresh(&self, now: SystemTime, ttl: Duration) -> bool {
        self.age(now) < ttl
    }
}

/// A thread-safe TTL cache of credit reports.
///
/// Entries are never evicted; expired entries stay available as stale-if-error
/// fallbacks.
#[derive(Clone)]
pub struct TtlCache {
    store: Arc<dyn CacheStore>,
    ttl: Duration,
}

impl TtlCache {
    /// Create a cache over the default in-memory store.
    pub fn new(ttl: Duration) -> Self {
        Self::with_store(ttl, Arc::new(DashMapStore::new()))
    }

    /// Create a cache over a custom store.
    pub fn with_store(ttl: Duration, store: Arc<dyn CacheStore>) -> Self {
        Self { store, ttl }
    }

    /// Configured time-to-live.
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up the entry for `key`, fresh or not.
    pub fn get(&self, key: &SubjectKey) -> Option<CacheEntry> {
        self.store.get(key)
    }

    /// Store `report` for `key`, replacing any previous entry.
    pub fn put(&self, key: SubjectKey, report: CreditReport, now: SystemTime) -> CacheEntry {
        let entry = CacheEntry {
            report: Arc::new(report),
            cached_at: now,
        };
        self.store.insert(key, entry.clone());
        entry
    }

    /// Check `entry` against this cache's TTL.
    pub fn is_fresh(&self, entry: &CacheEntry, now: SystemTime) -> bool {
        entry.is_fresh(now, self.ttl)
    }

    /// Number of cached subjects.
    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }
}

impl std::fmt::Debug for TtlCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TtlCache")
            .field("ttl", &self.ttl)
            .field("entries", &self.store.len())
            .finish()
    }
}
