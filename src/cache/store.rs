//! Pluggable storage behind the TTL cache.
//!
//! The default store never evicts: memory grows with the number of unique
//! subjects. A bounded or remote store can be swapped in by implementing
//! [`CacheStore`] without touching the cache's callers.

use dashmap::DashMap;

use crate::cache::ttl::CacheEntry;
use crate::credit::SubjectKey;

/// Key/value storage for cache entries.
///
/// `insert` must replace the whole entry atomically with respect to `get`.
pub trait CacheStore: Send + Sync {
    fn get(&self, key: &SubjectKey) -> Option<CacheEntry>;
    fn insert(&self, key: SubjectKey, entry: CacheEntry);
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Sharded in-memory store; each key is guarded by its shard lock only.
#[derive(Debug, Default)]
pub struct DashMapStore {
    inner: DashMap<SubjectKey, CacheEntry>,
}

impl DashMapStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl CacheStore for DashMapStore {
    fn get(&self, key: &SubjectKey) -> Option<CacheEntry> {
        self.inner.get(key).map(|r| r.value().clone())
    }

    fn insert(&self, key: SubjectKey, entry: CacheEntry) {
        self.inner.insert(key, entry);
    }

    fn len(&self) -> usize {
        self.inner.len()
    }
}
