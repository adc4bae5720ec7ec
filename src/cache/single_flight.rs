//! Request coalescing for concurrent misses on the same key.
//!
//! # Design Decisions
//! - The first caller for a key spawns the fetch; later callers join it
//! - The fetch runs as its own task, so a cancelled caller never cancels the
//!   fetch for the others still waiting
//! - The task removes its own table entry when done; keys are independent

use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use futures_util::future::{BoxFuture, FutureExt, Shared};
use std::future::Future;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use thiserror::Error;

/// The shared fetch task ended without producing a value (panic or runtime
/// shutdown).
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("in-flight fetch aborted: {0}")]
pub struct FlightAborted(pub String);

/// Whether the caller started the fetch or joined one already running.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FlightRole {
    Leader,
    Follower,
}

type FlightResult<T> = Result<T, FlightAborted>;

struct Flight<T> {
    id: u64,
    result: Shared<BoxFuture<'static, FlightResult<T>>>,
}

impl<T> Clone for Flight<T> {
    fn clone(&self) -> Self {
        Self {
            id: self.id,
            result: self.result.clone(),
        }
    }
}

/// Removes a finished flight from the table, including when the fetch
/// panicked.
struct FlightCleanup<K: Eq + Hash, T> {
    table: Arc<DashMap<K, Flight<T>>>,
    key: K,
    id: u64,
}

impl<K: Eq + Hash, T> Drop for FlightCleanup<K, T> {
    fn drop(&mut self) {
        let id = self.id;
        self.table.remove_if(&self.key, |_, flight| flight.id == id);
    }
}

/// Table of in-flight fetches keyed by `K`.
pub struct SingleFlight<K, T> {
    in_flight: Arc<DashMap<K, Flight<T>>>,
    next_id: AtomicU64,
}

impl<K, T> SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    pub fn new() -> Self {
        Self {
            in_flight: Arc::new(DashMap::new()),
            next_id: AtomicU64::new(0),
        }
    }

    /// Run `make()` for `key` unless a fetch for `key` is already running, in
    /// which case wait for that one instead.
    ///
    /// `make` is only called by the leader. Must be called from within a
    /// Tokio runtime.
    pub async fn run<F, Fut>(&self, key: K, make: F) -> (FlightResult<T>, FlightRole)
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = T> + Send + 'static,
    {
        let (flight, role) = {
            // The shard lock is held only while the entry is inspected or
            // installed, never across an await.
            match self.in_flight.entry(key.clone()) {
                Entry::Occupied(existing) => (existing.get().clone(), FlightRole::Follower),
                Entry::Vacant(vacant) => {
                    let flight = self.spawn_flight(key, make());
                    vacant.insert(flight.clone());
                    (flight, FlightRole::Leader)
                }
            }
        };

        (flight.result.await, role)
    }

    fn spawn_flight<Fut>(&self, key: K, fut: Fut) -> Flight<T>
    where
        Fut: Future<Output = T> + Send + 'static,
    {
        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let table = Arc::clone(&self.in_flight);

        let handle = tokio::spawn(async move {
            let _cleanup = FlightCleanup { table, key, id };
            fut.await
        });

        let result = async move {
            handle
                .await
                .map_err(|e| FlightAborted(e.to_string()))
        }
        .boxed()
        .shared();

        Flight { id, result }
    }

    /// Number of keys with a fetch currently running.
    pub fn in_flight(&self) -> usize {
        self.in_flight.len()
    }
}

impl<K, T> Default for SingleFlight<K, T>
where
    K: Eq + Hash + Clone + Send + Sync + 'static,
    T: Clone + Send + Sync + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}
