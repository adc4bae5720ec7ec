//! Observer hook for breaker and cache events.
//!
//! The gateway and breaker call into a [`GatewayObserver`] but never depend
//! on it: every call goes through [`notify`], which swallows panics so a
//! broken observer cannot fail a lookup.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::credit::SubjectKey;
use crate::observability::metrics;
use crate::resilience::BreakerState;

/// What happened on a cache lookup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum CacheEvent {
    /// Fresh entry served, no upstream call.
    Hit,
    /// No entry for the subject.
    Miss,
    /// Entry present but older than the TTL.
    Expired,
    /// Joined a fetch already in flight for the subject.
    Coalesced,
    /// Live fetch failed and an expired entry was served instead.
    StaleServed,
}

impl CacheEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            CacheEvent::Hit => "hit",
            CacheEvent::Miss => "miss",
            CacheEvent::Expired => "expired",
            CacheEvent::Coalesced => "coalesced",
            CacheEvent::StaleServed => "stale_served",
        }
    }
}

/// Receives state changes and cache events. Both methods default to no-ops.
pub trait GatewayObserver: Send + Sync {
    fn on_state_change(&self, _breaker: &str, _from: BreakerState, _to: BreakerState) {}

    fn on_cache_event(&self, _subject: &SubjectKey, _event: CacheEvent) {}
}

/// Observer that ignores everything.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl GatewayObserver for NoopObserver {}

/// Observer that records Prometheus metrics.
#[derive(Debug, Clone, Copy, Default)]
pub struct MetricsObserver;

impl GatewayObserver for MetricsObserver {
    fn on_state_change(&self, breaker: &str, from: BreakerState, to: BreakerState) {
        metrics::record_breaker_transition(breaker, from, to);
    }

    fn on_cache_event(&self, _subject: &SubjectKey, event: CacheEvent) {
        metrics::record_cache_event(event);
    }
}

/// Invoke an observer callback, containing any panic.
pub fn notify<F: FnOnce()>(f: F) {
    if catch_unwind(AssertUnwindSafe(f)).is_err() {
        tracing::warn!("Observer panicked; event dropped");
    }
}
