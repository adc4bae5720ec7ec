//! Circuit breaker for the credit bureau.
//!
//! # States
//! - Closed: normal operation, calls pass through
//! - Open: bureau assumed down, calls fail fast
//! - Half-Open: a bounded number of probe calls test for recovery
//!
//! # State Transitions
//! ```text
//! Closed → Open: consecutive_failures >= failure_threshold
//! Open → Half-Open: open_timeout elapsed since the last transition
//! Half-Open → Closed: half_open_success_threshold probes succeeded
//! Half-Open → Open: any probe fails (cooldown restarts)
//! ```
//!
//! # Design Decisions
//! - One breaker per downstream dependency, not per subject
//! - State and counters sit behind one mutex; the call runs outside it
//! - Every transition bumps a generation; results of calls admitted under an
//!   older generation are ignored
//! - Rejected calls never touch the counters

use std::future::Future;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::{Duration, SystemTime};
use serde::Serialize;
use thiserror::Error;

use crate::clock::{elapsed_between, Clock};
use crate::config::BreakerConfig;
use crate::observability::events::{self, GatewayObserver};

/// Breaker state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakerState {
    Closed,
    Open,
    HalfOpen,
}

impl BreakerState {
    pub fn as_str(&self) -> &'static str {
        match self {
            BreakerState::Closed => "closed",
            BreakerState::Open => "open",
            BreakerState::HalfOpen => "half_open",
        }
    }
}

/// Read-only view of the breaker's bookkeeping.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BreakerSnapshot {
    pub state: BreakerState,
    pub consecutive_failures: u32,
    pub last_transition_at: SystemTime,
    pub half_open_probes_in_flight: u32,
    pub half_open_successes: u32,
}

/// Outcome of a call made through the breaker.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum BreakerError<E> {
    /// Rejected without invoking the call.
    #[error("circuit breaker is open")]
    Open,

    /// The call ran and failed.
    #[error("{0}")]
    Call(E),
}

#[derive(Debug)]
struct Inner {
    state: BreakerState,
    consecutive_failures: u32,
    last_transition_at: SystemTime,
    half_open_probes_in_flight: u32,
    half_open_successes: u32,
    generation: u64,
}

type Transition = (BreakerState, BreakerState);

impl Inner {
    fn transition(&mut self, to: BreakerState, now: SystemTime) -> Option<Transition> {
        let from = self.state;
        if from == to {
            return None;
        }
        self.state = to;
        self.last_transition_at = now;
        self.generation += 1;
        self.half_open_probes_in_flight = 0;
        self.half_open_successes = 0;
        if to == BreakerState::Closed {
            self.consecutive_failures = 0;
        }
        Some((from, to))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum AdmissionKind {
    Normal,
    Probe,
}

/// A call admitted by the breaker. An unsettled probe permit gives its slot
/// back when dropped, so a cancelled probe neither succeeds nor fails.
struct Permit<'a> {
    breaker: &'a CircuitBreaker,
    kind: AdmissionKind,
    generation: u64,
    settled: bool,
}

impl Permit<'_> {
    fn settle(mut self, success: bool) {
        self.settled = true;
        self.breaker.record(self.kind, self.generation, success);
    }
}

impl Drop for Permit<'_> {
    fn drop(&mut self) {
        if !self.settled && self.kind == AdmissionKind::Probe {
            self.breaker.release_probe(self.generation);
        }
    }
}

/// Consecutive-failure circuit breaker with bounded half-open probing.
pub struct CircuitBreaker {
    name: String,
    failure_threshold: u32,
    open_timeout: Duration,
    max_half_open_probes: u32,
    half_open_success_threshold: u32,
    clock: Arc<dyn Clock>,
    observer: Option<Arc<dyn GatewayObserver>>,
    inner: Mutex<Inner>,
}

impl CircuitBreaker {
    /// Create a closed breaker. Zero thresholds are raised to one.
    pub fn new(name: impl Into<String>, config: &BreakerConfig, clock: Arc<dyn Clock>) -> Self {
        let now = clock.now();
        Self {
            name: name.into(),
            failure_threshold: config.failure_threshold.max(1),
            open_timeout: Duration::from_secs(config.open_timeout_secs),
            max_half_open_probes: config.max_half_open_probes.max(1),
            half_open_success_threshold: config.half_open_success_threshold.max(1),
            clock,
            observer: None,
            inner: Mutex::new(Inner {
                state: BreakerState::Closed,
                consecutive_failures: 0,
                last_transition_at: now,
                half_open_probes_in_flight: 0,
                half_open_successes: 0,
                generation: 0,
            }),
        }
    }

    /// Attach a state-change observer.
    pub fn with_observer(mut self, observer: Arc<dyn GatewayObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run `call` if the breaker admits it and record the outcome.
    ///
    /// Every `Err` returned by `call` counts as a failure.
    pub async fn execute<F, Fut, T, E>(&self, call: F) -> Result<T, BreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        let permit = match self.acquire() {
            Some(permit) => permit,
            None => {
                tracing::debug!(breaker = %self.name, "Call rejected by open circuit");
                return Err(BreakerError::Open);
            }
        };

        let result = call().await;
        permit.settle(result.is_ok());
        result.map_err(BreakerError::Call)
    }

    /// Current state, applying an elapsed cooldown first.
    pub fn state(&self) -> BreakerState {
        self.snapshot().state
    }

    /// Current bookkeeping, applying an elapsed cooldown first.
    pub fn snapshot(&self) -> BreakerSnapshot {
        let (snapshot, transition) = {
            let mut inner = self.lock();
            let transition = self.maybe_half_open(&mut inner);
            let snapshot = BreakerSnapshot {
                state: inner.state,
                consecutive_failures: inner.consecutive_failures,
                last_transition_at: inner.last_transition_at,
                half_open_probes_in_flight: inner.half_open_probes_in_flight,
                half_open_successes: inner.half_open_successes,
            };
            (snapshot, transition)
        };
        self.emit(transition);
        snapshot
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(|e| e.into_inner())
    }

    fn maybe_half_open(&self, inner: &mut Inner) -> Option<Transition> {
        if inner.state != BreakerState::Open {
            return None;
        }
        let now = self.clock.now();
        if elapsed_between(inner.last_transition_at, now) >= self.open_timeout {
            inner.transition(BreakerState::HalfOpen, now)
        } else {
            None
        }
    }

    fn acquire(&self) -> Option<Permit<'_>> {
        let (admission, transition) = {
            let mut inner = self.lock();
            let transition = self.maybe_half_open(&mut inner);
            let admission = match inner.state {
                BreakerState::Closed => Some(AdmissionKind::Normal),
                BreakerState::Open => None,
                BreakerState::HalfOpen => {
                    if inner.half_open_probes_in_flight < self.max_half_open_probes {
                        inner.half_open_probes_in_flight += 1;
                        Some(AdmissionKind::Probe)
                    } else {
                        None
                    }
                }
            };
            (admission.map(|kind| (kind, inner.generation)), transition)
        };
        self.emit(transition);

        admission.map(|(kind, generation)| Permit {
            breaker: self,
            kind,
            generation,
            settled: false,
        })
    }

    fn record(&self, kind: AdmissionKind, generation: u64, success: bool) {
        let transition = {
            let mut inner = self.lock();
            if inner.generation != generation {
                // Admitted before the last transition; outcome is stale.
                return;
            }
            let now = self.clock.now();
            match (inner.state, kind) {
                (BreakerState::Closed, AdmissionKind::Normal) => {
                    if success {
                        inner.consecutive_failures = 0;
                        None
                    } else {
                        inner.consecutive_failures += 1;
                        if inner.consecutive_failures >= self.failure_threshold {
                            inner.transition(BreakerState::Open, now)
                        } else {
                            None
                        }
                    }
                }
                (BreakerState::HalfOpen, AdmissionKind::Probe) => {
                    inner.half_open_probes_in_flight = inner.half_open_probes_in_flight.saturating_sub(1);
                    if success {
                        inner.half_open_successes += 1;
                        if inner.half_open_successes >= self.half_open_success_threshold {
                            inner.transition(BreakerState::Closed, now)
                        } else {
                            None
                        }
                    } else {
                        inner.transition(BreakerState::Open, now)
                    }
                }
                _ => None,
            }
        };
        self.emit(transition);
    }

    fn release_probe(&self, generation: u64) {
        let mut inner = self.lock();
        if inner.generation == generation && inner.state == BreakerState::HalfOpen {
            inner.half_open_probes_in_flight = inner.half_open_probes_in_flight.saturating_sub(1);
        }
    }

    fn emit(&self, transition: Option<Transition>) {
        let Some((from, to)) = transition else {
            return;
        };

        match to {
            BreakerState::Open => tracing::warn!(
                breaker = %self.name,
                from = from.as_str(),
                open_timeout_secs = self.open_timeout.as_secs(),
                "Circuit opened"
            ),
            BreakerState::HalfOpen => tracing::info!(breaker = %self.name, "Circuit half-open, probing"),
            BreakerState::Closed => tracing::info!(breaker = %self.name, from = from.as_str(), "Circuit closed"),
        }

        if let Some(observer) = &self.observer {
            events::notify(|| observer.on_state_change(&self.name, from, to));
        }
    }
}

impl std::fmt::Debug for CircuitBreaker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CircuitBreaker")
            .field("name", &self.name)
            .field("failure_threshold", &self.failure_threshold)
            .field("open_timeout", &self.open_timeout)
            .field("max_half_open_probes", &self.max_half_open_probes)
            .finish()
    }
}
