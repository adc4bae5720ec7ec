//! The credit report read path.
//!
//! Fallback order: fresh cache, then one breaker-guarded bureau call per
//! subject (shared by concurrent callers), then the expired cache entry,
//! then `NoDataAvailable`.

use std::future::Future;
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime};

use crate::cache::{CacheEntry, FlightRole, SingleFlight, TtlCache};
use crate::clock::Clock;
use crate::config::GatewayConfig;
use crate::credit::{
    CreditError, CreditLookup, CreditReport, CreditResult, CreditSource, FetchError, Freshness,
    SubjectKey,
};
use crate::observability::events::{self, CacheEvent, GatewayObserver, MetricsObserver};
use crate::observability::metrics;
use crate::resilience::{with_deadline, BreakerError, CircuitBreaker};

/// Composes the cache, breaker and bureau into one lookup.
pub struct CreditGateway {
    cache: TtlCache,
    breaker: Arc<CircuitBreaker>,
    source: Arc<dyn CreditSource>,
    flights: SingleFlight<SubjectKey, CreditResult<CacheEntry>>,
    upstream_timeout: Duration,
    observer: Arc<dyn GatewayObserver>,
}

impl CreditGateway {
    /// Create a gateway over existing cache and breaker handles.
    pub fn new(
        cache: TtlCache,
        breaker: Arc<CircuitBreaker>,
        source: Arc<dyn CreditSource>,
        upstream_timeout: Duration,
    ) -> Self {
        Self {
            cache,
            breaker,
            source,
            flights: SingleFlight::new(),
            upstream_timeout,
            observer: Arc::new(MetricsObserver),
        }
    }

    /// Build the cache and breaker from configuration.
    ///
    /// `observer` receives both breaker transitions and cache events.
    pub fn from_config(
        config: &GatewayConfig,
        source: Arc<dyn CreditSource>,
        clock: Arc<dyn Clock>,
        observer: Arc<dyn GatewayObserver>,
    ) -> Self {
        let cache = TtlCache::new(config.cache.ttl());
        let breaker = CircuitBreaker::new(source.name(), &config.breaker, clock)
            .with_observer(Arc::clone(&observer));

        tracing::info!(
            source = source.name(),
            ttl_secs = config.cache.ttl_secs,
            failure_threshold = config.breaker.failure_threshold,
            open_timeout_secs = config.breaker.open_timeout_secs,
            upstream_timeout_ms = config.upstream.timeout_ms,
            "Credit gateway configured"
        );

        Self::new(cache, Arc::new(breaker), source, config.upstream.timeout()).with_observer(observer)
    }

    /// Replace the cache-event observer.
    pub fn with_observer(mut self, observer: Arc<dyn GatewayObserver>) -> Self {
        self.observer = observer;
        self
    }

    pub fn cache(&self) -> &TtlCache {
        &self.cache
    }

    pub fn breaker(&self) -> &CircuitBreaker {
        &self.breaker
    }

    /// Fetch the report for `subject` as of `now`.
    ///
    /// # Errors
    /// Returns [`CreditError::NoDataAvailable`] only when the live fetch failed
    /// and nothing at all is cached for `subject`.
    pub async fn get_report(&self, subject: &SubjectKey, now: SystemTime) -> CreditResult<CreditLookup> {
        match self.cache.get(subject) {
            Some(entry) if self.cache.is_fresh(&entry, now) => {
                self.observe(subject, CacheEvent::Hit);
                tracing::debug!(subject = %subject, "Serving fresh cached report");
                return Ok(CreditLookup {
                    report: CreditReport::clone(&entry.report),
                    freshness: Freshness::Fresh,
                });
            }
            Some(_) => self.observe(subject, CacheEvent::Expired),
            None => self.observe(subject, CacheEvent::Miss),
        }

        let (outcome, role) = self
            .flights
            .run(subject.clone(), || self.fetch_task(subject.clone(), now))
            .await;
        if role == FlightRole::Follower {
            self.observe(subject, CacheEvent::Coalesced);
        }

        let outcome = outcome.unwrap_or_else(|aborted| Err(CreditError::TransientUpstream(aborted.to_string())));
        match outcome {
            Ok(entry) => Ok(CreditLookup {
                report: CreditReport::clone(&entry.report),
                freshness: Freshness::Fresh,
            }),
            Err(cause) => self.fallback(subject, now, cause),
        }
    }

    fn fallback(&self, subject: &SubjectKey, now: SystemTime, cause: CreditError) -> CreditResult<CreditLookup> {
        // Re-read: a concurrent refresh may have landed since the first lookup.
        let Some(entry) = self.cache.get(subject) else {
            tracing::warn!(subject = %subject, cause = %cause, "No credit data available");
            return Err(CreditError::NoDataAvailable {
                subject: subject.clone(),
                cause: Box::new(cause),
            });
        };

        let freshness = if self.cache.is_fresh(&entry, now) {
            Freshness::Fresh
        } else {
            self.observe(subject, CacheEvent::StaleServed);
            tracing::info!(
                subject = %subject,
                cause = %cause,
                age_secs = entry.age(now).as_secs(),
                ttl_secs = self.cache.ttl().as_secs(),
                "Serving stale report after failed refresh"
            );
            Freshness::Stale
        };

        Ok(CreditLookup {
            report: CreditReport::clone(&entry.report),
            freshness,
        })
    }

    /// The shared bureau call for one subject. Owns everything it touches so
    /// it can outlive any single caller.
    fn fetch_task(
        &self,
        subject: SubjectKey,
        now: SystemTime,
    ) -> impl Future<Output = CreditResult<CacheEntry>> + Send + 'static {
        let cache = self.cache.clone();
        let breaker = Arc::clone(&self.breaker);
        let source = Arc::clone(&self.source);
        let deadline = self.upstream_timeout;

        async move {
            // A flight that finished between the caller's miss and this one
            // starting has already refreshed the entry.
            if let Some(entry) = cache.get(&subject).filter(|e| cache.is_fresh(e, now)) {
                return Ok(entry);
            }

            let started = Instant::now();
            let result = breaker
                .execute(|| async {
                    let report = with_deadline(deadline, source.fetch(&subject, deadline)).await?;
                    report.validate(&subject).map_err(FetchError::Invalid)?;
                    Ok::<_, FetchError>(report)
                })
                .await;
            let elapsed = started.elapsed();

            match result {
                Ok(report) => {
                    metrics::record_upstream_call(source.name(), "success", elapsed);
                    tracing::debug!(subject = %subject, score = report.score, "Fetched credit report");
                    let entry = cache.put(subject, report, now);
                    metrics::record_cache_size(cache.len());
                    Ok(entry)
                }
                Err(BreakerError::Open) => {
                    metrics::record_upstream_call(source.name(), "rejected", elapsed);
                    Err(CreditError::BreakerOpen)
                }
                Err(BreakerError::Call(err)) => {
                    let outcome = match err {
                        FetchError::Timeout(_) => "timeout",
                        FetchError::Unavailable(_) => "unavailable",
                        FetchError::Invalid(_) => "invalid",
                    };
                    metrics::record_upstream_call(source.name(), outcome, elapsed);
                    tracing::warn!(subject = %subject, error = %err, "Credit bureau call failed");
                    Err(err.into())
                }
            }
        }
    }

    fn observe(&self, subject: &SubjectKey, event: CacheEvent) {
        events::notify(|| self.observer.on_cache_event(subject, event));
    }
}

impl std::fmt::Debug for CreditGateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CreditGateway")
            .field("cache", &self.cache)
            .field("breaker", &self.breaker)
            .field("source", &self.source.name())
            .field("upstream_timeout", &self.upstream_timeout)
            .finish()
    }
}
