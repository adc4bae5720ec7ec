//! Metrics collection and exposition.
//!
//! # Metrics
//! - `credit_cache_events_total` (counter): cache lookups by event
//! - `credit_breaker_transitions_total` (counter): breaker transitions by from/to
//! - `credit_breaker_state` (gauge): 0=closed, 1=half_open, 2=open
//! - `credit_upstream_requests_total` (counter): bureau calls by outcome
//! - `credit_upstream_duration_seconds` (histogram): bureau call latency
//! - `credit_decisions_total` (counter): underwriting decisions by status/freshness
//!
//! Recording is a no-op until a recorder is installed, so library users and
//! tests pay nothing unless they call [`init_metrics`].

use metrics_exporter_prometheus::PrometheusBuilder;
use std::net::SocketAddr;
use std::time::Duration;

use crate::observability::events::CacheEvent;
use crate::resilience::BreakerState;

/// Install the Prometheus recorder and its scrape endpoint.
///
/// Must be called from within a Tokio runtime.
pub fn init_metrics(addr: SocketAddr) {
    match PrometheusBuilder::new().with_http_listener(addr).install() {
        Ok(()) => tracing::info!(address = %addr, "Metrics endpoint listening"),
        Err(e) => tracing::error!(address = %addr, error = %e, "Failed to install metrics exporter"),
    }
}

pub fn record_cache_event(event: CacheEvent) {
    metrics::counter!("credit_cache_events_total", "event" => event.as_str()).increment(1);
}

pub fn record_cache_size(entries: usize) {
    metrics::gauge!("credit_cache_entries").set(entries as f64);
}

pub fn record_breaker_transition(breaker: &str, from: BreakerState, to: BreakerState) {
    metrics::counter!(
        "credit_breaker_transitions_total",
        "breaker" => breaker.to_string(),
        "from" => from.as_str(),
        "to" => to.as_str()
    )
    .increment(1);

    let level = match to {
        BreakerState::Closed => 0.0,
        BreakerState::HalfOpen => 1.0,
        BreakerState::Open => 2.0,
    };
    metrics::gauge!("credit_breaker_state", "breaker" => breaker.to_string()).set(level);
}

pub fn record_upstream_call(source: &str, outcome: &'static str, elapsed: Duration) {
    metrics::counter!(
        "credit_upstream_requests_total",
        "source" => source.to_string(),
        "outcome" => outcome
    )
    .increment(1);
    metrics::histogram!("credit_upstream_duration_seconds", "source" => source.to_string())
        .record(elapsed.as_secs_f64());
}

pub fn record_decision(status: &'static str, freshness: &'static str) {
    metrics::counter!(
        "credit_decisions_total",
        "status" => status,
        "freshness" => freshness
    )
    .increment(1);
}
