//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! Breaker transitions, cache lookups, bureau calls, decisions
//!     → logging.rs (structured tracing events)
//!     → events.rs (GatewayObserver hook, panic-isolated)
//!     → metrics.rs (counters, gauges, histograms)
//!     → Prometheus scrape endpoint (optional)
//! ```
//!
//! # Design Decisions
//! - Observers are never on the failure path of a lookup
//! - Metrics are cheap (no-ops without an installed recorder)

pub mod events;
pub mod logging;
pub mod metrics;

pub use events::{CacheEvent, GatewayObserver, MetricsObserver, NoopObserver};
