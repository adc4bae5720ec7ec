//! Credit score gateway.
//!
//! # Data Flow
//! ```text
//! get_report(subject, now)
//!     → TtlCache: fresh entry? return Fresh
//!     → SingleFlight: join or lead the fetch for this subject
//!         → CircuitBreaker → with_deadline → CreditSource::fetch
//!         → validate report → TtlCache::put
//!     → on failure: expired entry? return Stale : NoDataAvailable
//! ```

pub mod service;

pub use service::CreditGateway;
