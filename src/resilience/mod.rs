//! Resilience subsystem.
//!
//! # Data Flow
//! ```text
//! Bureau call:
//!     → circuit_breaker.rs (admit, or reject fast while open)
//!     → timeouts.rs (enforce the upstream deadline)
//!     → outcome recorded by the breaker (timeouts count as failures)
//! ```
//!
//! # Design Decisions
//! - Timeouts are non-negotiable; every bureau call has a deadline
//! - No retry loop; recovery is the breaker's half-open probing
//! - Breaker-open rejections never reach the bureau and are never counted

pub mod circuit_breaker;
pub mod timeouts;

pub use circuit_breaker::{BreakerError, BreakerSnapshot, BreakerState, CircuitBreaker};
pub use timeouts::with_deadline;
