//! Credit report caching.
//!
//! # Data Flow
//! ```text
//! CreditGateway
//!     → ttl.rs (freshness check, put after successful fetch)
//!     → store.rs (CacheStore trait, sharded DashMap default)
//!     → single_flight.rs (one upstream fetch per key at a time)
//! ```
//!
//! # Design Decisions
//! - No size or LRU eviction; storage is behind `CacheStore` so a bounded
//!   store can replace it later
//! - Expired entries are kept as stale-if-error fallbacks
//! - Entries are replaced whole, never mutated in place

pub mod single_flight;
pub mod store;
pub mod ttl;

pub use single_flight::{FlightAborted, FlightRole, SingleFlight};
pub use store::{CacheStore, DashMapStore};
pub use ttl::{CacheEntry, TtlCache};
