//! Resilient credit-score retrieval for loan underwriting.
//!
//! A TTL cache, a circuit breaker and single-flight request coalescing sit
//! between the underwriting evaluator and an unreliable credit bureau, so
//! decisions degrade to slightly-old data instead of failing outright.

pub mod cache;
pub mod clock;
pub mod config;
pub mod credit;
pub mod gateway;
pub mod observability;
pub mod resilience;
pub mod underwriting;

pub use config::GatewayConfig;
pub use gateway::CreditGateway;
pub use underwriting::UnderwritingEvaluator;
