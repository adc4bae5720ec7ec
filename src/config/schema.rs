//! Configuration schema definitions.
//!
//! This module defines the complete configuration structure for the gateway.
//! All types derive Serde traits for deserialization from config files.

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the credit gateway.
#[derive(Debug, Clone, Deserialize, Serialize, Default, PartialEq)]
#[serde(default)]
pub struct GatewayConfig {
    /// Report cache settings.
    pub cache: CacheConfig,

    /// Circuit breaker settings for the bureau.
    pub breaker: BreakerConfig,

    /// Bureau connection settings.
    pub upstream: UpstreamConfig,

    /// Decision rule settings.
    pub underwriting: UnderwritingConfig,

    /// Observability settings.
    pub observability: ObservabilityConfig,
}

/// Report cache configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct CacheConfig {
    /// How long a cached report counts as fresh, in seconds.
    pub ttl_secs: u64,
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            ttl_secs: 24 * 60 * 60,
        }
    }
}

/// Circuit breaker configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct BreakerConfig {
    /// Consecutive failures before the circuit opens.
    pub failure_threshold: u32,

    /// Cooldown before probing a tripped bureau, in seconds.
    pub open_timeout_secs: u64,

    /// Concurrent trial calls allowed while half-open.
    pub max_half_open_probes: u32,

    /// Probe successes needed to close the circuit again.
    pub half_open_success_threshold: u32,
}

impl Default for BreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_secs: 15,
            max_half_open_probes: 3,
            half_open_success_threshold: 3,
        }
    }
}

/// Bureau connection configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UpstreamConfig {
    /// Bureau base URL; reports are fetched from `{base_url}/reports/{subject}`.
    pub base_url: String,

    /// Per-call timeout in milliseconds.
    pub timeout_ms: u64,
}

impl UpstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:9000".to_string(),
            timeout_ms: 2_000,
        }
    }
}

/// Underwriting decision configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct UnderwritingConfig {
    /// Scores strictly above this are approved.
    pub approval_threshold: u16,

    /// Total time budget for one evaluation, in milliseconds.
    pub evaluation_budget_ms: u64,
}

impl UnderwritingConfig {
    pub fn evaluation_budget(&self) -> Duration {
        Duration::from_millis(self.evaluation_budget_ms)
    }
}

impl Default for UnderwritingConfig {
    fn default() -> Self {
        Self {
            approval_threshold: 700,
            evaluation_budget_ms: 5_000,
        }
    }
}

/// Observability configuration.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level (trace, debug, info, warn, error).
    pub log_level: String,

    /// Enable metrics endpoint.
    pub metrics_enabled: bool,

    /// Metrics endpoint bind address.
    pub metrics_address: String,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            metrics_enabled: false,
            metrics_address: "0.0.0.0:9090".to_string(),
        }
    }
}
