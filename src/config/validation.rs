//! Configuration validation.
//!
//! # Responsibilities
//! - Semantic validation (serde handles syntactic)
//! - Validate value ranges (timeouts > 0, thresholds >= 1, score in range)
//! - Check the bureau URL and metrics address parse
//!
//! # Design Decisions
//! - Returns all validation errors, not just first
//! - Validation is a pure function: GatewayConfig → Result<(), Vec<ValidationError>>

use std::net::SocketAddr;
use thiserror::Error;
use url::Url;

use crate::config::schema::GatewayConfig;
use crate::credit::types::{MAX_SCORE, MIN_SCORE};

/// A single semantic problem in the configuration.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{field}: {message}")]
pub struct ValidationError {
    pub field: &'static str,
    pub message: String,
}

impl ValidationError {
    fn new(field: &'static str, message: impl Into<String>) -> Self {
        Self {
            field,
            message: message.into(),
        }
    }
}

/// Check every semantic constraint, collecting all failures.
pub fn validate_config(config: &GatewayConfig) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.cache.ttl_secs == 0 {
        errors.push(ValidationError::new("cache.ttl_secs", "must be greater than 0"));
    }

    let breaker = &config.breaker;
    if breaker.failure_threshold == 0 {
        errors.push(ValidationError::new("breaker.failure_threshold", "must be at least 1"));
    }
    if breaker.open_timeout_secs == 0 {
        errors.push(ValidationError::new("breaker.open_timeout_secs", "must be greater than 0"));
    }
    if breaker.max_half_open_probes == 0 {
        errors.push(ValidationError::new("breaker.max_half_open_probes", "must be at least 1"));
    }
    if breaker.half_open_success_threshold == 0 {
        errors.push(ValidationError::new(
            "breaker.half_open_success_threshold",
            "must be at least 1",
        ));
    }

    match Url::parse(&config.upstream.base_url) {
        Ok(url) if url.cannot_be_a_base() => {
            errors.push(ValidationError::new("upstream.base_url", "must be a hierarchical URL"));
        }
        Ok(url) if url.scheme() != "http" && url.scheme() != "https" => {
            errors.push(ValidationError::new(
                "upstream.base_url",
                format!("unsupported scheme '{}'", url.scheme()),
            ));
        }
        Ok(_) => {}
        Err(e) => errors.push(ValidationError::new("upstream.base_url", e.to_string())),
    }
    if config.upstream.timeout_ms == 0 {
        errors.push(ValidationError::new("upstream.timeout_ms", "must be greater than 0"));
    }

    let threshold = config.underwriting.approval_threshold;
    if !(MIN_SCORE..=MAX_SCORE).contains(&threshold) {
        errors.push(ValidationError::new(
            "underwriting.approval_threshold",
            format!("must be within {}..={}", MIN_SCORE, MAX_SCORE),
        ));
    }
    if config.underwriting.evaluation_budget_ms == 0 {
        errors.push(ValidationError::new(
            "underwriting.evaluation_budget_ms",
            "must be greater than 0",
        ));
    }

    if config.observability.metrics_enabled
        && config.observability.metrics_address.parse::<SocketAddr>().is_err()
    {
        errors.push(ValidationError::new(
            "observability.metrics_address",
            format!("'{}' is not a socket address", config.observability.metrics_address),
        ));
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
