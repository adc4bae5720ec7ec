//! The remote credit source seam.

use async_trait::async_trait;
use std::time::Duration;
use thiserror::Error;

use crate::credit::types::{CreditError, CreditReport, SubjectKey};

/// Failures reported by a credit source.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FetchError {
    /// The call did not complete before its deadline.
    #[error("credit source timed out after {0:?}")]
    Timeout(Duration),

    /// The source could not be reached or refused the request.
    #[error("credit source unavailable: {0}")]
    Unavailable(String),

    /// The source answered with something that is not a usable report.
    #[error("invalid credit report: {0}")]
    Invalid(String),
}

impl From<FetchError> for CreditError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Timeout(after) => CreditError::Timeout(after),
            other => CreditError::TransientUpstream(other.to_string()),
        }
    }
}

/// A bureau that answers credit-report lookups.
///
/// Implementations may be slow or fail; callers never assume success.
/// `deadline` is the budget for this one call and implementations should
/// give up once it elapses.
#[async_trait]
pub trait CreditSource: Send + Sync {
    async fn fetch(
        &self,
        subject: &SubjectKey,
        deadline: Duration,
    ) -> Result<CreditReport, FetchError>;

    /// Short name used in logs and metrics.
    fn name(&self) -> &str {
        "credit_source"
    }
}
