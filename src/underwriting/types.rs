//! Underwriting types and error definitions.

use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

use crate::credit::{CreditError, CreditReport, Freshness, SubjectKey};

/// The part of a loan application the evaluator needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoanApplication {
    pub id: u64,
    pub applicant_name: String,
    /// Identity the bureau knows the applicant by.
    pub subject_key: SubjectKey,
    pub loan_amount: f64,
    #[serde(default)]
    pub loan_purpose: String,
    #[serde(default)]
    pub annual_income: f64,
}

/// Outcome of the decision rule.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DecisionStatus {
    Approved,
    ManualReview,
}

impl DecisionStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DecisionStatus::Approved => "approved",
            DecisionStatus::ManualReview => "manual_review",
        }
    }
}

/// A decision and the data it was based on.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UnderwritingDecision {
    pub application_id: u64,
    pub status: DecisionStatus,
    /// Human-readable justification; mentions stale data when applicable.
    pub reason: String,
    pub freshness: Freshness,
    pub based_on: Option<CreditReport>,
}

/// Why an application could not be underwritten right now.
///
/// Neither variant is a denial; both mean "try again later".
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum UnderwritingError {
    /// No credit data at all could be obtained.
    #[error("cannot underwrite at this time: {0}")]
    NoDataAvailable(CreditError),

    /// The credit lookup did not finish within the evaluation budget.
    #[error("cannot underwrite at this time: credit lookup exceeded {0:?}")]
    DeadlineExceeded(Duration),
}

impl UnderwritingError {
    /// Whether retrying later may succeed.
    pub fn is_retryable(&self) -> bool {
        match self {
            UnderwritingError::NoDataAvailable(_) | UnderwritingError::DeadlineExceeded(_) => true,
        }
    }
}

/// Result type for underwriting.
pub type UnderwritingResult<T> = Result<T, UnderwritingError>;
