//! Credit report types and error definitions.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::time::{Duration, SystemTime};
use thiserror::Error;

/// Lowest score a bureau can report.
pub const MIN_SCORE: u16 = 300;
/// Highest score a bureau can report.
pub const MAX_SCORE: u16 = 850;

/// Identity used to look up a credit report.
///
/// `Display` is masked so keys can be logged; use [`SubjectKey::as_str`]
/// when the full value is needed (cache keys, upstream requests).
#[derive(Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectKey(String);

impl SubjectKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Masked form showing only the last four characters.
    pub fn masked(&self) -> String {
        let chars: Vec<char> = self.0.chars().collect();
        if chars.len() < 4 {
            return "***-**-xxxx".to_string();
        }
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("***-**-{}", tail)
    }
}

impl From<&str> for SubjectKey {
    fn from(key: &str) -> Self {
        Self::new(key)
    }
}

impl From<String> for SubjectKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl fmt::Display for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.masked())
    }
}

impl fmt::Debug for SubjectKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("SubjectKey").field(&self.masked()).finish()
    }
}

/// A credit report as returned by a bureau.
///
/// Reports are produced only by a [`CreditSource`](crate::credit::CreditSource)
/// and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreditReport {
    /// Subject the report describes.
    pub subject_key: SubjectKey,
    /// Bureau score.
    pub score: u16,
    /// When the bureau produced the report.
    pub retrieved_at: SystemTime,
    /// Reporting bureau identifier.
    pub bureau: String,
    /// Remaining bureau fields, passed through untouched.
    #[serde(default)]
    pub raw: BTreeMap<String, serde_json::Value>,
}

impl CreditReport {
    /// Check the report is usable for `expected` subject.
    ///
    /// Returns a description of the first problem found.
    pub fn validate(&self, expected: &SubjectKey) -> Result<(), String> {
        if &self.subject_key != expected {
            return Err(format!(
                "report subject {} does not match requested {}",
                self.subject_key, expected
            ));
        }
        if !(MIN_SCORE..=MAX_SCORE).contains(&self.score) {
            return Err(format!(
                "score {} outside {}..={}",
                self.score, MIN_SCORE, MAX_SCORE
            ));
        }
        Ok(())
    }
}

/// Whether a returned report is within the cache TTL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Freshness {
    Fresh,
    Stale,
}

impl Freshness {
    pub fn as_str(&self) -> &'static str {
        match self {
            Freshness::Fresh => "fresh",
            Freshness::Stale => "stale",
        }
    }
}

/// Successful gateway lookup.
#[derive(Debug, Clone, PartialEq)]
pub struct CreditLookup {
    pub report: CreditReport,
    pub freshness: Freshness,
}

/// Errors on the credit retrieval path.
///
/// Only [`CreditError::NoDataAvailable`] escapes the gateway; the other
/// variants describe why a live fetch failed and end up as its `cause`.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum CreditError {
    /// A single failed call to the credit source.
    #[error("transient upstream error: {0}")]
    TransientUpstream(String),

    /// Call rejected by the circuit breaker without reaching upstream.
    #[error("circuit breaker is open")]
    BreakerOpen,

    /// Upstream call exceeded its deadline.
    #[error("upstream timed out after {0:?}")]
    Timeout(Duration),

    /// No cached report exists and the live fetch failed.
    #[error("no credit data available for {subject}: {cause}")]
    NoDataAvailable {
        subject: SubjectKey,
        cause: Box<CreditError>,
    },
}

/// Result type for credit lookups.
pub type CreditResult<T> = Result<T, CreditError>;
