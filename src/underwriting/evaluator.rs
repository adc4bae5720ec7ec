//! Score-based underwriting decisions.

use std::sync::Arc;
use std::time::{Duration, SystemTime};
use tokio::time::timeout;

use crate::config::UnderwritingConfig;
use crate::credit::{CreditLookup, CreditReport, Freshness};
use crate::gateway::CreditGateway;
use crate::observability::metrics;
use crate::underwriting::types::{
    DecisionStatus, LoanApplication, UnderwritingDecision, UnderwritingError, UnderwritingResult,
};

/// Turns a credit lookup into a decision.
#[derive(Debug, Clone)]
pub struct UnderwritingEvaluator {
    gateway: Arc<CreditGateway>,
    approval_threshold: u16,
    budget: Duration,
}

impl UnderwritingEvaluator {
    pub fn new(gateway: Arc<CreditGateway>, config: &UnderwritingConfig) -> Self {
        Self {
            gateway,
            approval_threshold: config.approval_threshold,
            budget: config.evaluation_budget(),
        }
    }

    /// Decide `application` using credit data as of `now`.
    ///
    /// If the lookup overruns the evaluation budget, any cached report for
    /// the subject is used instead.
    ///
    /// # Errors
    /// Returns an [`UnderwritingError`] when no credit data is available, or
    /// when the budget ran out with nothing cached. Neither is a denial.
    pub async fn evaluate(
        &self,
        application: &LoanApplication,
        now: SystemTime,
    ) -> UnderwritingResult<UnderwritingDecision> {
        let lookup = match timeout(self.budget, self.gateway.get_report(&application.subject_key, now)).await {
            Ok(result) => result.map_err(UnderwritingError::NoDataAvailable)?,
            Err(_) => self.budget_fallback(application, now)?,
        };

        let decision = decide(application.id, lookup, self.approval_threshold);
        metrics::record_decision(decision.status.as_str(), decision.freshness.as_str());
        tracing::info!(
            application_id = application.id,
            status = decision.status.as_str(),
            freshness = decision.freshness.as_str(),
            "Underwriting decision made"
        );
        Ok(decision)
    }

    fn budget_fallback(&self, application: &LoanApplication, now: SystemTime) -> UnderwritingResult<CreditLookup> {
        let cache = self.gateway.cache();
        let Some(entry) = cache.get(&application.subject_key) else {
            tracing::warn!(
                application_id = application.id,
                subject = %application.subject_key,
                budget_ms = self.budget.as_millis() as u64,
                "Credit lookup exceeded evaluation budget with nothing cached"
            );
            return Err(UnderwritingError::DeadlineExceeded(self.budget));
        };

        let freshness = if cache.is_fresh(&entry, now) {
            Freshness::Fresh
        } else {
            Freshness::Stale
        };
        tracing::warn!(
            application_id = application.id,
            subject = %application.subject_key,
            budget_ms = self.budget.as_millis() as u64,
            freshness = freshness.as_str(),
            "Credit lookup exceeded evaluation budget; using cached report"
        );

        Ok(CreditLookup {
            report: CreditReport::clone(&entry.report),
            freshness,
        })
    }
}

/// The decision rule: approve strictly above `threshold`, otherwise refer to
/// manual review. Stale data is called out in the reason.
pub fn decide(application_id: u64, lookup: CreditLookup, threshold: u16) -> UnderwritingDecision {
    let score = lookup.report.score;
    let (status, mut reason) = if score > threshold {
        (
            DecisionStatus::Approved,
            format!("credit score {} above approval threshold {}", score, threshold),
        )
    } else {
        (
            DecisionStatus::ManualReview,
            format!("credit score {} at or below approval threshold {}", score, threshold),
        )
    };
    if lookup.freshness == Freshness::Stale {
        reason.push_str(" (based on stale credit data)");
    }

    UnderwritingDecision {
        application_id,
        status,
        reason,
        freshness: lookup.freshness,
        based_on: Some(lookup.report),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::credit::{CreditReport, SubjectKey};
    use std::collections::BTreeMap;
    use std::time::UNIX_EPOCH;

    fn lookup(score: u16, freshness: Freshness) -> CreditLookup {
        CreditLookup {
            report: CreditReport {
                subject_key: SubjectKey::from("123-45-6789"),
                score,
                retrieved_at: UNIX_EPOCH,
                bureau: "test".into(),
                raw: BTreeMap::new(),
            },
            freshness,
        }
    }

    #[test]
    fn test_threshold_is_strict() {
        assert_eq!(decide(1, lookup(701, Freshness::Fresh), 700).status, DecisionStatus::Approved);
        assert_eq!(decide(1, lookup(700, Freshness::Fresh), 700).status, DecisionStatus::ManualReview);
        assert_eq!(decide(1, lookup(300, Freshness::Fresh), 700).status, DecisionStatus::ManualReview);
    }

    #[test]
    fn test_stale_data_is_called_out() {
        let fresh = decide(7, lookup(720, Freshness::Fresh), 700);
        assert!(!fresh.reason.contains("stale"));

        let stale = decide(7, lookup(720, Freshness::Stale), 700);
        assert_eq!(stale.status, DecisionStatus::Approved);
        assert_eq!(stale.freshness, Freshness::Stale);
        assert!(stale.reason.contains("stale"));
        assert_eq!(stale.based_on.as_ref().map(|r| r.score), Some(720));
        assert_eq!(stale.application_id, 7);
    }
}
