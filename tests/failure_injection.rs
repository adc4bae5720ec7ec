//! Failure injection tests for the credit retrieval path.

use std::sync::Arc;
use std::time::Duration;

use credit_gateway::clock::Clock;
use credit_gateway::credit::{CreditError, Freshness, SubjectKey};
use credit_gateway::observability::{CacheEvent, GatewayObserver};
use credit_gateway::resilience::BreakerState;
use credit_gateway::underwriting::{DecisionStatus, LoanApplication, UnderwritingError};
use credit_gateway::{CreditGateway, GatewayConfig, UnderwritingEvaluator};

mod common;

const SUBJECT: &str = "123-45-6789";

fn application(subject: &str) -> LoanApplication {
    LoanApplication {
        id: 1,
        applicant_name: "Jane Smith".into(),
        subject_key: SubjectKey::from(subject),
        loan_amount: 20_000.0,
        loan_purpose: "vehicle".into(),
        annual_income: 90_000.0,
    }
}

#[tokio::test]
async fn test_fresh_report_served_from_cache() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    let (gateway, clock) = common::gateway(&config, source.clone());
    let key = SubjectKey::from(SUBJECT);

    let first = gateway.get_report(&key, clock.now()).await.unwrap();
    clock.advance(config.cache.ttl() - Duration::from_secs(1));
    let second = gateway.get_report(&key, clock.now()).await.unwrap();

    assert_eq!(second.freshness, Freshness::Fresh);
    assert_eq!(second.report, first.report);
    assert_eq!(source.calls(), 1, "Fresh lookups must not reach the bureau");
}

#[tokio::test]
async fn test_stale_report_served_when_bureau_down() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    let (gateway, clock) = common::gateway(&config, source.clone());
    let key = SubjectKey::from(SUBJECT);

    gateway.get_report(&key, clock.now()).await.unwrap();
    source.set_failing(true);
    clock.advance(config.cache.ttl() + Duration::from_secs(60));

    let lookup = gateway.get_report(&key, clock.now()).await.expect("stale fallback");
    assert_eq!(lookup.freshness, Freshness::Stale);
    assert_eq!(lookup.report.score, 720);
    assert_eq!(source.calls(), 2);
}

#[tokio::test]
async fn test_no_data_when_nothing_cached() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_failing(true);
    let (gateway, clock) = common::gateway(&config, source);

    let err = gateway
        .get_report(&SubjectKey::from(SUBJECT), clock.now())
        .await
        .unwrap_err();
    assert!(matches!(err, CreditError::NoDataAvailable { .. }));
}

#[tokio::test]
async fn test_breaker_trips_and_shields_bureau() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_failing(true);
    let (gateway, clock) = common::gateway(&config, source.clone());

    for i in 0..config.breaker.failure_threshold {
        let key = SubjectKey::from(format!("000-00-{:04}", i));
        assert!(gateway.get_report(&key, clock.now()).await.is_err());
    }
    assert_eq!(gateway.breaker().state(), BreakerState::Open);
    assert_eq!(source.calls(), 5);

    // Within the cooldown nothing reaches the bureau
    clock.advance(Duration::from_secs(14));
    for i in 0..10 {
        let key = SubjectKey::from(format!("111-11-{:04}", i));
        let err = gateway.get_report(&key, clock.now()).await.unwrap_err();
        match err {
            CreditError::NoDataAvailable { cause, .. } => assert_eq!(*cause, CreditError::BreakerOpen),
            other => panic!("unexpected error: {}", other),
        }
    }
    assert_eq!(source.calls(), 5);
    assert_eq!(gateway.breaker().snapshot().consecutive_failures, 5);
}

#[tokio::test]
async fn test_half_open_recovery_closes_breaker() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_failing(true);
    let (gateway, clock) = common::gateway(&config, source.clone());

    for i in 0..5 {
        let _ = gateway
            .get_report(&SubjectKey::from(format!("000-00-{:04}", i)), clock.now())
            .await;
    }
    assert_eq!(gateway.breaker().state(), BreakerState::Open);

    source.set_failing(false);
    for i in 0..3 {
        source.set_score(&format!("222-22-{:04}", i), 700);
    }
    clock.advance(Duration::from_secs(config.breaker.open_timeout_secs));
    assert_eq!(gateway.breaker().state(), BreakerState::HalfOpen);

    for i in 0..3 {
        let key = SubjectKey::from(format!("222-22-{:04}", i));
        assert!(gateway.get_report(&key, clock.now()).await.is_ok());
    }

    let snapshot = gateway.breaker().snapshot();
    assert_eq!(snapshot.state, BreakerState::Closed);
    assert_eq!(snapshot.consecutive_failures, 0);
}

#[tokio::test]
async fn test_failed_probe_reopens_breaker() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_failing(true);
    let (gateway, clock) = common::gateway(&config, source.clone());

    for i in 0..5 {
        let _ = gateway
            .get_report(&SubjectKey::from(format!("000-00-{:04}", i)), clock.now())
            .await;
    }
    clock.advance(Duration::from_secs(15));

    let _ = gateway.get_report(&SubjectKey::from(SUBJECT), clock.now()).await;
    assert_eq!(source.calls(), 6, "One probe should reach the bureau");
    assert_eq!(gateway.breaker().state(), BreakerState::Open);

    // Cooldown restarted at the probe failure
    clock.advance(Duration::from_secs(10));
    let _ = gateway.get_report(&SubjectKey::from(SUBJECT), clock.now()).await;
    assert_eq!(source.calls(), 6);
}

#[tokio::test(start_paused = true)]
async fn test_upstream_timeout_counts_as_failure() {
    let mut config = GatewayConfig::default();
    config.upstream.timeout_ms = 200;
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    source.set_latency(Duration::from_secs(5));
    let (gateway, clock) = common::gateway(&config, source);

    let err = gateway
        .get_report(&SubjectKey::from(SUBJECT), clock.now())
        .await
        .unwrap_err();
    match err {
        CreditError::NoDataAvailable { cause, .. } => {
            assert_eq!(*cause, CreditError::Timeout(Duration::from_millis(200)))
        }
        other => panic!("unexpected error: {}", other),
    }
    assert_eq!(gateway.breaker().snapshot().consecutive_failures, 1);
}

#[tokio::test]
async fn test_end_to_end_decisions() {
    let config = GatewayConfig::default();

    // Score above threshold
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    let (gateway, clock) = common::gateway(&config, source.clone());
    let evaluator = UnderwritingEvaluator::new(gateway.clone(), &config.underwriting);
    let decision = evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap();
    assert_eq!(decision.status, DecisionStatus::Approved);
    assert_eq!(decision.freshness, Freshness::Fresh);
    assert!(!decision.reason.contains("stale"));

    // Bureau unreachable, cached 720 is reused but labeled
    source.set_failing(true);
    clock.advance(config.cache.ttl() * 2);
    let decision = evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap();
    assert_eq!(decision.status, DecisionStatus::Approved);
    assert_eq!(decision.freshness, Freshness::Stale);
    assert!(decision.reason.contains("stale"));
    assert_eq!(decision.based_on.map(|r| r.score), Some(720));

    // Score at or below threshold
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 650);
    let (gateway, clock) = common::gateway(&config, source);
    let evaluator = UnderwritingEvaluator::new(gateway, &config.underwriting);
    let decision = evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap();
    assert_eq!(decision.status, DecisionStatus::ManualReview);
}

#[tokio::test]
async fn test_no_data_is_not_a_denial() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_failing(true);
    let (gateway, clock) = common::gateway(&config, source);
    let evaluator = UnderwritingEvaluator::new(gateway, &config.underwriting);

    let err = evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap_err();
    assert!(matches!(err, UnderwritingError::NoDataAvailable(_)));
    assert!(err.is_retryable());
}

#[tokio::test(start_paused = true)]
async fn test_evaluation_budget_exceeded() {
    let mut config = GatewayConfig::default();
    config.upstream.timeout_ms = 30_000;
    config.underwriting.evaluation_budget_ms = 1_000;
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    source.set_latency(Duration::from_secs(10));
    let (gateway, clock) = common::gateway(&config, source.clone());
    let evaluator = UnderwritingEvaluator::new(gateway.clone(), &config.underwriting);

    let err = evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap_err();
    assert_eq!(err, UnderwritingError::DeadlineExceeded(Duration::from_secs(1)));

    // The abandoned fetch still completes and warms the cache
    tokio::time::sleep(Duration::from_secs(10)).await;
    let lookup = gateway.get_report(&SubjectKey::from(SUBJECT), clock.now()).await.unwrap();
    assert_eq!(lookup.freshness, Freshness::Fresh);
    assert_eq!(source.calls(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_evaluation_budget_falls_back_to_cached_report() {
    let mut config = GatewayConfig::default();
    config.upstream.timeout_ms = 30_000;
    config.underwriting.evaluation_budget_ms = 1_000;
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    let (gateway, clock) = common::gateway(&config, source.clone());
    let evaluator = UnderwritingEvaluator::new(gateway.clone(), &config.underwriting);

    evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap();

    // Expired entry, bureau now slower than the budget
    clock.advance(config.cache.ttl() * 2);
    source.set_latency(Duration::from_secs(10));

    let decision = evaluator.evaluate(&application(SUBJECT), clock.now()).await.unwrap();
    assert_eq!(decision.status, DecisionStatus::Approved);
    assert_eq!(decision.freshness, Freshness::Stale);
    assert!(decision.reason.contains("stale"));
    assert_eq!(decision.based_on.map(|r| r.score), Some(720));
    assert_eq!(source.calls(), 2);
}

struct PanickingObserver;

impl GatewayObserver for PanickingObserver {
    fn on_state_change(&self, _breaker: &str, _from: BreakerState, _to: BreakerState) {
        panic!("metrics backend exploded");
    }

    fn on_cache_event(&self, _subject: &SubjectKey, _event: CacheEvent) {
        panic!("metrics backend exploded");
    }
}

#[tokio::test]
async fn test_panicking_observer_does_not_break_lookups() {
    let config = GatewayConfig::default();
    let source = common::StubCreditSource::new();
    source.set_score(SUBJECT, 720);
    let clock = Arc::new(credit_gateway::clock::ManualClock::at_secs(1_700_000_000));
    let gateway = CreditGateway::from_config(&config, source.clone(), clock.clone(), Arc::new(PanickingObserver));
    let key = SubjectKey::from(SUBJECT);

    assert!(gateway.get_report(&key, clock.now()).await.is_ok());
    assert!(gateway.get_report(&key, clock.now()).await.is_ok());

    // Transitions still happen with a broken observer
    source.set_failing(true);
    for i in 0..5 {
        let _ = gateway
            .get_report(&SubjectKey::from(format!("000-00-{:04}", i)), clock.now())
            .await;
    }
    assert_eq!(gateway.breaker().state(), BreakerState::Open);
}
