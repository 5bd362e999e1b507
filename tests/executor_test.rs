//! Analysis executor integration tests: cache consultation, breaker gating,
//! fallback resolution, and partial-parse salvage.

mod common;

use common::{make_table, strong_finding_response, MockLlmClient};
use std::sync::Arc;
use std::time::Duration;
use tablewise_core::analysis::AnalysisExecutor;
use tablewise_core::cache::AnalysisCache;
use tablewise_core::clients::LlmError;
use tablewise_core::config::AnalysisSettings;
use tablewise_core::models::{AnalysisCategory, QualityBand};
use tablewise_core::orchestration::{ErrorKind, RateGate};
use tablewise_core::resilience::{CircuitBreakerConfig, CircuitBreakerManager, CircuitState};

const THRESHOLD: f64 = 0.7;

fn make_executor(llm: Arc<MockLlmClient>) -> AnalysisExecutor {
    make_executor_with_breaker(llm, CircuitBreakerConfig::default())
}

fn make_executor_with_breaker(
    llm: Arc<MockLlmClient>,
    breaker_config: CircuitBreakerConfig,
) -> AnalysisExecutor {
    AnalysisExecutor::new(
        llm,
        Arc::new(AnalysisCache::new(Duration::from_secs(3600))),
        Arc::new(CircuitBreakerManager::new(breaker_config)),
        Arc::new(RateGate::new(Duration::ZERO)),
        AnalysisSettings {
            max_tokens: 4000,
            temperature: 0.1,
            request_timeout: Duration::from_secs(5),
        },
        true,
        true,
    )
}

#[tokio::test]
async fn test_valid_response_yields_scored_finding() {
    // Spec scenario: 20-field table, one valid finding at confidence 0.9
    let llm = Arc::new(MockLlmClient::always_ok(strong_finding_response(0.9)));
    let executor = make_executor(llm.clone());
    let table = make_table("tblWide", 20);

    let result = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;

    assert!(!result.fallback_used);
    assert_eq!(result.error_kind, None);
    assert_eq!(result.findings.len(), 1);
    assert!(matches!(
        result.findings[0].quality_band,
        QualityBand::High | QualityBand::Acceptable
    ));
    assert!(result.cost > 0.0);
    assert_eq!(llm.call_count(), 1);
}

#[tokio::test]
async fn test_cache_hit_skips_upstream_call() {
    let llm = Arc::new(MockLlmClient::always_ok(strong_finding_response(0.9)));
    let executor = make_executor(llm.clone());
    let table = make_table("tblCached", 5);

    let first = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    let second = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;

    assert_eq!(llm.call_count(), 1);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_schema_change_invalidates_cache() {
    let llm = Arc::new(MockLlmClient::always_ok(strong_finding_response(0.9)));
    let executor = make_executor(llm.clone());
    let table = make_table("tblEvolving", 5);

    executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;

    let grown = make_table("tblEvolving", 6);
    executor
        .execute(&grown, AnalysisCategory::Structure, THRESHOLD)
        .await;

    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_client_failure_resolves_to_fallback() {
    let llm = Arc::new(MockLlmClient::always_fail(LlmError::Network(
        "connection reset".to_string(),
    )));
    let executor = make_executor(llm.clone());
    let table = make_table("tblDown", 5);

    let result = executor
        .execute(&table, AnalysisCategory::Performance, THRESHOLD)
        .await;

    assert!(result.fallback_used);
    assert_eq!(result.error_kind, Some(ErrorKind::Network));
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.findings[0].finding.issue_type, "analysis_fallback");
    assert_eq!(result.findings[0].finding.confidence_score, 0.3);
}

#[tokio::test]
async fn test_breaker_opens_after_five_failures_and_short_circuits() {
    // Spec scenario: six consecutive failures; the breaker opens after the
    // fifth, so the sixth call never reaches the upstream client
    let llm = Arc::new(MockLlmClient::always_fail(LlmError::Network(
        "down".to_string(),
    )));
    let executor = make_executor(llm.clone());
    let table = make_table("tblFlaky", 5);

    for _ in 0..5 {
        let result = executor
            .execute(&table, AnalysisCategory::Performance, THRESHOLD)
            .await;
        assert!(result.fallback_used);
    }
    assert_eq!(llm.call_count(), 5);

    let sixth = executor
        .execute(&table, AnalysisCategory::Performance, THRESHOLD)
        .await;
    assert_eq!(llm.call_count(), 5);
    assert!(sixth.fallback_used);
    assert_eq!(sixth.cost, 0.0);
}

#[tokio::test]
async fn test_breaker_recovers_after_cooldown() {
    let llm = Arc::new(
        MockLlmClient::always_ok(strong_finding_response(0.9)).with_script(vec![
            Err(LlmError::Network("down".to_string())),
            Err(LlmError::Network("down".to_string())),
        ]),
    );
    let executor = make_executor_with_breaker(
        llm.clone(),
        CircuitBreakerConfig {
            failure_threshold: 2,
            cooldown: Duration::from_millis(50),
        },
    );
    let table = make_table("tblRecovering", 5);

    // Two failures open the circuit
    for _ in 0..2 {
        executor
            .execute(&table, AnalysisCategory::Structure, THRESHOLD)
            .await;
    }
    let short_circuited = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    assert!(short_circuited.fallback_used);
    assert_eq!(llm.call_count(), 2);

    // After the cooldown the half-open trial succeeds and the circuit closes
    tokio::time::sleep(Duration::from_millis(60)).await;
    let recovered = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    assert!(!recovered.fallback_used);
    assert_eq!(recovered.findings.len(), 1);
}

#[tokio::test]
async fn test_unparseable_response_is_fallback_with_parsing_kind() {
    let llm = Arc::new(MockLlmClient::always_ok(
        "I am unable to analyze this table.",
    ));
    let executor = make_executor(llm.clone());
    let table = make_table("tblGarbled", 5);

    let result = executor
        .execute(&table, AnalysisCategory::DataQuality, THRESHOLD)
        .await;

    assert!(result.fallback_used);
    assert_eq!(result.error_kind, Some(ErrorKind::Parsing));
    // The upstream call was made and its cost is carried on the result
    assert!(result.cost > 0.0);
}

#[tokio::test]
async fn test_partial_parse_keeps_valid_findings() {
    let text = format!(
        r#"[
  {{
    "issue_type": "redundant_field",
    "priority": "high",
    "description": "The Status and Stage fields duplicate the same lifecycle information",
    "recommendation": "Remove the Stage field and update views to use the Status field",
    "impact": "Less drift",
    "effort": "low",
    "estimated_improvement": "15% less maintenance",
    "implementation_steps": ["Audit views", "Remove field"],
    "confidence_score": 0.85
  }},
  {{"issue_type": "missing everything"}}
]"#
    );
    let llm = Arc::new(MockLlmClient::always_ok(text));
    let executor = make_executor(llm.clone());
    let table = make_table("tblPartial", 5);

    let result = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;

    // One of two parsed: kept, not a fallback (half dropped, not more)
    assert_eq!(result.findings.len(), 1);
    assert_eq!(result.dropped_findings, 1);
    assert!(!result.fallback_used);
    assert_eq!(result.error_kind, Some(ErrorKind::Parsing));
}

#[tokio::test]
async fn test_fallback_results_are_not_cached() {
    let llm = Arc::new(
        MockLlmClient::always_ok(strong_finding_response(0.9))
            .with_script(vec![Err(LlmError::Network("blip".to_string()))]),
    );
    let executor = make_executor(llm.clone());
    let table = make_table("tblBlip", 5);

    let first = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    assert!(first.fallback_used);

    // Transient failure is not masked for the TTL window: the next call
    // reaches the upstream and succeeds
    let second = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    assert!(!second.fallback_used);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_stale_cache_preferred_over_simplified_fallback() {
    // A stale cached result beats a synthesized placeholder when the
    // upstream is degraded
    let llm = Arc::new(
        MockLlmClient::always_fail(LlmError::Network("down".to_string())).with_script(vec![Ok(
            strong_finding_response(0.9),
        )]),
    );
    let executor = AnalysisExecutor::new(
        llm.clone(),
        Arc::new(AnalysisCache::new(Duration::from_millis(10))),
        Arc::new(CircuitBreakerManager::default()),
        Arc::new(RateGate::new(Duration::ZERO)),
        AnalysisSettings {
            max_tokens: 4000,
            temperature: 0.1,
            request_timeout: Duration::from_secs(5),
        },
        true,
        true,
    );
    let table = make_table("tblStale", 5);

    let fresh = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    assert!(!fresh.fallback_used);

    // Entry expires, the re-run fails upstream, and the stale result is
    // served with the fallback flag and failure classification attached
    tokio::time::sleep(Duration::from_millis(30)).await;
    let stale = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;

    assert!(stale.fallback_used);
    assert_eq!(stale.error_kind, Some(ErrorKind::Network));
    assert_eq!(stale.findings, fresh.findings);
    assert_eq!(llm.call_count(), 2);
}

#[tokio::test]
async fn test_timeout_escalates_to_fallback_not_error() {
    let llm = Arc::new(
        MockLlmClient::always_ok(strong_finding_response(0.9))
            .with_delay(Duration::from_millis(200)),
    );
    let executor = AnalysisExecutor::new(
        llm.clone(),
        Arc::new(AnalysisCache::new(Duration::from_secs(3600))),
        Arc::new(CircuitBreakerManager::default()),
        Arc::new(RateGate::new(Duration::ZERO)),
        AnalysisSettings {
            max_tokens: 4000,
            temperature: 0.1,
            request_timeout: Duration::from_millis(20),
        },
        true,
        true,
    );
    let table = make_table("tblSlow", 5);

    let result = executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;

    assert!(result.fallback_used);
    assert_eq!(result.error_kind, Some(ErrorKind::Network));
}

#[tokio::test]
async fn test_cost_summary_accumulates() {
    let llm = Arc::new(MockLlmClient::always_ok(strong_finding_response(0.9)));
    let executor = make_executor(llm);
    let table = make_table("tblCost", 5);

    executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    executor
        .execute(&table, AnalysisCategory::Performance, THRESHOLD)
        .await;

    let summary = executor.cost_summary();
    assert_eq!(summary.analysis_count, 2);
    assert!((summary.total_cost - 0.04).abs() < 1e-9);
    assert!((summary.average_cost_per_analysis - 0.02).abs() < 1e-9);
}

#[tokio::test]
async fn test_breaker_is_shared_across_tables() {
    // The breaker is keyed per dependency, not per table: failures on many
    // tables protect all callers
    let llm = Arc::new(MockLlmClient::always_fail(LlmError::ApiLimit(
        "quota".to_string(),
    )));
    let breakers = Arc::new(CircuitBreakerManager::default());
    let executor = AnalysisExecutor::new(
        llm.clone(),
        Arc::new(AnalysisCache::new(Duration::from_secs(3600))),
        breakers.clone(),
        Arc::new(RateGate::new(Duration::ZERO)),
        AnalysisSettings {
            max_tokens: 4000,
            temperature: 0.1,
            request_timeout: Duration::from_secs(5),
        },
        true,
        true,
    );

    for i in 0..5 {
        let table = make_table(&format!("tbl{i}"), 3);
        executor
            .execute(&table, AnalysisCategory::Structure, THRESHOLD)
            .await;
    }

    assert_eq!(
        breakers.breaker("llm-backend").state(),
        CircuitState::Open
    );

    // A sixth table short-circuits without an upstream call
    let table = make_table("tblAnother", 3);
    executor
        .execute(&table, AnalysisCategory::Structure, THRESHOLD)
        .await;
    assert_eq!(llm.call_count(), 5);
}
