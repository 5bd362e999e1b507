//! # Analysis Executor
//!
//! Performs one (table, category) analysis end to end: cache consultation,
//! circuit breaker gating, prompt construction, the bounded LLM call,
//! response parsing, quality scoring, and cache write-through. The executor
//! never raises past its boundary - every failure path resolves to an
//! `AnalysisResult` (possibly synthesized by a fallback strategy) carrying an
//! error classification for observability.
//!
//! Fallback handling is an explicit ordered strategy list evaluated as a
//! short-circuiting sequence: stale cached results first, then the simplified
//! single-finding fallback, which always produces a result.

use crate::cache::{cache_key, AnalysisCache};
use crate::clients::{LlmClient, LlmError};
use crate::config::AnalysisSettings;
use crate::constants::{dependencies, FALLBACK_CONFIDENCE, FALLBACK_ISSUE_TYPE};
use crate::models::{AnalysisCategory, Effort, Finding, Priority, TableDescriptor};
use crate::orchestration::error_classifier::{ErrorKind, UpstreamErrorClassifier};
use crate::orchestration::scheduler::RateGate;
use crate::orchestration::types::{AnalysisResult, CostSummary};
use crate::quality::QualityScorer;
use crate::resilience::{CircuitBreakerError, CircuitBreakerManager};
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use super::parser::{parse_findings, ParseError};
use super::prompts::PromptBuilder;

/// Successful upstream round trip: recovered findings plus call metadata
struct CallSuccess {
    findings: Vec<Finding>,
    dropped: usize,
    cost: f64,
    duration: Duration,
}

/// Failed upstream round trip. Parse failures still carry the cost the call
/// incurred before the response proved unusable.
enum CallFailure {
    Client(LlmError),
    Parse {
        error: ParseError,
        cost: f64,
        duration: Duration,
    },
}

/// Context handed to fallback strategies when normal analysis cannot complete
pub struct FallbackContext<'a> {
    pub table: &'a TableDescriptor,
    pub category: AnalysisCategory,
    pub cache_key: &'a str,
    pub error_kind: Option<ErrorKind>,
    /// Cost already incurred before the failure (nonzero for parse failures)
    pub cost: f64,
    pub duration: Duration,
}

/// One recovery option in the ordered fallback chain. Returns a result or
/// "no result"; the first strategy to produce a result wins.
pub trait FallbackStrategy: Send + Sync {
    fn name(&self) -> &'static str;
    fn recover(&self, ctx: &FallbackContext<'_>) -> Option<AnalysisResult>;
}

/// Reuse an expired cached result when the upstream is degraded. A stale
/// answer beats a synthesized placeholder.
pub struct StaleCacheFallback {
    cache: Arc<AnalysisCache>,
}

impl StaleCacheFallback {
    pub fn new(cache: Arc<AnalysisCache>) -> Self {
        Self { cache }
    }
}

impl FallbackStrategy for StaleCacheFallback {
    fn name(&self) -> &'static str {
        "stale_cache"
    }

    fn recover(&self, ctx: &FallbackContext<'_>) -> Option<AnalysisResult> {
        let cached = self.cache.get_stale(ctx.cache_key)?;
        info!(
            table_id = %ctx.table.table_id,
            category = %ctx.category,
            "Reusing stale cached result as fallback"
        );
        Some(AnalysisResult {
            fallback_used: true,
            error_kind: ctx.error_kind,
            cost: ctx.cost,
            duration: ctx.duration,
            timestamp: Utc::now(),
            ..cached
        })
    }
}

/// Synthesize a single low-confidence finding directing the operator to a
/// manual review. Always produces a result; terminates the chain.
pub struct SimplifiedFallback {
    scorer: QualityScorer,
}

impl SimplifiedFallback {
    pub fn new(scorer: QualityScorer) -> Self {
        Self { scorer }
    }
}

impl FallbackStrategy for SimplifiedFallback {
    fn name(&self) -> &'static str {
        "simplified"
    }

    fn recover(&self, ctx: &FallbackContext<'_>) -> Option<AnalysisResult> {
        let finding = Finding {
            issue_type: FALLBACK_ISSUE_TYPE.to_string(),
            priority: Priority::Medium,
            description: format!(
                "Automated {} analysis was unavailable for table '{}'. Manual review recommended.",
                ctx.category, ctx.table.table_name
            ),
            recommendation: "Perform a manual review of this table's structure and configuration."
                .to_string(),
            impact: "Unknown - requires manual assessment".to_string(),
            effort: Effort::Medium,
            estimated_improvement: None,
            implementation_steps: vec![
                "Schedule manual review".to_string(),
                "Assess the table schema".to_string(),
                "Apply improvements".to_string(),
            ],
            confidence_score: FALLBACK_CONFIDENCE,
        };

        Some(AnalysisResult {
            table_id: ctx.table.table_id.clone(),
            table_name: ctx.table.table_name.clone(),
            category: ctx.category,
            findings: vec![self.scorer.score(&finding, ctx.category)],
            dropped_findings: 0,
            cost: ctx.cost,
            duration: ctx.duration,
            fallback_used: true,
            error_kind: ctx.error_kind,
            timestamp: Utc::now(),
        })
    }
}

/// Running cost totals, shared across concurrent executions
#[derive(Debug, Default)]
struct CostTracker {
    inner: parking_lot::Mutex<(f64, u64)>,
}

impl CostTracker {
    fn record(&self, cost: f64) {
        let mut inner = self.inner.lock();
        inner.0 += cost;
        inner.1 += 1;
    }

    fn summary(&self) -> CostSummary {
        let inner = self.inner.lock();
        CostSummary {
            total_cost: inner.0,
            analysis_count: inner.1,
            average_cost_per_analysis: if inner.1 > 0 {
                inner.0 / inner.1 as f64
            } else {
                0.0
            },
        }
    }
}

/// Executes single (table, category) analyses under cache, breaker, and rate
/// gate protection
pub struct AnalysisExecutor {
    llm: Arc<dyn LlmClient>,
    cache: Arc<AnalysisCache>,
    cache_enabled: bool,
    reuse_below_threshold: bool,
    breakers: Arc<CircuitBreakerManager>,
    scorer: QualityScorer,
    classifier: UpstreamErrorClassifier,
    prompts: PromptBuilder,
    rate_gate: Arc<RateGate>,
    fallbacks: Vec<Box<dyn FallbackStrategy>>,
    settings: AnalysisSettings,
    costs: CostTracker,
}

impl AnalysisExecutor {
    pub fn new(
        llm: Arc<dyn LlmClient>,
        cache: Arc<AnalysisCache>,
        breakers: Arc<CircuitBreakerManager>,
        rate_gate: Arc<RateGate>,
        settings: AnalysisSettings,
        cache_enabled: bool,
        reuse_below_threshold: bool,
    ) -> Self {
        let scorer = QualityScorer::new();
        let fallbacks: Vec<Box<dyn FallbackStrategy>> = vec![
            Box::new(StaleCacheFallback::new(cache.clone())),
            Box::new(SimplifiedFallback::new(scorer.clone())),
        ];

        Self {
            llm,
            cache,
            cache_enabled,
            reuse_below_threshold,
            breakers,
            scorer,
            classifier: UpstreamErrorClassifier::new(),
            prompts: PromptBuilder::new(),
            rate_gate,
            fallbacks,
            settings,
            costs: CostTracker::default(),
        }
    }

    /// Perform one (table, category) analysis. Never fails; every path
    /// resolves to a result.
    ///
    /// `quality_threshold` is the active run's threshold, consulted only for
    /// the cache reuse policy - threshold filtering of the final aggregate
    /// happens at aggregation time.
    pub async fn execute(
        &self,
        table: &TableDescriptor,
        category: AnalysisCategory,
        quality_threshold: f64,
    ) -> AnalysisResult {
        let key = cache_key(table, category);

        if self.cache_enabled {
            if let Some(hit) = self.cache.get(&key) {
                // An empty finding list is a legitimate "no issues" answer
                // and is always reusable
                if self.reuse_below_threshold
                    || hit.findings.is_empty()
                    || hit
                        .findings
                        .iter()
                        .any(|f| f.quality_score >= quality_threshold)
                {
                    debug!(
                        table_id = %table.table_id,
                        category = %category,
                        "Cache hit, skipping upstream call"
                    );
                    return hit;
                }
                debug!(
                    table_id = %table.table_id,
                    category = %category,
                    "Cached result below active threshold, re-running"
                );
            }
        }

        let breaker = self.breakers.breaker(dependencies::LLM_BACKEND);
        let outcome = breaker
            .call(|| self.perform_analysis(table, category))
            .await;

        match outcome {
            Ok(success) => self.assemble_result(table, category, &key, success),
            Err(CircuitBreakerError::CircuitOpen { .. }) => {
                warn!(
                    table_id = %table.table_id,
                    category = %category,
                    "Circuit open, resolving via fallback"
                );
                self.run_fallback_chain(&FallbackContext {
                    table,
                    category,
                    cache_key: &key,
                    error_kind: None,
                    cost: 0.0,
                    duration: Duration::ZERO,
                })
            }
            Err(CircuitBreakerError::OperationFailed(failure)) => {
                let (error_kind, cost, duration) = match &failure {
                    CallFailure::Client(e) => {
                        (self.classifier.classify_llm_error(e), 0.0, Duration::ZERO)
                    }
                    CallFailure::Parse {
                        error,
                        cost,
                        duration,
                    } => {
                        warn!(
                            table_id = %table.table_id,
                            category = %category,
                            error = %error,
                            "Structural parse failure"
                        );
                        (ErrorKind::Parsing, *cost, *duration)
                    }
                };
                if cost > 0.0 {
                    self.costs.record(cost);
                }
                self.run_fallback_chain(&FallbackContext {
                    table,
                    category,
                    cache_key: &key,
                    error_kind: Some(error_kind),
                    cost,
                    duration,
                })
            }
        }
    }

    /// The breaker-protected round trip: rate gate, bounded LLM call, parse.
    /// Returns an error for any client failure or a structurally unparseable
    /// response, so both count against the breaker.
    async fn perform_analysis(
        &self,
        table: &TableDescriptor,
        category: AnalysisCategory,
    ) -> Result<CallSuccess, CallFailure> {
        self.rate_gate.wait().await;

        let prompt = self.prompts.build(table, category);
        let response = tokio::time::timeout(
            self.settings.request_timeout,
            self.llm
                .complete(&prompt, self.settings.max_tokens, self.settings.temperature),
        )
        .await
        .map_err(|_| CallFailure::Client(LlmError::Timeout(self.settings.request_timeout)))?
        .map_err(CallFailure::Client)?;

        match parse_findings(&response.text) {
            Ok(parsed) if parsed.findings.is_empty() && parsed.dropped > 0 => {
                // Every element failed validation; nothing was recovered
                Err(CallFailure::Parse {
                    error: ParseError::MalformedJson("all findings failed validation".to_string()),
                    cost: response.cost,
                    duration: response.duration,
                })
            }
            Ok(parsed) => Ok(CallSuccess {
                findings: parsed.findings,
                dropped: parsed.dropped,
                cost: response.cost,
                duration: response.duration,
            }),
            Err(error) => Err(CallFailure::Parse {
                error,
                cost: response.cost,
                duration: response.duration,
            }),
        }
    }

    /// Score recovered findings and assemble the final result, writing
    /// through the cache when the execution did not degrade to a fallback.
    fn assemble_result(
        &self,
        table: &TableDescriptor,
        category: AnalysisCategory,
        key: &str,
        success: CallSuccess,
    ) -> AnalysisResult {
        self.costs.record(success.cost);

        // Partial salvage: more dropped than kept marks the result degraded
        let fallback_used = success.dropped > success.findings.len();
        let error_kind = if success.dropped > 0 {
            Some(ErrorKind::Parsing)
        } else {
            None
        };

        let findings = success
            .findings
            .iter()
            .map(|finding| self.scorer.score(finding, category))
            .collect();

        let result = AnalysisResult {
            table_id: table.table_id.clone(),
            table_name: table.table_name.clone(),
            category,
            findings,
            dropped_findings: success.dropped,
            cost: success.cost,
            duration: success.duration,
            fallback_used,
            error_kind,
            timestamp: Utc::now(),
        };

        // Fallback results are not cached, so a transient failure is not
        // masked for the TTL window
        if self.cache_enabled && !fallback_used {
            self.cache.put(key.to_string(), result.clone());
        }

        info!(
            table_id = %table.table_id,
            category = %category,
            findings = result.findings.len(),
            dropped = result.dropped_findings,
            cost = result.cost,
            "Analysis completed"
        );

        result
    }

    /// Evaluate the ordered fallback chain; the first result wins. The
    /// simplified strategy always produces one, so this cannot come up empty.
    fn run_fallback_chain(&self, ctx: &FallbackContext<'_>) -> AnalysisResult {
        for strategy in &self.fallbacks {
            if let Some(result) = strategy.recover(ctx) {
                debug!(
                    strategy = strategy.name(),
                    table_id = %ctx.table.table_id,
                    category = %ctx.category,
                    "Fallback strategy produced a result"
                );
                return result;
            }
        }
        // The chain is constructed with SimplifiedFallback last; reaching
        // here would mean the executor was built without it
        unreachable!("fallback chain must terminate with an always-on strategy")
    }

    /// Running cost totals across this executor's lifetime
    pub fn cost_summary(&self) -> CostSummary {
        self.costs.summary()
    }
}
