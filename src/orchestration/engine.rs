//! # Analysis Engine
//!
//! The top-level facade that wires the orchestration components together:
//! shared cache, per-dependency circuit breakers, the rate-gated executor,
//! the batch scheduler, and the workflow coordinator. Construct one engine
//! per process with injected clients; everything downstream receives its
//! collaborators by handle, so tests build fresh engines per case instead of
//! relying on process-wide state.
//!
//! Two call paths are exposed:
//! - the synchronous request API ([`AnalysisEngine::analyze_table`]) for
//!   small interactive requests, bypassing the workflow coordinator
//! - the workflow API (`start_workflow` / `workflow_status` /
//!   `workflow_results` / `cancel_workflow`) for long-running multi-table
//!   runs with queryable progress

use crate::analysis::AnalysisExecutor;
use crate::cache::AnalysisCache;
use crate::clients::{LlmClient, PersistenceClient, SchemaClient};
use crate::config::TablewiseConfig;
use crate::constants::{estimated_category_cost, ESTIMATED_SECONDS_PER_ANALYSIS};
use crate::error::Result;
use crate::models::{AnalysisCategory, TableDescriptor};
use crate::orchestration::scheduler::{BatchScheduler, RateGate};
use crate::orchestration::types::{
    CostEstimate, CostSummary, TableReport, Workflow, WorkflowOutcome, WorkflowRequest,
    WorkflowSummaryInfo,
};
use crate::orchestration::workflow_coordinator::WorkflowCoordinator;
use crate::resilience::{CircuitBreakerManager, CircuitBreakerMetrics};
use std::collections::HashMap;
use std::sync::Arc;
use uuid::Uuid;

/// Top-level orchestration engine
pub struct AnalysisEngine {
    executor: Arc<AnalysisExecutor>,
    coordinator: Arc<WorkflowCoordinator>,
    breakers: Arc<CircuitBreakerManager>,
    config: TablewiseConfig,
}

impl AnalysisEngine {
    /// Construct an engine from configuration and the three external clients
    pub fn new(
        config: TablewiseConfig,
        schema_client: Arc<dyn SchemaClient>,
        llm_client: Arc<dyn LlmClient>,
        persistence_client: Arc<dyn PersistenceClient>,
    ) -> Self {
        let cache = Arc::new(AnalysisCache::new(config.cache.ttl()));
        let breakers = Arc::new(CircuitBreakerManager::new(
            config.circuit_breaker.to_breaker_config(),
        ));
        let rate_gate = Arc::new(RateGate::new(config.analysis.min_request_interval()));

        let executor = Arc::new(AnalysisExecutor::new(
            llm_client,
            cache,
            breakers.clone(),
            rate_gate,
            config.analysis.to_settings(),
            config.cache.enabled,
            config.cache.reuse_below_threshold,
        ));

        let scheduler = Arc::new(BatchScheduler::new(executor.clone()));
        let coordinator = Arc::new(WorkflowCoordinator::new(
            schema_client,
            persistence_client,
            scheduler,
            config.workflow.to_settings(),
            config.quality.default_threshold,
        ));

        Self {
            executor,
            coordinator,
            breakers,
            config,
        }
    }

    /// Analyze one table immediately with an explicit category set.
    ///
    /// Categories run sequentially under the shared rate gate; the full
    /// report is returned inline. Intended for small interactive requests.
    pub async fn analyze_table(
        &self,
        table: &TableDescriptor,
        categories: &[AnalysisCategory],
        quality_threshold: Option<f64>,
    ) -> TableReport {
        let threshold = quality_threshold.unwrap_or(self.config.quality.default_threshold);
        let categories: Vec<AnalysisCategory> = if categories.is_empty() {
            AnalysisCategory::all().to_vec()
        } else {
            categories.to_vec()
        };

        let mut results = HashMap::new();
        for category in categories {
            let result = self.executor.execute(table, category, threshold).await;
            results.insert(category, result);
        }

        TableReport::from_results(
            table.table_id.clone(),
            table.table_name.clone(),
            results,
            threshold,
        )
    }

    /// Start a workflow run; returns the workflow id immediately
    pub fn start_workflow(&self, request: WorkflowRequest) -> Uuid {
        self.coordinator.start(request)
    }

    /// Snapshot of a workflow's status and progress
    pub fn workflow_status(&self, id: Uuid) -> Result<Workflow> {
        self.coordinator.status(id)
    }

    /// Aggregated results of a completed workflow
    pub fn workflow_results(&self, id: Uuid) -> Result<WorkflowOutcome> {
        self.coordinator.results(id)
    }

    /// Cancel a workflow: stops new submissions, in-flight calls finish
    pub fn cancel_workflow(&self, id: Uuid) -> Result<()> {
        self.coordinator.cancel(id)
    }

    /// All tracked workflows
    pub fn list_workflows(&self) -> Vec<WorkflowSummaryInfo> {
        self.coordinator.list()
    }

    /// Running cost totals across this engine's lifetime
    pub fn cost_summary(&self) -> CostSummary {
        self.executor.cost_summary()
    }

    /// Circuit breaker metrics per upstream dependency
    pub fn breaker_metrics(&self) -> HashMap<String, CircuitBreakerMetrics> {
        self.breakers.all_metrics()
    }

    /// Pre-flight cost and time estimate for a batch run
    pub fn estimate_batch_cost(
        table_count: usize,
        categories: &[AnalysisCategory],
    ) -> CostEstimate {
        let categories: Vec<AnalysisCategory> = if categories.is_empty() {
            AnalysisCategory::all().to_vec()
        } else {
            categories.to_vec()
        };

        let per_table: f64 = categories
            .iter()
            .map(|category| estimated_category_cost(*category))
            .sum();
        let total = per_table * table_count as f64;
        let analyses = table_count * categories.len();

        CostEstimate {
            estimated_total_cost: total,
            cost_per_table: per_table,
            categories_count: categories.len(),
            table_count,
            estimated_time_minutes: analyses as f64 * ESTIMATED_SECONDS_PER_ANALYSIS as f64 / 60.0,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_estimate_covers_all_categories_by_default() {
        let estimate = AnalysisEngine::estimate_batch_cost(10, &[]);
        assert_eq!(estimate.categories_count, 6);
        assert_eq!(estimate.table_count, 10);
        assert!(estimate.estimated_total_cost > 0.0);
        assert!((estimate.cost_per_table * 10.0 - estimate.estimated_total_cost).abs() < 1e-9);
    }

    #[test]
    fn test_estimate_scales_with_category_subset() {
        let all = AnalysisEngine::estimate_batch_cost(5, &[]);
        let one = AnalysisEngine::estimate_batch_cost(5, &[AnalysisCategory::Structure]);
        assert!(one.estimated_total_cost < all.estimated_total_cost);
        assert_eq!(one.categories_count, 1);
    }
}
