//! # Workflow Coordinator
//!
//! Owns the lifecycle of a multi-table analysis run: discovers target tables
//! through the external schema client, flattens (table x category) pairs into
//! the batch scheduler's work list, consumes the result stream to keep
//! progress current, groups results back by table, applies the run's quality
//! threshold, computes summary statistics, and optionally hands the aggregate
//! to the persistence client.
//!
//! State machine: pending -> running -> {completed, failed, cancelled}.
//! Fallback results count as resolved, not failed; only total inability to
//! discover tables escalates to workflow failure. Cancellation stops
//! submission of new work but lets in-flight executions finish and still be
//! aggregated.

use crate::clients::{PersistenceClient, SchemaClient};
use crate::config::WorkflowSettings;
use crate::error::{Result, TablewiseError};
use crate::models::{extract_relationships, AnalysisCategory, TableDescriptor};
use crate::orchestration::scheduler::{BatchOptions, BatchScheduler};
use crate::orchestration::types::{
    AnalysisResult, TableReport, WorkItem, Workflow, WorkflowOutcome, WorkflowRequest,
    WorkflowStatus, WorkflowSummary, WorkflowSummaryInfo,
};
use dashmap::DashMap;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tracing::{error, info, warn};
use uuid::Uuid;

/// Tracked state for one workflow run
struct WorkflowHandle {
    workflow: RwLock<Workflow>,
    cancelled: Arc<AtomicBool>,
}

/// Coordinates multi-table workflow runs over the batch scheduler
pub struct WorkflowCoordinator {
    schema_client: Arc<dyn SchemaClient>,
    persistence_client: Arc<dyn PersistenceClient>,
    scheduler: Arc<BatchScheduler>,
    workflows: DashMap<Uuid, Arc<WorkflowHandle>>,
    settings: WorkflowSettings,
    default_quality_threshold: f64,
}

impl WorkflowCoordinator {
    pub fn new(
        schema_client: Arc<dyn SchemaClient>,
        persistence_client: Arc<dyn PersistenceClient>,
        scheduler: Arc<BatchScheduler>,
        settings: WorkflowSettings,
        default_quality_threshold: f64,
    ) -> Self {
        Self {
            schema_client,
            persistence_client,
            scheduler,
            workflows: DashMap::new(),
            settings,
            default_quality_threshold,
        }
    }

    /// Start a workflow and return its id immediately. The run proceeds on a
    /// spawned task; progress and results are queryable by id.
    pub fn start(self: &Arc<Self>, request: WorkflowRequest) -> Uuid {
        let id = Uuid::new_v4();
        let threshold = request
            .quality_threshold
            .unwrap_or(self.default_quality_threshold);

        let handle = Arc::new(WorkflowHandle {
            workflow: RwLock::new(Workflow::new(id, threshold)),
            cancelled: Arc::new(AtomicBool::new(false)),
        });
        self.workflows.insert(id, handle.clone());

        info!(workflow_id = %id, "Workflow created");

        let coordinator = self.clone();
        tokio::spawn(async move {
            coordinator.run_workflow(id, handle, request).await;
        });

        id
    }

    /// Snapshot of a workflow's current state
    pub fn status(&self, id: Uuid) -> Result<Workflow> {
        let handle = self
            .workflows
            .get(&id)
            .ok_or_else(|| TablewiseError::WorkflowNotFound(id.to_string()))?;
        let workflow = handle.workflow.read().clone();
        Ok(workflow)
    }

    /// Aggregated results of a completed workflow
    pub fn results(&self, id: Uuid) -> Result<WorkflowOutcome> {
        let workflow = self.status(id)?;
        match (workflow.status, workflow.outcome) {
            (WorkflowStatus::Completed, Some(outcome)) => Ok(outcome),
            (status, _) => Err(TablewiseError::ValidationError(format!(
                "Workflow {id} is not completed (status: {status})"
            ))),
        }
    }

    /// Request cancellation. Stops submission of new work immediately;
    /// in-flight executions finish and are aggregated into a partial outcome.
    pub fn cancel(&self, id: Uuid) -> Result<()> {
        let handle = self
            .workflows
            .get(&id)
            .ok_or_else(|| TablewiseError::WorkflowNotFound(id.to_string()))?;

        let mut workflow = handle.workflow.write();
        if workflow.status.is_terminal() {
            return Err(TablewiseError::ValidationError(format!(
                "Workflow {id} is already {} and cannot be cancelled",
                workflow.status
            )));
        }
        handle.cancelled.store(true, Ordering::Release);
        workflow.transition(WorkflowStatus::Cancelled);
        info!(workflow_id = %id, "Workflow cancellation requested");
        Ok(())
    }

    /// All tracked workflows, newest last
    pub fn list(&self) -> Vec<WorkflowSummaryInfo> {
        let mut entries: Vec<WorkflowSummaryInfo> = self
            .workflows
            .iter()
            .map(|entry| {
                let workflow = entry.value().workflow.read();
                WorkflowSummaryInfo {
                    id: workflow.id,
                    status: workflow.status,
                    progress: workflow.progress,
                    created_at: workflow.created_at,
                }
            })
            .collect();
        entries.sort_by_key(|info| info.created_at);
        entries
    }

    /// Drive one workflow from discovery through aggregation
    async fn run_workflow(
        self: Arc<Self>,
        id: Uuid,
        handle: Arc<WorkflowHandle>,
        request: WorkflowRequest,
    ) {
        handle.workflow.write().transition(WorkflowStatus::Running);

        let tables = match self.discover_tables(request.base_ids.as_deref()).await {
            Ok(tables) if tables.is_empty() => {
                error!(workflow_id = %id, "No tables discovered");
                let mut workflow = handle.workflow.write();
                workflow.error = Some("No tables could be discovered".to_string());
                workflow.transition(WorkflowStatus::Failed);
                return;
            }
            Ok(tables) => tables,
            Err(e) => {
                error!(workflow_id = %id, error = %e, "Table discovery failed");
                let mut workflow = handle.workflow.write();
                workflow.error = Some(e.to_string());
                workflow.transition(WorkflowStatus::Failed);
                return;
            }
        };

        let categories: Vec<AnalysisCategory> = request
            .categories
            .clone()
            .unwrap_or_else(|| AnalysisCategory::all().to_vec());
        let threshold = handle.workflow.read().quality_threshold;

        let items: Vec<WorkItem> = tables
            .iter()
            .flat_map(|table| {
                categories.iter().map(move |category| WorkItem {
                    table: table.clone(),
                    category: *category,
                })
            })
            .collect();

        {
            let mut workflow = handle.workflow.write();
            workflow.tables = tables.iter().map(|t| t.table_id.clone()).collect();
            workflow.categories = categories.clone();
            workflow.progress.total = items.len();
            workflow.updated_at = chrono::Utc::now();
        }

        info!(
            workflow_id = %id,
            tables = tables.len(),
            categories = categories.len(),
            total_pairs = items.len(),
            "Workflow running"
        );

        let options = BatchOptions {
            max_concurrent: request
                .max_concurrent
                .unwrap_or(self.settings.max_concurrent),
            batch_size: request.batch_size.unwrap_or(self.settings.batch_size),
            quality_threshold: threshold,
        };

        let mut rx = self
            .scheduler
            .run(items, options, handle.cancelled.clone());

        // Results arrive in completion order, not submission order; key by
        // (table id, category), never by position
        let mut by_table: HashMap<String, HashMap<AnalysisCategory, AnalysisResult>> =
            HashMap::new();
        while let Some(result) = rx.recv().await {
            let mut workflow = handle.workflow.write();
            if workflow.progress.completed < workflow.progress.total {
                workflow.progress.completed += 1;
            }
            workflow.updated_at = chrono::Utc::now();
            drop(workflow);

            by_table
                .entry(result.table_id.clone())
                .or_default()
                .insert(result.category, result);
        }

        let outcome = aggregate(&tables, by_table, threshold);
        let was_cancelled = handle.cancelled.load(Ordering::Acquire);

        let persistence_error = if !was_cancelled
            && request.auto_persist.unwrap_or(self.settings.auto_persist)
        {
            self.persist(id, &outcome).await
        } else {
            None
        };

        let mut workflow = handle.workflow.write();
        workflow.outcome = Some(outcome);
        workflow.persistence_error = persistence_error;
        if !was_cancelled {
            workflow.transition(WorkflowStatus::Completed);
        }
        info!(
            workflow_id = %id,
            status = %workflow.status,
            completed = workflow.progress.completed,
            total = workflow.progress.total,
            "Workflow finished"
        );
    }

    /// Discover target tables, supplementing missing relationship lists from
    /// field descriptors. A base whose schema fetch fails is logged and
    /// skipped; only zero tables overall fails the workflow.
    async fn discover_tables(
        &self,
        base_ids: Option<&[String]>,
    ) -> Result<Vec<Arc<TableDescriptor>>> {
        let base_ids: Vec<String> = match base_ids {
            Some(ids) => ids.to_vec(),
            None => self
                .schema_client
                .list_bases()
                .await
                .map_err(|e| TablewiseError::SchemaDiscoveryError(e.to_string()))?,
        };

        let mut tables = Vec::new();
        for base_id in &base_ids {
            match self.schema_client.get_schema(base_id).await {
                Ok(descriptors) => {
                    for mut table in descriptors {
                        if table.relationships.is_empty() {
                            table.relationships = extract_relationships(&table.fields);
                        }
                        tables.push(Arc::new(table));
                    }
                }
                Err(e) => {
                    warn!(base_id = %base_id, error = %e, "Failed to fetch schema for base");
                }
            }
        }
        Ok(tables)
    }

    /// Best-effort persistence handoff. A failure is reported in workflow
    /// status but does not revert completion.
    async fn persist(&self, id: Uuid, outcome: &WorkflowOutcome) -> Option<String> {
        match self
            .persistence_client
            .write_results(id, &outcome.reports)
            .await
        {
            Ok(()) => None,
            Err(e) => {
                error!(workflow_id = %id, error = %e, "Persistence write failed");
                Some(e.to_string())
            }
        }
    }
}

/// Group per-execution results back by table and compute summary statistics
fn aggregate(
    tables: &[Arc<TableDescriptor>],
    mut by_table: HashMap<String, HashMap<AnalysisCategory, AnalysisResult>>,
    threshold: f64,
) -> WorkflowOutcome {
    let mut summary = WorkflowSummary::default();
    let mut reports = Vec::new();

    for table in tables {
        let Some(results) = by_table.remove(&table.table_id) else {
            continue;
        };

        for result in results.values() {
            summary.analyses_completed += 1;
            summary.total_cost += result.cost;
            summary.total_duration += result.duration;
            if result.fallback_used {
                summary.fallback_results += 1;
            }
            if let Some(kind) = result.error_kind {
                *summary.error_kinds.entry(kind).or_default() += 1;
            }
            for finding in &result.findings {
                summary.total_findings += 1;
                *summary
                    .counts_by_priority
                    .entry(finding.finding.priority)
                    .or_default() += 1;
                *summary
                    .counts_by_band
                    .entry(finding.quality_band)
                    .or_default() += 1;
                if finding.quality_score >= threshold {
                    summary.recommended_findings += 1;
                }
            }
        }

        reports.push(TableReport::from_results(
            table.table_id.clone(),
            table.table_name.clone(),
            results,
            threshold,
        ));
    }

    summary.tables_analyzed = reports.len();
    WorkflowOutcome { reports, summary }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Effort, Finding, Priority, QualityBand, QualityBreakdown, ScoredFinding};
    use chrono::Utc;
    use std::time::Duration;

    fn scored(score: f64, priority: Priority) -> ScoredFinding {
        ScoredFinding {
            finding: Finding {
                issue_type: "test".to_string(),
                priority,
                description: "A finding for aggregation tests".to_string(),
                recommendation: "Update the field configuration accordingly".to_string(),
                impact: "Moderate".to_string(),
                effort: Effort::Low,
                estimated_improvement: None,
                implementation_steps: vec![],
                confidence_score: score,
            },
            quality_score: score,
            quality_band: if score >= 0.8 {
                QualityBand::High
            } else if score >= 0.7 {
                QualityBand::Acceptable
            } else if score >= 0.5 {
                QualityBand::Review
            } else {
                QualityBand::Rejected
            },
            breakdown: QualityBreakdown {
                confidence: score,
                content_quality: score,
                actionability: score,
                specificity: score,
                consistency: score,
            },
        }
    }

    fn table(id: &str) -> Arc<TableDescriptor> {
        Arc::new(TableDescriptor {
            base_id: "app".to_string(),
            table_id: id.to_string(),
            table_name: id.to_string(),
            fields: vec![],
            record_count: None,
            relationships: vec![],
            views: vec![],
        })
    }

    fn result(
        table_id: &str,
        category: AnalysisCategory,
        findings: Vec<ScoredFinding>,
        fallback: bool,
    ) -> AnalysisResult {
        AnalysisResult {
            table_id: table_id.to_string(),
            table_name: table_id.to_string(),
            category,
            findings,
            dropped_findings: 0,
            cost: 0.02,
            duration: Duration::from_millis(500),
            fallback_used: fallback,
            error_kind: None,
            timestamp: Utc::now(),
        }
    }

    #[test]
    fn test_aggregate_counts_by_band_and_priority() {
        let tables = vec![table("t1")];
        let mut by_table = HashMap::new();
        let mut categories = HashMap::new();
        categories.insert(
            AnalysisCategory::Structure,
            result(
                "t1",
                AnalysisCategory::Structure,
                vec![scored(0.9, Priority::High), scored(0.75, Priority::Medium)],
                false,
            ),
        );
        by_table.insert("t1".to_string(), categories);

        // Threshold 0.8: the 0.75 finding is excluded from recommendations
        // but still counted in the band tallies
        let outcome = aggregate(&tables, by_table, 0.8);
        assert_eq!(outcome.summary.total_findings, 2);
        assert_eq!(outcome.summary.recommended_findings, 1);
        assert_eq!(outcome.summary.counts_by_band[&QualityBand::Acceptable], 1);
        assert_eq!(outcome.summary.counts_by_priority[&Priority::High], 1);
        assert_eq!(outcome.reports[0].recommended.len(), 1);
    }

    #[test]
    fn test_aggregate_tallies_fallbacks() {
        let tables = vec![table("t1"), table("t2")];
        let mut by_table = HashMap::new();

        let mut first = HashMap::new();
        first.insert(
            AnalysisCategory::Structure,
            result("t1", AnalysisCategory::Structure, vec![], true),
        );
        by_table.insert("t1".to_string(), first);

        let mut second = HashMap::new();
        second.insert(
            AnalysisCategory::Structure,
            result(
                "t2",
                AnalysisCategory::Structure,
                vec![scored(0.9, Priority::Low)],
                false,
            ),
        );
        by_table.insert("t2".to_string(), second);

        let outcome = aggregate(&tables, by_table, 0.7);
        assert_eq!(outcome.summary.fallback_results, 1);
        assert_eq!(outcome.summary.tables_analyzed, 2);
        assert_eq!(outcome.summary.analyses_completed, 2);
    }
}
