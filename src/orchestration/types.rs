//! # Orchestration Types
//!
//! Core types shared across the orchestration components: per-execution
//! analysis results, per-table reports, workflow lifecycle state, progress
//! counters, and summary statistics.

use crate::models::{AnalysisCategory, Priority, QualityBand, ScoredFinding, TableDescriptor};
use crate::orchestration::error_classifier::ErrorKind;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use uuid::Uuid;

/// Result of one (table, category) analysis execution.
///
/// Every execution resolves to one of these - success, partial salvage, or a
/// synthesized fallback. Failures never escape the executor boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnalysisResult {
    pub table_id: String,
    pub table_name: String,
    pub category: AnalysisCategory,
    /// Scored findings retained from this execution, in model output order
    pub findings: Vec<ScoredFinding>,
    /// Individually invalid findings dropped during parsing
    pub dropped_findings: usize,
    /// Monetary cost incurred by this execution (zero for cache hits and
    /// short-circuited calls)
    pub cost: f64,
    pub duration: Duration,
    /// True when this result was synthesized or salvaged by a fallback path
    pub fallback_used: bool,
    /// Upstream failure classification, for observability only
    pub error_kind: Option<ErrorKind>,
    pub timestamp: DateTime<Utc>,
}

/// One unit of scheduler work: a table paired with one analysis category
#[derive(Debug, Clone)]
pub struct WorkItem {
    pub table: Arc<TableDescriptor>,
    pub category: AnalysisCategory,
}

/// Per-table aggregation of category results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TableReport {
    pub table_id: String,
    pub table_name: String,
    pub results: HashMap<AnalysisCategory, AnalysisResult>,
    /// Findings at or above the run's quality threshold, best first
    pub recommended: Vec<ScoredFinding>,
}

impl TableReport {
    /// Build a report from a table's category results, filtering the
    /// recommended set at the given quality threshold.
    pub fn from_results(
        table_id: String,
        table_name: String,
        results: HashMap<AnalysisCategory, AnalysisResult>,
        quality_threshold: f64,
    ) -> Self {
        let mut recommended: Vec<ScoredFinding> = results
            .values()
            .flat_map(|result| result.findings.iter())
            .filter(|finding| finding.quality_score >= quality_threshold)
            .cloned()
            .collect();
        recommended.sort_by(|a, b| {
            b.quality_score
                .partial_cmp(&a.quality_score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });

        Self {
            table_id,
            table_name,
            results,
            recommended,
        }
    }
}

/// Workflow lifecycle states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum WorkflowStatus {
    /// Initial state when the workflow is created
    Pending,
    /// Workflow is discovering tables or draining analyses
    Running,
    /// Every scheduled pair resolved (success or fallback)
    Completed,
    /// Coordinator-level fault; no tables could be discovered
    Failed,
    /// Explicit cancellation; in-flight calls finished and were aggregated
    Cancelled,
}

impl WorkflowStatus {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed | Self::Failed | Self::Cancelled)
    }

    /// Check if this is an active state
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Pending | Self::Running)
    }
}

impl fmt::Display for WorkflowStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Completed => write!(f, "completed"),
            Self::Failed => write!(f, "failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl std::str::FromStr for WorkflowStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(Self::Pending),
            "running" => Ok(Self::Running),
            "completed" => Ok(Self::Completed),
            "failed" => Ok(Self::Failed),
            "cancelled" => Ok(Self::Cancelled),
            _ => Err(format!("Invalid workflow status: {s}")),
        }
    }
}

impl Default for WorkflowStatus {
    fn default() -> Self {
        Self::Pending
    }
}

/// Progress counters for a workflow run. `completed` never exceeds `total`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkflowProgress {
    pub completed: usize,
    pub total: usize,
}

/// Request to start a workflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowRequest {
    /// Bases to analyze; `None` discovers all accessible bases
    pub base_ids: Option<Vec<String>>,
    /// Categories to run; `None` runs all six
    pub categories: Option<Vec<AnalysisCategory>>,
    /// Tables grouped per scheduling batch; `None` uses the configured default
    pub batch_size: Option<usize>,
    /// Bounded worker pool size; `None` uses the configured default
    pub max_concurrent: Option<usize>,
    /// Quality threshold for the final recommendation set
    pub quality_threshold: Option<f64>,
    /// Hand the aggregate to the persistence client on completion
    pub auto_persist: Option<bool>,
}

/// Summary statistics computed over a workflow's aggregated results
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct WorkflowSummary {
    pub tables_analyzed: usize,
    pub analyses_completed: usize,
    pub total_findings: usize,
    /// Findings retained by the quality threshold
    pub recommended_findings: usize,
    pub counts_by_priority: HashMap<Priority, usize>,
    pub counts_by_band: HashMap<QualityBand, usize>,
    /// Tally of upstream failure kinds observed across executions
    pub error_kinds: HashMap<ErrorKind, usize>,
    /// Executions that resolved via a fallback path
    pub fallback_results: usize,
    pub total_cost: f64,
    pub total_duration: Duration,
}

/// Final aggregate of a finished workflow
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowOutcome {
    pub reports: Vec<TableReport>,
    pub summary: WorkflowSummary,
}

/// A tracked multi-table analysis run with queryable progress
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Workflow {
    pub id: Uuid,
    pub status: WorkflowStatus,
    /// Table ids targeted by this run, in discovery order
    pub tables: Vec<String>,
    pub categories: Vec<AnalysisCategory>,
    pub progress: WorkflowProgress,
    pub quality_threshold: f64,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Coordinator-level error, set only on the failed path
    pub error: Option<String>,
    /// Best-effort persistence failure; does not affect status
    pub persistence_error: Option<String>,
    pub outcome: Option<WorkflowOutcome>,
}

impl Workflow {
    pub fn new(id: Uuid, quality_threshold: f64) -> Self {
        let now = Utc::now();
        Self {
            id,
            status: WorkflowStatus::Pending,
            tables: Vec::new(),
            categories: Vec::new(),
            progress: WorkflowProgress::default(),
            quality_threshold,
            created_at: now,
            updated_at: now,
            error: None,
            persistence_error: None,
            outcome: None,
        }
    }

    /// Transition to a new status. Terminal states are sinks: once completed,
    /// failed, or cancelled, further transitions are refused.
    pub fn transition(&mut self, next: WorkflowStatus) -> bool {
        if self.status.is_terminal() {
            return false;
        }
        self.status = next;
        self.updated_at = Utc::now();
        true
    }
}

/// Lightweight workflow listing entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowSummaryInfo {
    pub id: Uuid,
    pub status: WorkflowStatus,
    pub progress: WorkflowProgress,
    pub created_at: DateTime<Utc>,
}

/// Pre-flight cost and time estimate for a batch run
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CostEstimate {
    pub estimated_total_cost: f64,
    pub cost_per_table: f64,
    pub categories_count: usize,
    pub table_count: usize,
    pub estimated_time_minutes: f64,
}

/// Running cost totals across an engine's lifetime
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CostSummary {
    pub total_cost: f64,
    pub analysis_count: u64,
    pub average_cost_per_analysis: f64,
}
