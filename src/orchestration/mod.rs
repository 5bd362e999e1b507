//! # Orchestration Module
//!
//! The components that turn single analyses into reliable multi-table runs:
//! the batch scheduler (bounded fan-out with a shared rate gate), the
//! workflow coordinator (lifecycle, progress, aggregation), the error
//! classifier, and the engine facade that wires everything together.

pub mod engine;
pub mod error_classifier;
pub mod scheduler;
pub mod types;
pub mod workflow_coordinator;

pub use engine::AnalysisEngine;
pub use error_classifier::{ErrorKind, UpstreamErrorClassifier};
pub use scheduler::{BatchOptions, BatchScheduler, RateGate};
pub use types::{
    AnalysisResult, CostEstimate, CostSummary, TableReport, WorkItem, Workflow, WorkflowOutcome,
    WorkflowProgress, WorkflowRequest, WorkflowStatus, WorkflowSummary, WorkflowSummaryInfo,
};
pub use workflow_coordinator::WorkflowCoordinator;
