#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Tablewise Core
//!
//! Batch analysis orchestration engine for LLM-powered table schema
//! recommendations.
//!
//! ## Overview
//!
//! Tablewise Core analyzes large sets of database tables by sending their
//! schemas to an LLM backend and converting free-form model output into
//! structured, scored improvement recommendations. The engineering focus is
//! orchestrating many such calls reliably: bounding concurrency and spend,
//! tolerating a flaky upstream, validating and scoring untrusted model
//! output, and tracking long-running multi-table workflows to completion.
//!
//! ## Architecture
//!
//! - **Quality Scorer**: pure, deterministic scoring of parsed findings
//! - **Circuit Breaker**: per-dependency fault isolation shared across all
//!   concurrent executors
//! - **Cache**: schema-fingerprint-keyed results with lazy TTL expiry
//! - **Analysis Executor**: one (table, category) analysis with an explicit
//!   ordered fallback chain; failures never escape its boundary
//! - **Batch Scheduler**: bounded worker pool with a shared rate gate
//! - **Workflow Coordinator**: multi-table run lifecycle with queryable
//!   progress and terminal, write-once status
//!
//! External collaborators (schema discovery, LLM completion, persistence)
//! are consumed through traits in [`clients`] and injected at engine
//! construction.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tablewise_core::config::TablewiseConfig;
//! use tablewise_core::orchestration::{AnalysisEngine, WorkflowRequest};
//! use std::sync::Arc;
//!
//! # use tablewise_core::clients::{SchemaClient, LlmClient, PersistenceClient};
//! # async fn example(
//! #     schema: Arc<dyn SchemaClient>,
//! #     llm: Arc<dyn LlmClient>,
//! #     persistence: Arc<dyn PersistenceClient>,
//! # ) -> Result<(), Box<dyn std::error::Error>> {
//! let config = TablewiseConfig::load()?;
//! let engine = AnalysisEngine::new(config, schema, llm, persistence);
//!
//! // Start a workflow across all discoverable tables
//! let workflow_id = engine.start_workflow(WorkflowRequest::default());
//!
//! // Progress is queryable at any time
//! let status = engine.workflow_status(workflow_id)?;
//! println!(
//!     "{}: {}/{}",
//!     status.status, status.progress.completed, status.progress.total
//! );
//! # Ok(())
//! # }
//! ```
//!
//! ## Module Organization
//!
//! - [`models`] - Table schema snapshots, categories, and finding types
//! - [`clients`] - Traits for the external collaborators
//! - [`quality`] - Pure quality scoring
//! - [`cache`] - Fingerprint-keyed analysis result cache
//! - [`resilience`] - Circuit breakers keyed per upstream dependency
//! - [`analysis`] - Prompts, response parsing, and the analysis executor
//! - [`orchestration`] - Scheduler, workflow coordinator, and engine facade
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling

pub mod analysis;
pub mod cache;
pub mod clients;
pub mod config;
pub mod constants;
pub mod error;
pub mod logging;
pub mod models;
pub mod orchestration;
pub mod quality;
pub mod resilience;

pub use config::TablewiseConfig;
pub use error::{Result, TablewiseError};
pub use models::{
    AnalysisCategory, Effort, FieldDescriptor, Finding, Priority, QualityBand, ScoredFinding,
    TableDescriptor,
};
pub use orchestration::{
    AnalysisEngine, AnalysisResult, ErrorKind, TableReport, Workflow, WorkflowRequest,
    WorkflowStatus,
};
pub use quality::QualityScorer;
pub use resilience::{CircuitBreaker, CircuitBreakerManager, CircuitState};
