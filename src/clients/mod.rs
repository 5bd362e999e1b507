//! # External Client Traits
//!
//! Defines the traits the engine consumes for its three external
//! collaborators: schema discovery, LLM completion, and result persistence.
//! The engine treats all three as opaque; applications provide concrete
//! implementations (HTTP gateways, SDK wrappers, test doubles) when
//! constructing the engine.

use crate::models::TableDescriptor;
use async_trait::async_trait;
use std::time::Duration;
use uuid::Uuid;

use crate::orchestration::types::TableReport;

/// Failure kinds surfaced by an LLM client implementation
#[derive(Debug, Clone, thiserror::Error)]
pub enum LlmError {
    /// Connection-level failure reaching the backend
    #[error("network error: {0}")]
    Network(String),

    /// Rate or quota limit reported by the backend
    #[error("api limit exceeded: {0}")]
    ApiLimit(String),

    /// Credentials rejected by the backend
    #[error("authentication failed: {0}")]
    Authentication(String),

    /// The bounded per-call timeout elapsed
    #[error("request timed out after {0:?}")]
    Timeout(Duration),

    /// The backend rejected the request as malformed
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Failure reported by the schema client
#[derive(Debug, Clone, thiserror::Error)]
pub enum SchemaError {
    #[error("schema client unreachable: {0}")]
    Unreachable(String),

    #[error("base not found: {0}")]
    BaseNotFound(String),
}

/// Failure reported by the persistence client
#[derive(Debug, Clone, thiserror::Error)]
#[error("persistence write failed: {0}")]
pub struct PersistenceError(pub String);

/// A completed LLM response with cost and timing metadata
#[derive(Debug, Clone)]
pub struct LlmResponse {
    /// Raw completion text; any text is attempted for structured parsing
    pub text: String,
    /// Monetary cost of the call as reported by the client
    pub cost: f64,
    /// Wall-clock duration of the call as reported by the client
    pub duration: Duration,
}

/// LLM completion backend consumed by the analysis executor
#[async_trait]
pub trait LlmClient: Send + Sync {
    /// Complete a prompt with a bounded token budget and sampling temperature
    async fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<LlmResponse, LlmError>;
}

/// External schema discovery client consumed by the workflow coordinator
#[async_trait]
pub trait SchemaClient: Send + Sync {
    /// List all accessible base identifiers
    async fn list_bases(&self) -> Result<Vec<String>, SchemaError>;

    /// Fetch table descriptors for one base
    async fn get_schema(&self, base_id: &str) -> Result<Vec<TableDescriptor>, SchemaError>;
}

/// External persistence client for completed workflow results.
///
/// Best-effort: a write failure is logged and reported in workflow status
/// but never reverts a completed workflow.
#[async_trait]
pub trait PersistenceClient: Send + Sync {
    async fn write_results(
        &self,
        workflow_id: Uuid,
        reports: &[TableReport],
    ) -> Result<(), PersistenceError>;
}
