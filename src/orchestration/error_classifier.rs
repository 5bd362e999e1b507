//! # Upstream Error Classification
//!
//! Maps upstream-call failures onto the fixed error taxonomy carried on
//! analysis results. Classification is observability-only: it never drives
//! control flow beyond the fallback trigger that produced it.

use crate::clients::LlmError;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Fixed taxonomy of upstream-call failure kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    /// Connection-level failure or per-call timeout
    Network,
    /// Rate or quota limit reported by the upstream
    ApiLimit,
    /// Credentials rejected
    Authentication,
    /// Response was structurally unparseable
    Parsing,
    /// Request or response failed validation
    Validation,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::ApiLimit => write!(f, "api_limit"),
            Self::Authentication => write!(f, "authentication"),
            Self::Parsing => write!(f, "parsing"),
            Self::Validation => write!(f, "validation"),
        }
    }
}

/// Classifier for upstream client failures
#[derive(Debug, Clone, Copy, Default)]
pub struct UpstreamErrorClassifier;

impl UpstreamErrorClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify an LLM client failure. Timeouts classify as network failures;
    /// the taxonomy intentionally has no separate timeout kind.
    pub fn classify_llm_error(&self, error: &LlmError) -> ErrorKind {
        match error {
            LlmError::Network(_) | LlmError::Timeout(_) => ErrorKind::Network,
            LlmError::ApiLimit(_) => ErrorKind::ApiLimit,
            LlmError::Authentication(_) => ErrorKind::Authentication,
            LlmError::InvalidRequest(_) => ErrorKind::Validation,
        }
    }
}
