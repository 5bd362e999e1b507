//! # Findings and Analysis Categories
//!
//! The finding types that flow out of LLM response parsing and through the
//! quality scorer. A `Finding` is untrusted parsed output; a `ScoredFinding`
//! carries the composite quality score and band and is immutable after
//! creation.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Analysis categories for table optimization.
///
/// Closed set: adding a category requires updating the prompt table and the
/// category keyword lists, not a runtime string match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AnalysisCategory {
    /// Table structure, field organization, and design patterns
    Structure,
    /// Normalization opportunities and data redundancy
    Normalization,
    /// Field types, configurations, and validation rules
    FieldTypes,
    /// Table relationships and linking opportunities
    Relationships,
    /// Performance bottlenecks and optimization opportunities
    Performance,
    /// Data quality, consistency, and validation needs
    DataQuality,
}

impl AnalysisCategory {
    /// All categories, in canonical order
    pub fn all() -> [AnalysisCategory; 6] {
        [
            Self::Structure,
            Self::Normalization,
            Self::FieldTypes,
            Self::Relationships,
            Self::Performance,
            Self::DataQuality,
        ]
    }
}

impl fmt::Display for AnalysisCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Structure => write!(f, "structure"),
            Self::Normalization => write!(f, "normalization"),
            Self::FieldTypes => write!(f, "field_types"),
            Self::Relationships => write!(f, "relationships"),
            Self::Performance => write!(f, "performance"),
            Self::DataQuality => write!(f, "data_quality"),
        }
    }
}

impl std::str::FromStr for AnalysisCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "structure" => Ok(Self::Structure),
            "normalization" => Ok(Self::Normalization),
            "field_types" => Ok(Self::FieldTypes),
            "relationships" => Ok(Self::Relationships),
            "performance" => Ok(Self::Performance),
            "data_quality" => Ok(Self::DataQuality),
            _ => Err(format!("Invalid analysis category: {s}")),
        }
    }
}

/// Priority assigned to a finding by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Priority {
    High,
    Medium,
    Low,
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Medium => write!(f, "medium"),
            Self::Low => write!(f, "low"),
        }
    }
}

impl std::str::FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "high" => Ok(Self::High),
            "medium" => Ok(Self::Medium),
            "low" => Ok(Self::Low),
            _ => Err(format!("Invalid priority: {s}")),
        }
    }
}

/// Implementation effort estimated by the model
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Effort {
    Low,
    Medium,
    High,
}

impl fmt::Display for Effort {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Low => write!(f, "low"),
            Self::Medium => write!(f, "medium"),
            Self::High => write!(f, "high"),
        }
    }
}

impl std::str::FromStr for Effort {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            _ => Err(format!("Invalid effort: {s}")),
        }
    }
}

/// One discrete improvement recommendation parsed from LLM output
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Finding {
    pub issue_type: String,
    pub priority: Priority,
    pub description: String,
    pub recommendation: String,
    pub impact: String,
    pub effort: Effort,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_improvement: Option<String>,
    #[serde(default)]
    pub implementation_steps: Vec<String>,
    /// Model-reported certainty, clamped to [0, 1] at parse time
    pub confidence_score: f64,
}

/// Discrete quality bucket derived from a continuous quality score
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualityBand {
    High,
    Acceptable,
    Review,
    Rejected,
}

impl fmt::Display for QualityBand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::High => write!(f, "high"),
            Self::Acceptable => write!(f, "acceptable"),
            Self::Review => write!(f, "review"),
            Self::Rejected => write!(f, "rejected"),
        }
    }
}

/// Per-component contribution to a composite quality score
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityBreakdown {
    pub confidence: f64,
    pub content_quality: f64,
    pub actionability: f64,
    pub specificity: f64,
    pub consistency: f64,
}

/// A finding with its composite quality score attached. Never mutated after
/// creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredFinding {
    pub finding: Finding,
    pub quality_score: f64,
    pub quality_band: QualityBand,
    pub breakdown: QualityBreakdown,
}
