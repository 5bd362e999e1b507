//! # System Constants
//!
//! Core constants that define the operational boundaries of the analysis
//! orchestration engine: upstream dependency names, quality bands, and the
//! per-category cost table used for batch estimation.

use crate::models::AnalysisCategory;
use std::time::Duration;

/// Logical upstream dependency names used to key circuit breakers
pub mod dependencies {
    /// The LLM completion backend
    pub const LLM_BACKEND: &str = "llm-backend";
    /// The external schema discovery client
    pub const SCHEMA_CLIENT: &str = "schema-client";
}

/// Quality banding thresholds applied to composite quality scores
pub mod quality_bands {
    /// Scores at or above this value band as high quality
    pub const HIGH: f64 = 0.8;
    /// Scores at or above this value band as acceptable (default accept threshold)
    pub const ACCEPTABLE: f64 = 0.7;
    /// Scores at or above this value band as review; below is rejected
    pub const REVIEW: f64 = 0.5;
}

/// Default quality threshold for retaining findings in the final aggregate
pub const DEFAULT_QUALITY_THRESHOLD: f64 = 0.7;

/// Default cache entry time-to-live
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_secs(24 * 60 * 60);

/// Default number of consecutive failures before a breaker opens
pub const DEFAULT_FAILURE_THRESHOLD: u32 = 5;

/// Default breaker cooldown before a half-open trial is permitted
pub const DEFAULT_BREAKER_COOLDOWN: Duration = Duration::from_secs(60);

/// Default bounded worker pool size for batch scheduling
pub const DEFAULT_MAX_CONCURRENT: usize = 3;

/// Default number of tables grouped into one scheduling batch
pub const DEFAULT_BATCH_SIZE: usize = 5;

/// Default minimum spacing between successive upstream calls
pub const DEFAULT_MIN_REQUEST_INTERVAL: Duration = Duration::from_secs(1);

/// Default bounded timeout for a single LLM request
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Default token budget for a single analysis completion
pub const DEFAULT_MAX_TOKENS: u32 = 4000;

/// Default sampling temperature; low for consistent analysis output
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Confidence assigned to synthesized fallback findings
pub const FALLBACK_CONFIDENCE: f64 = 0.3;

/// Issue type marker carried by synthesized fallback findings
pub const FALLBACK_ISSUE_TYPE: &str = "analysis_fallback";

/// Estimated unit cost (USD) of one analysis call for a category.
///
/// Rough estimates based on prompt complexity and expected response length;
/// used only for pre-flight batch cost estimation, never for accounting.
pub fn estimated_category_cost(category: AnalysisCategory) -> f64 {
    match category {
        AnalysisCategory::Structure => 0.02,
        AnalysisCategory::Normalization => 0.025,
        AnalysisCategory::FieldTypes => 0.015,
        AnalysisCategory::Relationships => 0.03,
        AnalysisCategory::Performance => 0.02,
        AnalysisCategory::DataQuality => 0.02,
    }
}

/// Estimated wall-clock time for one analysis call, for batch estimation
pub const ESTIMATED_SECONDS_PER_ANALYSIS: u64 = 30;
