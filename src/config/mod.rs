//! # Configuration System
//!
//! Typed configuration for the analysis engine with explicit defaults and
//! environment-aware loading. Config structs hold plain numeric fields so
//! they deserialize cleanly from files and environment variables; components
//! receive converted runtime settings (`Duration`s, breaker config) at
//! construction time.

pub mod loader;

use crate::constants;
use crate::resilience::CircuitBreakerConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Root configuration for the analysis engine
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TablewiseConfig {
    /// Single-analysis execution settings
    pub analysis: AnalysisConfig,

    /// Analysis result caching
    pub cache: CacheConfig,

    /// Circuit breaker thresholds for upstream dependencies
    pub circuit_breaker: CircuitBreakerSettings,

    /// Quality filtering defaults
    pub quality: QualityConfig,

    /// Workflow scheduling defaults
    pub workflow: WorkflowConfig,
}

impl TablewiseConfig {
    /// Validate cross-field constraints. Called by the loader; direct
    /// construction in tests may skip it.
    pub fn validate(&self) -> crate::error::Result<()> {
        if !(0.0..=1.0).contains(&self.quality.default_threshold) {
            return Err(crate::error::TablewiseError::ConfigurationError(format!(
                "quality.default_threshold must be in [0, 1], got {}",
                self.quality.default_threshold
            )));
        }
        if self.workflow.max_concurrent == 0 {
            return Err(crate::error::TablewiseError::ConfigurationError(
                "workflow.max_concurrent must be at least 1".to_string(),
            ));
        }
        if self.workflow.batch_size == 0 {
            return Err(crate::error::TablewiseError::ConfigurationError(
                "workflow.batch_size must be at least 1".to_string(),
            ));
        }
        if self.circuit_breaker.failure_threshold == 0 {
            return Err(crate::error::TablewiseError::ConfigurationError(
                "circuit_breaker.failure_threshold must be at least 1".to_string(),
            ));
        }
        Ok(())
    }
}

/// Settings for one LLM analysis call
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalysisConfig {
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout_seconds: u64,
    pub min_request_interval_ms: u64,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            max_tokens: constants::DEFAULT_MAX_TOKENS,
            temperature: constants::DEFAULT_TEMPERATURE,
            request_timeout_seconds: constants::DEFAULT_REQUEST_TIMEOUT.as_secs(),
            min_request_interval_ms: constants::DEFAULT_MIN_REQUEST_INTERVAL.as_millis() as u64,
        }
    }
}

impl AnalysisConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_seconds)
    }

    pub fn min_request_interval(&self) -> Duration {
        Duration::from_millis(self.min_request_interval_ms)
    }

    pub fn to_settings(&self) -> AnalysisSettings {
        AnalysisSettings {
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            request_timeout: self.request_timeout(),
        }
    }
}

/// Runtime settings handed to the analysis executor
#[derive(Debug, Clone)]
pub struct AnalysisSettings {
    pub max_tokens: u32,
    pub temperature: f32,
    pub request_timeout: Duration,
}

/// Analysis result cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    pub enabled: bool,
    pub ttl_seconds: u64,
    /// Whether a fresh cache hit is returned even when its findings all fall
    /// below the active run's quality threshold. When false such a hit is
    /// treated as a miss and the analysis re-runs.
    pub reuse_below_threshold: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            ttl_seconds: constants::DEFAULT_CACHE_TTL.as_secs(),
            reuse_below_threshold: true,
        }
    }
}

impl CacheConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_seconds)
    }
}

/// Circuit breaker thresholds
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerSettings {
    pub failure_threshold: u32,
    pub cooldown_seconds: u64,
}

impl Default for CircuitBreakerSettings {
    fn default() -> Self {
        Self {
            failure_threshold: constants::DEFAULT_FAILURE_THRESHOLD,
            cooldown_seconds: constants::DEFAULT_BREAKER_COOLDOWN.as_secs(),
        }
    }
}

impl CircuitBreakerSettings {
    pub fn to_breaker_config(&self) -> CircuitBreakerConfig {
        CircuitBreakerConfig {
            failure_threshold: self.failure_threshold,
            cooldown: Duration::from_secs(self.cooldown_seconds),
        }
    }
}

/// Quality filtering defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QualityConfig {
    pub default_threshold: f64,
}

impl Default for QualityConfig {
    fn default() -> Self {
        Self {
            default_threshold: constants::DEFAULT_QUALITY_THRESHOLD,
        }
    }
}

/// Workflow scheduling defaults
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkflowConfig {
    pub batch_size: usize,
    pub max_concurrent: usize,
    pub auto_persist: bool,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            batch_size: constants::DEFAULT_BATCH_SIZE,
            max_concurrent: constants::DEFAULT_MAX_CONCURRENT,
            auto_persist: true,
        }
    }
}

impl WorkflowConfig {
    pub fn to_settings(&self) -> WorkflowSettings {
        WorkflowSettings {
            batch_size: self.batch_size,
            max_concurrent: self.max_concurrent,
            auto_persist: self.auto_persist,
        }
    }
}

/// Runtime settings handed to the workflow coordinator
#[derive(Debug, Clone)]
pub struct WorkflowSettings {
    pub batch_size: usize,
    pub max_concurrent: usize,
    pub auto_persist: bool,
}
