//! # Circuit Breaker Manager
//!
//! Keys one shared circuit breaker per logical upstream dependency. Breakers
//! are constructed once per process and handed to executors by reference, so
//! one table's repeated failures protect all concurrent callers from
//! hammering a degraded upstream. Tests construct fresh managers per case
//! instead of relying on process-wide state.

use crate::resilience::circuit_breaker::{CircuitBreaker, CircuitBreakerConfig, CircuitBreakerMetrics};
use dashmap::DashMap;
use std::collections::HashMap;
use std::sync::Arc;

/// Registry of circuit breakers keyed by upstream dependency name
#[derive(Debug)]
pub struct CircuitBreakerManager {
    breakers: DashMap<String, Arc<CircuitBreaker>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerManager {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: DashMap::new(),
            config,
        }
    }

    /// Get or create the breaker for a dependency
    pub fn breaker(&self, dependency: &str) -> Arc<CircuitBreaker> {
        self.breakers
            .entry(dependency.to_string())
            .or_insert_with(|| {
                Arc::new(CircuitBreaker::new(
                    dependency.to_string(),
                    self.config.clone(),
                ))
            })
            .clone()
    }

    /// Metrics snapshot across all registered breakers
    pub fn all_metrics(&self) -> HashMap<String, CircuitBreakerMetrics> {
        self.breakers
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().metrics()))
            .collect()
    }
}

impl Default for CircuitBreakerManager {
    fn default() -> Self {
        Self::new(CircuitBreakerConfig::default())
    }
}
