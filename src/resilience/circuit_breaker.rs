//! # Circuit Breaker Implementation
//!
//! Provides fault isolation to prevent hammering a degraded upstream
//! dependency. Follows the classic circuit breaker pattern with three states:
//! Closed (normal operation), Open (failing fast), and Half-Open (testing
//! recovery with exactly one trial call in flight).

use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};

/// Circuit breaker states representing the current operational mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    /// Normal operation - all calls are allowed through
    Closed = 0,
    /// Failure mode - all calls fail fast without executing
    Open = 1,
    /// Testing recovery - a single trial call is allowed
    HalfOpen = 2,
}

impl From<u8> for CircuitState {
    fn from(value: u8) -> Self {
        match value {
            0 => CircuitState::Closed,
            2 => CircuitState::HalfOpen,
            // Default to safest state
            _ => CircuitState::Open,
        }
    }
}

/// Circuit breaker configuration parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerConfig {
    /// Consecutive failures before the circuit opens
    pub failure_threshold: u32,
    /// How long the circuit stays open before permitting a trial call
    pub cooldown: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: crate::constants::DEFAULT_FAILURE_THRESHOLD,
            cooldown: crate::constants::DEFAULT_BREAKER_COOLDOWN,
        }
    }
}

/// Errors that can occur during circuit breaker operation
#[derive(Debug, thiserror::Error)]
pub enum CircuitBreakerError<E> {
    /// Circuit is open, rejecting all calls
    #[error("Circuit breaker is open for {component}")]
    CircuitOpen { component: String },

    /// Operation failed and was recorded
    #[error("Operation failed: {0}")]
    OperationFailed(E),
}

/// Snapshot of breaker counters and state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CircuitBreakerMetrics {
    pub state: CircuitState,
    pub consecutive_failures: u32,
    pub total_calls: u64,
    pub success_count: u64,
    pub failure_count: u64,
    pub short_circuited: u64,
}

#[derive(Debug, Default)]
struct BreakerCounters {
    consecutive_failures: u32,
    total_calls: u64,
    success_count: u64,
    failure_count: u64,
    short_circuited: u64,
    opened_at: Option<Instant>,
    last_failure_at: Option<Instant>,
}

/// Core circuit breaker with atomic state management.
///
/// State transitions are monotonic per the state machine: closed opens after
/// `failure_threshold` consecutive failures, open transitions to half-open
/// once the cooldown elapses, and the half-open trial either closes the
/// circuit (success) or reopens it with a refreshed cooldown (failure). The
/// half-open trial permit is claimed by compare-and-swap, so two workers
/// observing an elapsed cooldown cannot both issue trial calls.
#[derive(Debug)]
pub struct CircuitBreaker {
    /// Dependency name for logging and metrics
    name: String,
    /// Current circuit state (atomic for thread safety)
    state: AtomicU8,
    /// Whether a half-open trial call is currently in flight
    trial_in_flight: AtomicBool,
    config: CircuitBreakerConfig,
    counters: parking_lot::Mutex<BreakerCounters>,
}

impl CircuitBreaker {
    pub fn new(name: String, config: CircuitBreakerConfig) -> Self {
        info!(
            component = %name,
            failure_threshold = config.failure_threshold,
            cooldown_seconds = config.cooldown.as_secs(),
            "🛡️ Circuit breaker initialized"
        );

        Self {
            name,
            state: AtomicU8::new(CircuitState::Closed as u8),
            trial_in_flight: AtomicBool::new(false),
            config,
            counters: parking_lot::Mutex::new(BreakerCounters::default()),
        }
    }

    /// Get current circuit state
    pub fn state(&self) -> CircuitState {
        CircuitState::from(self.state.load(Ordering::Acquire))
    }

    /// Execute an operation with circuit breaker protection.
    ///
    /// When the circuit is open, the operation closure is never invoked and
    /// the caller receives `CircuitOpen` immediately.
    pub async fn call<F, T, E, Fut>(&self, operation: F) -> Result<T, CircuitBreakerError<E>>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, E>>,
    {
        if !self.try_acquire() {
            self.counters.lock().short_circuited += 1;
            debug!(component = %self.name, "Call short-circuited, circuit open");
            return Err(CircuitBreakerError::CircuitOpen {
                component: self.name.clone(),
            });
        }

        let result = operation().await;

        match &result {
            Ok(_) => self.record_success(),
            Err(_) => self.record_failure(),
        }

        result.map_err(CircuitBreakerError::OperationFailed)
    }

    /// Decide whether a call may proceed, claiming the half-open trial permit
    /// when applicable.
    fn try_acquire(&self) -> bool {
        match self.state() {
            CircuitState::Closed => true,
            CircuitState::Open => {
                let cooldown_elapsed = {
                    let counters = self.counters.lock();
                    counters
                        .opened_at
                        .map(|at| at.elapsed() >= self.config.cooldown)
                        .unwrap_or(true)
                };
                if !cooldown_elapsed {
                    return false;
                }
                // Only the caller that wins the transition performs the trial;
                // losers contend for the permit like any half-open caller.
                if self
                    .state
                    .compare_exchange(
                        CircuitState::Open as u8,
                        CircuitState::HalfOpen as u8,
                        Ordering::AcqRel,
                        Ordering::Acquire,
                    )
                    .is_ok()
                {
                    info!(component = %self.name, "🟡 Circuit breaker half-open (testing recovery)");
                    self.trial_in_flight.store(true, Ordering::Release);
                    true
                } else {
                    self.claim_trial()
                }
            }
            CircuitState::HalfOpen => self.claim_trial(),
        }
    }

    fn claim_trial(&self) -> bool {
        self.trial_in_flight
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Record a successful operation
    fn record_success(&self) {
        let state = self.state();
        let mut counters = self.counters.lock();
        counters.total_calls += 1;
        counters.success_count += 1;

        match state {
            CircuitState::HalfOpen => {
                counters.consecutive_failures = 0;
                counters.opened_at = None;
                drop(counters);
                self.trial_in_flight.store(false, Ordering::Release);
                self.state
                    .store(CircuitState::Closed as u8, Ordering::Release);
                info!(component = %self.name, "🟢 Circuit breaker closed (recovered)");
            }
            CircuitState::Closed => {
                counters.consecutive_failures = 0;
            }
            CircuitState::Open => {
                warn!(component = %self.name, "Success recorded while circuit is open");
            }
        }
    }

    /// Record a failed operation
    fn record_failure(&self) {
        let state = self.state();
        let mut counters = self.counters.lock();
        counters.total_calls += 1;
        counters.failure_count += 1;
        counters.last_failure_at = Some(Instant::now());

        match state {
            CircuitState::Closed => {
                counters.consecutive_failures += 1;
                if counters.consecutive_failures >= self.config.failure_threshold {
                    counters.opened_at = Some(Instant::now());
                    let failures = counters.consecutive_failures;
                    drop(counters);
                    self.state
                        .store(CircuitState::Open as u8, Ordering::Release);
                    error!(
                        component = %self.name,
                        consecutive_failures = failures,
                        cooldown_seconds = self.config.cooldown.as_secs(),
                        "🔴 Circuit breaker opened (failing fast)"
                    );
                }
            }
            CircuitState::HalfOpen => {
                // Trial failed; reopen with a refreshed cooldown
                counters.opened_at = Some(Instant::now());
                drop(counters);
                self.trial_in_flight.store(false, Ordering::Release);
                self.state
                    .store(CircuitState::Open as u8, Ordering::Release);
                error!(component = %self.name, "🔴 Circuit breaker reopened (trial failed)");
            }
            CircuitState::Open => {
                // Already open, just record the failure
            }
        }
    }

    /// Get current metrics snapshot
    pub fn metrics(&self) -> CircuitBreakerMetrics {
        let counters = self.counters.lock();
        CircuitBreakerMetrics {
            state: self.state(),
            consecutive_failures: counters.consecutive_failures,
            total_calls: counters.total_calls,
            success_count: counters.success_count,
            failure_count: counters.failure_count,
            short_circuited: counters.short_circuited,
        }
    }

    /// Get component name
    pub fn name(&self) -> &str {
        &self.name
    }
}
