//! Per-component circuit breakers.
//!
//! Each component gets its own breaker, created lazily on the first
//! recorded failure:
//!
//! ```text
//! Closed   -> Open      failures >= threshold
//! Open     -> HalfOpen  timeout elapsed since the last failure (checked in is_open)
//! HalfOpen -> Closed    next success
//! HalfOpen -> Open      next failure, timeout restarts
//! ```
//!
//! A half-open breaker admits one trial call at a time; `is_open` keeps
//! returning true to other callers until the trial is recorded or released.

use chrono::{DateTime, Utc};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CircuitState {
    Closed,
    Open,
    HalfOpen,
}

impl std::fmt::Display for CircuitState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CircuitState::Closed => write!(f, "closed"),
            CircuitState::Open => write!(f, "open"),
            CircuitState::HalfOpen => write!(f, "half_open"),
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct CircuitBreakerConfig {
    pub failure_threshold: u32,
    pub timeout: Duration,
}

impl Default for CircuitBreakerConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            timeout: Duration::from_secs(60),
        }
    }
}

impl From<&crate::config::HealthConfig> for CircuitBreakerConfig {
    fn from(config: &crate::config::HealthConfig) -> Self {
        Self {
            failure_threshold: config.failure_threshold,
            timeout: config.open_timeout(),
        }
    }
}

/// Read-only view of one breaker, as exposed to diagnostics.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CircuitBreakerState {
    pub failures: u32,
    pub last_failure_at: DateTime<Utc>,
    pub state: CircuitState,
    pub timeout_ms: u64,
}

#[derive(Debug)]
struct Breaker {
    failures: u32,
    state: CircuitState,
    trial_in_flight: bool,
    last_failure: Instant,
    last_failure_at: DateTime<Utc>,
}

impl Breaker {
    fn new() -> Self {
        Self {
            failures: 0,
            state: CircuitState::Closed,
            trial_in_flight: false,
            last_failure: Instant::now(),
            last_failure_at: Utc::now(),
        }
    }
}

/// Breakers for every component, behind a single lock so that each
/// read-modify-write of a component's counters is atomic.
#[derive(Debug, Default)]
pub struct CircuitBreakerRegistry {
    breakers: Mutex<HashMap<String, Breaker>>,
    config: CircuitBreakerConfig,
}

impl CircuitBreakerRegistry {
    pub fn new(config: CircuitBreakerConfig) -> Self {
        Self {
            breakers: Mutex::new(HashMap::new()),
            config,
        }
    }

    pub fn config(&self) -> CircuitBreakerConfig {
        self.config
    }

    /// Returns true while the component's breaker rejects calls.
    ///
    /// An open breaker whose timeout has elapsed is moved to half-open and
    /// the caller is granted the single trial call. The caller must follow up
    /// with `record_success`, `record_failure` or `release_trial`.
    pub fn is_open(&self, component: &str) -> bool {
        let mut breakers = self.breakers.lock();
        let Some(breaker) = breakers.get_mut(component) else {
            return false;
        };

        match breaker.state {
            CircuitState::Open if breaker.last_failure.elapsed() >= self.config.timeout => {
                breaker.state = CircuitState::HalfOpen;
                breaker.trial_in_flight = true;
                info!(
                    component = %component,
                    failures = breaker.failures,
                    "Circuit breaker half-open, allowing trial call"
                );
                false
            }
            CircuitState::Open => true,
            CircuitState::HalfOpen if breaker.trial_in_flight => true,
            CircuitState::HalfOpen => {
                breaker.trial_in_flight = true;
                false
            }
            CircuitState::Closed => false,
        }
    }

    /// Gives up a granted trial without an outcome, so the next caller may
    /// take it.
    pub fn release_trial(&self, component: &str) {
        if let Some(breaker) = self.breakers.lock().get_mut(component) {
            breaker.trial_in_flight = false;
        }
    }

    pub fn record_failure(&self, component: &str) {
        let mut breakers = self.breakers.lock();
        let breaker = breakers
            .entry(component.to_string())
            .or_insert_with(Breaker::new);

        breaker.failures = breaker.failures.saturating_add(1);
        breaker.trial_in_flight = false;
        breaker.last_failure = Instant::now();
        breaker.last_failure_at = Utc::now();

        let reopen = breaker.state == CircuitState::HalfOpen;
        if reopen || breaker.failures >= self.config.failure_threshold {
            if breaker.state != CircuitState::Open {
                warn!(
                    component = %component,
                    failures = breaker.failures,
                    failure_threshold = self.config.failure_threshold,
                    timeout_ms = self.config.timeout.as_millis() as u64,
                    "Circuit breaker opened"
                );
            }
            breaker.state = CircuitState::Open;
        } else {
            debug!(
                component = %component,
                failures = breaker.failures,
                "Recorded probe failure"
            );
        }
    }

    pub fn record_success(&self, component: &str) {
        let mut breakers = self.breakers.lock();
        if let Some(breaker) = breakers.get_mut(component) {
            if breaker.state != CircuitState::Closed {
                info!(component = %component, "Circuit breaker closed");
            }
            breaker.failures = 0;
            breaker.trial_in_flight = false;
            breaker.state = CircuitState::Closed;
        }
    }

    pub fn reset_all(&self) {
        let mut breakers = self.breakers.lock();
        let count = breakers.len();
        breakers.clear();
        info!("Reset {} circuit breakers", count);
    }

    pub fn state_of(&self, component: &str) -> Option<CircuitBreakerState> {
        self.breakers
            .lock()
            .get(component)
            .map(|breaker| self.view(breaker))
    }

    pub fn snapshot(&self) -> BTreeMap<String, CircuitBreakerState> {
        self.breakers
            .lock()
            .iter()
            .map(|(name, breaker)| (name.clone(), self.view(breaker)))
            .collect()
    }

    pub fn failure_count(&self, component: &str) -> u32 {
        self.breakers
            .lock()
            .get(component)
            .map(|breaker| breaker.failures)
            .unwrap_or(0)
    }

    fn view(&self, breaker: &Breaker) -> CircuitBreakerState {
        CircuitBreakerState {
            failures: breaker.failures,
            last_failure_at: breaker.last_failure_at,
            state: breaker.state,
            timeout_ms: self.config.timeout.as_millis() as u64,
        }
    }
}
