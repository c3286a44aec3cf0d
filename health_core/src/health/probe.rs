//! Probe contract and the guard that wraps every probe with breaker,
//! cache and deadline handling.

use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tracing::{debug, warn};

use super::cache::ResultCache;
use super::circuit_breaker::CircuitBreakerRegistry;
use super::types::HealthCheckResult;
use crate::error::ProbeError;

/// A single dependency-specific health check.
///
/// Implementations perform the real dependency call. Slow or partially
/// failing dependencies are reported as `Ok` results with a `Degraded`
/// status; hard failures either return `Err` or an `Unhealthy` result.
#[async_trait::async_trait]
pub trait HealthProbe: Send + Sync {
    fn name(&self) -> &str;

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError>;

    /// Per-probe deadline; the monitor-wide default applies when `None`.
    fn timeout(&self) -> Option<Duration> {
        None
    }
}

pub struct GuardedProbe {
    probe: Arc<dyn HealthProbe>,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: Arc<ResultCache>,
    timeout: Duration,
}

impl GuardedProbe {
    pub fn new(
        probe: Arc<dyn HealthProbe>,
        breakers: Arc<CircuitBreakerRegistry>,
        cache: Arc<ResultCache>,
        default_timeout: Duration,
    ) -> Self {
        let timeout = probe.timeout().unwrap_or(default_timeout);
        Self {
            probe,
            breakers,
            cache,
            timeout,
        }
    }

    pub fn name(&self) -> &str {
        self.probe.name()
    }

    pub fn timeout(&self) -> Duration {
        self.timeout
    }

    pub async fn check(&self) -> HealthCheckResult {
        let component = self.probe.name();

        if self.breakers.is_open(component) {
            debug!("Circuit open for '{}', skipping probe", component);
            return HealthCheckResult::unhealthy(component, ProbeError::CircuitOpen.to_string());
        }

        if let Some(cached) = self.cache.get(component) {
            // A granted half-open trial is handed back when no call is made.
            self.breakers.release_trial(component);
            return cached;
        }

        let start = Instant::now();
        let outcome = match tokio::time::timeout(self.timeout, self.probe.probe()).await {
            Ok(outcome) => outcome,
            Err(_) => Err(ProbeError::Timeout(self.timeout)),
        };

        let result = match outcome {
            Ok(mut result) => {
                if result.component != component {
                    result.component = component.to_string();
                }
                result
            }
            Err(err) => {
                warn!("Probe '{}' failed ({}): {}", component, err.kind(), err);
                HealthCheckResult::unhealthy(component, err.to_string())
                    .with_latency(start.elapsed().as_millis() as u64)
            }
        };

        if result.is_failure() {
            self.breakers.record_failure(component);
        } else {
            self.breakers.record_success(component);
        }

        self.cache.put(component, result.clone());
        result
    }
}
