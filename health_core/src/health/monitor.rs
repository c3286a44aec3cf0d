//! Health monitor: fans out to every guarded probe and aggregates the results

use std::any::Any;
use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use futures_util::future::join_all;
use tokio::task::JoinError;
use tracing::{error, info, warn};

use super::cache::{CacheStats, ResultCache};
use super::circuit_breaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitBreakerState};
use super::probe::{GuardedProbe, HealthProbe};
use super::probes::{
    CacheServiceClient, CacheServiceProbe, DatabasePing, DatabaseProbe, ExternalServiceCheck,
    ExternalServicesProbe, ObjectStorageClient, ObjectStorageProbe, QueueProbe,
    QueueStatusSource, ResourceSampler, SystemResourcesProbe,
};
use super::types::{HealthCheckResult, HealthStatus, SystemHealth};
use crate::config::{AppConfig, HealthConfig};

/// Dependency clients the standard probe set is built from.
pub struct MonitorDependencies {
    pub database: Arc<dyn DatabasePing>,
    pub cache_service: Option<Arc<dyn CacheServiceClient>>,
    pub external_services: Vec<Arc<dyn ExternalServiceCheck>>,
    pub resources: Arc<dyn ResourceSampler>,
    pub queue: Arc<dyn QueueStatusSource>,
    pub object_storage: Arc<dyn ObjectStorageClient>,
}

pub struct HealthMonitorBuilder {
    breaker_config: CircuitBreakerConfig,
    cache_ttl: Duration,
    cache_capacity: usize,
    probe_timeout: Duration,
    version: String,
    probes: Vec<Arc<dyn HealthProbe>>,
}

impl HealthMonitorBuilder {
    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn probe<P: HealthProbe + 'static>(self, probe: P) -> Self {
        self.shared_probe(Arc::new(probe))
    }

    pub fn shared_probe(mut self, probe: Arc<dyn HealthProbe>) -> Self {
        if self.probes.iter().any(|p| p.name() == probe.name()) {
            warn!("Ignoring duplicate probe registration for '{}'", probe.name());
            return self;
        }
        self.probes.push(probe);
        self
    }

    pub fn build(self) -> HealthMonitor {
        let breakers = Arc::new(CircuitBreakerRegistry::new(self.breaker_config));
        let cache = Arc::new(ResultCache::new(self.cache_ttl, self.cache_capacity));

        let probes = self
            .probes
            .into_iter()
            .map(|probe| {
                Arc::new(GuardedProbe::new(
                    probe,
                    breakers.clone(),
                    cache.clone(),
                    self.probe_timeout,
                ))
            })
            .collect();

        HealthMonitor {
            probes,
            breakers,
            cache,
            start_time: Instant::now(),
            version: self.version,
        }
    }
}

pub struct HealthMonitor {
    probes: Vec<Arc<GuardedProbe>>,
    breakers: Arc<CircuitBreakerRegistry>,
    cache: Arc<ResultCache>,
    start_time: Instant,
    version: String,
}

impl HealthMonitor {
    pub fn builder(config: &HealthConfig) -> HealthMonitorBuilder {
        HealthMonitorBuilder {
            breaker_config: CircuitBreakerConfig::from(config),
            cache_ttl: config.cache_ttl(),
            cache_capacity: config.cache_capacity,
            probe_timeout: config.probe_timeout(),
            version: env!("CARGO_PKG_VERSION").to_string(),
            probes: Vec::new(),
        }
    }

    /// Registers the standard probes in their fixed report order.
    pub fn from_config(config: &AppConfig, deps: MonitorDependencies) -> Self {
        let thresholds = &config.thresholds;

        Self::builder(&config.health)
            .probe(DatabaseProbe::new(deps.database, thresholds.database_degraded_ms))
            .probe(CacheServiceProbe::new(
                deps.cache_service,
                thresholds.cache_service_degraded_ms,
            ))
            .probe(ExternalServicesProbe::new(deps.external_services))
            .probe(SystemResourcesProbe::new(
                deps.resources,
                thresholds.memory_degraded_ratio,
                thresholds.memory_unhealthy_ratio,
            ))
            .probe(QueueProbe::new(
                deps.queue,
                Duration::from_secs(config.queue.stale_after_seconds),
                config.queue.max_pending_jobs,
            ))
            .probe(ObjectStorageProbe::new(
                deps.object_storage,
                thresholds.object_storage_degraded_ms,
            ))
            .build()
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    pub fn component_names(&self) -> Vec<String> {
        self.probes.iter().map(|p| p.name().to_string()).collect()
    }

    pub async fn check_system_health(&self) -> SystemHealth {
        info!("Running health checks for {} components", self.probes.len());
        let started = Instant::now();

        let tasks = self.probes.iter().map(|probe| {
            let probe = Arc::clone(probe);
            tokio::spawn(async move { probe.check().await })
        });
        let outcomes = join_all(tasks).await;

        let components: Vec<HealthCheckResult> = outcomes
            .into_iter()
            .zip(&self.probes)
            .map(|(outcome, probe)| match outcome {
                Ok(result) => result,
                Err(err) => self.failed_task_result(probe.name(), err),
            })
            .collect();

        for component in &components {
            log_result(component);
        }

        let health = SystemHealth::new(
            self.version.clone(),
            self.start_time.elapsed().as_secs(),
            components,
        );

        info!(
            "Health check completed in {:?} - Overall status: {}",
            started.elapsed(),
            health.overall
        );
        health
    }

    pub async fn check_component(&self, component: &str) -> Option<HealthCheckResult> {
        let probe = self.probes.iter().find(|p| p.name() == component)?.clone();

        let outcome = tokio::spawn({
            let probe = probe.clone();
            async move { probe.check().await }
        })
        .await;

        let result = match outcome {
            Ok(result) => result,
            Err(err) => self.failed_task_result(probe.name(), err),
        };
        log_result(&result);
        Some(result)
    }

    /// Clears every circuit breaker and cached result.
    pub fn reset(&self) {
        self.breakers.reset_all();
        self.cache.clear();
        info!("Health monitor state reset");
    }

    pub fn circuit_breaker_states(&self) -> BTreeMap<String, CircuitBreakerState> {
        self.breakers.snapshot()
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn breakers(&self) -> &CircuitBreakerRegistry {
        &self.breakers
    }

    fn failed_task_result(&self, component: &str, err: JoinError) -> HealthCheckResult {
        let reason = if err.is_panic() {
            panic_message(err.into_panic())
        } else {
            "probe task cancelled".to_string()
        };

        error!("Probe task for '{}' did not complete: {}", component, reason);
        self.breakers.record_failure(component);
        HealthCheckResult::unhealthy(component, reason)
    }
}

fn log_result(result: &HealthCheckResult) {
    match result.status {
        HealthStatus::Healthy => {
            info!("Health check '{}' passed ({:?} ms)", result.component, result.latency_ms);
        }
        HealthStatus::Degraded => {
            warn!(
                "Health check '{}' degraded ({:?} ms): {}",
                result.component,
                result.latency_ms,
                result.error.as_deref().unwrap_or("slow response")
            );
        }
        HealthStatus::Unhealthy => {
            error!(
                "Health check '{}' failed: {}",
                result.component,
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

fn panic_message(payload: Box<dyn Any + Send>) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        message.to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "probe panicked".to_string()
    }
}
