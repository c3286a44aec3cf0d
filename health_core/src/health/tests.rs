#[cfg(test)]
mod tests {
    use crate::config::{AppConfig, HealthConfig};
    use crate::error::ProbeError;
    use crate::health::probes::{
        BucketSummary, CacheServiceClient, CacheServiceInfo, DatabasePing, ExternalServiceCheck,
        ObjectStorageClient, PoolSnapshot, QueueStatusSource, ResourceSampler, ResourceSnapshot,
        WorkerStatus,
    };
    use crate::health::{
        CircuitState, HealthCheckResult, HealthMonitor, HealthProbe, HealthStatus,
        MonitorDependencies, SystemHealth,
    };
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Duration;

    struct DelayedProbe {
        name: &'static str,
        delay: Duration,
        status: HealthStatus,
    }

    #[async_trait::async_trait]
    impl HealthProbe for DelayedProbe {
        fn name(&self) -> &str {
            self.name
        }

        async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
            tokio::time::sleep(self.delay).await;
            Ok(match self.status {
                HealthStatus::Healthy => HealthCheckResult::healthy(self.name),
                HealthStatus::Degraded => HealthCheckResult::degraded(self.name),
                HealthStatus::Unhealthy => HealthCheckResult::unhealthy(self.name, "down"),
            })
        }
    }

    struct PanickingProbe;

    #[async_trait::async_trait]
    impl HealthProbe for PanickingProbe {
        fn name(&self) -> &str {
            "exploding"
        }

        async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
            panic!("probe blew up");
        }
    }

    /// Cache client that refuses connections and counts attempts.
    #[derive(Default)]
    struct RefusingCache {
        calls: AtomicUsize,
    }

    #[async_trait::async_trait]
    impl CacheServiceClient for RefusingCache {
        async fn ping(&self) -> Result<(), ProbeError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Err(ProbeError::connectivity(
                "cache service unreachable: Connection refused (os error 111)",
            ))
        }

        async fn info(&self) -> Result<CacheServiceInfo, ProbeError> {
            Ok(CacheServiceInfo::default())
        }
    }

    struct OkDatabase;

    #[async_trait::async_trait]
    impl DatabasePing for OkDatabase {
        async fn ping(&self) -> Result<PoolSnapshot, ProbeError> {
            Ok(PoolSnapshot {
                size: 1,
                idle: 1,
                max_connections: 5,
            })
        }
    }

    struct Configured(&'static str);

    #[async_trait::async_trait]
    impl ExternalServiceCheck for Configured {
        fn name(&self) -> &str {
            self.0
        }

        async fn check(&self) -> bool {
            true
        }
    }

    struct LowMemory;

    #[async_trait::async_trait]
    impl ResourceSampler for LowMemory {
        async fn sample(&self) -> Result<ResourceSnapshot, ProbeError> {
            Ok(ResourceSnapshot {
                memory_used_bytes: 100,
                memory_total_bytes: 1000,
                cpu_usage_percent: 1.0,
                uptime_seconds: 5,
            })
        }
    }

    struct OneWorker;

    #[async_trait::async_trait]
    impl QueueStatusSource for OneWorker {
        async fn workers(&self) -> Vec<WorkerStatus> {
            vec![WorkerStatus {
                worker_id: "worker-1".to_string(),
                queue: "default".to_string(),
                pending_jobs: 0,
                since_last_heartbeat: Duration::from_secs(1),
            }]
        }
    }

    struct EmptyStorage;

    #[async_trait::async_trait]
    impl ObjectStorageClient for EmptyStorage {
        async fn list_buckets(&self) -> Result<Vec<BucketSummary>, ProbeError> {
            Ok(Vec::new())
        }
    }

    /// Every dependency hangs on its call and counts how often it was entered.
    #[derive(Default)]
    struct Hanging {
        calls: AtomicUsize,
    }

    impl Hanging {
        async fn hang(&self) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            tokio::time::sleep(Duration::from_secs(3600)).await;
        }
    }

    #[async_trait::async_trait]
    impl DatabasePing for Hanging {
        async fn ping(&self) -> Result<PoolSnapshot, ProbeError> {
            self.hang().await;
            Ok(PoolSnapshot {
                size: 0,
                idle: 0,
                max_connections: 0,
            })
        }
    }

    #[async_trait::async_trait]
    impl CacheServiceClient for Hanging {
        async fn ping(&self) -> Result<(), ProbeError> {
            self.hang().await;
            Ok(())
        }

        async fn info(&self) -> Result<CacheServiceInfo, ProbeError> {
            Ok(CacheServiceInfo::default())
        }
    }

    #[async_trait::async_trait]
    impl ExternalServiceCheck for Hanging {
        fn name(&self) -> &str {
            "email"
        }

        async fn check(&self) -> bool {
            self.hang().await;
            true
        }
    }

    #[async_trait::async_trait]
    impl ResourceSampler for Hanging {
        async fn sample(&self) -> Result<ResourceSnapshot, ProbeError> {
            self.hang().await;
            Ok(ResourceSnapshot {
                memory_used_bytes: 0,
                memory_total_bytes: 1,
                cpu_usage_percent: 0.0,
                uptime_seconds: 0,
            })
        }
    }

    #[async_trait::async_trait]
    impl QueueStatusSource for Hanging {
        async fn workers(&self) -> Vec<WorkerStatus> {
            self.hang().await;
            Vec::new()
        }
    }

    #[async_trait::async_trait]
    impl ObjectStorageClient for Hanging {
        async fn list_buckets(&self) -> Result<Vec<BucketSummary>, ProbeError> {
            self.hang().await;
            Ok(Vec::new())
        }
    }

    fn health_config(threshold: u32) -> HealthConfig {
        HealthConfig {
            failure_threshold: threshold,
            ..HealthConfig::default()
        }
    }

    fn standard_monitor(config: &AppConfig, cache: Arc<RefusingCache>) -> HealthMonitor {
        HealthMonitor::from_config(
            config,
            MonitorDependencies {
                database: Arc::new(OkDatabase),
                cache_service: Some(cache as Arc<dyn CacheServiceClient>),
                external_services: vec![
                    Arc::new(Configured("email")) as Arc<dyn ExternalServiceCheck>,
                    Arc::new(Configured("payment")),
                ],
                resources: Arc::new(LowMemory),
                queue: Arc::new(OneWorker),
                object_storage: Arc::new(EmptyStorage),
            },
        )
    }

    #[test]
    fn test_health_status_display() {
        assert_eq!(HealthStatus::Healthy.to_string(), "healthy");
        assert_eq!(HealthStatus::Degraded.to_string(), "degraded");
        assert_eq!(HealthStatus::Unhealthy.to_string(), "unhealthy");
    }

    #[test]
    fn test_aggregation_law_for_all_combinations() {
        let all = [HealthStatus::Healthy, HealthStatus::Degraded, HealthStatus::Unhealthy];

        for a in all {
            for b in all {
                for c in all {
                    let statuses = [a, b, c];
                    let expected = if statuses.contains(&HealthStatus::Unhealthy) {
                        HealthStatus::Unhealthy
                    } else if statuses.contains(&HealthStatus::Degraded) {
                        HealthStatus::Degraded
                    } else {
                        HealthStatus::Healthy
                    };
                    assert_eq!(HealthStatus::aggregate(&statuses), expected, "{:?}", statuses);
                }
            }
        }

        assert_eq!(HealthStatus::aggregate(&[] as &[HealthStatus]), HealthStatus::Healthy);
    }

    #[test]
    fn test_system_health_serialization() {
        let health = SystemHealth::new(
            "1.0.0".to_string(),
            60,
            vec![
                HealthCheckResult::healthy("database").with_latency(3),
                HealthCheckResult::unhealthy("queue", "no queue workers registered"),
            ],
        );

        let json = serde_json::to_value(&health).unwrap();
        assert_eq!(json["overall"], "unhealthy");
        assert_eq!(json["version"], "1.0.0");
        assert_eq!(json["components"][0]["component"], "database");
        assert_eq!(json["components"][0]["latency_ms"], 3);
        assert!(json["components"][0].get("error").is_none());
        assert_eq!(json["components"][1]["error"], "no queue workers registered");
    }

    #[tokio::test]
    async fn test_empty_monitor_is_healthy() {
        let monitor = HealthMonitor::builder(&HealthConfig::default())
            .version("1.0.0")
            .build();

        let health = monitor.check_system_health().await;

        assert_eq!(health.version, "1.0.0");
        assert_eq!(health.overall, HealthStatus::Healthy);
        assert!(health.components.is_empty());
    }

    #[tokio::test]
    async fn test_report_keeps_registration_order() {
        let monitor = HealthMonitor::builder(&HealthConfig::default())
            .probe(DelayedProbe {
                name: "slow",
                delay: Duration::from_millis(60),
                status: HealthStatus::Healthy,
            })
            .probe(DelayedProbe {
                name: "fast",
                delay: Duration::from_millis(1),
                status: HealthStatus::Degraded,
            })
            .probe(DelayedProbe {
                name: "medium",
                delay: Duration::from_millis(20),
                status: HealthStatus::Healthy,
            })
            .build();

        let health = monitor.check_system_health().await;

        let names: Vec<&str> = health.components.iter().map(|c| c.component.as_str()).collect();
        assert_eq!(names, vec!["slow", "fast", "medium"]);
        assert_eq!(health.overall, HealthStatus::Degraded);
    }

    #[tokio::test]
    async fn test_probes_run_concurrently() {
        let mut builder = HealthMonitor::builder(&HealthConfig::default());
        for name in ["a", "b", "c", "d"] {
            builder = builder.probe(DelayedProbe {
                name,
                delay: Duration::from_millis(200),
                status: HealthStatus::Healthy,
            });
        }
        let monitor = builder.build();

        let started = std::time::Instant::now();
        let health = monitor.check_system_health().await;

        assert_eq!(health.components.len(), 4);
        assert!(started.elapsed() < Duration::from_millis(700));
    }

    #[tokio::test]
    async fn test_panicking_probe_is_isolated() {
        let monitor = HealthMonitor::builder(&HealthConfig::default())
            .probe(DelayedProbe {
                name: "database",
                delay: Duration::ZERO,
                status: HealthStatus::Healthy,
            })
            .probe(PanickingProbe)
            .probe(DelayedProbe {
                name: "queue",
                delay: Duration::ZERO,
                status: HealthStatus::Healthy,
            })
            .build();

        let health = monitor.check_system_health().await;

        assert_eq!(health.overall, HealthStatus::Unhealthy);
        assert_eq!(health.components[0].status, HealthStatus::Healthy);
        assert_eq!(health.components[1].component, "exploding");
        assert_eq!(health.components[1].status, HealthStatus::Unhealthy);
        assert_eq!(health.components[1].error.as_deref(), Some("probe blew up"));
        assert_eq!(health.components[2].status, HealthStatus::Healthy);
        assert_eq!(monitor.breakers().failure_count("exploding"), 1);
    }

    #[tokio::test]
    async fn test_duplicate_probe_names_are_ignored() {
        let monitor = HealthMonitor::builder(&HealthConfig::default())
            .probe(DelayedProbe {
                name: "database",
                delay: Duration::ZERO,
                status: HealthStatus::Healthy,
            })
            .probe(DelayedProbe {
                name: "database",
                delay: Duration::ZERO,
                status: HealthStatus::Unhealthy,
            })
            .build();

        assert_eq!(monitor.component_names(), vec!["database".to_string()]);
    }

    #[tokio::test]
    async fn test_standard_probe_order() {
        let config = AppConfig::default();
        let monitor = standard_monitor(&config, Arc::new(RefusingCache::default()));

        assert_eq!(
            monitor.component_names(),
            vec![
                "database",
                "cache_service",
                "external_services",
                "system_resources",
                "queue",
                "object_storage",
            ]
        );
    }

    #[tokio::test]
    async fn test_refused_cache_service_opens_breaker() {
        let mut config = AppConfig::default();
        config.health = health_config(1);
        let cache = Arc::new(RefusingCache::default());
        let monitor = standard_monitor(&config, cache.clone());

        let health = monitor.check_system_health().await;
        let result = health.component("cache_service").unwrap();

        assert_eq!(result.status, HealthStatus::Unhealthy);
        assert_eq!(monitor.breakers().failure_count("cache_service"), 1);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 1);
        assert_eq!(health.overall, HealthStatus::Unhealthy);
        assert_eq!(
            health.component("database").unwrap().status,
            HealthStatus::Healthy
        );

        let again = monitor.check_component("cache_service").await.unwrap();
        assert_eq!(again.status, HealthStatus::Unhealthy);
        assert_eq!(again.error.as_deref(), Some("circuit breaker open"));
        assert_eq!(cache.calls.load(Ordering::SeqCst), 1);

        let states = monitor.circuit_breaker_states();
        assert_eq!(states["cache_service"].state, CircuitState::Open);
    }

    #[tokio::test]
    async fn test_failure_below_threshold_is_served_from_cache() {
        let config = AppConfig::default();
        let cache = Arc::new(RefusingCache::default());
        let monitor = standard_monitor(&config, cache.clone());

        let first = monitor.check_component("cache_service").await.unwrap();
        let second = monitor.check_component("cache_service").await.unwrap();

        assert_eq!(first, second);
        assert_eq!(cache.calls.load(Ordering::SeqCst), 1);
        assert_eq!(monitor.breakers().failure_count("cache_service"), 1);
    }

    #[tokio::test]
    async fn test_reset_allows_real_probe_again() {
        let mut config = AppConfig::default();
        config.health = health_config(1);
        let cache = Arc::new(RefusingCache::default());
        let monitor = standard_monitor(&config, cache.clone());

        monitor.check_component("cache_service").await;
        assert!(monitor.breakers().is_open("cache_service"));

        monitor.reset();
        assert!(monitor.circuit_breaker_states().is_empty());

        let result = monitor.check_component("cache_service").await.unwrap();
        assert_ne!(result.error.as_deref(), Some("circuit breaker open"));
        assert_eq!(cache.calls.load(Ordering::SeqCst), 2);
    }

    #[tokio::test]
    async fn test_unknown_component() {
        let monitor = standard_monitor(&AppConfig::default(), Arc::new(RefusingCache::default()));
        assert!(monitor.check_component("mainframe").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_every_standard_component_is_bounded_by_deadline() {
        let mut config = AppConfig::default();
        config.health.probe_timeout_ms = 250;
        let hanging = Arc::new(Hanging::default());
        let monitor = HealthMonitor::from_config(
            &config,
            MonitorDependencies {
                database: hanging.clone(),
                cache_service: Some(hanging.clone() as Arc<dyn CacheServiceClient>),
                external_services: vec![hanging.clone() as Arc<dyn ExternalServiceCheck>],
                resources: hanging.clone(),
                queue: hanging.clone(),
                object_storage: hanging.clone(),
            },
        );

        let started = tokio::time::Instant::now();
        let health = monitor.check_system_health().await;

        assert!(started.elapsed() < Duration::from_secs(1));
        assert_eq!(health.components.len(), 6);
        for component in &health.components {
            assert_eq!(component.status, HealthStatus::Unhealthy, "{}", component.component);
            assert_eq!(
                component.error.as_deref(),
                Some("probe timed out after 250ms"),
                "{}",
                component.component
            );
        }
        assert_eq!(hanging.calls.load(Ordering::SeqCst), 6);
        assert_eq!(health.overall, HealthStatus::Unhealthy);
    }
}
