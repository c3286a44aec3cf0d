use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use health_core::health::probes::{
    CacheServiceClient, CacheServiceInfo, DatabasePing, ExternalServiceCheck, PoolSnapshot,
    ResourceSampler, ResourceSnapshot,
};
use health_core::{
    create_app, AppConfig, AppState, FilesystemObjectStore, HealthMonitor, MonitorDependencies,
    ProbeError, WorkerRegistry,
};
use serde_json::Value;
use tempfile::TempDir;
use tower::ServiceExt;

struct StubDatabase;

#[async_trait::async_trait]
impl DatabasePing for StubDatabase {
    async fn ping(&self) -> Result<PoolSnapshot, ProbeError> {
        Ok(PoolSnapshot {
            size: 2,
            idle: 1,
            max_connections: 5,
        })
    }
}

/// Cache service whose availability can be flipped mid-test.
#[derive(Default)]
struct SwitchableCache {
    down: AtomicBool,
    pings: AtomicUsize,
}

#[async_trait::async_trait]
impl CacheServiceClient for SwitchableCache {
    async fn ping(&self) -> Result<(), ProbeError> {
        self.pings.fetch_add(1, Ordering::SeqCst);
        if self.down.load(Ordering::SeqCst) {
            Err(ProbeError::connectivity("Connection refused (os error 111)"))
        } else {
            Ok(())
        }
    }

    async fn info(&self) -> Result<CacheServiceInfo, ProbeError> {
        Ok(CacheServiceInfo {
            used_memory_bytes: Some(1024),
            used_memory_human: Some("1.00K".to_string()),
            version: Some("7.2.4".to_string()),
        })
    }
}

struct StubService(&'static str);

#[async_trait::async_trait]
impl ExternalServiceCheck for StubService {
    fn name(&self) -> &str {
        self.0
    }

    async fn check(&self) -> bool {
        true
    }
}

struct StubSampler;

#[async_trait::async_trait]
impl ResourceSampler for StubSampler {
    async fn sample(&self) -> Result<ResourceSnapshot, ProbeError> {
        Ok(ResourceSnapshot {
            memory_used_bytes: 100,
            memory_total_bytes: 1000,
            cpu_usage_percent: 3.5,
            uptime_seconds: 12,
        })
    }
}

struct TestApp {
    router: Router,
    cache: Arc<SwitchableCache>,
    workers: Arc<WorkerRegistry>,
    _storage: TempDir,
}

fn test_app() -> TestApp {
    let storage = TempDir::new().unwrap();
    std::fs::create_dir(storage.path().join("uploads")).unwrap();
    std::fs::write(storage.path().join("uploads/report.csv"), b"a,b").unwrap();

    let mut config = AppConfig::default();
    config.health.failure_threshold = 1;

    let cache = Arc::new(SwitchableCache::default());
    let workers = Arc::new(WorkerRegistry::default());
    workers.heartbeat("worker-1", "default", 0);

    let monitor = HealthMonitor::from_config(
        &config,
        MonitorDependencies {
            database: Arc::new(StubDatabase),
            cache_service: Some(cache.clone() as Arc<dyn CacheServiceClient>),
            external_services: vec![
                Arc::new(StubService("email")) as Arc<dyn ExternalServiceCheck>,
                Arc::new(StubService("payment")) as Arc<dyn ExternalServiceCheck>,
            ],
            resources: Arc::new(StubSampler),
            queue: workers.clone(),
            object_storage: Arc::new(FilesystemObjectStore::new(storage.path())),
        },
    );

    let state = AppState::new(Arc::new(monitor), workers.clone());

    TestApp {
        router: create_app(state),
        cache,
        workers,
        _storage: storage,
    }
}

async fn send(router: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let mut builder = Request::builder().method(method).uri(uri);
    let body = match body {
        Some(json) => {
            builder = builder.header("content-type", "application/json");
            Body::from(json.to_string())
        }
        None => Body::empty(),
    };

    let response = router
        .clone()
        .oneshot(builder.body(body).unwrap())
        .await
        .unwrap();

    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };

    (status, json)
}

#[tokio::test]
async fn test_healthy_system_reports_every_component_in_order() {
    let app = test_app();

    let (status, body) = send(&app.router, "GET", "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["overall"], "healthy");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));

    let names: Vec<&str> = body["components"]
        .as_array()
        .unwrap()
        .iter()
        .map(|c| c["component"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        vec![
            "database",
            "cache_service",
            "external_services",
            "system_resources",
            "queue",
            "object_storage"
        ]
    );

    let storage = &body["components"][5];
    assert_eq!(storage["details"]["bucket_count"], 1);
    assert_eq!(storage["details"]["object_count"], 1);
}

#[tokio::test]
async fn test_failing_dependency_returns_503_and_opens_breaker() {
    let app = test_app();
    app.cache.down.store(true, Ordering::SeqCst);

    let (status, body) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["overall"], "unhealthy");
    assert_eq!(body["components"][1]["status"], "unhealthy");
    assert_eq!(body["components"][0]["status"], "healthy");

    let (status, body) = send(&app.router, "GET", "/health/circuit-breakers", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cache_service"]["state"], "open");
    assert_eq!(body["data"]["cache_service"]["failures"], 1);

    let (status, _) = send(&app.router, "GET", "/ready", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = send(&app.router, "GET", "/live", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_reset_clears_breakers_and_cached_results() {
    let app = test_app();
    app.cache.down.store(true, Ordering::SeqCst);

    let (status, _) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    // Breaker is open: the dependency is not called again.
    let (_, body) = send(&app.router, "GET", "/health/cache_service", None).await;
    assert_eq!(body["data"]["error"], "circuit breaker open");
    assert_eq!(app.cache.pings.load(Ordering::SeqCst), 1);

    app.cache.down.store(false, Ordering::SeqCst);
    let (status, body) = send(&app.router, "POST", "/health/circuit-breakers/reset", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(body, Value::Null);

    let (_, body) = send(&app.router, "GET", "/health/circuit-breakers", None).await;
    assert_eq!(body["data"], serde_json::json!({}));

    let (status, body) = send(&app.router, "GET", "/health", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["components"][1]["status"], "healthy");
    assert_eq!(app.cache.pings.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_component_route() {
    let app = test_app();

    let (status, body) = send(&app.router, "GET", "/health/database", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["component"], "database");
    assert_eq!(body["data"]["details"]["pool_size"], 2);

    let (status, body) = send(&app.router, "GET", "/health/mainframe", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["status"], 404);
}

#[tokio::test]
async fn test_queue_heartbeat_revives_queue() {
    let app = test_app();

    let (status, _) = send(&app.router, "DELETE", "/queue/workers/worker-1", None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert!(app.workers.is_empty());

    let (status, body) = send(&app.router, "GET", "/health/queue", None).await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["data"]["error"], "no queue workers registered");

    let (status, body) = send(
        &app.router,
        "POST",
        "/queue/heartbeat",
        Some(serde_json::json!({"worker_id": "worker-2", "queue": "emails", "pending_jobs": 4})),
    )
    .await;
    assert_eq!(status, StatusCode::ACCEPTED);
    assert_eq!(body["data"]["registered_workers"], 1);

    send(&app.router, "POST", "/health/circuit-breakers/reset", None).await;

    let (status, body) = send(&app.router, "GET", "/health/queue", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["status"], "healthy");
    assert_eq!(body["data"]["details"]["active_workers"], 1);
    assert_eq!(body["data"]["details"]["pending_jobs"], 4);
}

#[tokio::test]
async fn test_invalid_heartbeat_rejected() {
    let app = test_app();

    let (status, body) = send(
        &app.router,
        "POST",
        "/queue/heartbeat",
        Some(serde_json::json!({"worker_id": "  ", "queue": "emails"})),
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "worker_id cannot be empty");
    assert_eq!(app.workers.len(), 1);
}

#[tokio::test]
async fn test_root_lists_components() {
    let app = test_app();

    let (status, body) = send(&app.router, "GET", "/", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["components"].as_array().unwrap().len(), 6);
}

#[tokio::test]
async fn test_deregister_unknown_worker_is_404() {
    let app = test_app();

    let (status, body) = send(&app.router, "DELETE", "/queue/workers/ghost", None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "Worker 'ghost' not found");
    assert_eq!(app.workers.len(), 1);
}
