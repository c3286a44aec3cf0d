//! Health monitoring core: guarded dependency probes, their aggregation and
//! the HTTP surface that exposes them.

pub mod cache_service;
pub mod config;
pub mod database;
pub mod error;
pub mod external;
pub mod handlers;
pub mod health;
pub mod middleware;
pub mod models;
pub mod monitoring;
pub mod queue;
pub mod storage;

pub use cache_service::RedisCacheClient;
pub use config::AppConfig;
pub use database::{connect_lazy, DatabaseManager};
pub use error::{AppError, ProbeError, Result};
pub use external::{checks_from_config, ConfiguredServiceCheck};
pub use handlers::routes::create_routes;
pub use handlers::{system_health_response, HealthResponseBody};
pub use health::{
    CircuitBreakerRegistry, CircuitBreakerState, CircuitState, HealthCheckResult, HealthMonitor,
    HealthStatus, MonitorDependencies, ResultCache, SystemHealth,
};
pub use monitoring::SysinfoSampler;
pub use queue::WorkerRegistry;
pub use storage::FilesystemObjectStore;

use axum::Router;
use std::{net::SocketAddr, sync::Arc};
use tokio::signal;
use tracing::{error, info};

#[derive(Clone)]
pub struct AppState {
    pub app_name: String,
    pub version: String,
    pub monitor: Arc<HealthMonitor>,
    pub workers: Arc<WorkerRegistry>,
}

impl AppState {
    pub fn new(monitor: Arc<HealthMonitor>, workers: Arc<WorkerRegistry>) -> Self {
        Self {
            app_name: "Health Server".to_string(),
            version: monitor.version().to_string(),
            monitor,
            workers,
        }
    }
}

pub fn create_app(state: AppState) -> Router {
    middleware::with_request_logging(create_routes()).with_state(state)
}

pub async fn run_server(app: Router, addr: SocketAddr) -> Result<()> {
    info!("Starting server on {}", addr);

    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    Ok(())
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(e) => {
                error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, starting graceful shutdown");
        },
        _ = terminate => {
            info!("Received SIGTERM, starting graceful shutdown");
        },
    }
}
