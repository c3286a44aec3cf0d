//! Main entry point for the health server binary

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Result;
use health_core::health::probes::CacheServiceClient;
use health_core::{
    checks_from_config, connect_lazy, create_app, run_server, AppConfig, AppState,
    FilesystemObjectStore, HealthMonitor, MonitorDependencies, RedisCacheClient, SysinfoSampler,
    WorkerRegistry,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    init_tracing();

    let config = AppConfig::load()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;

    info!("Configuration loaded successfully");
    info!("Server will bind to: {}", config.bind_address());

    let addr: SocketAddr = config
        .bind_address()
        .parse()
        .map_err(|e| anyhow::anyhow!("Invalid bind address: {}", e))?;

    let database = connect_lazy(&config.database)
        .map_err(|e| anyhow::anyhow!("Failed to configure database pool: {}", e))?;

    let cache_service = match &config.cache_service.url {
        Some(url) => match RedisCacheClient::open(url) {
            Ok(client) => Some(Arc::new(client) as Arc<dyn CacheServiceClient>),
            Err(e) => {
                warn!("Cache service disabled: {}", e);
                None
            }
        },
        None => None,
    };

    let external_services = checks_from_config(&config.external, config.health.probe_timeout())
        .map_err(|e| anyhow::anyhow!("Failed to configure external service checks: {}", e))?;

    if let Err(e) = tokio::fs::create_dir_all(&config.object_storage.root).await {
        warn!(
            "Could not create object storage root {}: {}",
            config.object_storage.root.display(),
            e
        );
    }

    let workers = Arc::new(WorkerRegistry::from_config(&config.queue));

    let monitor = HealthMonitor::from_config(
        &config,
        MonitorDependencies {
            database: Arc::new(database),
            cache_service,
            external_services,
            resources: Arc::new(SysinfoSampler::new(&config.resources)),
            queue: workers.clone(),
            object_storage: Arc::new(FilesystemObjectStore::from_config(&config.object_storage)),
        },
    );

    info!(
        "Monitoring components: {}",
        monitor.component_names().join(", ")
    );

    let state = AppState::new(Arc::new(monitor), workers);
    info!("App: {} v{}", state.app_name, state.version);

    let app = create_app(state);

    run_server(app, addr).await?;

    info!("Server shutdown complete");
    Ok(())
}

fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        let default_level = if cfg!(debug_assertions) {
            "debug"
        } else {
            "info"
        };

        format!(
            "{}={},health_core={},tower_http=info",
            env!("CARGO_CRATE_NAME").replace('-', "_"),
            default_level,
            default_level
        )
        .into()
    });

    let fmt_layer = fmt::layer()
        .with_target(true)
        .with_thread_ids(true)
        .with_file(true)
        .with_line_number(true);

    let is_json = std::env::var("LOG_FORMAT")
        .map(|v| v.to_lowercase() == "json")
        .unwrap_or(false);

    if is_json {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.json())
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt_layer.pretty())
            .init();
    }
}
