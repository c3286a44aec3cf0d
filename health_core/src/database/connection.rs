use sqlx::{sqlite::SqlitePoolOptions, Row, SqlitePool};
use std::time::Duration;
use tracing::{error, info};

use crate::config::DatabaseConfig;
use crate::error::{AppError, ProbeError, Result};
use crate::health::probes::{DatabasePing, PoolSnapshot};

#[derive(Clone)]
pub struct DatabaseManager {
    pool: SqlitePool,
    max_connections: u32,
}

impl DatabaseManager {
    pub fn new(pool: SqlitePool, max_connections: u32) -> Self {
        Self {
            pool,
            max_connections,
        }
    }

    pub fn pool(&self) -> &SqlitePool {
        &self.pool
    }

    pub async fn health_check(&self) -> Result<()> {
        let row = sqlx::query("SELECT 1 as test")
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                error!("Database health check failed: {}", e);
                AppError::from(e)
            })?;

        let test_value: i32 = row.try_get("test").map_err(AppError::from)?;

        if test_value == 1 {
            Ok(())
        } else {
            Err(AppError::Database(format!(
                "unexpected health check value: {}",
                test_value
            )))
        }
    }

    pub fn pool_snapshot(&self) -> PoolSnapshot {
        PoolSnapshot {
            size: self.pool.size(),
            idle: self.pool.num_idle() as u32,
            max_connections: self.max_connections,
        }
    }
}

#[async_trait::async_trait]
impl DatabasePing for DatabaseManager {
    async fn ping(&self) -> std::result::Result<PoolSnapshot, ProbeError> {
        self.health_check()
            .await
            .map_err(|e| ProbeError::Connectivity(e.to_string()))?;
        Ok(self.pool_snapshot())
    }
}

/// Builds a lazily-connecting pool so an unreachable database surfaces as a
/// failing probe instead of a startup error.
pub fn connect_lazy(config: &DatabaseConfig) -> Result<DatabaseManager> {
    info!("Configuring database pool: {}", config.url);

    let pool = SqlitePoolOptions::new()
        .max_connections(config.max_connections)
        .acquire_timeout(Duration::from_secs(config.connection_timeout_seconds))
        .idle_timeout(Duration::from_secs(300))
        .test_before_acquire(true)
        .connect_lazy(&config.url)
        .map_err(|e| {
            error!("Invalid database configuration: {}", e);
            AppError::from(e)
        })?;

    Ok(DatabaseManager::new(pool, config.max_connections))
}
