use std::sync::Arc;

use tokio::time::Instant;

use crate::error::ProbeError;
use crate::health::probe::HealthProbe;
use crate::health::types::{ComponentDetails, HealthCheckResult};

/// Connection-pool occupancy reported alongside a successful ping.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PoolSnapshot {
    pub size: u32,
    pub idle: u32,
    pub max_connections: u32,
}

#[async_trait::async_trait]
pub trait DatabasePing: Send + Sync {
    async fn ping(&self) -> Result<PoolSnapshot, ProbeError>;
}

pub struct DatabaseProbe {
    database: Arc<dyn DatabasePing>,
    degraded_above_ms: u64,
}

impl DatabaseProbe {
    pub const NAME: &'static str = "database";

    pub fn new(database: Arc<dyn DatabasePing>, degraded_above_ms: u64) -> Self {
        Self {
            database,
            degraded_above_ms,
        }
    }
}

#[async_trait::async_trait]
impl HealthProbe for DatabaseProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
        let start = Instant::now();
        let pool = self.database.ping().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(
            HealthCheckResult::from_latency(Self::NAME, latency_ms, self.degraded_above_ms)
                .with_details(ComponentDetails::Database {
                    pool_size: pool.size,
                    idle_connections: pool.idle,
                    max_connections: pool.max_connections,
                }),
        )
    }
}
