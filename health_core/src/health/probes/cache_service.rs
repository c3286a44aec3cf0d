use std::sync::Arc;

use tokio::time::Instant;

use crate::error::ProbeError;
use crate::health::probe::HealthProbe;
use crate::health::types::{ComponentDetails, HealthCheckResult};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CacheServiceInfo {
    pub used_memory_bytes: Option<u64>,
    pub used_memory_human: Option<String>,
    pub version: Option<String>,
}

#[async_trait::async_trait]
pub trait CacheServiceClient: Send + Sync {
    /// Establishes the connection used by `ping` and `info`. Called before
    /// the PING is timed so connection setup is not counted as latency.
    async fn connect(&self) -> Result<(), ProbeError> {
        Ok(())
    }

    async fn ping(&self) -> Result<(), ProbeError>;

    async fn info(&self) -> Result<CacheServiceInfo, ProbeError>;
}

/// Pings the key-value cache service and reads its memory/version info.
///
/// Without a configured client the probe fails with a configuration error
/// rather than reporting a service it cannot see.
pub struct CacheServiceProbe {
    client: Option<Arc<dyn CacheServiceClient>>,
    degraded_above_ms: u64,
}

impl CacheServiceProbe {
    pub const NAME: &'static str = "cache_service";

    pub fn new(client: Option<Arc<dyn CacheServiceClient>>, degraded_above_ms: u64) -> Self {
        Self {
            client,
            degraded_above_ms,
        }
    }
}

#[async_trait::async_trait]
impl HealthProbe for CacheServiceProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
        let client = self.client.as_ref().ok_or_else(|| {
            ProbeError::Configuration("cache service URL not configured".to_string())
        })?;

        client.connect().await?;

        let start = Instant::now();
        client.ping().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        let info = client.info().await?;

        Ok(
            HealthCheckResult::from_latency(Self::NAME, latency_ms, self.degraded_above_ms)
                .with_details(ComponentDetails::CacheService {
                    used_memory_bytes: info.used_memory_bytes,
                    used_memory_human: info.used_memory_human,
                    version: info.version,
                }),
        )
    }
}
