use std::sync::Arc;

use tokio::time::Instant;

use crate::error::ProbeError;
use crate::health::probe::HealthProbe;
use crate::health::types::{ComponentDetails, HealthCheckResult};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketSummary {
    pub name: String,
    pub object_count: u64,
}

#[async_trait::async_trait]
pub trait ObjectStorageClient: Send + Sync {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, ProbeError>;
}

pub struct ObjectStorageProbe {
    client: Arc<dyn ObjectStorageClient>,
    degraded_above_ms: u64,
}

impl ObjectStorageProbe {
    pub const NAME: &'static str = "object_storage";

    pub fn new(client: Arc<dyn ObjectStorageClient>, degraded_above_ms: u64) -> Self {
        Self {
            client,
            degraded_above_ms,
        }
    }
}

#[async_trait::async_trait]
impl HealthProbe for ObjectStorageProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
        let start = Instant::now();
        let buckets = self.client.list_buckets().await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        Ok(
            HealthCheckResult::from_latency(Self::NAME, latency_ms, self.degraded_above_ms)
                .with_details(ComponentDetails::ObjectStorage {
                    bucket_count: buckets.len(),
                    object_count: buckets.iter().map(|b| b.object_count).sum(),
                }),
        )
    }
}
