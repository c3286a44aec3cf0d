use std::sync::Arc;

use crate::error::ProbeError;
use crate::health::probe::HealthProbe;
use crate::health::types::{ComponentDetails, HealthCheckResult};

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ResourceSnapshot {
    pub memory_used_bytes: u64,
    pub memory_total_bytes: u64,
    pub cpu_usage_percent: f32,
    pub uptime_seconds: u64,
}

impl ResourceSnapshot {
    pub fn memory_ratio(&self) -> f64 {
        if self.memory_total_bytes == 0 {
            return 0.0;
        }
        self.memory_used_bytes as f64 / self.memory_total_bytes as f64
    }
}

#[async_trait::async_trait]
pub trait ResourceSampler: Send + Sync {
    async fn sample(&self) -> Result<ResourceSnapshot, ProbeError>;
}

pub struct SystemResourcesProbe {
    sampler: Arc<dyn ResourceSampler>,
    degraded_ratio: f64,
    unhealthy_ratio: f64,
}

impl SystemResourcesProbe {
    pub const NAME: &'static str = "system_resources";

    pub fn new(sampler: Arc<dyn ResourceSampler>, degraded_ratio: f64, unhealthy_ratio: f64) -> Self {
        Self {
            sampler,
            degraded_ratio,
            unhealthy_ratio,
        }
    }
}

#[async_trait::async_trait]
impl HealthProbe for SystemResourcesProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
        let snapshot = self.sampler.sample().await?;
        let ratio = snapshot.memory_ratio();

        let result = if ratio > self.unhealthy_ratio {
            HealthCheckResult::unhealthy(
                Self::NAME,
                format!(
                    "memory usage {:.1}% above {:.0}%",
                    ratio * 100.0,
                    self.unhealthy_ratio * 100.0
                ),
            )
        } else if ratio > self.degraded_ratio {
            HealthCheckResult::degraded(Self::NAME).with_error(format!(
                "memory usage {:.1}% above {:.0}%",
                ratio * 100.0,
                self.degraded_ratio * 100.0
            ))
        } else {
            HealthCheckResult::healthy(Self::NAME)
        };

        Ok(result.with_details(ComponentDetails::SystemResources {
            memory_used_bytes: snapshot.memory_used_bytes,
            memory_total_bytes: snapshot.memory_total_bytes,
            memory_usage_ratio: ratio,
            cpu_usage_percent: snapshot.cpu_usage_percent,
            uptime_seconds: snapshot.uptime_seconds,
        }))
    }
}
