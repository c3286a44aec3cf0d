//! Health results, typed component details and the aggregate report

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

impl std::fmt::Display for HealthStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HealthStatus::Healthy => write!(f, "healthy"),
            HealthStatus::Degraded => write!(f, "degraded"),
            HealthStatus::Unhealthy => write!(f, "unhealthy"),
        }
    }
}

impl HealthStatus {
    /// Worst-wins fold: any unhealthy component makes the whole unhealthy,
    /// otherwise any degraded component makes it degraded.
    pub fn aggregate<'a, I>(statuses: I) -> HealthStatus
    where
        I: IntoIterator<Item = &'a HealthStatus>,
    {
        statuses
            .into_iter()
            .copied()
            .max()
            .unwrap_or(HealthStatus::Healthy)
    }

    pub fn is_operational(&self) -> bool {
        *self != HealthStatus::Unhealthy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueueStats {
    pub workers: usize,
    pub pending_jobs: u64,
}

/// Component-specific extension of a [`HealthCheckResult`].
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ComponentDetails {
    Database {
        pool_size: u32,
        idle_connections: u32,
        max_connections: u32,
    },
    CacheService {
        used_memory_bytes: Option<u64>,
        used_memory_human: Option<String>,
        version: Option<String>,
    },
    ExternalServices {
        services: BTreeMap<String, bool>,
        success_rate: String,
    },
    SystemResources {
        memory_used_bytes: u64,
        memory_total_bytes: u64,
        memory_usage_ratio: f64,
        cpu_usage_percent: f32,
        uptime_seconds: u64,
    },
    Queue {
        active_workers: usize,
        stale_workers: usize,
        pending_jobs: u64,
        queues: BTreeMap<String, QueueStats>,
    },
    ObjectStorage {
        bucket_count: usize,
        object_count: u64,
    },
    Other {
        data: serde_json::Value,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HealthCheckResult {
    pub status: HealthStatus,
    pub component: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latency_ms: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<ComponentDetails>,
    pub last_checked: DateTime<Utc>,
}

impl HealthCheckResult {
    fn new(status: HealthStatus, component: impl Into<String>) -> Self {
        Self {
            status,
            component: component.into(),
            latency_ms: None,
            error: None,
            details: None,
            last_checked: Utc::now(),
        }
    }

    pub fn healthy(component: impl Into<String>) -> Self {
        Self::new(HealthStatus::Healthy, component)
    }

    pub fn degraded(component: impl Into<String>) -> Self {
        Self::new(HealthStatus::Degraded, component)
    }

    pub fn unhealthy(component: impl Into<String>, error: impl Into<String>) -> Self {
        let mut result = Self::new(HealthStatus::Unhealthy, component);
        result.error = Some(error.into());
        result
    }

    /// Picks `Degraded` when the measured latency is above the threshold.
    pub fn from_latency(component: impl Into<String>, latency_ms: u64, degraded_above_ms: u64) -> Self {
        let result = if latency_ms > degraded_above_ms {
            Self::degraded(component)
        } else {
            Self::healthy(component)
        };
        result.with_latency(latency_ms)
    }

    pub fn with_latency(mut self, latency_ms: u64) -> Self {
        self.latency_ms = Some(latency_ms);
        self
    }

    pub fn with_error(mut self, error: impl Into<String>) -> Self {
        self.error = Some(error.into());
        self
    }

    pub fn with_details(mut self, details: ComponentDetails) -> Self {
        self.details = Some(details);
        self
    }

    pub fn is_failure(&self) -> bool {
        self.status == HealthStatus::Unhealthy
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SystemHealth {
    pub overall: HealthStatus,
    pub components: Vec<HealthCheckResult>,
    pub timestamp: DateTime<Utc>,
    pub version: String,
    pub uptime_seconds: u64,
}

impl SystemHealth {
    pub fn new(version: String, uptime_seconds: u64, components: Vec<HealthCheckResult>) -> Self {
        let overall = HealthStatus::aggregate(components.iter().map(|c| &c.status));
        Self {
            overall,
            components,
            timestamp: Utc::now(),
            version,
            uptime_seconds,
        }
    }

    pub fn is_healthy(&self) -> bool {
        self.overall == HealthStatus::Healthy
    }

    pub fn component(&self, name: &str) -> Option<&HealthCheckResult> {
        self.components.iter().find(|c| c.component == name)
    }
}
