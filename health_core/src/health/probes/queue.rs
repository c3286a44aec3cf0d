use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use crate::error::ProbeError;
use crate::health::probe::HealthProbe;
use crate::health::types::{ComponentDetails, HealthCheckResult, QueueStats};

#[derive(Debug, Clone, PartialEq)]
pub struct WorkerStatus {
    pub worker_id: String,
    pub queue: String,
    pub pending_jobs: u64,
    pub since_last_heartbeat: Duration,
}

#[async_trait::async_trait]
pub trait QueueStatusSource: Send + Sync {
    async fn workers(&self) -> Vec<WorkerStatus>;
}

/// Liveness and backlog of queue workers, judged from their heartbeats.
pub struct QueueProbe {
    source: Arc<dyn QueueStatusSource>,
    stale_after: Duration,
    max_pending_jobs: u64,
}

impl QueueProbe {
    pub const NAME: &'static str = "queue";

    pub fn new(source: Arc<dyn QueueStatusSource>, stale_after: Duration, max_pending_jobs: u64) -> Self {
        Self {
            source,
            stale_after,
            max_pending_jobs,
        }
    }
}

#[async_trait::async_trait]
impl HealthProbe for QueueProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
        let workers = self.source.workers().await;
        if workers.is_empty() {
            return Ok(HealthCheckResult::unhealthy(Self::NAME, "no queue workers registered"));
        }

        let mut queues: BTreeMap<String, QueueStats> = BTreeMap::new();
        let mut stale_workers = 0;

        for worker in &workers {
            if worker.since_last_heartbeat >= self.stale_after {
                stale_workers += 1;
                continue;
            }
            // Workers on the same queue report the same depth.
            let stats = queues.entry(worker.queue.clone()).or_insert(QueueStats {
                workers: 0,
                pending_jobs: 0,
            });
            stats.workers += 1;
            stats.pending_jobs = stats.pending_jobs.max(worker.pending_jobs);
        }

        let active_workers = workers.len() - stale_workers;
        let pending_jobs: u64 = queues.values().map(|q| q.pending_jobs).sum();

        let result = if active_workers == 0 {
            HealthCheckResult::unhealthy(
                Self::NAME,
                format!("no live queue workers ({} stale)", stale_workers),
            )
        } else if pending_jobs > self.max_pending_jobs {
            HealthCheckResult::degraded(Self::NAME).with_error(format!(
                "{} pending jobs exceeds limit of {}",
                pending_jobs, self.max_pending_jobs
            ))
        } else if stale_workers > 0 {
            HealthCheckResult::degraded(Self::NAME)
                .with_error(format!("{} stale queue workers", stale_workers))
        } else {
            HealthCheckResult::healthy(Self::NAME)
        };

        Ok(result.with_details(ComponentDetails::Queue {
            active_workers,
            stale_workers,
            pending_jobs,
            queues,
        }))
    }
}
