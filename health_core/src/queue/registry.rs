use std::collections::HashMap;
use std::time::Duration;

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use tokio::time::Instant;
use tracing::{debug, info};

use crate::config::QueueConfig;
use crate::health::probes::{QueueStatusSource, WorkerStatus};

/// Body of `POST /queue/heartbeat`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeartbeatRequest {
    pub worker_id: String,
    pub queue: String,
    #[serde(default)]
    pub pending_jobs: u64,
}

#[derive(Debug, Clone)]
struct Heartbeat {
    queue: String,
    pending_jobs: u64,
    last_seen: Instant,
}

/// Last heartbeat of every queue worker, keyed by worker id.
///
/// Workers silent for longer than `forget_after` are dropped, so a worker
/// that died or restarted under a new id stops counting as stale.
#[derive(Debug)]
pub struct WorkerRegistry {
    workers: RwLock<HashMap<String, Heartbeat>>,
    forget_after: Duration,
}

impl Default for WorkerRegistry {
    fn default() -> Self {
        Self::new(Duration::from_secs(600))
    }
}

impl WorkerRegistry {
    pub fn new(forget_after: Duration) -> Self {
        Self {
            workers: RwLock::new(HashMap::new()),
            forget_after,
        }
    }

    pub fn from_config(config: &QueueConfig) -> Self {
        Self::new(Duration::from_secs(config.forget_after_seconds))
    }

    pub fn heartbeat(&self, worker_id: &str, queue: &str, pending_jobs: u64) {
        let mut workers = self.workers.write();
        self.forget_silent(&mut workers, Instant::now());

        let previous = workers.insert(
            worker_id.to_string(),
            Heartbeat {
                queue: queue.to_string(),
                pending_jobs,
                last_seen: Instant::now(),
            },
        );

        if previous.is_none() {
            info!("Queue worker '{}' registered on '{}'", worker_id, queue);
        } else {
            debug!("Heartbeat from '{}' ({} pending)", worker_id, pending_jobs);
        }
    }

    pub fn record(&self, request: &HeartbeatRequest) {
        self.heartbeat(&request.worker_id, &request.queue, request.pending_jobs);
    }

    pub fn deregister(&self, worker_id: &str) -> bool {
        let removed = self.workers.write().remove(worker_id).is_some();
        if removed {
            info!("Queue worker '{}' deregistered", worker_id);
        }
        removed
    }

    fn forget_silent(&self, workers: &mut HashMap<String, Heartbeat>, now: Instant) {
        workers.retain(|worker_id, beat| {
            let keep = now.saturating_duration_since(beat.last_seen) < self.forget_after;
            if !keep {
                info!("Forgetting silent queue worker '{}'", worker_id);
            }
            keep
        });
    }

    pub fn len(&self) -> usize {
        self.workers.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.workers.read().is_empty()
    }
}

#[async_trait::async_trait]
impl QueueStatusSource for WorkerRegistry {
    async fn workers(&self) -> Vec<WorkerStatus> {
        let now = Instant::now();
        let mut registered = self.workers.write();
        self.forget_silent(&mut registered, now);

        let mut workers: Vec<WorkerStatus> = registered
            .iter()
            .map(|(worker_id, beat)| WorkerStatus {
                worker_id: worker_id.clone(),
                queue: beat.queue.clone(),
                pending_jobs: beat.pending_jobs,
                since_last_heartbeat: now.saturating_duration_since(beat.last_seen),
            })
            .collect();

        workers.sort_by(|a, b| a.worker_id.cmp(&b.worker_id));
        workers
    }
}
