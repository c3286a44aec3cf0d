//! Process resource sampling backed by `sysinfo`

use std::sync::Arc;

use parking_lot::Mutex;
use sysinfo::{Pid, System};
use tracing::debug;

use crate::config::ResourceConfig;
use crate::error::ProbeError;
use crate::health::probes::{ResourceSampler, ResourceSnapshot};

/// Samples the current process: resident memory against a budget, cpu
/// usage and run time.
///
/// The budget is the configured `memory_budget_bytes`, or total system
/// memory when unset. Refreshes read `/proc` and run on the blocking pool.
pub struct SysinfoSampler {
    system: Arc<Mutex<System>>,
    pid: Pid,
    memory_budget_bytes: Option<u64>,
}

impl SysinfoSampler {
    pub fn new(config: &ResourceConfig) -> Self {
        let pid = Pid::from_u32(std::process::id());
        let mut system = System::new();
        system.refresh_memory();
        system.refresh_process(pid);

        Self {
            system: Arc::new(Mutex::new(system)),
            pid,
            memory_budget_bytes: config.memory_budget_bytes,
        }
    }
}

impl Default for SysinfoSampler {
    fn default() -> Self {
        Self::new(&ResourceConfig::default())
    }
}

fn sample_process(
    system: &mut System,
    pid: Pid,
    memory_budget_bytes: Option<u64>,
) -> Result<ResourceSnapshot, ProbeError> {
    system.refresh_memory();

    if !system.refresh_process(pid) {
        return Err(ProbeError::connectivity(format!(
            "process {} not visible to the resource sampler",
            pid
        )));
    }

    let process = system
        .process(pid)
        .ok_or_else(|| ProbeError::connectivity(format!("process {} disappeared", pid)))?;

    let budget = memory_budget_bytes
        .filter(|budget| *budget > 0)
        .unwrap_or_else(|| system.total_memory());

    Ok(ResourceSnapshot {
        memory_used_bytes: process.memory(),
        memory_total_bytes: budget,
        cpu_usage_percent: process.cpu_usage(),
        uptime_seconds: process.run_time(),
    })
}

#[async_trait::async_trait]
impl ResourceSampler for SysinfoSampler {
    async fn sample(&self) -> Result<ResourceSnapshot, ProbeError> {
        let system = Arc::clone(&self.system);
        let pid = self.pid;
        let budget = self.memory_budget_bytes;

        let snapshot = tokio::task::spawn_blocking(move || {
            sample_process(&mut system.lock(), pid, budget)
        })
        .await
        .map_err(|e| ProbeError::connectivity(format!("resource sampling failed: {}", e)))??;

        debug!(
            "Sampled process resources: {} / {} bytes, {:.1}% cpu",
            snapshot.memory_used_bytes, snapshot.memory_total_bytes, snapshot.cpu_usage_percent
        );

        Ok(snapshot)
    }
}
