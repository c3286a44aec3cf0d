pub mod cache;
pub mod circuit_breaker;
pub mod monitor;
pub mod probe;
pub mod probes;
pub mod types;

#[cfg(test)]
mod tests;

pub use cache::{CacheStats, ResultCache};
pub use circuit_breaker::{CircuitBreakerConfig, CircuitBreakerRegistry, CircuitBreakerState, CircuitState};
pub use monitor::{HealthMonitor, HealthMonitorBuilder, MonitorDependencies};
pub use probe::{GuardedProbe, HealthProbe};
pub use types::{ComponentDetails, HealthCheckResult, HealthStatus, QueueStats, SystemHealth};
