use std::collections::BTreeMap;
use std::sync::Arc;

use futures_util::future::join_all;
use tokio::time::Instant;

use crate::error::ProbeError;
use crate::health::probe::HealthProbe;
use crate::health::types::{ComponentDetails, HealthCheckResult};

/// One third-party dependency: passes when it is configured (and reachable,
/// where the implementation can tell).
#[async_trait::async_trait]
pub trait ExternalServiceCheck: Send + Sync {
    fn name(&self) -> &str;

    async fn check(&self) -> bool;
}

pub struct ExternalServicesProbe {
    services: Vec<Arc<dyn ExternalServiceCheck>>,
}

impl ExternalServicesProbe {
    pub const NAME: &'static str = "external_services";

    pub fn new(services: Vec<Arc<dyn ExternalServiceCheck>>) -> Self {
        Self { services }
    }
}

#[async_trait::async_trait]
impl HealthProbe for ExternalServicesProbe {
    fn name(&self) -> &str {
        Self::NAME
    }

    async fn probe(&self) -> Result<HealthCheckResult, ProbeError> {
        if self.services.is_empty() {
            return Err(ProbeError::Configuration(
                "no external services configured".to_string(),
            ));
        }

        let start = Instant::now();
        let outcomes = join_all(self.services.iter().map(|service| service.check())).await;
        let latency_ms = start.elapsed().as_millis() as u64;

        let checked: Vec<(&str, bool)> = self
            .services
            .iter()
            .map(|service| service.name())
            .zip(outcomes)
            .collect();

        let total = checked.len();
        let passed = checked.iter().filter(|(_, passed)| *passed).count();
        let success_rate = format!("{}/{}", passed, total);

        let result = if passed == total {
            HealthCheckResult::healthy(Self::NAME)
        } else if passed == 0 {
            HealthCheckResult::unhealthy(Self::NAME, "all external services unavailable")
        } else {
            let failing: Vec<&str> = checked
                .iter()
                .filter(|(_, passed)| !*passed)
                .map(|(name, _)| *name)
                .collect();
            HealthCheckResult::degraded(Self::NAME)
                .with_error(format!("unavailable: {}", failing.join(", ")))
        };

        // A name that appears twice is reported as passing only if every
        // check under that name passed.
        let mut services: BTreeMap<String, bool> = BTreeMap::new();
        for (name, passed) in &checked {
            services
                .entry(name.to_string())
                .and_modify(|all| *all &= *passed)
                .or_insert(*passed);
        }

        Ok(result
            .with_latency(latency_ms)
            .with_details(ComponentDetails::ExternalServices {
                services,
                success_rate,
            }))
    }
}
