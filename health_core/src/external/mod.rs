//! Third-party service checks built from `[external]` configuration.

use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{ExternalConfig, ExternalServiceConfig};
use crate::error::{AppError, Result};
use crate::health::probes::ExternalServiceCheck;

/// Passes when every required setting is present in the environment and,
/// if a status URL is configured, the URL answers with a success status.
pub struct ConfiguredServiceCheck {
    name: String,
    required_settings: Vec<String>,
    status_url: Option<String>,
    http: reqwest::Client,
}

impl ConfiguredServiceCheck {
    pub fn new(config: &ExternalServiceConfig, http: reqwest::Client) -> Self {
        Self {
            name: config.name.clone(),
            required_settings: config.required_settings.clone(),
            status_url: config.status_url.clone(),
            http,
        }
    }

    fn missing_settings(&self) -> Vec<&str> {
        self.required_settings
            .iter()
            .filter(|key| {
                std::env::var(key.as_str())
                    .map(|value| value.trim().is_empty())
                    .unwrap_or(true)
            })
            .map(|key| key.as_str())
            .collect()
    }

    async fn status_ok(&self, url: &str) -> bool {
        match self.http.get(url).send().await {
            Ok(response) if response.status().is_success() => true,
            Ok(response) => {
                warn!(
                    "External service '{}' status endpoint returned {}",
                    self.name,
                    response.status()
                );
                false
            }
            Err(e) => {
                warn!("External service '{}' unreachable: {}", self.name, e);
                false
            }
        }
    }
}

#[async_trait::async_trait]
impl ExternalServiceCheck for ConfiguredServiceCheck {
    fn name(&self) -> &str {
        &self.name
    }

    async fn check(&self) -> bool {
        let missing = self.missing_settings();
        if !missing.is_empty() {
            debug!(
                "External service '{}' missing settings: {}",
                self.name,
                missing.join(", ")
            );
            return false;
        }

        match &self.status_url {
            Some(url) => self.status_ok(url).await,
            None => true,
        }
    }
}

pub fn http_client(timeout: Duration) -> Result<reqwest::Client> {
    reqwest::Client::builder()
        .timeout(timeout)
        .build()
        .map_err(|e| AppError::Configuration(format!("failed to build HTTP client: {}", e)))
}

/// One check per configured service, all sharing a single HTTP client.
pub fn checks_from_config(
    config: &ExternalConfig,
    timeout: Duration,
) -> Result<Vec<Arc<dyn ExternalServiceCheck>>> {
    let http = http_client(timeout)?;

    Ok(config
        .services
        .iter()
        .map(|service| {
            Arc::new(ConfiguredServiceCheck::new(service, http.clone())) as Arc<dyn ExternalServiceCheck>
        })
        .collect())
}
