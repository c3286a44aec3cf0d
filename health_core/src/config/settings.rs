use config::{Config, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AppConfig {
    pub server: ServerConfig,
    pub health: HealthConfig,
    pub thresholds: ThresholdConfig,
    pub database: DatabaseConfig,
    pub cache_service: CacheServiceConfig,
    pub object_storage: ObjectStorageConfig,
    pub external: ExternalConfig,
    pub queue: QueueConfig,
    pub resources: ResourceConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
}

/// Breaker, cache and deadline settings shared by every guarded probe.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthConfig {
    pub failure_threshold: u32,
    pub open_timeout_seconds: u64,
    pub cache_ttl_seconds: u64,
    pub cache_capacity: usize,
    pub probe_timeout_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ThresholdConfig {
    pub database_degraded_ms: u64,
    pub cache_service_degraded_ms: u64,
    pub object_storage_degraded_ms: u64,
    pub memory_degraded_ratio: f64,
    pub memory_unhealthy_ratio: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub connection_timeout_seconds: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CacheServiceConfig {
    pub url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ObjectStorageConfig {
    pub root: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalConfig {
    pub services: Vec<ExternalServiceConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExternalServiceConfig {
    pub name: String,
    pub required_settings: Vec<String>,
    pub status_url: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueConfig {
    pub stale_after_seconds: u64,
    pub forget_after_seconds: u64,
    pub max_pending_jobs: u64,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ResourceConfig {
    pub memory_budget_bytes: Option<u64>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for HealthConfig {
    fn default() -> Self {
        Self {
            failure_threshold: 5,
            open_timeout_seconds: 60,
            cache_ttl_seconds: 30,
            cache_capacity: 64,
            probe_timeout_ms: 5000,
        }
    }
}

impl HealthConfig {
    pub fn open_timeout(&self) -> Duration {
        Duration::from_secs(self.open_timeout_seconds)
    }

    pub fn cache_ttl(&self) -> Duration {
        Duration::from_secs(self.cache_ttl_seconds)
    }

    pub fn probe_timeout(&self) -> Duration {
        Duration::from_millis(self.probe_timeout_ms)
    }
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            database_degraded_ms: 1000,
            cache_service_degraded_ms: 500,
            object_storage_degraded_ms: 2000,
            memory_degraded_ratio: 0.75,
            memory_unhealthy_ratio: 0.90,
        }
    }
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "sqlite:./data.db?mode=rwc".to_string(),
            max_connections: 5,
            connection_timeout_seconds: 5,
        }
    }
}

impl Default for ObjectStorageConfig {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
        }
    }
}

impl Default for ExternalConfig {
    fn default() -> Self {
        Self {
            services: vec![
                ExternalServiceConfig {
                    name: "email".to_string(),
                    required_settings: vec!["SMTP_API_KEY".to_string()],
                    status_url: None,
                },
                ExternalServiceConfig {
                    name: "payment".to_string(),
                    required_settings: vec!["PAYMENT_SECRET_KEY".to_string()],
                    status_url: None,
                },
                ExternalServiceConfig {
                    name: "identity".to_string(),
                    required_settings: vec![
                        "IDENTITY_CLIENT_ID".to_string(),
                        "IDENTITY_CLIENT_SECRET".to_string(),
                    ],
                    status_url: None,
                },
            ],
        }
    }
}

impl Default for QueueConfig {
    fn default() -> Self {
        Self {
            stale_after_seconds: 60,
            forget_after_seconds: 600,
            max_pending_jobs: 1000,
        }
    }
}

impl AppConfig {
    pub fn load() -> Result<Self, ConfigError> {
        let mut builder = Config::builder()
            .add_source(Config::try_from(&AppConfig::default())?);

        if std::path::Path::new("config.toml").exists() {
            builder = builder.add_source(File::with_name("config"));
        }

        builder = builder.add_source(
            Environment::with_prefix("APP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let app_config: AppConfig = config.try_deserialize()?;

        app_config.validate()?;

        Ok(app_config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.server.port == 0 {
            return Err(ConfigError::Message("Server port cannot be 0".to_string()));
        }

        if self.health.failure_threshold == 0 {
            return Err(ConfigError::Message(
                "Circuit breaker failure threshold must be greater than 0".to_string(),
            ));
        }

        if self.health.probe_timeout_ms == 0 {
            return Err(ConfigError::Message(
                "Probe timeout must be greater than 0".to_string(),
            ));
        }

        if self.health.cache_capacity == 0 {
            return Err(ConfigError::Message(
                "Result cache capacity must be greater than 0".to_string(),
            ));
        }

        let ratios = &self.thresholds;
        if !(0.0..=1.0).contains(&ratios.memory_degraded_ratio)
            || !(0.0..=1.0).contains(&ratios.memory_unhealthy_ratio)
        {
            return Err(ConfigError::Message(
                "Memory thresholds must be ratios between 0 and 1".to_string(),
            ));
        }

        if ratios.memory_degraded_ratio > ratios.memory_unhealthy_ratio {
            return Err(ConfigError::Message(
                "Memory degraded ratio cannot exceed the unhealthy ratio".to_string(),
            ));
        }

        if self.database.url.is_empty() {
            return Err(ConfigError::Message(
                "Database URL cannot be empty".to_string(),
            ));
        }

        if self.database.max_connections == 0 {
            return Err(ConfigError::Message(
                "Database max connections must be greater than 0".to_string(),
            ));
        }

        if self.external.services.iter().any(|s| s.name.trim().is_empty()) {
            return Err(ConfigError::Message(
                "External service names cannot be empty".to_string(),
            ));
        }

        let mut service_names = std::collections::HashSet::new();
        if let Some(duplicate) = self
            .external
            .services
            .iter()
            .find(|s| !service_names.insert(s.name.as_str()))
        {
            return Err(ConfigError::Message(format!(
                "Duplicate external service name '{}'",
                duplicate.name
            )));
        }

        if self.queue.forget_after_seconds <= self.queue.stale_after_seconds {
            return Err(ConfigError::Message(
                "Queue forget_after_seconds must be greater than stale_after_seconds".to_string(),
            ));
        }

        if self.cache_service.url.is_none() {
            tracing::warn!("No cache service URL configured - cache_service will report unhealthy");
        }

        Ok(())
    }

    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.server.host, self.server.port)
    }
}
