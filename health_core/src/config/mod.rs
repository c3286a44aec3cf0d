pub mod settings;

pub use settings::{
    AppConfig, CacheServiceConfig, DatabaseConfig, ExternalConfig, ExternalServiceConfig,
    HealthConfig, ObjectStorageConfig, QueueConfig, ResourceConfig, ServerConfig,
    ThresholdConfig,
};
