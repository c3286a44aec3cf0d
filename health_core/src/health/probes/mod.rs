//! One probe per monitored dependency.
//!
//! Each probe talks to its dependency through a small trait so the real
//! clients (sqlx, redis, sysinfo, the filesystem store) can be swapped for
//! stubs.

pub mod cache_service;
pub mod database;
pub mod external;
pub mod queue;
pub mod storage;
pub mod system;

pub use cache_service::{CacheServiceClient, CacheServiceInfo, CacheServiceProbe};
pub use database::{DatabasePing, DatabaseProbe, PoolSnapshot};
pub use external::{ExternalServiceCheck, ExternalServicesProbe};
pub use queue::{QueueProbe, QueueStatusSource, WorkerStatus};
pub use storage::{BucketSummary, ObjectStorageClient, ObjectStorageProbe};
pub use system::{ResourceSampler, ResourceSnapshot, SystemResourcesProbe};
