use std::path::{Path, PathBuf};

use tokio::fs as async_fs;
use tracing::debug;

use crate::config::ObjectStorageConfig;
use crate::error::ProbeError;
use crate::health::probes::{BucketSummary, ObjectStorageClient};

/// Object store laid out on disk: every directory directly under `root` is a
/// bucket, and every file beneath a bucket (at any depth) is an object.
#[derive(Debug, Clone)]
pub struct FilesystemObjectStore {
    root: PathBuf,
}

impl FilesystemObjectStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn from_config(config: &ObjectStorageConfig) -> Self {
        Self::new(config.root.clone())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    async fn count_objects(bucket: &Path) -> Result<u64, ProbeError> {
        let mut count = 0;
        let mut pending = vec![bucket.to_path_buf()];

        while let Some(dir) = pending.pop() {
            let mut entries = async_fs::read_dir(&dir).await?;
            while let Some(entry) = entries.next_entry().await? {
                let file_type = entry.file_type().await?;
                if file_type.is_dir() {
                    pending.push(entry.path());
                } else if file_type.is_file() {
                    count += 1;
                }
            }
        }

        Ok(count)
    }
}

#[async_trait::async_trait]
impl ObjectStorageClient for FilesystemObjectStore {
    async fn list_buckets(&self) -> Result<Vec<BucketSummary>, ProbeError> {
        let mut entries = async_fs::read_dir(&self.root).await.map_err(|e| {
            ProbeError::connectivity(format!(
                "object storage root {} unavailable: {}",
                self.root.display(),
                e
            ))
        })?;

        let mut buckets = Vec::new();
        while let Some(entry) = entries.next_entry().await? {
            if !entry.file_type().await?.is_dir() {
                continue;
            }

            let object_count = Self::count_objects(&entry.path()).await?;
            buckets.push(BucketSummary {
                name: entry.file_name().to_string_lossy().into_owned(),
                object_count,
            });
        }

        buckets.sort_by(|a, b| a.name.cmp(&b.name));
        debug!("Listed {} buckets under {}", buckets.len(), self.root.display());
        Ok(buckets)
    }
}
