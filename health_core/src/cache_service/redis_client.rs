use std::sync::Arc;

use redis::aio::MultiplexedConnection;
use redis::Client;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

use crate::error::{AppError, ProbeError, Result};
use crate::health::probes::{CacheServiceClient, CacheServiceInfo};

/// Redis-backed cache service client used by the `cache_service` probe.
///
/// Keeps one multiplexed connection for PING and INFO. A command error drops
/// it so the next probe reconnects.
#[derive(Clone)]
pub struct RedisCacheClient {
    client: Client,
    connection: Arc<Mutex<Option<MultiplexedConnection>>>,
}

impl RedisCacheClient {
    pub fn open(url: &str) -> Result<Self> {
        let client = Client::open(url).map_err(|e| {
            AppError::Configuration(format!("invalid cache service URL: {}", e))
        })?;

        info!("Cache service client configured");
        Ok(Self {
            client,
            connection: Arc::new(Mutex::new(None)),
        })
    }

    async fn connection(&self) -> std::result::Result<MultiplexedConnection, ProbeError> {
        let mut slot = self.connection.lock().await;
        if let Some(conn) = slot.as_ref() {
            return Ok(conn.clone());
        }

        let conn = self.client.get_multiplexed_async_connection().await?;
        debug!("Opened cache service connection");
        *slot = Some(conn.clone());
        Ok(conn)
    }

    async fn discard_connection(&self) {
        self.connection.lock().await.take();
    }

    async fn query<T: redis::FromRedisValue + Send>(
        &self,
        command: &str,
    ) -> std::result::Result<T, ProbeError> {
        let mut conn = self.connection().await?;
        match redis::cmd(command).query_async(&mut conn).await {
            Ok(value) => Ok(value),
            Err(e) => {
                warn!("Cache service {} failed, dropping connection: {}", command, e);
                self.discard_connection().await;
                Err(e.into())
            }
        }
    }
}

#[async_trait::async_trait]
impl CacheServiceClient for RedisCacheClient {
    async fn connect(&self) -> std::result::Result<(), ProbeError> {
        self.connection().await.map(|_| ())
    }

    async fn ping(&self) -> std::result::Result<(), ProbeError> {
        let reply: String = self.query("PING").await?;

        if reply.eq_ignore_ascii_case("PONG") {
            Ok(())
        } else {
            Err(ProbeError::connectivity(format!(
                "unexpected PING reply: {}",
                reply
            )))
        }
    }

    async fn info(&self) -> std::result::Result<CacheServiceInfo, ProbeError> {
        let raw: String = self.query("INFO").await?;
        debug!("Read {} bytes of INFO output", raw.len());
        Ok(parse_info(&raw))
    }
}

/// Extracts memory usage and server version from `INFO` output.
pub fn parse_info(raw: &str) -> CacheServiceInfo {
    let mut info = CacheServiceInfo::default();

    for line in raw.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };

        match key {
            "used_memory" => info.used_memory_bytes = value.parse().ok(),
            "used_memory_human" => info.used_memory_human = Some(value.to_string()),
            "redis_version" => info.version = Some(value.to_string()),
            _ => {}
        }
    }

    info
}
