use std::collections::HashMap;
use std::time::Duration;

use anyhow::Result;
use async_trait::async_trait;
use redis::aio::{ConnectionManager, ConnectionManagerConfig};
use redis::AsyncCommands;

use crate::config::BackendConfig;
use crate::storage::{BackendError, BackendResult, KvBackend};

/// Redis-backed key-value store.
///
/// A single `ConnectionManager` multiplexes all requests over one logical
/// connection and reconnects with bounded exponential backoff on its own.
/// Operations are never retried here: a failed HINCRBY surfaces as an error
/// instead of risking a double increment.
pub struct RedisBackend {
    conn: ConnectionManager,
}

impl RedisBackend {
    pub async fn connect(config: &BackendConfig) -> Result<Self> {
        let client = redis::Client::open(config.redis_url.as_str())?;

        let manager_config = ConnectionManagerConfig::new()
            .set_number_of_retries(config.max_retries)
            .set_connection_timeout(Duration::from_millis(config.connect_timeout_ms))
            .set_response_timeout(Duration::from_millis(config.response_timeout_ms));

        let conn = ConnectionManager::new_with_config(client, manager_config).await?;

        Ok(Self { conn })
    }
}

fn backend_err(err: redis::RedisError) -> BackendError {
    BackendError::from(anyhow::Error::new(err))
}

#[async_trait]
impl KvBackend for RedisBackend {
    async fn hash_incr_by(&self, key: &str, field: &str, by: i64) -> BackendResult<i64> {
        let mut conn = self.conn.clone();
        let value: i64 = conn.hincr(key, field, by).await.map_err(backend_err)?;
        Ok(value)
    }

    async fn hash_get(&self, key: &str, field: &str) -> BackendResult<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.hget(key, field).await.map_err(backend_err)?;
        Ok(value)
    }

    async fn hash_get_all(&self, key: &str) -> BackendResult<HashMap<String, String>> {
        let mut conn = self.conn.clone();
        let fields: HashMap<String, String> = conn.hgetall(key).await.map_err(backend_err)?;
        Ok(fields)
    }

    async fn delete(&self, key: &str) -> BackendResult<i64> {
        let mut conn = self.conn.clone();
        let removed: i64 = conn.del(key).await.map_err(backend_err)?;
        Ok(removed)
    }

    async fn ping(&self) -> BackendResult<()> {
        let mut conn = self.conn.clone();
        let _pong: String = redis::cmd("PING")
            .query_async(&mut conn)
            .await
            .map_err(backend_err)?;
        Ok(())
    }
}
