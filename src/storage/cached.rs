use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use moka::future::Cache;

use crate::storage::{BackendResult, KvBackend};

/// Read-through cache over another backend.
///
/// Only the whole-table read (`hash_get_all`) is cached, with a short TTL,
/// for deployments where the aggregate endpoints see far more traffic than
/// tracking does. Single-field reads stay authoritative and writes
/// invalidate the cached table. Stale reads within the TTL are acceptable:
/// the counters are approximate analytics, not a ledger.
pub struct CachedBackend {
    /// Underlying backend implementation
    inner: Arc<dyn KvBackend>,
    /// Cached full-hash snapshots keyed by backend key (Moka cache)
    table_cache: Cache<String, HashMap<String, String>>,
}

impl CachedBackend {
    pub fn new(inner: Arc<dyn KvBackend>, ttl_secs: u64) -> Self {
        let table_cache = Cache::builder()
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        Self { inner, table_cache }
    }
}

#[async_trait]
impl KvBackend for CachedBackend {
    async fn hash_incr_by(&self, key: &str, field: &str, by: i64) -> BackendResult<i64> {
        let value = self.inner.hash_incr_by(key, field, by).await?;

        // The cached snapshot is stale now; drop it so local reads converge
        // faster than the TTL would allow.
        self.table_cache.invalidate(key).await;

        Ok(value)
    }

    async fn hash_get(&self, key: &str, field: &str) -> BackendResult<Option<String>> {
        self.inner.hash_get(key, field).await
    }

    async fn hash_get_all(&self, key: &str) -> BackendResult<HashMap<String, String>> {
        if let Some(cached) = self.table_cache.get(key).await {
            return Ok(cached);
        }

        // Cache miss - fetch from the underlying backend
        let fields = self.inner.hash_get_all(key).await?;

        self.table_cache
            .insert(key.to_string(), fields.clone())
            .await;

        Ok(fields)
    }

    async fn delete(&self, key: &str) -> BackendResult<i64> {
        let removed = self.inner.delete(key).await?;

        self.table_cache.invalidate(key).await;

        Ok(removed)
    }

    async fn ping(&self) -> BackendResult<()> {
        self.inner.ping().await
    }
}
