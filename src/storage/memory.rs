use std::collections::HashMap;

use async_trait::async_trait;
use dashmap::DashMap;

use crate::storage::{BackendResult, KvBackend};

/// In-process key-value backend.
///
/// Used by tests and single-node dev deployments. Counters live inside a
/// DashMap entry, so an increment mutates the hash while holding the entry's
/// shard lock and is atomic with respect to concurrent callers, matching the
/// guarantee the remote backend provides.
#[derive(Default)]
pub struct MemoryBackend {
    hashes: DashMap<String, HashMap<String, i64>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl KvBackend for MemoryBackend {
    async fn hash_incr_by(&self, key: &str, field: &str, by: i64) -> BackendResult<i64> {
        let mut hash = self.hashes.entry(key.to_string()).or_default();
        let value = hash
            .entry(field.to_string())
            .and_modify(|v| *v += by)
            .or_insert(by);
        Ok(*value)
    }

    async fn hash_get(&self, key: &str, field: &str) -> BackendResult<Option<String>> {
        Ok(self
            .hashes
            .get(key)
            .and_then(|hash| hash.get(field).map(|v| v.to_string())))
    }

    async fn hash_get_all(&self, key: &str) -> BackendResult<HashMap<String, String>> {
        Ok(self
            .hashes
            .get(key)
            .map(|hash| {
                hash.iter()
                    .map(|(field, value)| (field.clone(), value.to_string()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn delete(&self, key: &str) -> BackendResult<i64> {
        Ok(if self.hashes.remove(key).is_some() { 1 } else { 0 })
    }

    async fn ping(&self) -> BackendResult<()> {
        Ok(())
    }
}
