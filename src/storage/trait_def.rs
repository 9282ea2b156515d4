use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

/// Error raised by a key-value backend.
///
/// Connectivity failures, timeouts and protocol errors all land here; the
/// original cause is retained so callers can log the full chain. Backends
/// never retry individual operations (reconnect policy lives in the client
/// connection itself), so an error here means the operation did not apply.
#[derive(Debug, Error)]
#[error("key-value backend unavailable: {source}")]
pub struct BackendError {
    #[from]
    source: anyhow::Error,
}

pub type BackendResult<T> = Result<T, BackendError>;

/// Contract required from the key-value backend collaborator.
///
/// The whole persisted state of the service is hash-typed records: one
/// top-level key mapping named fields to string-encoded values. Field
/// increments must be atomic on the backend side; callers never
/// read-modify-write.
#[async_trait]
pub trait KvBackend: Send + Sync {
    /// Atomically add `by` to a numeric hash field, creating the field at 0
    /// first if it is absent. Returns the post-increment value.
    async fn hash_incr_by(&self, key: &str, field: &str, by: i64) -> BackendResult<i64>;

    /// Read a single hash field. `None` when the field (or the whole key)
    /// does not exist.
    async fn hash_get(&self, key: &str, field: &str) -> BackendResult<Option<String>>;

    /// Read every field of a hash in one operation. An absent key reads as
    /// an empty map, not an error.
    async fn hash_get_all(&self, key: &str) -> BackendResult<HashMap<String, String>>;

    /// Remove a key entirely. Returns the number of keys removed (0 when the
    /// key was already absent, which is not an error).
    async fn delete(&self, key: &str) -> BackendResult<i64>;

    /// Liveness probe for health checks. The counter store itself never
    /// calls this.
    async fn ping(&self) -> BackendResult<()>;
}
