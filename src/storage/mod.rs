pub mod cached;
pub mod memory;
pub mod redis;
pub mod trait_def;

pub use cached::CachedBackend;
pub use memory::MemoryBackend;
// self:: because the module shares its name with the redis crate
pub use self::redis::RedisBackend;
pub use trait_def::{BackendError, BackendResult, KvBackend};
