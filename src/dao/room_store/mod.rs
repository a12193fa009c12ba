mod memory;
#[cfg(feature = "redis-store")]
mod redis_store;

use std::time::Duration;

use futures::future::BoxFuture;

use crate::dao::storage::StorageResult;

pub use memory::MemoryRoomStore;
#[cfg(feature = "redis-store")]
pub use redis_store::{RedisConfig, RedisRoomStore};

/// Abstraction over the TTL-backed key-value store shared by every room mutator.
///
/// There are no transactions: a read-modify-write is a `get` followed by a `set`.
pub trait RoomStore: Send + Sync {
    /// Fetch the raw value stored under `key`, or `None` when absent or expired.
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>>;
    /// Store `value` under `key`, replacing any previous value and resetting its TTL.
    fn set(&self, key: &str, value: String, ttl: Duration) -> BoxFuture<'static, StorageResult<()>>;
    /// Remove `key`. Deleting an absent key is not an error.
    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Round-trip to the backend, failing when it cannot be reached.
    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>>;
}
