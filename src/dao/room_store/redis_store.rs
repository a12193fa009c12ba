use std::time::Duration;

use futures::future::BoxFuture;
use redis::{AsyncCommands, aio::MultiplexedConnection};

use crate::dao::{
    room_store::RoomStore,
    storage::{StorageError, StorageResult},
};

const REDIS_URL_ENV: &str = "REDIS_URL";

/// Runtime configuration describing how to reach Redis.
#[derive(Debug, Clone)]
pub struct RedisConfig {
    /// `redis://` connection URL.
    pub url: String,
}

impl RedisConfig {
    /// Read the connection URL from `REDIS_URL`, if set and non-empty.
    pub fn from_env() -> Option<Self> {
        std::env::var(REDIS_URL_ENV)
            .ok()
            .filter(|url| !url.trim().is_empty())
            .map(|url| Self { url })
    }
}

/// Redis-backed [`RoomStore`] sharing a single multiplexed connection.
#[derive(Clone)]
pub struct RedisRoomStore {
    connection: MultiplexedConnection,
}

impl RedisRoomStore {
    /// Open a client and establish the multiplexed connection, failing fast when Redis is down.
    pub async fn connect(config: &RedisConfig) -> StorageResult<Self> {
        let client = redis::Client::open(config.url.as_str()).map_err(|source| {
            StorageError::unavailable(format!("invalid redis url `{}`", config.url), source)
        })?;
        let connection = client
            .get_multiplexed_async_connection()
            .await
            .map_err(|source| StorageError::unavailable("failed to connect to redis".into(), source))?;

        let store = Self { connection };
        store.health_check().await?;
        Ok(store)
    }
}

impl RoomStore for RedisRoomStore {
    fn get(&self, key: &str) -> BoxFuture<'static, StorageResult<Option<String>>> {
        let mut connection = self.connection.clone();
        let key = key.to_string();
        Box::pin(async move {
            connection
                .get::<_, Option<String>>(&key)
                .await
                .map_err(|source| StorageError::unavailable(format!("redis GET `{key}` failed"), source))
        })
    }

    fn set(&self, key: &str, value: String, ttl: Duration) -> BoxFuture<'static, StorageResult<()>> {
        let mut connection = self.connection.clone();
        let key = key.to_string();
        // Redis rejects a zero expiry.
        let seconds = ttl.as_secs().max(1);
        Box::pin(async move {
            connection
                .set_ex::<_, _, ()>(&key, value, seconds)
                .await
                .map_err(|source| StorageError::unavailable(format!("redis SET `{key}` failed"), source))
        })
    }

    fn delete(&self, key: &str) -> BoxFuture<'static, StorageResult<()>> {
        let mut connection = self.connection.clone();
        let key = key.to_string();
        Box::pin(async move {
            connection
                .del::<_, ()>(&key)
                .await
                .map_err(|source| StorageError::unavailable(format!("redis DEL `{key}` failed"), source))
        })
    }

    fn health_check(&self) -> BoxFuture<'static, StorageResult<()>> {
        let mut connection = self.connection.clone();
        Box::pin(async move {
            let _pong: String = redis::cmd("PING")
                .query_async(&mut connection)
                .await
                .map_err(|source| StorageError::unavailable("redis PING failed".into(), source))?;
            Ok(())
        })
    }
}
