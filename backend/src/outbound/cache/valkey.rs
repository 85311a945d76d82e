//! Valkey/Redis cache over a `bb8-redis` connection pool.

use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::RedisConnectionManager;
use bb8_redis::bb8::Pool;
use bb8_redis::redis::AsyncCommands;

use crate::domain::ports::{CacheError, KeyValueCache};

/// Pool settings for the cache connection.
///
/// # Example
///
/// ```ignore
/// let config = RedisCacheConfig::new("redis://localhost:6379")
///     .with_max_size(20)
///     .with_connection_timeout(Duration::from_secs(1));
/// ```
#[derive(Debug, Clone)]
pub struct RedisCacheConfig {
    url: String,
    max_size: u32,
    connection_timeout: Duration,
}

impl RedisCacheConfig {
    /// Defaults: 10 connections, 2 second checkout timeout.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            max_size: 10,
            connection_timeout: Duration::from_secs(2),
        }
    }

    #[must_use]
    pub fn with_max_size(mut self, max_size: u32) -> Self {
        self.max_size = max_size;
        self
    }

    #[must_use]
    pub fn with_connection_timeout(mut self, timeout: Duration) -> Self {
        self.connection_timeout = timeout;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }
}

/// [`KeyValueCache`] backed by Valkey.
#[derive(Clone)]
pub struct RedisCache {
    pool: Pool<RedisConnectionManager>,
}

impl RedisCache {
    /// Build the pool. Connections are opened lazily.
    ///
    /// # Errors
    ///
    /// Returns `CacheError::Connection` when the URL is invalid.
    pub fn new(config: &RedisCacheConfig) -> Result<Self, CacheError> {
        let manager = RedisConnectionManager::new(config.url.as_str())
            .map_err(|err| CacheError::connection(err.to_string()))?;
        let pool = Pool::builder()
            .max_size(config.max_size)
            .connection_timeout(config.connection_timeout)
            .build_unchecked(manager);
        Ok(Self { pool })
    }
}

#[async_trait]
impl KeyValueCache for RedisCache {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::connection(err.to_string()))?;
        conn.get::<_, Option<Vec<u8>>>(key)
            .await
            .map_err(|err| CacheError::command(err.to_string()))
    }

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::connection(err.to_string()))?;
        conn.set_ex::<_, _, ()>(key, value, ttl_seconds(ttl))
            .await
            .map_err(|err| CacheError::command(err.to_string()))
    }

    async fn delete(&self, key: &str) -> Result<(), CacheError> {
        let mut conn = self
            .pool
            .get()
            .await
            .map_err(|err| CacheError::connection(err.to_string()))?;
        conn.del::<_, ()>(key)
            .await
            .map_err(|err| CacheError::command(err.to_string()))
    }
}

/// `SET EX` rejects zero.
fn ttl_seconds(ttl: Duration) -> u64 {
    ttl.as_secs().max(1)
}
