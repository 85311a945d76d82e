//! Shared cache adapters.
//!
//! - [`RedisCache`]: Valkey/Redis through a `bb8-redis` pool.
//! - [`DisabledCache`]: always misses; used when no cache is configured.
//!
//! The JSON helpers are what the caching decorators use. A failing cache
//! never fails the request: errors are logged and treated as a miss.

mod valkey;

pub use self::valkey::{RedisCache, RedisCacheConfig};

use std::time::Duration;

use async_trait::async_trait;
use serde::Serialize;
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use crate::domain::ports::{CacheError, KeyValueCache};

/// Cache that stores nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct DisabledCache;

#[async_trait]
impl KeyValueCache for DisabledCache {
    async fn get(&self, _key: &str) -> Result<Option<Vec<u8>>, CacheError> {
        Ok(None)
    }

    async fn set(&self, _key: &str, _value: Vec<u8>, _ttl: Duration) -> Result<(), CacheError> {
        Ok(())
    }

    async fn delete(&self, _key: &str) -> Result<(), CacheError> {
        Ok(())
    }
}

/// Namespaced key, `digisosSak::<id>`.
pub(crate) fn cache_key(namespace: &str, key: &str) -> String {
    format!("{namespace}::{key}")
}

/// Read raw bytes. Misses and backend errors both return `None`.
pub(crate) async fn get_raw(cache: &dyn KeyValueCache, key: &str) -> Option<Vec<u8>> {
    match cache.get(key).await {
        Ok(Some(bytes)) => {
            debug!(key, "cache hit");
            Some(bytes)
        }
        Ok(None) => None,
        Err(err) => {
            warn!(key, error = %err, "cache utilgjengelig ved lesing");
            None
        }
    }
}

/// Store raw bytes; failures are only logged.
pub(crate) async fn put_raw(cache: &dyn KeyValueCache, key: &str, value: Vec<u8>, ttl: Duration) {
    if let Err(err) = cache.set(key, value, ttl).await {
        warn!(key, error = %err, "cache utilgjengelig ved skriving");
    }
}

/// Read and decode a cached value. Stale formats read as a miss.
pub(crate) async fn get_json<T: DeserializeOwned>(cache: &dyn KeyValueCache, key: &str) -> Option<T> {
    let bytes = get_raw(cache, key).await?;
    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(err) => {
            warn!(key, error = %err, "kunne ikke lese verdi fra cache");
            None
        }
    }
}

/// Encode and store a value; failures are only logged.
pub(crate) async fn put_json<T: Serialize + Sync>(
    cache: &dyn KeyValueCache,
    key: &str,
    value: &T,
    ttl: Duration,
) {
    match serde_json::to_vec(value) {
        Ok(bytes) => put_raw(cache, key, bytes, ttl).await,
        Err(err) => warn!(key, error = %err, "kunne ikke serialisere verdi til cache"),
    }
}

/// Evict one key; failures are only logged.
pub(crate) async fn evict(cache: &dyn KeyValueCache, key: &str) {
    if let Err(err) = cache.delete(key).await {
        warn!(key, error = %err, "kunne ikke slette nøkkel fra cache");
    }
}
