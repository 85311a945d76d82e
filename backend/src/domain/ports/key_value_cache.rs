//! Driven port for the shared byte cache.

use std::time::Duration;

use async_trait::async_trait;

use super::define_port_error;

define_port_error! {
    /// Errors surfaced by the cache backend.
    pub enum CacheError {
        /// The backend could not be reached.
        Connection { message: String } => "cache utilgjengelig: {message}",
        /// The backend rejected the command.
        Command { message: String } => "cache-kommando feilet: {message}",
    }
}

/// Port for a key-value store with expiry.
///
/// Callers treat every error as a cache miss.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait KeyValueCache: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Vec<u8>>, CacheError>;

    async fn set(&self, key: &str, value: Vec<u8>, ttl: Duration) -> Result<(), CacheError>;

    async fn delete(&self, key: &str) -> Result<(), CacheError>;
}
