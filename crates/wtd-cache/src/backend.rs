//! Backend seam
//!
//! A backend stores opaque string values under string keys. Three
//! implementations exist:
//! - [`crate::RedisBackend`]: networked, TTL enforced by the server
//! - [`crate::MemoryBackend`]: in-process moka cache with per-entry TTL
//! - [`crate::FallbackBackend`]: in-process map, TTL ignored
//!
//! A [`BackendConnector`] produces the primary backend; the store calls it
//! lazily and falls back when it fails.

use crate::error::CacheError;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;
use std::time::Duration;

/// Key-value backend
#[async_trait]
pub trait CacheBackend: Send + Sync + Debug {
    /// Short name used in logs
    fn name(&self) -> &'static str;

    /// Read a value; expired entries read as absent
    async fn get(&self, key: &str) -> Result<Option<String>, CacheError>;

    /// Write a value, replacing any previous one
    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError>;

    /// Remove a key; returns whether it existed
    async fn delete(&self, key: &str) -> Result<bool, CacheError>;

    /// Keys starting with `prefix`
    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError>;

    /// Remove every key starting with `prefix`; returns how many went
    async fn delete_prefix(&self, prefix: &str) -> Result<usize, CacheError> {
        let mut removed = 0;
        for key in self.keys(prefix).await? {
            if self.delete(&key).await? {
                removed += 1;
            }
        }
        Ok(removed)
    }
}

/// Produces the primary backend
#[async_trait]
pub trait BackendConnector: Send + Sync + Debug {
    /// Attempt one connection
    async fn connect(&self) -> Result<Arc<dyn CacheBackend>, CacheError>;
}
