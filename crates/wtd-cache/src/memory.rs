//! In-process backends
//!
//! [`MemoryBackend`] wraps a moka cache with per-entry expiry so each `set`
//! can carry its own TTL. [`FallbackBackend`] is the degraded-mode map: a
//! plain concurrent map that keeps entries until deleted or swept.

use crate::backend::{BackendConnector, CacheBackend};
use crate::error::CacheError;
use async_trait::async_trait;
use dashmap::DashMap;
use moka::future::Cache;
use moka::Expiry;
use std::sync::Arc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone)]
struct Entry {
    value: Arc<str>,
    ttl: Option<Duration>,
}

/// Expiry driven by the TTL stored on each entry
struct EntryTtl;

impl Expiry<String, Entry> for EntryTtl {
    fn expire_after_create(&self, _key: &String, entry: &Entry, _created_at: Instant) -> Option<Duration> {
        entry.ttl
    }

    fn expire_after_update(
        &self,
        _key: &String,
        entry: &Entry,
        _updated_at: Instant,
        _duration_until_expiry: Option<Duration>,
    ) -> Option<Duration> {
        entry.ttl
    }
}

/// In-process TTL backend
#[derive(Debug, Clone)]
pub struct MemoryBackend {
    inner: Cache<String, Entry>,
}

impl MemoryBackend {
    /// Create with max capacity
    #[inline]
    #[must_use]
    pub fn new(max_capacity: u64) -> Self {
        Self {
            inner: Cache::builder()
                .max_capacity(max_capacity)
                .expire_after(EntryTtl)
                .build(),
        }
    }

    /// Approximate entry count
    #[inline]
    #[must_use]
    pub fn entry_count(&self) -> u64 {
        self.inner.entry_count()
    }
}

#[async_trait]
impl CacheBackend for MemoryBackend {
    fn name(&self) -> &'static str {
        "memory"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.inner.get(key).await.map(|entry| entry.value.to_string()))
    }

    async fn set(&self, key: &str, value: String, ttl: Option<Duration>) -> Result<(), CacheError> {
        let entry = Entry {
            value: Arc::from(value),
            ttl,
        };
        self.inner.insert(key.to_string(), entry).await;
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.inner.remove(key).await.is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .inner
            .iter()
            .filter(|(key, _)| key.starts_with(prefix))
            .map(|(key, _)| key.as_ref().clone())
            .collect())
    }
}

/// Connector that always yields a fresh [`MemoryBackend`]
#[derive(Debug, Clone, Copy)]
pub struct MemoryConnector {
    capacity: u64,
}

impl MemoryConnector {
    #[inline]
    #[must_use]
    pub fn new(capacity: u64) -> Self {
        Self { capacity }
    }
}

#[async_trait]
impl BackendConnector for MemoryConnector {
    async fn connect(&self) -> Result<Arc<dyn CacheBackend>, CacheError> {
        Ok(Arc::new(MemoryBackend::new(self.capacity)))
    }
}

/// Degraded-mode map; TTLs are accepted and ignored
#[derive(Debug, Default)]
pub struct FallbackBackend {
    entries: DashMap<String, String>,
}

impl FallbackBackend {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[async_trait]
impl CacheBackend for FallbackBackend {
    fn name(&self) -> &'static str {
        "fallback"
    }

    async fn get(&self, key: &str) -> Result<Option<String>, CacheError> {
        Ok(self.entries.get(key).map(|value| value.clone()))
    }

    async fn set(&self, key: &str, value: String, _ttl: Option<Duration>) -> Result<(), CacheError> {
        self.entries.insert(key.to_string(), value);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<bool, CacheError> {
        Ok(self.entries.remove(key).is_some())
    }

    async fn keys(&self, prefix: &str) -> Result<Vec<String>, CacheError> {
        Ok(self
            .entries
            .iter()
            .filter(|entry| entry.key().starts_with(prefix))
            .map(|entry| entry.key().clone())
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn memory_entry_expires_after_its_ttl() {
        let backend = MemoryBackend::new(100);
        backend
            .set("k", "v".to_string(), Some(Duration::from_millis(50)))
            .await
            .unwrap();
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(backend.get("k").await.unwrap(), None);
    }

    #[tokio::test]
    async fn overwrite_takes_new_ttl() {
        let backend = MemoryBackend::new(100);
        backend
            .set("k", "old".to_string(), Some(Duration::from_millis(50)))
            .await
            .unwrap();
        backend.set("k", "new".to_string(), None).await.unwrap();

        tokio::time::sleep(Duration::from_millis(120)).await;
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn fallback_ignores_ttl() {
        let backend = FallbackBackend::new();
        backend
            .set("k", "v".to_string(), Some(Duration::from_millis(1)))
            .await
            .unwrap();

        tokio::time::sleep(Duration::from_millis(20)).await;
        assert_eq!(backend.get("k").await.unwrap().as_deref(), Some("v"));
        assert!(backend.delete("k").await.unwrap());
        assert!(backend.is_empty());
    }

    #[tokio::test]
    async fn prefix_delete_leaves_other_keys() {
        let backend = MemoryBackend::new(100);
        for key in ["ns:a:1", "ns:a:2", "ns:b:1"] {
            backend.set(key, "v".to_string(), None).await.unwrap();
        }

        assert_eq!(backend.delete_prefix("ns:a:").await.unwrap(), 2);
        assert_eq!(backend.keys("ns:").await.unwrap(), vec!["ns:b:1".to_string()]);
    }
}
