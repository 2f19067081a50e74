//! Cache store
//!
//! The only component shared by the request path and the scheduler. It:
//! - Connects to the primary backend lazily, on first use
//! - Falls back to an in-process map when the connection fails, recording
//!   the degradation once per connection attempt
//! - Absorbs every backend error: reads miss, writes are dropped
//!
//! Values are JSON-encoded [`RecommendationSet`]s. Single-key operations are
//! the backend's own; there are no multi-key transactions.

use crate::backend::{BackendConnector, CacheBackend};
use crate::memory::{FallbackBackend, MemoryConnector};
use crate::redis_backend::RedisConnector;
use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use wtd_core::{CacheBackendKind, CacheConfig, RecommendationSet};

/// Outcome of one sweep
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepStats {
    /// Keys inspected
    pub scanned: usize,
    /// Expired entries deleted
    pub expired: usize,
    /// Unreadable entries deleted
    pub corrupt: usize,
}

impl SweepStats {
    #[inline]
    #[must_use]
    pub fn removed(&self) -> usize {
        self.expired + self.corrupt
    }
}

/// Degradation-tolerant recommendation cache
#[derive(Debug)]
pub struct CacheStore {
    connector: Arc<dyn BackendConnector>,
    active: RwLock<Option<Arc<dyn CacheBackend>>>,
    connect_lock: Mutex<()>,
    fallback: Arc<FallbackBackend>,
    degraded: AtomicBool,
    degradations: AtomicU64,
}

impl CacheStore {
    /// Create a store over a connector; nothing connects until first use
    #[must_use]
    pub fn new(connector: Arc<dyn BackendConnector>) -> Self {
        Self {
            connector,
            active: RwLock::new(None),
            connect_lock: Mutex::new(()),
            fallback: Arc::new(FallbackBackend::new()),
            degraded: AtomicBool::new(false),
            degradations: AtomicU64::new(0),
        }
    }

    /// Create a store for the configured backend kind
    #[must_use]
    pub fn from_config(config: &CacheConfig) -> Self {
        let connector: Arc<dyn BackendConnector> = match config.backend {
            CacheBackendKind::Redis => {
                Arc::new(RedisConnector::new(config.url.clone(), config.connect_timeout()))
            }
            CacheBackendKind::Memory => Arc::new(MemoryConnector::new(config.memory_capacity)),
        };
        Self::new(connector)
    }

    /// Whether the store is running on the in-process fallback
    #[inline]
    #[must_use]
    pub fn is_degraded(&self) -> bool {
        self.degraded.load(Ordering::Acquire)
    }

    /// Number of connection attempts that ended in fallback
    #[inline]
    #[must_use]
    pub fn degradation_count(&self) -> u64 {
        self.degradations.load(Ordering::Relaxed)
    }

    /// Name of the backend in use, connecting if needed
    pub async fn backend_name(&self) -> &'static str {
        self.backend().await.name()
    }

    /// Drop the current backend and connect again.
    ///
    /// Returns `true` if the primary backend is now in use. Entries written
    /// to the fallback stay there.
    pub async fn reconnect(&self) -> bool {
        let _guard = self.connect_lock.lock().await;
        let backend = self.connect().await;
        *self.active.write() = Some(backend);
        !self.is_degraded()
    }

    /// Read a set; missing, expired, unreadable or failed reads are misses
    pub async fn get(&self, key: &str) -> Option<RecommendationSet> {
        let backend = self.backend().await;
        let raw = match backend.get(key).await {
            Ok(raw) => raw?,
            Err(e) => {
                warn!(key, backend = backend.name(), error = %e, "cache read failed");
                return None;
            }
        };

        match serde_json::from_str(&raw) {
            Ok(set) => Some(set),
            Err(e) => {
                warn!(key, error = %e, "cached value unreadable, treating as miss");
                None
            }
        }
    }

    /// Write a set with an optional TTL
    pub async fn set(&self, key: &str, value: &RecommendationSet, ttl: Option<Duration>) {
        let raw = match serde_json::to_string(value) {
            Ok(raw) => raw,
            Err(e) => {
                warn!(key, error = %e, "failed to encode recommendation set");
                return;
            }
        };

        let backend = self.backend().await;
        if let Err(e) = backend.set(key, raw, ttl).await {
            warn!(key, backend = backend.name(), error = %e, "cache write failed");
        }
    }

    /// Delete a key; returns whether it existed
    pub async fn delete(&self, key: &str) -> bool {
        let backend = self.backend().await;
        match backend.delete(key).await {
            Ok(existed) => existed,
            Err(e) => {
                warn!(key, backend = backend.name(), error = %e, "cache delete failed");
                false
            }
        }
    }

    /// Delete every key starting with `prefix`; returns how many went
    pub async fn clear_pattern(&self, prefix: &str) -> usize {
        let backend = self.backend().await;
        match backend.delete_prefix(prefix).await {
            Ok(removed) => {
                info!(prefix, removed, "cleared cache prefix");
                removed
            }
            Err(e) => {
                warn!(prefix, backend = backend.name(), error = %e, "cache prefix clear failed");
                0
            }
        }
    }

    /// Delete entries under `prefix` that are unreadable or past their
    /// `next_refresh_at`
    pub async fn sweep(&self, prefix: &str, now: DateTime<Utc>) -> SweepStats {
        let backend = self.backend().await;
        let keys = match backend.keys(prefix).await {
            Ok(keys) => keys,
            Err(e) => {
                warn!(prefix, backend = backend.name(), error = %e, "cache sweep listing failed");
                return SweepStats::default();
            }
        };

        let mut stats = SweepStats {
            scanned: keys.len(),
            ..SweepStats::default()
        };

        for key in keys {
            let raw = match backend.get(&key).await {
                Ok(Some(raw)) => raw,
                // expired between listing and reading
                Ok(None) => continue,
                Err(e) => {
                    warn!(key = %key, error = %e, "cache sweep read failed");
                    continue;
                }
            };

            let stale = match serde_json::from_str::<RecommendationSet>(&raw) {
                Ok(set) if set.is_expired(now) => Some(&mut stats.expired),
                Ok(_) => None,
                Err(_) => Some(&mut stats.corrupt),
            };

            if let Some(counter) = stale {
                match backend.delete(&key).await {
                    Ok(_) => *counter += 1,
                    Err(e) => warn!(key = %key, error = %e, "cache sweep delete failed"),
                }
            }
        }

        debug!(
            prefix,
            scanned = stats.scanned,
            removed = stats.removed(),
            "cache sweep finished"
        );
        stats
    }

    async fn backend(&self) -> Arc<dyn CacheBackend> {
        let current = self.active.read().clone();
        if let Some(backend) = current {
            return backend;
        }

        let _guard = self.connect_lock.lock().await;
        let current = self.active.read().clone();
        if let Some(backend) = current {
            return backend;
        }

        let backend = self.connect().await;
        *self.active.write() = Some(Arc::clone(&backend));
        backend
    }

    /// One connection attempt; callers hold `connect_lock`
    async fn connect(&self) -> Arc<dyn CacheBackend> {
        match self.connector.connect().await {
            Ok(backend) => {
                info!(backend = backend.name(), "cache backend connected");
                self.degraded.store(false, Ordering::Release);
                backend
            }
            Err(e) => {
                warn!(
                    error = %e,
                    "cache backend unreachable, degrading to in-process fallback without ttl"
                );
                metrics::counter!("wtd_cache_degraded_total").increment(1);
                self.degradations.fetch_add(1, Ordering::Relaxed);
                self.degraded.store(true, Ordering::Release);
                Arc::clone(&self.fallback) as Arc<dyn CacheBackend>
            }
        }
    }
}
