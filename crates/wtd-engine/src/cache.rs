//! Per-user view over the cache store
//!
//! Both the request path and the scheduler write through here, so entries
//! from either are indistinguishable.

use chrono::{DateTime, Utc};
use std::sync::Arc;
use std::time::Duration;
use wtd_cache::{CacheKeys, CacheStore, SweepStats};
use wtd_core::{CacheConfig, RecommendationSet, UserId};

/// Recommendation sets keyed by user
#[derive(Debug, Clone)]
pub struct RecommendationCache {
    store: Arc<CacheStore>,
    keys: CacheKeys,
    ttl: Duration,
}

impl RecommendationCache {
    #[must_use]
    pub fn new(store: Arc<CacheStore>, config: &CacheConfig) -> Self {
        Self {
            store,
            keys: CacheKeys::new(config.namespace.clone()),
            ttl: config.ttl(),
        }
    }

    /// The underlying store
    #[inline]
    #[must_use]
    pub fn store(&self) -> &Arc<CacheStore> {
        &self.store
    }

    /// Entry lifetime
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Cached set of a user
    pub async fn get(&self, user: UserId) -> Option<RecommendationSet> {
        self.store.get(&self.keys.user(user)).await
    }

    /// Store a set under its own user
    pub async fn put(&self, set: &RecommendationSet) {
        self.store
            .set(&self.keys.user(set.user_id), set, Some(self.ttl))
            .await;
    }

    /// Drop a user's set; returns whether one was cached
    pub async fn invalidate(&self, user: UserId) -> bool {
        self.store.delete(&self.keys.user(user)).await
    }

    /// Drop every cached set
    pub async fn clear_all(&self) -> usize {
        self.store
            .clear_pattern(&self.keys.recommendations_prefix())
            .await
    }

    /// Delete expired or unreadable sets
    pub async fn sweep(&self, now: DateTime<Utc>) -> SweepStats {
        self.store
            .sweep(&self.keys.recommendations_prefix(), now)
            .await
    }
}
