//! WTD Cache - recommendation set storage
//!
//! Keeps each user's latest `RecommendationSet` under a namespaced key:
//! - Redis when reachable, with server-side TTL
//! - moka for single-node deployments, with per-entry TTL
//! - an in-process map when the primary is unreachable, swept by age
//!
//! # Example
//!
//! ```rust,ignore
//! use wtd_cache::{CacheKeys, CacheStore};
//!
//! let store = CacheStore::from_config(&config.cache);
//! let keys = CacheKeys::new(&config.cache.namespace);
//! store.set(&keys.user(user), &set, Some(config.cache.ttl())).await;
//! let cached = store.get(&keys.user(user)).await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod backend;
pub mod error;
pub mod keys;
pub mod memory;
pub mod redis_backend;
pub mod store;

pub use backend::{BackendConnector, CacheBackend};
pub use error::CacheError;
pub use keys::CacheKeys;
pub use memory::{FallbackBackend, MemoryBackend, MemoryConnector};
pub use redis_backend::{RedisBackend, RedisConnector};
pub use store::{CacheStore, SweepStats};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
