//! Cache errors
//!
//! Raised by backends only. [`crate::CacheStore`] absorbs every one of them.

use std::time::Duration;

/// Backend-level cache errors
#[derive(Debug, thiserror::Error)]
pub enum CacheError {
    /// Connection URL rejected or handshake failed
    #[error("cache connection failed: {0}")]
    Connect(String),

    /// Connection attempt did not finish in time
    #[error("cache connection timed out after {0:?}")]
    ConnectTimeout(Duration),

    /// Command failed on the networked store
    #[error("redis command failed: {0}")]
    Redis(#[from] redis::RedisError),

    /// Cached value could not be encoded or decoded
    #[error("cache value serialization failed: {0}")]
    Serde(#[from] serde_json::Error),
}
