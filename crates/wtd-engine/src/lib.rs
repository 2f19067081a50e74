//! WTD Engine - recommendation generation and delivery
//!
//! The async half of the agent:
//! - `DataProvider` seam with an HTTP client and an offline fixture provider
//! - Concurrent context assembly with per-source timeouts
//! - `RecommendationEngine`, which never fails a caller
//! - `RecommendationService` with cache-first reads, feedback and explanations
//! - `PrecomputeScheduler` keeping active users' sets warm
//!
//! # Example
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use wtd_cache::CacheStore;
//! use wtd_engine::*;
//!
//! let provider: Arc<dyn DataProvider> = Arc::new(HttpProvider::new(&config.provider)?);
//! let engine = Arc::new(RecommendationEngine::new(provider, &config));
//! let cache = RecommendationCache::new(Arc::new(CacheStore::from_config(&config.cache)), &config.cache);
//! let tracker = Arc::new(ActivityTracker::new(&config.scheduler));
//! let service = RecommendationService::new(engine, cache, Arc::new(PerformanceMonitor::new()), tracker);
//!
//! let top = service.top3(UserId(51), "token", false).await;
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod cache;
pub mod context;
pub mod directory;
pub mod engine;
pub mod error;
pub mod fixtures;
pub mod http;
pub mod provider;
pub mod scheduler;
pub mod service;
pub mod telemetry;

pub use cache::RecommendationCache;
pub use context::ContextAssembler;
pub use directory::{ActiveUser, ActivityTracker, UserDirectory};
pub use engine::{EngineStats, Generation, RecommendationEngine};
pub use error::{EngineError, ProviderError, SchedulerError, ServiceError};
pub use fixtures::FixtureProvider;
pub use http::HttpProvider;
pub use provider::{parse_timestamp, DataProvider};
pub use scheduler::{next_daily_run, CycleStats, PrecomputeScheduler};
pub use service::{Explanation, FeedbackKind, RecommendationService, ScoreComponent, Top3};
pub use telemetry::{PerformanceMonitor, PerformanceSnapshot, RequestSample, TelemetrySink};

pub use wtd_core::UserId;

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
