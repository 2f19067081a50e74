//! WTD Core - "what to do next" ranking
//!
//! The pure, synchronous half of the recommendation agent:
//! - Typed upstream records and the per-cycle `UserContext`
//! - Candidate generators, one per recommendation family
//! - A weighted scorer with configurable urgency thresholds
//! - A diversity selector producing the top-3 shortlist
//! - The validated `AgentConfig`
//!
//! # Example
//!
//! ```rust,ignore
//! use wtd_core::prelude::*;
//!
//! let config = AgentConfig::new();
//! let scorer = Scorer::new(&config.scoring);
//! let generators = Generators::new(config.generators, scorer);
//!
//! let ctx = UserContext::new(UserId(51), chrono::Utc::now());
//! let scored = generators
//!     .generate_all(&ctx)
//!     .into_iter()
//!     .filter_map(|c| scorer.score(c, &ctx).ok())
//!     .collect();
//! let top = DiversitySelector::new().select(scored);
//! assert!(top.len() <= 3);
//! ```

#![warn(unreachable_pub)]
#![allow(missing_docs)]

pub mod config;
pub mod error;
pub mod generators;
pub mod records;
pub mod scoring;
pub mod selector;
pub mod types;

pub use config::{
    AgentConfig, CacheBackendKind, CacheConfig, GeneratorConfig, LogFormat, LoggingConfig,
    ProviderConfig, SchedulerConfig, ScoringConfig, ScoringWeights, SeedUser, UrgencyThresholds,
    ENV_PREFIX,
};
pub use error::{ConfigError, ScoreError};
pub use generators::{GeneratorFamily, Generators};
pub use records::{Course, CourseSelection, Goal, Project, TimeReport};
pub use scoring::{Scorer, UrgencyCurve, MAX_SCORE};
pub use selector::DiversitySelector;
pub use types::{
    to_chrono, Candidate, CandidateKind, CategoryGroup, RecommendationSet, ScoredCandidate,
    Source, SubScores, UrgencyLevel, UserContext, UserId, ALGORITHM_VERSION, MAX_RECOMMENDATIONS,
};

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with WTD Core
    pub use crate::{
        AgentConfig, Candidate, CandidateKind, DiversitySelector, Generators, RecommendationSet,
        ScoredCandidate, Scorer, Source, UserContext, UserId,
    };
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
