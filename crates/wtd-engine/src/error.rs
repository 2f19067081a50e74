//! Error types for WTD Engine
//!
//! None of these reach a `generate` caller. Provider errors degrade one
//! source, engine errors degrade one call to an empty set, and scheduler
//! errors cost one cycle.

use wtd_core::{ScoreError, Source, UserId};

/// Upstream fetch errors
#[derive(Debug, thiserror::Error)]
pub enum ProviderError {
    /// Transport failure or undecodable body
    #[error("request to {endpoint} failed: {source}")]
    Http {
        endpoint: String,
        #[source]
        source: reqwest::Error,
    },

    /// Non-success status
    #[error("{endpoint} answered {status}")]
    Status { endpoint: String, status: u16 },

    /// Fetch did not finish within the per-source timeout
    #[error("{0} fetch timed out")]
    Timeout(Source),

    /// Source is not reachable at all
    #[error("{0} source unavailable: {1}")]
    Unavailable(Source, String),
}

/// Failures inside one generation call
#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    /// A candidate could not be scored
    #[error(transparent)]
    Scoring(#[from] ScoreError),

    /// Orchestration panicked
    #[error("generation panicked: {0}")]
    Panicked(String),
}

/// Caller-facing service errors
#[derive(Debug, thiserror::Error)]
pub enum ServiceError {
    /// Nothing cached for the user, or the id is not in the cached set
    #[error("recommendation {recommendation_id} not found for user {user}")]
    NotFound {
        user: UserId,
        recommendation_id: String,
    },
}

/// Scheduler errors; a failed cycle backs off and retries
#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
    /// The user directory could not list users
    #[error("user directory failed: {0}")]
    Directory(String),

    /// A cycle panicked
    #[error("cycle panicked: {0}")]
    Panicked(String),

    /// `start` was called on a running scheduler
    #[error("scheduler already started")]
    AlreadyStarted,
}
