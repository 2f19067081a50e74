//! Error types for WTD Core
//!
//! Two families live here:
//! - Configuration errors, raised once at load time
//! - Scoring errors, raised when a candidate cannot be given a finite score

use std::path::PathBuf;

/// Configuration loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// Config file could not be read
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Config file is not valid TOML or does not match the schema
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// Effective config could not be rendered back to TOML
    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),

    /// Environment override could not be applied
    #[error("invalid environment override {key}: {reason}")]
    InvalidEnv { key: String, reason: String },

    /// A scoring weight is outside [0, 1]
    #[error("weight {name} must be within [0, 1], got {value}")]
    WeightOutOfRange { name: &'static str, value: f64 },

    /// Scoring weights do not sum to 1.0
    #[error("scoring weights must sum to 1.0, got {sum}")]
    WeightSum { sum: f64 },

    /// Urgency thresholds are not strictly increasing
    #[error("urgency thresholds must increase: critical {critical}h < high {high}h < medium {medium}h < low {low}h")]
    ThresholdOrder {
        critical: i64,
        high: i64,
        medium: i64,
        low: i64,
    },

    /// Refresh staleness threshold is not shorter than the cache TTL
    #[error("staleness threshold ({staleness_secs}s) must be shorter than cache ttl ({ttl_secs}s)")]
    StalenessNotBelowTtl { staleness_secs: u64, ttl_secs: u64 },

    /// An interval or duration that must be positive is zero
    #[error("{0} must be greater than zero")]
    ZeroDuration(&'static str),

    /// Daily precompute hour is not a valid hour of day
    #[error("daily hour must be within 0..=23, got {0}")]
    InvalidHour(u32),

    /// Any other invalid value
    #[error("invalid config value for {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

/// Scoring errors
#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    /// A sub-score or the weighted total is NaN or infinite
    #[error("candidate {candidate_id} produced a non-finite {component} score")]
    NonFinite {
        candidate_id: String,
        component: &'static str,
    },
}
