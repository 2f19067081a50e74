//! Caller-facing recommendation service
//!
//! Cache-first reads with write-through generation, plus feedback and
//! score explanations over the cached set.
//!
//! Two concurrent misses for one user both generate and both write; the
//! later write wins. No per-user lock is taken.

use crate::cache::RecommendationCache;
use crate::directory::ActivityTracker;
use crate::engine::RecommendationEngine;
use crate::error::ServiceError;
use crate::telemetry::{RequestSample, TelemetrySink};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;
use wtd_core::{CandidateKind, RecommendationSet, ScoringWeights, UrgencyLevel, UserId};

/// Answer of [`RecommendationService::top3`]
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Top3 {
    pub set: RecommendationSet,
    /// Served from the cache without generating
    pub cache_hit: bool,
}

/// User reaction to a recommendation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FeedbackKind {
    Like,
    Dislike,
    Click,
    /// The user did it; the cached set is stale
    Complete,
}

impl FeedbackKind {
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            FeedbackKind::Like => "like",
            FeedbackKind::Dislike => "dislike",
            FeedbackKind::Click => "click",
            FeedbackKind::Complete => "complete",
        }
    }
}

impl std::str::FromStr for FeedbackKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "like" => Ok(FeedbackKind::Like),
            "dislike" => Ok(FeedbackKind::Dislike),
            "click" => Ok(FeedbackKind::Click),
            "complete" => Ok(FeedbackKind::Complete),
            other => Err(format!("unknown feedback kind: {other}")),
        }
    }
}

/// One weighted component of a total score
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ScoreComponent {
    pub name: &'static str,
    pub score: f64,
    pub weight: f64,
    /// `score * weight`
    pub contribution: f64,
    pub description: &'static str,
}

/// Why an item was recommended
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Explanation {
    pub recommendation_id: String,
    pub title: String,
    pub kind: CandidateKind,
    pub total_score: f64,
    pub urgency_level: UrgencyLevel,
    pub components: Vec<ScoreComponent>,
    pub reasons: Vec<String>,
    pub algorithm_version: String,
}

fn describe(component: &str) -> &'static str {
    match component {
        "urgency" => "time pressure from the deadline",
        "importance" => "impact of the task",
        "personal_fit" => "match with skills and interests",
        "growth_value" => "skill growth from finishing it",
        _ => "",
    }
}

/// Front door used by callers and the binary
#[derive(Debug, Clone)]
pub struct RecommendationService {
    engine: Arc<RecommendationEngine>,
    cache: RecommendationCache,
    telemetry: Arc<dyn TelemetrySink>,
    tracker: Arc<ActivityTracker>,
    weights: ScoringWeights,
}

impl RecommendationService {
    #[must_use]
    pub fn new(
        engine: Arc<RecommendationEngine>,
        cache: RecommendationCache,
        telemetry: Arc<dyn TelemetrySink>,
        tracker: Arc<ActivityTracker>,
    ) -> Self {
        let weights = *engine.scorer().weights();
        Self {
            engine,
            cache,
            telemetry,
            tracker,
            weights,
        }
    }

    #[inline]
    #[must_use]
    pub fn cache(&self) -> &RecommendationCache {
        &self.cache
    }

    #[inline]
    #[must_use]
    pub fn engine(&self) -> &Arc<RecommendationEngine> {
        &self.engine
    }

    /// Shortlist for `user`, from cache unless `refresh` is set
    pub async fn top3(&self, user: UserId, token: &str, refresh: bool) -> Top3 {
        let started = Instant::now();
        let now = Utc::now();
        self.tracker.record(user, token, now);

        if !refresh {
            if let Some(set) = self.cache.get(user).await {
                if !set.is_expired(now) {
                    tracing::debug!(user_id = %user, "recommendations served from cache");
                    self.telemetry.record(RequestSample {
                        latency: started.elapsed(),
                        cache_hit: true,
                        error: false,
                    });
                    return Top3 {
                        set,
                        cache_hit: true,
                    };
                }
            }
        }

        let generation = self.engine.run(user, token, now).await;
        if !generation.is_failed() {
            self.cache.put(&generation.set).await;
        }

        self.telemetry.record(RequestSample {
            latency: started.elapsed(),
            cache_hit: false,
            error: generation.is_failed(),
        });
        Top3 {
            set: generation.set,
            cache_hit: false,
        }
    }

    /// Drop the cached set of `user`
    pub async fn invalidate(&self, user: UserId) -> bool {
        let removed = self.cache.invalidate(user).await;
        tracing::info!(user_id = %user, removed, "recommendation cache invalidated");
        removed
    }

    /// Record a reaction; `Complete` invalidates the cached set
    pub async fn feedback(&self, user: UserId, recommendation_id: &str, kind: FeedbackKind) {
        tracing::info!(
            user_id = %user,
            recommendation_id,
            feedback = kind.as_str(),
            "feedback received"
        );
        metrics::counter!("wtd_feedback_total", "kind" => kind.as_str()).increment(1);

        if kind == FeedbackKind::Complete {
            self.invalidate(user).await;
        }
    }

    /// Score breakdown of one item in the cached set
    pub async fn explain(
        &self,
        user: UserId,
        recommendation_id: &str,
    ) -> Result<Explanation, ServiceError> {
        let not_found = || ServiceError::NotFound {
            user,
            recommendation_id: recommendation_id.to_string(),
        };

        let set = self.cache.get(user).await.ok_or_else(not_found)?;
        let item = set.find(recommendation_id).ok_or_else(not_found)?;

        let weights = [
            self.weights.urgency,
            self.weights.importance,
            self.weights.personal_fit,
            self.weights.growth_value,
        ];
        let components = item
            .candidate
            .scores
            .components()
            .into_iter()
            .zip(weights)
            .map(|((name, score), weight)| ScoreComponent {
                name,
                score,
                weight,
                contribution: score * weight,
                description: describe(name),
            })
            .collect();

        Ok(Explanation {
            recommendation_id: item.id().to_string(),
            title: item.candidate.title.clone(),
            kind: item.kind(),
            total_score: item.total_score,
            urgency_level: item.urgency_level,
            components,
            reasons: item.candidate.reasons.clone(),
            algorithm_version: set.algorithm_version.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn feedback_kind_parses_case_insensitively() {
        assert_eq!("Complete".parse::<FeedbackKind>(), Ok(FeedbackKind::Complete));
        assert_eq!(" like ".parse::<FeedbackKind>(), Ok(FeedbackKind::Like));
        assert!("love".parse::<FeedbackKind>().is_err());
    }

    #[test]
    fn every_component_has_a_description() {
        for name in ["urgency", "importance", "personal_fit", "growth_value"] {
            assert!(!describe(name).is_empty(), "{name}");
        }
    }
}
