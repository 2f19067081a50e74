//! Scorer
//!
//! Turns a [`Candidate`] into a [`ScoredCandidate`]:
//! - each sub-score is clamped to [0, 100]
//! - the total is the weighted sum, clamped to [0, 100]
//! - the urgency level comes from hours remaining against configured
//!   thresholds, independent of the urgency sub-score curve
//!
//! The urgency curves used by the generators also live here.

use crate::config::{ScoringConfig, ScoringWeights, UrgencyThresholds};
use crate::error::ScoreError;
use crate::types::{Candidate, ScoredCandidate, SubScores, UrgencyLevel, UserContext};

/// Upper bound of every score
pub const MAX_SCORE: f64 = 100.0;

/// Deadline escalation curves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrgencyCurve {
    /// Course chapters escalate early
    Course,
    /// Project tasks escalate later and bottom out higher
    Project,
}

impl UrgencyCurve {
    /// Urgency sub-score for whole days remaining
    #[must_use]
    pub fn urgency(&self, days_left: i64) -> f64 {
        match self {
            UrgencyCurve::Course => match days_left {
                i64::MIN..=1 => 95.0,
                2..=3 => 85.0,
                4..=7 => 70.0,
                8..=14 => 50.0,
                _ => 30.0,
            },
            UrgencyCurve::Project => match days_left {
                i64::MIN..=3 => 90.0,
                4..=7 => 75.0,
                8..=14 => 60.0,
                _ => 40.0,
            },
        }
    }
}

/// Weighted scorer
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scorer {
    weights: ScoringWeights,
    thresholds: UrgencyThresholds,
}

impl Scorer {
    /// Create scorer from validated config
    #[inline]
    #[must_use]
    pub fn new(config: &ScoringConfig) -> Self {
        Self {
            weights: config.weights,
            thresholds: config.thresholds,
        }
    }

    /// Configured weights
    #[inline]
    #[must_use]
    pub fn weights(&self) -> &ScoringWeights {
        &self.weights
    }

    /// Weighted total of sub-scores, clamped to [0, 100].
    ///
    /// A non-finite input yields a non-finite total.
    #[must_use]
    pub fn total(&self, scores: &SubScores) -> f64 {
        let w = &self.weights;
        let total = clamp(scores.urgency) * w.urgency
            + clamp(scores.importance) * w.importance
            + clamp(scores.personal_fit) * w.personal_fit
            + clamp(scores.growth_value) * w.growth_value;
        clamp(total)
    }

    /// Urgency level for whole hours remaining
    #[must_use]
    pub fn urgency_level(&self, hours_left: i64) -> UrgencyLevel {
        let t = &self.thresholds;
        if hours_left <= t.critical_hours {
            UrgencyLevel::Critical
        } else if hours_left <= t.high_hours {
            UrgencyLevel::High
        } else if hours_left <= t.medium_hours {
            UrgencyLevel::Medium
        } else {
            UrgencyLevel::Low
        }
    }

    /// Score a candidate against the context clock.
    ///
    /// # Errors
    /// `ScoreError::NonFinite` if any sub-score is NaN or infinite.
    pub fn score(&self, candidate: Candidate, ctx: &UserContext) -> Result<ScoredCandidate, ScoreError> {
        for (component, value) in candidate.scores.components() {
            if !value.is_finite() {
                return Err(ScoreError::NonFinite {
                    candidate_id: candidate.id,
                    component,
                });
            }
        }

        let total_score = self.total(&candidate.scores);
        let urgency_level = match candidate.deadline {
            Some(deadline) => self.urgency_level(ctx.hours_until(deadline)),
            None => candidate.kind.default_urgency_level(),
        };

        Ok(ScoredCandidate {
            candidate,
            total_score,
            urgency_level,
        })
    }
}

#[inline]
fn clamp(value: f64) -> f64 {
    value.clamp(0.0, MAX_SCORE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ScoringConfig;
    use crate::types::{CandidateKind, UserId};
    use chrono::{Duration, TimeZone, Utc};

    fn scorer() -> Scorer {
        Scorer::new(&ScoringConfig::default())
    }

    fn candidate(scores: SubScores, deadline_hours: Option<i64>, ctx: &UserContext) -> Candidate {
        Candidate {
            id: "c".to_string(),
            kind: CandidateKind::CourseUrgent,
            title: "t".to_string(),
            description: String::new(),
            action_text: String::new(),
            action_url: String::new(),
            deadline: deadline_hours.map(|h| ctx.now + Duration::hours(h)),
            estimated_effort: String::new(),
            reasons: Vec::new(),
            source_id: String::new(),
            source_type: String::new(),
            scores,
        }
    }

    fn ctx() -> UserContext {
        UserContext::new(UserId(51), Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap())
    }

    #[test]
    fn course_curve_steps() {
        let c = UrgencyCurve::Course;
        assert_eq!(c.urgency(-2), 95.0);
        assert_eq!(c.urgency(1), 95.0);
        assert_eq!(c.urgency(3), 85.0);
        assert_eq!(c.urgency(7), 70.0);
        assert_eq!(c.urgency(14), 50.0);
        assert_eq!(c.urgency(30), 30.0);
    }

    #[test]
    fn project_curve_steps() {
        let p = UrgencyCurve::Project;
        assert_eq!(p.urgency(2), 90.0);
        assert_eq!(p.urgency(5), 75.0);
        assert_eq!(p.urgency(10), 60.0);
        assert_eq!(p.urgency(15), 40.0);
    }

    #[test]
    fn weighted_total_matches_hand_computation() {
        let total = scorer().total(&SubScores::new(90.0, 80.0, 85.0, 70.0));
        let expected = 90.0 * 0.35 + 80.0 * 0.30 + 85.0 * 0.25 + 70.0 * 0.10;
        assert!((total - expected).abs() < 1e-9);
    }

    #[test]
    fn course_due_in_two_days_scores_high() {
        let ctx = ctx();
        let scored = scorer()
            .score(candidate(SubScores::new(85.0, 85.0, 90.0, 70.0), Some(48), &ctx), &ctx)
            .unwrap();

        assert!((scored.total_score - 84.25).abs() < 1e-9);
        assert_eq!(scored.urgency_level, UrgencyLevel::High);
    }

    #[test]
    fn urgency_levels_follow_thresholds() {
        let s = scorer();
        assert_eq!(s.urgency_level(-5), UrgencyLevel::Critical);
        assert_eq!(s.urgency_level(24), UrgencyLevel::Critical);
        assert_eq!(s.urgency_level(25), UrgencyLevel::High);
        assert_eq!(s.urgency_level(168), UrgencyLevel::Medium);
        assert_eq!(s.urgency_level(169), UrgencyLevel::Low);
    }

    #[test]
    fn out_of_range_sub_scores_are_clamped() {
        let total = scorer().total(&SubScores::new(250.0, -40.0, 100.0, 100.0));
        assert!((total - (100.0 * 0.35 + 100.0 * 0.25 + 100.0 * 0.10)).abs() < 1e-9);
    }

    #[test]
    fn deadline_less_candidate_takes_kind_default() {
        let ctx = ctx();
        let mut c = candidate(SubScores::new(50.0, 50.0, 50.0, 50.0), None, &ctx);
        c.kind = CandidateKind::GoalTalk;
        let scored = scorer().score(c, &ctx).unwrap();
        assert_eq!(scored.urgency_level, UrgencyLevel::Medium);
    }

    #[test]
    fn nan_sub_score_rejected() {
        let ctx = ctx();
        let c = candidate(SubScores::new(50.0, f64::NAN, 50.0, 50.0), None, &ctx);
        let err = scorer().score(c, &ctx).unwrap_err();
        assert!(matches!(err, ScoreError::NonFinite { component: "importance", .. }));
    }
}
