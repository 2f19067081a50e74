//! Diversity selector
//!
//! Reduces a scored pool to at most [`MAX_RECOMMENDATIONS`] items:
//! 1. Stable sort by total score, descending (ties keep emission order)
//! 2. Take the best candidate of each category group not yet represented
//! 3. Fill what is left with the best remaining candidates of any group
//!
//! The result is re-sorted by score so the set reads best first.

use crate::types::{CategoryGroup, ScoredCandidate, MAX_RECOMMENDATIONS};
use std::cmp::Ordering;
use std::collections::HashSet;

/// Category-spreading top-N selector
#[derive(Debug, Clone, Copy)]
pub struct DiversitySelector {
    limit: usize,
}

impl Default for DiversitySelector {
    fn default() -> Self {
        Self::new()
    }
}

impl DiversitySelector {
    /// Selector bounded to [`MAX_RECOMMENDATIONS`]
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            limit: MAX_RECOMMENDATIONS,
        }
    }

    /// Select the shortlist; an empty pool gives an empty shortlist
    #[must_use]
    pub fn select(&self, mut pool: Vec<ScoredCandidate>) -> Vec<ScoredCandidate> {
        pool.sort_by(by_score_desc);

        let mut picked = vec![false; pool.len()];
        let mut seen: HashSet<CategoryGroup> = HashSet::new();
        let mut count = 0;

        for (idx, candidate) in pool.iter().enumerate() {
            if count == self.limit {
                break;
            }
            if seen.insert(candidate.group()) {
                picked[idx] = true;
                count += 1;
            }
        }

        for slot in picked.iter_mut() {
            if count == self.limit {
                break;
            }
            if !*slot {
                *slot = true;
                count += 1;
            }
        }

        // pool is already sorted, so keeping picks in pool order keeps them sorted
        pool.into_iter()
            .zip(picked)
            .filter_map(|(candidate, keep)| keep.then_some(candidate))
            .collect()
    }
}

fn by_score_desc(a: &ScoredCandidate, b: &ScoredCandidate) -> Ordering {
    b.total_score
        .partial_cmp(&a.total_score)
        .unwrap_or(Ordering::Equal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Candidate, CandidateKind, SubScores, UrgencyLevel};
    use pretty_assertions::assert_eq;

    fn scored(id: &str, kind: CandidateKind, total: f64) -> ScoredCandidate {
        ScoredCandidate {
            candidate: Candidate {
                id: id.to_string(),
                kind,
                title: id.to_string(),
                description: String::new(),
                action_text: String::new(),
                action_url: String::new(),
                deadline: None,
                estimated_effort: String::new(),
                reasons: Vec::new(),
                source_id: String::new(),
                source_type: String::new(),
                scores: SubScores::new(total, total, total, total),
            },
            total_score: total,
            urgency_level: UrgencyLevel::Low,
        }
    }

    fn ids(items: &[ScoredCandidate]) -> Vec<&str> {
        items.iter().map(ScoredCandidate::id).collect()
    }

    #[test]
    fn empty_pool_gives_empty_selection() {
        assert!(DiversitySelector::new().select(Vec::new()).is_empty());
    }

    #[test]
    fn dominant_category_does_not_crowd_out_others() {
        let pool = vec![
            scored("c1", CandidateKind::CourseUrgent, 95.0),
            scored("c2", CandidateKind::CourseUrgent, 94.0),
            scored("c3", CandidateKind::CoursePopular, 93.0),
            scored("p1", CandidateKind::ProjectClaim, 60.0),
            scored("g1", CandidateKind::GoalTalk, 55.0),
        ];

        let out = DiversitySelector::new().select(pool);
        assert_eq!(ids(&out), vec!["c1", "p1", "g1"]);
    }

    #[test]
    fn backfills_when_groups_run_out() {
        let pool = vec![
            scored("c1", CandidateKind::CourseUrgent, 80.0),
            scored("c2", CandidateKind::CoursePopular, 70.0),
            scored("c3", CandidateKind::CourseUrgent, 90.0),
            scored("r1", CandidateKind::ReportReminder, 50.0),
        ];

        let out = DiversitySelector::new().select(pool);
        assert_eq!(ids(&out), vec!["c3", "c1", "r1"]);
    }

    #[test]
    fn ties_keep_emission_order() {
        let pool = vec![
            scored("a", CandidateKind::CourseUrgent, 70.0),
            scored("b", CandidateKind::CourseUrgent, 70.0),
            scored("c", CandidateKind::CourseUrgent, 70.0),
            scored("d", CandidateKind::CourseUrgent, 70.0),
        ];

        let out = DiversitySelector::new().select(pool);
        assert_eq!(ids(&out), vec!["a", "b", "c"]);
    }
}
