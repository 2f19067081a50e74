use chrono::{Duration, TimeZone, Utc};
use proptest::prelude::*;
use std::collections::HashSet;
use wtd_core::prelude::*;
use wtd_core::{CourseSelection, ScoringConfig, ScoringWeights, SubScores, UrgencyLevel};

fn kind_strategy() -> impl Strategy<Value = CandidateKind> {
    prop_oneof![
        Just(CandidateKind::CourseUrgent),
        Just(CandidateKind::CoursePopular),
        Just(CandidateKind::ProjectClaim),
        Just(CandidateKind::GoalTalk),
        Just(CandidateKind::ReportReminder),
    ]
}

fn scored(idx: usize, kind: CandidateKind, total: f64) -> ScoredCandidate {
    ScoredCandidate {
        candidate: Candidate {
            id: format!("cand_{idx}"),
            kind,
            title: String::new(),
            description: String::new(),
            action_text: String::new(),
            action_url: String::new(),
            deadline: None,
            estimated_effort: String::new(),
            reasons: Vec::new(),
            source_id: idx.to_string(),
            source_type: String::new(),
            scores: SubScores::new(total, total, total, total),
        },
        total_score: total,
        urgency_level: UrgencyLevel::Low,
    }
}

fn pool_strategy() -> impl Strategy<Value = Vec<ScoredCandidate>> {
    prop::collection::vec((kind_strategy(), 0.0f64..=100.0), 1..20).prop_map(|items| {
        items
            .into_iter()
            .enumerate()
            .map(|(idx, (kind, total))| scored(idx, kind, total))
            .collect()
    })
}

#[test]
fn course_due_in_two_days_end_to_end() {
    let now = Utc.with_ymd_and_hms(2025, 3, 10, 9, 30, 0).unwrap();
    let config = AgentConfig::new();
    let scorer = Scorer::new(&config.scoring);
    let generators = Generators::new(config.generators, scorer);

    let ctx = UserContext::new(UserId(51), now).with_selections(vec![CourseSelection {
        selection_id: 2,
        course_id: 3,
        course_title: "Algorithms".to_string(),
        chapter_title: "Trees".to_string(),
        current_serial: 3,
        deadline: now + Duration::hours(48),
        url: "/course/3/learn".to_string(),
        mentor_name: Some("Wang".to_string()),
    }]);

    let candidates: Vec<_> = generators
        .generate_all(&ctx)
        .into_iter()
        .filter(|c| c.kind == CandidateKind::CourseUrgent)
        .collect();
    assert_eq!(candidates.len(), 1);

    let scored = scorer.score(candidates[0].clone(), &ctx).unwrap();
    assert!((scored.total_score - 84.25).abs() < 1e-9);
    assert_eq!(scored.urgency_level, UrgencyLevel::High);
}

proptest! {
    #[test]
    fn prop_total_is_bounded(
        raw in prop::array::uniform4(0.001f64..1.0),
        subs in prop::array::uniform4(0.0f64..=100.0),
    ) {
        let sum: f64 = raw.iter().sum();
        let weights = ScoringWeights::new(raw[0] / sum, raw[1] / sum, raw[2] / sum, raw[3] / sum);
        let scorer = Scorer::new(&ScoringConfig { weights, ..ScoringConfig::default() });

        let total = scorer.total(&SubScores::new(subs[0], subs[1], subs[2], subs[3]));
        prop_assert!((0.0..=100.0).contains(&total));
    }

    #[test]
    fn prop_selection_is_bounded_and_diverse(pool in pool_strategy()) {
        let groups: HashSet<_> = pool
            .iter()
            .filter(|c| c.total_score > 0.0)
            .map(ScoredCandidate::group)
            .collect();

        let out = DiversitySelector::new().select(pool);
        prop_assert!(out.len() <= 3);

        if groups.len() >= 3 {
            let picked: HashSet<_> = out.iter().map(ScoredCandidate::group).collect();
            prop_assert_eq!(picked.len(), 3);
        }
        for pair in out.windows(2) {
            prop_assert!(pair[0].total_score >= pair[1].total_score);
        }
    }

    #[test]
    fn prop_raised_candidate_goes_first(pool in pool_strategy(), pick in any::<prop::sample::Index>()) {
        let mut pool = pool;
        let idx = pick.index(pool.len());
        pool[idx].total_score = 100.5;
        let raised = pool[idx].id().to_string();

        let out = DiversitySelector::new().select(pool);
        prop_assert_eq!(out[0].id(), raised.as_str());
    }
}
