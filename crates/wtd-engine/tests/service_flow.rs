//! Request-path behavior: cache-first reads, write-through, feedback, explain

use chrono::Utc;
use pretty_assertions::assert_eq;
use std::sync::Arc;
use std::time::{Duration, Instant};
use wtd_core::{CategoryGroup, ScoredCandidate, Source, UserId};
use wtd_engine::{
    ActivityTracker, FeedbackKind, PerformanceMonitor, RecommendationEngine,
    RecommendationService, ServiceError, UserDirectory,
};
use wtd_test_utils::{memory_cache, test_config, StaticProvider};

struct Harness {
    service: RecommendationService,
    provider: Arc<StaticProvider>,
    monitor: Arc<PerformanceMonitor>,
    tracker: Arc<ActivityTracker>,
}

fn harness(provider: StaticProvider) -> Harness {
    let config = test_config();
    let provider = Arc::new(provider);
    let engine = Arc::new(RecommendationEngine::new(provider.clone(), &config));
    let monitor = Arc::new(PerformanceMonitor::new());
    let tracker = Arc::new(ActivityTracker::new(&config.scheduler));
    let service = RecommendationService::new(
        engine,
        memory_cache(&config),
        monitor.clone(),
        tracker.clone(),
    );
    Harness {
        service,
        provider,
        monitor,
        tracker,
    }
}

#[tokio::test]
async fn second_read_is_served_from_cache() {
    let h = harness(StaticProvider::sample(Utc::now()));

    let first = h.service.top3(UserId(51), "token", false).await;
    let second = h.service.top3(UserId(51), "token", false).await;

    assert!(!first.cache_hit);
    assert!(second.cache_hit);
    assert_eq!(first.set, second.set);
    assert_eq!(h.provider.calls(), 1);

    let groups: Vec<_> = first.set.items.iter().map(ScoredCandidate::group).collect();
    assert_eq!(
        groups,
        vec![CategoryGroup::Course, CategoryGroup::Goal, CategoryGroup::Project]
    );

    let stats = h.monitor.snapshot();
    assert_eq!((stats.calls, stats.cache_hits, stats.errors), (2, 1, 0));
}

#[tokio::test]
async fn refresh_bypasses_the_cache() {
    let h = harness(StaticProvider::sample(Utc::now()));

    h.service.top3(UserId(51), "token", false).await;
    let refreshed = h.service.top3(UserId(51), "token", true).await;

    assert!(!refreshed.cache_hit);
    assert_eq!(h.provider.calls(), 2);
}

#[tokio::test]
async fn users_do_not_share_entries() {
    let h = harness(StaticProvider::sample(Utc::now()));

    let a = h.service.top3(UserId(1), "a", false).await;
    let b = h.service.top3(UserId(2), "b", false).await;

    assert!(!b.cache_hit);
    assert_eq!(a.set.user_id, UserId(1));
    assert_eq!(b.set.user_id, UserId(2));
}

#[tokio::test]
async fn failing_sources_still_answer() {
    let provider = StaticProvider::sample(Utc::now())
        .failing(Source::Selections)
        .failing(Source::Projects);
    let h = harness(provider);

    let top = h.service.top3(UserId(51), "token", false).await;

    let groups: Vec<_> = top.set.items.iter().map(ScoredCandidate::group).collect();
    assert_eq!(groups, vec![CategoryGroup::Goal, CategoryGroup::Report]);
    assert_eq!(h.monitor.snapshot().errors, 0);
}

#[tokio::test]
async fn recovered_source_shows_up_on_refresh() {
    let h = harness(StaticProvider::sample(Utc::now()).failing(Source::Projects));

    let degraded = h.service.top3(UserId(51), "token", false).await;
    assert!(degraded.set.find("task_claim_201").is_none());

    h.provider.set_failing(Source::Projects, false);
    assert!(h.service.top3(UserId(51), "token", false).await.set.find("task_claim_201").is_none());

    let refreshed = h.service.top3(UserId(51), "token", true).await;
    assert!(refreshed.set.find("task_claim_201").is_some());
}

#[tokio::test]
async fn slow_source_is_cut_off_by_the_fetch_timeout() {
    let config = test_config();
    let provider = StaticProvider::sample(Utc::now()).slow(Source::Catalog, Duration::from_secs(5));
    let engine = RecommendationEngine::new(Arc::new(provider), &config);

    let started = Instant::now();
    let generation = engine.run(UserId(51), "token", Utc::now()).await;

    assert!(started.elapsed() < Duration::from_secs(3));
    assert!(generation.unavailable.contains(&Source::Catalog));
    assert_eq!(generation.set.len(), 3);
}

#[tokio::test]
async fn complete_feedback_invalidates() {
    let h = harness(StaticProvider::sample(Utc::now()));
    h.service.top3(UserId(51), "token", false).await;

    h.service
        .feedback(UserId(51), "course_urgent_1", FeedbackKind::Like)
        .await;
    assert!(h.service.top3(UserId(51), "token", false).await.cache_hit);

    h.service
        .feedback(UserId(51), "course_urgent_1", FeedbackKind::Complete)
        .await;
    assert!(!h.service.top3(UserId(51), "token", false).await.cache_hit);
    assert_eq!(h.provider.calls(), 2);
}

#[tokio::test]
async fn invalidate_reports_whether_an_entry_existed() {
    let h = harness(StaticProvider::sample(Utc::now()));
    assert!(!h.service.invalidate(UserId(51)).await);

    h.service.top3(UserId(51), "token", false).await;
    assert!(h.service.invalidate(UserId(51)).await);
    assert!(h.service.cache().get(UserId(51)).await.is_none());
}

#[tokio::test]
async fn explain_breaks_down_the_total() {
    let h = harness(StaticProvider::sample(Utc::now()));
    h.service.top3(UserId(51), "token", false).await;

    let explanation = h.service.explain(UserId(51), "course_urgent_1").await.unwrap();

    let names: Vec<_> = explanation.components.iter().map(|c| c.name).collect();
    assert_eq!(names, vec!["urgency", "importance", "personal_fit", "growth_value"]);
    let weights: Vec<_> = explanation.components.iter().map(|c| c.weight).collect();
    assert_eq!(weights, vec![0.35, 0.30, 0.25, 0.10]);

    let sum: f64 = explanation.components.iter().map(|c| c.contribution).sum();
    assert!((sum - explanation.total_score).abs() < 1e-9);
    assert!((explanation.total_score - 88.25).abs() < 1e-9);
    assert!(!explanation.reasons.is_empty());
    assert_eq!(explanation.algorithm_version, wtd_core::ALGORITHM_VERSION);
}

#[tokio::test]
async fn explain_without_cache_or_id_is_not_found() {
    let h = harness(StaticProvider::sample(Utc::now()));

    let err = h.service.explain(UserId(51), "course_urgent_1").await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound { .. }));

    h.service.top3(UserId(51), "token", false).await;
    let err = h.service.explain(UserId(51), "nope").await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "recommendation nope not found for user 51"
    );
}

#[tokio::test]
async fn served_users_become_recently_active() {
    let h = harness(StaticProvider::sample(Utc::now()));
    h.service.top3(UserId(9), "t9", false).await;

    let recent = h
        .tracker
        .recently_active(Duration::from_secs(60), Utc::now())
        .await
        .unwrap();
    assert_eq!(recent.len(), 1);
    assert_eq!(recent[0].user_id, UserId(9));
    assert_eq!(recent[0].token, "t9");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_misses_for_one_user_both_succeed() {
    let h = harness(StaticProvider::sample(Utc::now()));
    let service = Arc::new(h.service);

    let calls = (0..8).map(|_| {
        let service = Arc::clone(&service);
        tokio::spawn(async move { service.top3(UserId(51), "token", false).await })
    });
    let results = futures::future::join_all(calls).await;

    for result in &results {
        let top = result.as_ref().unwrap();
        assert_eq!(top.set.len(), 3);
        assert_eq!(top.set.user_id, UserId(51));
    }

    let cached = service.cache().get(UserId(51)).await.unwrap();
    assert_eq!(cached.len(), 3);
    assert!(results
        .iter()
        .any(|r| r.as_ref().unwrap().set == cached));
}
