//! Testing utilities for the WTD workspace
//!
//! Sample records, a scriptable provider and ready-made configs.

#![allow(missing_docs)]

use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use parking_lot::Mutex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wtd_cache::{CacheStore, MemoryConnector};
use wtd_core::{
    AgentConfig, CacheBackendKind, Course, CourseSelection, Goal, Project, Source, TimeReport,
    UserId,
};
use wtd_engine::{DataProvider, ProviderError, RecommendationCache};

pub fn selection(id: u64, due_in: ChronoDuration, now: DateTime<Utc>) -> CourseSelection {
    CourseSelection {
        selection_id: id,
        course_id: 100 + id,
        course_title: format!("Course {id}"),
        chapter_title: format!("Chapter {id}"),
        current_serial: 1,
        deadline: now + due_in,
        url: format!("/course/{}", 100 + id),
        mentor_name: Some("Zhang".to_string()),
    }
}

pub fn course(id: u64, finished_count: u32) -> Course {
    Course {
        id,
        title: format!("Catalog course {id}"),
        description: "A popular course".to_string(),
        director_name: None,
        finished_count,
    }
}

pub fn project(id: u64, due_days: i64, planned_hours: f64, bonus: f64, now: DateTime<Utc>) -> Project {
    Project {
        id,
        title: format!("Project {id}"),
        publisher: "Product".to_string(),
        taker_id: None,
        deadline: now + ChronoDuration::days(due_days),
        planned_hours,
        bonus,
        description: "Open task".to_string(),
    }
}

pub fn goal(id: u64, started_days_ago: i64, now: DateTime<Utc>) -> Goal {
    Goal {
        id,
        content: "Become a full-stack developer".to_string(),
        started_at: now - ChronoDuration::days(started_days_ago),
    }
}

pub fn report(id: u64, days_ago: i64, hours: f64, now: DateTime<Utc>) -> TimeReport {
    TimeReport {
        id,
        reported_at: now - ChronoDuration::days(days_ago),
        hours,
        activity: None,
    }
}

/// Config with an in-process cache, no per-user pause and short timeouts
pub fn test_config() -> AgentConfig {
    let mut config = AgentConfig::default();
    config.cache.backend = CacheBackendKind::Memory;
    config.cache.memory_capacity = 1_000;
    config.provider.fetch_timeout_ms = 200;
    config.scheduler.per_user_pause_ms = 0;
    config
}

/// Recommendation cache over a fresh in-process store
pub fn memory_cache(config: &AgentConfig) -> RecommendationCache {
    let store = CacheStore::new(Arc::new(MemoryConnector::new(config.cache.memory_capacity)));
    RecommendationCache::new(Arc::new(store), &config.cache)
}

#[derive(Debug, Clone, Default)]
struct Records {
    selections: Vec<CourseSelection>,
    catalog: Vec<Course>,
    projects: Vec<Project>,
    goal: Option<Goal>,
    reports: Vec<TimeReport>,
}

/// Provider serving fixed records, with per-source failure and delay
#[derive(Debug, Default)]
pub struct StaticProvider {
    records: Mutex<Records>,
    failing: Mutex<BTreeSet<Source>>,
    delays: BTreeMap<Source, Duration>,
    calls: AtomicUsize,
}

impl StaticProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// One record for every family, relative to `now`
    pub fn sample(now: DateTime<Utc>) -> Self {
        Self::new()
            .with_selections(vec![
                selection(1, ChronoDuration::hours(30), now),
                selection(2, ChronoDuration::days(2), now),
            ])
            .with_catalog(vec![course(103, 12), course(104, 3)])
            .with_projects(vec![project(201, 10, 8.0, 300.0, now)])
            .with_goal(Some(goal(1, 25, now)))
            .with_reports(vec![report(1, 3, 2.5, now)])
    }

    pub fn with_selections(self, selections: Vec<CourseSelection>) -> Self {
        self.records.lock().selections = selections;
        self
    }

    pub fn with_catalog(self, catalog: Vec<Course>) -> Self {
        self.records.lock().catalog = catalog;
        self
    }

    pub fn with_projects(self, projects: Vec<Project>) -> Self {
        self.records.lock().projects = projects;
        self
    }

    pub fn with_goal(self, goal: Option<Goal>) -> Self {
        self.records.lock().goal = goal;
        self
    }

    pub fn with_reports(self, reports: Vec<TimeReport>) -> Self {
        self.records.lock().reports = reports;
        self
    }

    /// Make `source` fail on every call
    pub fn failing(self, source: Source) -> Self {
        self.failing.lock().insert(source);
        self
    }

    /// Delay every read of `source`
    pub fn slow(mut self, source: Source, delay: Duration) -> Self {
        self.delays.insert(source, delay);
        self
    }

    /// Stop or resume failing `source` on a shared provider
    pub fn set_failing(&self, source: Source, failing: bool) {
        let mut set = self.failing.lock();
        if failing {
            set.insert(source);
        } else {
            set.remove(&source);
        }
    }

    /// Number of context assemblies served, counted on the selections read
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    async fn read<T>(&self, source: Source, pick: impl FnOnce(&Records) -> T) -> Result<T, ProviderError> {
        if let Some(delay) = self.delays.get(&source) {
            tokio::time::sleep(*delay).await;
        }
        if self.failing.lock().contains(&source) {
            return Err(ProviderError::Unavailable(source, "scripted failure".to_string()));
        }
        Ok(pick(&self.records.lock()))
    }
}

#[async_trait]
impl DataProvider for StaticProvider {
    async fn selections(&self, _token: &str) -> Result<Vec<CourseSelection>, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.read(Source::Selections, |r| r.selections.clone()).await
    }

    async fn catalog(&self) -> Result<Vec<Course>, ProviderError> {
        self.read(Source::Catalog, |r| r.catalog.clone()).await
    }

    async fn open_projects(&self) -> Result<Vec<Project>, ProviderError> {
        self.read(Source::Projects, |r| r.projects.clone()).await
    }

    async fn current_goal(&self, _user: UserId) -> Result<Option<Goal>, ProviderError> {
        self.read(Source::Goal, |r| r.goal.clone()).await
    }

    async fn reports(&self, _user: UserId) -> Result<Vec<TimeReport>, ProviderError> {
        self.read(Source::Reports, |r| r.reports.clone()).await
    }
}
