//! Core types for WTD
//!
//! Defines the data flowing through one generation cycle:
//! - `UserContext`: the per-cycle snapshot of upstream data
//! - `Candidate`: an unscored recommendation from a generator
//! - `ScoredCandidate`: a candidate with its total score and urgency level
//! - `RecommendationSet`: the bounded, ordered output that outlives the cycle

use crate::records::{Course, CourseSelection, Goal, Project, TimeReport};
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::time::Duration;

/// Maximum number of items in a recommendation set
pub const MAX_RECOMMENDATIONS: usize = 3;

/// Version tag stamped on every recommendation set
pub const ALGORITHM_VERSION: &str = "1.0";

const SECONDS_PER_DAY: i64 = 86_400;
const SECONDS_PER_HOUR: i64 = 3_600;

/// Platform user identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(pub u64);

impl From<u64> for UserId {
    fn from(value: u64) -> Self {
        Self(value)
    }
}

impl std::fmt::Display for UserId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl std::str::FromStr for UserId {
    type Err = std::num::ParseIntError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self)
    }
}

/// Upstream data sources feeding a `UserContext`
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Source {
    Selections,
    Catalog,
    Projects,
    Goal,
    Reports,
}

impl Source {
    /// All sources, in fetch order
    pub const ALL: [Source; 5] = [
        Source::Selections,
        Source::Catalog,
        Source::Projects,
        Source::Goal,
        Source::Reports,
    ];

    /// Stable lowercase name
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Source::Selections => "selections",
            Source::Catalog => "catalog",
            Source::Projects => "projects",
            Source::Goal => "goal",
            Source::Reports => "reports",
        }
    }
}

impl std::fmt::Display for Source {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Candidate kinds, one per generator family
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum CandidateKind {
    /// Enrolled course chapter with a near deadline
    #[serde(rename = "COURSE_URGENT")]
    CourseUrgent,
    /// Popular catalog course the user has not taken
    #[serde(rename = "COURSE_POPULAR")]
    CoursePopular,
    /// Unclaimed project task
    #[serde(rename = "TASK_CLAIM")]
    ProjectClaim,
    /// Overdue goal review
    #[serde(rename = "GOAL_TALK")]
    GoalTalk,
    /// Too few study hours logged recently
    #[serde(rename = "REPORT_TIME")]
    ReportReminder,
}

impl CandidateKind {
    /// Top-level category used for diversity
    #[inline]
    #[must_use]
    pub fn group(&self) -> CategoryGroup {
        match self {
            CandidateKind::CourseUrgent | CandidateKind::CoursePopular => CategoryGroup::Course,
            CandidateKind::ProjectClaim => CategoryGroup::Project,
            CandidateKind::GoalTalk => CategoryGroup::Goal,
            CandidateKind::ReportReminder => CategoryGroup::Report,
        }
    }

    /// Urgency level used when the candidate has no deadline
    #[inline]
    #[must_use]
    pub fn default_urgency_level(&self) -> UrgencyLevel {
        match self {
            CandidateKind::CourseUrgent | CandidateKind::ProjectClaim | CandidateKind::CoursePopular => {
                UrgencyLevel::Low
            }
            CandidateKind::GoalTalk | CandidateKind::ReportReminder => UrgencyLevel::Medium,
        }
    }
}

/// Top-level categories; the selector spreads picks across these
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CategoryGroup {
    Course,
    Project,
    Goal,
    Report,
}

/// Urgency level derived from hours remaining
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UrgencyLevel {
    Critical,
    High,
    Medium,
    Low,
}

/// The four raw sub-scores of a candidate, each in [0, 100]
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SubScores {
    pub urgency: f64,
    pub importance: f64,
    pub personal_fit: f64,
    pub growth_value: f64,
}

impl SubScores {
    /// Create sub-scores
    #[inline]
    #[must_use]
    pub const fn new(urgency: f64, importance: f64, personal_fit: f64, growth_value: f64) -> Self {
        Self {
            urgency,
            importance,
            personal_fit,
            growth_value,
        }
    }

    /// Named components, in weight order
    #[inline]
    #[must_use]
    pub fn components(&self) -> [(&'static str, f64); 4] {
        [
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("personal_fit", self.personal_fit),
            ("growth_value", self.growth_value),
        ]
    }
}

/// An unscored recommendation produced by a generator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    /// Stable id, unique within one set
    pub id: String,
    #[serde(rename = "type")]
    pub kind: CandidateKind,
    pub title: String,
    pub description: String,
    pub action_text: String,
    /// Where the action leads
    pub action_url: String,
    pub deadline: Option<DateTime<Utc>>,
    /// Human-readable effort, e.g. "30-45 min"
    pub estimated_effort: String,
    /// Ordered explanation lines
    pub reasons: Vec<String>,
    pub source_id: String,
    pub source_type: String,
    pub scores: SubScores,
}

impl Candidate {
    /// Top-level category
    #[inline]
    #[must_use]
    pub fn group(&self) -> CategoryGroup {
        self.kind.group()
    }
}

/// Keep non-blank reasons, preserving order
pub fn reasons<I>(lines: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    lines
        .into_iter()
        .filter(|line| !line.trim().is_empty())
        .collect()
}

/// A candidate with its weighted total and urgency level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredCandidate {
    #[serde(flatten)]
    pub candidate: Candidate,
    /// Weighted total in [0, 100]
    pub total_score: f64,
    pub urgency_level: UrgencyLevel,
}

impl ScoredCandidate {
    #[inline]
    #[must_use]
    pub fn id(&self) -> &str {
        &self.candidate.id
    }

    #[inline]
    #[must_use]
    pub fn kind(&self) -> CandidateKind {
        self.candidate.kind
    }

    #[inline]
    #[must_use]
    pub fn group(&self) -> CategoryGroup {
        self.candidate.group()
    }
}

/// Final output of one generation cycle
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecommendationSet {
    pub user_id: UserId,
    /// At most [`MAX_RECOMMENDATIONS`] items, best first
    pub items: Vec<ScoredCandidate>,
    pub generated_at: DateTime<Utc>,
    /// `generated_at + cache ttl`
    pub next_refresh_at: DateTime<Utc>,
    pub algorithm_version: String,
}

impl RecommendationSet {
    /// Create a set; items beyond [`MAX_RECOMMENDATIONS`] are dropped
    #[must_use]
    pub fn new(
        user_id: UserId,
        mut items: Vec<ScoredCandidate>,
        generated_at: DateTime<Utc>,
        ttl: Duration,
    ) -> Self {
        items.truncate(MAX_RECOMMENDATIONS);
        Self {
            user_id,
            items,
            generated_at,
            next_refresh_at: generated_at
                .checked_add_signed(to_chrono(ttl))
                .unwrap_or(DateTime::<Utc>::MAX_UTC),
            algorithm_version: ALGORITHM_VERSION.to_string(),
        }
    }

    /// Empty set, the worst-case answer
    #[inline]
    #[must_use]
    pub fn empty(user_id: UserId, generated_at: DateTime<Utc>, ttl: Duration) -> Self {
        Self::new(user_id, Vec::new(), generated_at, ttl)
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Find an item by id
    #[must_use]
    pub fn find(&self, id: &str) -> Option<&ScoredCandidate> {
        self.items.iter().find(|item| item.id() == id)
    }

    /// Whether `next_refresh_at` has passed
    #[inline]
    #[must_use]
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.next_refresh_at
    }

    /// Whether the set was generated longer ago than `max_age`
    #[inline]
    #[must_use]
    pub fn is_older_than(&self, max_age: Duration, now: DateTime<Utc>) -> bool {
        now - self.generated_at > to_chrono(max_age)
    }
}

/// Snapshot of upstream data for one generation cycle.
///
/// A source that failed to load is empty and listed in `unavailable`; the
/// context itself is always usable.
#[derive(Debug, Clone, PartialEq)]
pub struct UserContext {
    pub user_id: UserId,
    /// Single clock reading used by every generator
    pub now: DateTime<Utc>,
    pub selections: Vec<CourseSelection>,
    pub catalog: Vec<Course>,
    pub open_projects: Vec<Project>,
    pub current_goal: Option<Goal>,
    pub recent_reports: Vec<TimeReport>,
    pub unavailable: BTreeSet<Source>,
}

impl UserContext {
    /// Create an empty context
    #[must_use]
    pub fn new(user_id: UserId, now: DateTime<Utc>) -> Self {
        Self {
            user_id,
            now,
            selections: Vec::new(),
            catalog: Vec::new(),
            open_projects: Vec::new(),
            current_goal: None,
            recent_reports: Vec::new(),
            unavailable: BTreeSet::new(),
        }
    }

    #[must_use]
    pub fn with_selections(mut self, selections: Vec<CourseSelection>) -> Self {
        self.selections = selections;
        self
    }

    #[must_use]
    pub fn with_catalog(mut self, catalog: Vec<Course>) -> Self {
        self.catalog = catalog;
        self
    }

    #[must_use]
    pub fn with_projects(mut self, projects: Vec<Project>) -> Self {
        self.open_projects = projects;
        self
    }

    #[must_use]
    pub fn with_goal(mut self, goal: Option<Goal>) -> Self {
        self.current_goal = goal;
        self
    }

    #[must_use]
    pub fn with_reports(mut self, reports: Vec<TimeReport>) -> Self {
        self.recent_reports = reports;
        self
    }

    /// Record that a source could not be loaded
    pub fn mark_unavailable(&mut self, source: Source) {
        self.unavailable.insert(source);
    }

    /// Whether a source loaded successfully
    #[inline]
    #[must_use]
    pub fn is_available(&self, source: Source) -> bool {
        !self.unavailable.contains(&source)
    }

    /// Whole days from `now` until `at`, floored; negative once passed
    #[inline]
    #[must_use]
    pub fn days_until(&self, at: DateTime<Utc>) -> i64 {
        whole_days(at - self.now)
    }

    /// Whole days from `at` until `now`, floored
    #[inline]
    #[must_use]
    pub fn days_since(&self, at: DateTime<Utc>) -> i64 {
        whole_days(self.now - at)
    }

    /// Whole hours from `now` until `at`, floored
    #[inline]
    #[must_use]
    pub fn hours_until(&self, at: DateTime<Utc>) -> i64 {
        (at - self.now).num_seconds().div_euclid(SECONDS_PER_HOUR)
    }
}

fn whole_days(span: ChronoDuration) -> i64 {
    span.num_seconds().div_euclid(SECONDS_PER_DAY)
}

/// Convert a std duration, saturating at chrono's maximum
#[must_use]
pub fn to_chrono(duration: Duration) -> ChronoDuration {
    ChronoDuration::from_std(duration).unwrap_or(ChronoDuration::MAX)
}
