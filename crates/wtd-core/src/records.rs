//! Typed upstream records
//!
//! These are the shapes the learning platform returns once parsed and
//! normalized. Every timestamp is UTC; conversion happens where the record is
//! decoded, never in the generators.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A course the user is enrolled in, with the chapter currently due
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseSelection {
    pub selection_id: u64,
    pub course_id: u64,
    pub course_title: String,
    pub chapter_title: String,
    pub current_serial: u32,
    pub deadline: DateTime<Utc>,
    pub url: String,
    pub mentor_name: Option<String>,
}

/// A catalog course
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Course {
    pub id: u64,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub director_name: Option<String>,
    /// Number of learners who finished the course
    #[serde(default)]
    pub finished_count: u32,
}

/// An open project task
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Project {
    pub id: u64,
    pub title: String,
    pub publisher: String,
    /// Set once somebody has claimed the task
    pub taker_id: Option<u64>,
    pub deadline: DateTime<Utc>,
    pub planned_hours: f64,
    #[serde(default)]
    pub bonus: f64,
    #[serde(default)]
    pub description: String,
}

impl Project {
    /// Whether nobody has claimed the task yet
    #[inline]
    #[must_use]
    pub fn is_unclaimed(&self) -> bool {
        self.taker_id.is_none()
    }
}

/// The user's current goal; `started_at` is the last checkpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: u64,
    pub content: String,
    pub started_at: DateTime<Utc>,
}

/// One logged block of study time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimeReport {
    pub id: u64,
    pub reported_at: DateTime<Utc>,
    pub hours: f64,
    pub activity: Option<String>,
}
