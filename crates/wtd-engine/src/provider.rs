//! Upstream data provider seam
//!
//! Five independent reads feed a `UserContext`. Each can fail on its own;
//! the context assembler maps a failure to an empty default.

use crate::error::ProviderError;
use async_trait::async_trait;
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};
use wtd_core::{Course, CourseSelection, Goal, Project, TimeReport, UserId};

/// Learning platform reads
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait DataProvider: Send + Sync {
    /// Courses the user is enrolled in
    async fn selections(&self, token: &str) -> Result<Vec<CourseSelection>, ProviderError>;

    /// Full course catalog
    async fn catalog(&self) -> Result<Vec<Course>, ProviderError>;

    /// Project tasks currently open
    async fn open_projects(&self) -> Result<Vec<Project>, ProviderError>;

    /// The user's current goal, if any
    async fn current_goal(&self, user: UserId) -> Result<Option<Goal>, ProviderError>;

    /// The user's logged study time
    async fn reports(&self, user: UserId) -> Result<Vec<TimeReport>, ProviderError>;
}

const NAIVE_FORMATS: [&str; 2] = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%d %H:%M:%S%.f"];

/// Parse a platform timestamp into UTC.
///
/// An explicit offset is honored; a timestamp without one is taken as UTC.
///
/// # Errors
/// Returns the parse failure of the offset-aware attempt when no format
/// matches.
pub fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>, chrono::ParseError> {
    let raw = raw.trim();
    match DateTime::parse_from_rfc3339(raw) {
        Ok(aware) => Ok(aware.with_timezone(&Utc)),
        Err(err) => NAIVE_FORMATS
            .iter()
            .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
            .map(|naive| Utc.from_utc_datetime(&naive))
            .ok_or(err),
    }
}
