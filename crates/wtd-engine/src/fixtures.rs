//! Offline provider with built-in sample data
//!
//! Deadlines and timestamps are placed relative to the moment of the call so
//! every family has something to say.

use crate::error::ProviderError;
use crate::provider::DataProvider;
use async_trait::async_trait;
use chrono::{Duration, Utc};
use wtd_core::{Course, CourseSelection, Goal, Project, TimeReport, UserId};

/// Provider serving fixed sample records
#[derive(Debug, Clone, Copy, Default)]
pub struct FixtureProvider;

impl FixtureProvider {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl DataProvider for FixtureProvider {
    async fn selections(&self, _token: &str) -> Result<Vec<CourseSelection>, ProviderError> {
        let now = Utc::now();
        Ok(vec![
            CourseSelection {
                selection_id: 1,
                course_id: 101,
                course_title: "Python Fundamentals".to_string(),
                chapter_title: "Lesson 5: Loops and Conditions".to_string(),
                current_serial: 5,
                deadline: now + Duration::days(2),
                url: "/course/python-101#lesson-5".to_string(),
                mentor_name: Some("Zhang".to_string()),
            },
            CourseSelection {
                selection_id: 2,
                course_id: 102,
                course_title: "Data Structures and Algorithms".to_string(),
                chapter_title: "Lesson 3: Trees and Graphs".to_string(),
                current_serial: 3,
                deadline: now + Duration::days(7),
                url: "/course/algorithm-101#lesson-3".to_string(),
                mentor_name: Some("Li".to_string()),
            },
        ])
    }

    async fn catalog(&self) -> Result<Vec<Course>, ProviderError> {
        Ok(vec![
            Course {
                id: 103,
                title: "Frontend Development with Vue.js".to_string(),
                description: "Learn Vue.js from scratch and build modern frontends".to_string(),
                director_name: Some("Wang".to_string()),
                finished_count: 12,
            },
            Course {
                id: 104,
                title: "Introduction to Machine Learning".to_string(),
                description: "Core concepts and common algorithms of machine learning".to_string(),
                director_name: Some("Chen".to_string()),
                finished_count: 8,
            },
        ])
    }

    async fn open_projects(&self) -> Result<Vec<Project>, ProviderError> {
        let now = Utc::now();
        Ok(vec![
            Project {
                id: 201,
                title: "Homepage performance pass".to_string(),
                publisher: "Product".to_string(),
                taker_id: None,
                deadline: now + Duration::days(10),
                planned_hours: 15.0,
                bonus: 300.0,
                description: "Speed up the homepage: compress images, trim scripts and tidy the layout."
                    .to_string(),
            },
            Project {
                id: 202,
                title: "Feedback system".to_string(),
                publisher: "Engineering".to_string(),
                taker_id: None,
                deadline: now + Duration::days(5),
                planned_hours: 25.0,
                bonus: 500.0,
                description: "Build a feedback system covering submission, triage, handling and replies."
                    .to_string(),
            },
        ])
    }

    async fn current_goal(&self, _user: UserId) -> Result<Option<Goal>, ProviderError> {
        Ok(Some(Goal {
            id: 1,
            content: "Become a well-rounded full-stack developer".to_string(),
            started_at: Utc::now() - Duration::days(25),
        }))
    }

    async fn reports(&self, _user: UserId) -> Result<Vec<TimeReport>, ProviderError> {
        let now = Utc::now();
        Ok(vec![
            TimeReport {
                id: 1,
                reported_at: now - Duration::days(5),
                hours: 2.5,
                activity: Some("Python practice".to_string()),
            },
            TimeReport {
                id: 2,
                reported_at: now - Duration::days(15),
                hours: 3.0,
                activity: Some("Algorithm drills".to_string()),
            },
        ])
    }
}
