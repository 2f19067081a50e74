//! Candidate generators
//!
//! Five generator families, each a pure function of a [`UserContext`]. None
//! of them reads the clock or touches the network; every time comparison is
//! made against `ctx.now`.
//!
//! Course-urgent and goal-talk candidates are always emitted once their
//! trigger fires. Course-popular and project-claim candidates are gated on
//! their weighted total.

use crate::config::GeneratorConfig;
use crate::records::{Course, CourseSelection, Project};
use crate::scoring::{Scorer, UrgencyCurve};
use crate::types::{reasons, Candidate, CandidateKind, Source, SubScores, UserContext};
use chrono::Duration;
use std::collections::HashSet;

const DESCRIPTION_LIMIT: usize = 100;
const GOAL_PREVIEW_LIMIT: usize = 50;

/// Generator families, in emission order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeneratorFamily {
    CourseUrgent,
    CoursePopular,
    ProjectClaim,
    GoalTalk,
    ReportReminder,
}

impl GeneratorFamily {
    /// All families, in emission order
    pub const ALL: [GeneratorFamily; 5] = [
        GeneratorFamily::CourseUrgent,
        GeneratorFamily::CoursePopular,
        GeneratorFamily::ProjectClaim,
        GeneratorFamily::GoalTalk,
        GeneratorFamily::ReportReminder,
    ];
}

/// Runs the generator families over a context
#[derive(Debug, Clone, Copy)]
pub struct Generators {
    config: GeneratorConfig,
    scorer: Scorer,
}

impl Generators {
    /// Create generators; the scorer is used for score gates only
    #[inline]
    #[must_use]
    pub fn new(config: GeneratorConfig, scorer: Scorer) -> Self {
        Self { config, scorer }
    }

    /// Run every family and concatenate in emission order
    #[must_use]
    pub fn generate_all(&self, ctx: &UserContext) -> Vec<Candidate> {
        GeneratorFamily::ALL
            .iter()
            .flat_map(|family| self.generate(*family, ctx))
            .collect()
    }

    /// Run a single family
    #[must_use]
    pub fn generate(&self, family: GeneratorFamily, ctx: &UserContext) -> Vec<Candidate> {
        match family {
            GeneratorFamily::CourseUrgent => self.course_urgent(ctx),
            GeneratorFamily::CoursePopular => self.course_popular(ctx),
            GeneratorFamily::ProjectClaim => self.project_claim(ctx),
            GeneratorFamily::GoalTalk => self.goal_talk(ctx).into_iter().collect(),
            GeneratorFamily::ReportReminder => self.report_reminder(ctx).into_iter().collect(),
        }
    }

    /// One candidate per selection due within the horizon, overdue included
    fn course_urgent(&self, ctx: &UserContext) -> Vec<Candidate> {
        ctx.selections
            .iter()
            .filter_map(|selection| {
                let days_left = ctx.days_until(selection.deadline);
                (days_left <= self.config.urgent_horizon_days)
                    .then(|| course_urgent_candidate(selection, days_left))
            })
            .collect()
    }

    /// Popular catalog courses the user has not selected
    fn course_popular(&self, ctx: &UserContext) -> Vec<Candidate> {
        let selected: HashSet<u64> = ctx.selections.iter().map(|s| s.course_id).collect();

        ctx.catalog
            .iter()
            .filter(|course| {
                !selected.contains(&course.id) && course.finished_count >= self.config.popularity_floor
            })
            .map(course_popular_candidate)
            .filter(|candidate| self.passes(candidate, self.config.popular_min_score))
            .collect()
    }

    /// Unclaimed projects clearing the project gate
    fn project_claim(&self, ctx: &UserContext) -> Vec<Candidate> {
        ctx.open_projects
            .iter()
            .filter(|project| project.is_unclaimed())
            .map(|project| project_candidate(project, ctx.days_until(project.deadline)))
            .filter(|candidate| self.passes(candidate, self.config.project_min_score))
            .collect()
    }

    /// Goal review once the last checkpoint is older than the configured days
    fn goal_talk(&self, ctx: &UserContext) -> Option<Candidate> {
        let goal = ctx.current_goal.as_ref()?;
        let days_since = ctx.days_since(goal.started_at);
        if days_since <= self.config.goal_stale_days {
            return None;
        }

        let urgency = (50.0 + days_since as f64).min(90.0);
        Some(Candidate {
            id: format!("goal_talk_{}", goal.id),
            kind: CandidateKind::GoalTalk,
            title: format!("Book a goal review ({days_since} days since the last one)"),
            description: format!(
                "Current goal: {}",
                truncate(&goal.content, GOAL_PREVIEW_LIMIT)
            ),
            action_text: "Book now".to_string(),
            action_url: "/user/goaltalk/new".to_string(),
            deadline: None,
            estimated_effort: "60 min".to_string(),
            reasons: reasons([
                format!("{days_since} days since the goal was set"),
                "Regular reviews keep goals on track".to_string(),
                "Personal guidance".to_string(),
            ]),
            source_id: goal.id.to_string(),
            source_type: "goal_management".to_string(),
            scores: SubScores::new(urgency, 75.0, 100.0, 85.0),
        })
    }

    /// Reminder when too few hours were logged in the trailing window
    fn report_reminder(&self, ctx: &UserContext) -> Option<Candidate> {
        if !ctx.is_available(Source::Reports) {
            return None;
        }

        let window = self.config.report_window_days;
        let since = ctx.now - Duration::days(window);
        let hours: f64 = ctx
            .recent_reports
            .iter()
            .filter(|report| report.reported_at > since)
            .map(|report| report.hours)
            .sum();

        if hours >= self.config.report_hours_floor {
            return None;
        }

        Some(Candidate {
            id: "report_time_reminder".to_string(),
            kind: CandidateKind::ReportReminder,
            title: "Log your study hours".to_string(),
            description: format!("Only {hours:.1} hours logged in the last {window} days"),
            action_text: "Log hours".to_string(),
            action_url: "/user/reports/new".to_string(),
            deadline: None,
            estimated_effort: "10-15 min".to_string(),
            reasons: reasons([
                format!("Only {hours:.1} hours logged in the last {window} days"),
                "Logged hours help plan your learning".to_string(),
                "Keeps your study record complete".to_string(),
            ]),
            source_id: "time_report".to_string(),
            source_type: "system_reminder".to_string(),
            scores: SubScores::new(60.0, 70.0, 90.0, 50.0),
        })
    }

    fn passes(&self, candidate: &Candidate, gate: f64) -> bool {
        self.scorer.total(&candidate.scores) >= gate
    }
}

fn course_urgent_candidate(selection: &CourseSelection, days_left: i64) -> Candidate {
    let urgency = UrgencyCurve::Course.urgency(days_left);
    Candidate {
        id: format!("course_urgent_{}", selection.selection_id),
        kind: CandidateKind::CourseUrgent,
        title: format!("Finish \"{}\": {}", selection.course_title, selection.chapter_title),
        description: format!("Lesson {} - {}", selection.current_serial, selection.chapter_title),
        action_text: "Study now".to_string(),
        action_url: selection.url.clone(),
        deadline: Some(selection.deadline),
        estimated_effort: "30-45 min".to_string(),
        reasons: reasons([
            format!("{days_left} days until the deadline"),
            "Selected course needs finishing".to_string(),
            selection
                .mentor_name
                .as_ref()
                .map(|name| format!("Mentor: {name}"))
                .unwrap_or_default(),
        ]),
        source_id: selection.course_id.to_string(),
        source_type: "course_selection".to_string(),
        scores: SubScores::new(urgency, 85.0, 90.0, 70.0),
    }
}

fn course_popular_candidate(course: &Course) -> Candidate {
    let finished = course.finished_count;
    let importance = 60.0 + (2.0 * f64::from(finished)).min(30.0);
    Candidate {
        id: format!("course_popular_{}", course.id),
        kind: CandidateKind::CoursePopular,
        title: format!("Take the popular course \"{}\"", course.title),
        description: truncate(&course.description, DESCRIPTION_LIMIT),
        action_text: "Enroll now".to_string(),
        action_url: format!("/course/{}", course.id),
        deadline: None,
        estimated_effort: "1-2 weeks".to_string(),
        reasons: reasons([
            format!("{finished} learners finished it"),
            "Popular course".to_string(),
            format!(
                "Director: {}",
                course.director_name.as_deref().unwrap_or("unknown")
            ),
        ]),
        source_id: course.id.to_string(),
        source_type: "course_popular".to_string(),
        scores: SubScores::new(30.0, importance, 50.0, 80.0),
    }
}

fn project_candidate(project: &Project, days_left: i64) -> Candidate {
    let urgency = UrgencyCurve::Project.urgency(days_left);
    let importance = (60.0 + project.bonus / 10.0).min(90.0);
    let growth = (60.0 + project.planned_hours * 2.0).min(90.0);
    Candidate {
        id: format!("task_claim_{}", project.id),
        kind: CandidateKind::ProjectClaim,
        title: format!("Claim the task \"{}\"", project.title),
        description: truncate(&project.description, DESCRIPTION_LIMIT),
        action_text: "Claim now".to_string(),
        action_url: format!("/inno/task/{}", project.id),
        deadline: Some(project.deadline),
        estimated_effort: format!("{} hours", project.planned_hours),
        reasons: reasons([
            format!("Bonus: {} coins", project.bonus),
            format!("Publisher: {}", project.publisher),
            format!("Planned effort: {} hours", project.planned_hours),
            "Nobody has claimed it yet".to_string(),
        ]),
        source_id: project.id.to_string(),
        source_type: "project_task".to_string(),
        scores: SubScores::new(urgency, importance, project_fit(project), growth),
    }
}

/// Base fit adjusted by bonus size and effort
fn project_fit(project: &Project) -> f64 {
    let mut fit = 50.0;
    if project.bonus > 200.0 {
        fit += 20.0;
    } else if project.bonus > 100.0 {
        fit += 10.0;
    }
    if project.planned_hours <= 10.0 {
        fit += 15.0;
    }
    f64::min(fit, 95.0)
}

/// Cut at `limit` chars, marking the cut with "..."
fn truncate(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((cut, _)) => format!("{}...", &text[..cut]),
        None => text.to_string(),
    }
}
