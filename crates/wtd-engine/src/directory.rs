//! Users known to the scheduler
//!
//! The daily recompute walks `active_users`, the hourly refresh walks
//! `recently_active`. [`ActivityTracker`] answers both from the users seeded
//! in config plus every user the service has served.

use crate::error::SchedulerError;
use async_trait::async_trait;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use dashmap::DashMap;
use std::time::Duration;
use wtd_core::{to_chrono, SchedulerConfig, UserId};

/// A user to precompute for, with the token upstream reads need
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActiveUser {
    pub user_id: UserId,
    pub token: String,
}

/// Source of users for the precompute cycles
#[async_trait]
pub trait UserDirectory: Send + Sync + std::fmt::Debug {
    /// Users included in the daily full recompute
    async fn active_users(&self, now: DateTime<Utc>) -> Result<Vec<ActiveUser>, SchedulerError>;

    /// Users seen within `window` of `now`
    async fn recently_active(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveUser>, SchedulerError>;

    /// Drop users that can no longer become active; returns how many went
    async fn prune_inactive(&self, _now: DateTime<Utc>) -> usize {
        0
    }
}

#[derive(Debug, Clone)]
struct Activity {
    token: String,
    last_seen: Option<DateTime<Utc>>,
    seeded: bool,
}

/// In-process directory fed by served requests
#[derive(Debug)]
pub struct ActivityTracker {
    users: DashMap<UserId, Activity>,
    active_window: ChronoDuration,
}

impl ActivityTracker {
    /// Create a tracker holding the configured seed users
    #[must_use]
    pub fn new(config: &SchedulerConfig) -> Self {
        let users = DashMap::new();
        for seed in &config.seed_users {
            users.insert(
                UserId(seed.user_id),
                Activity {
                    token: seed.token.clone(),
                    last_seen: None,
                    seeded: true,
                },
            );
        }
        Self {
            users,
            active_window: ChronoDuration::try_days(config.active_window_days)
                .unwrap_or(ChronoDuration::MAX),
        }
    }

    /// Note that `user` was served at `at`
    pub fn record(&self, user: UserId, token: &str, at: DateTime<Utc>) {
        let mut entry = self.users.entry(user).or_insert_with(|| Activity {
            token: String::new(),
            last_seen: None,
            seeded: false,
        });
        if !token.is_empty() {
            entry.token = token.to_string();
        }
        let latest = entry.last_seen.map_or(at, |seen| seen.max(at));
        entry.last_seen = Some(latest);
    }

    /// Number of tracked users
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.users.len()
    }

    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.users.is_empty()
    }

    fn collect(&self, keep: impl Fn(&Activity) -> bool) -> Vec<ActiveUser> {
        let mut users: Vec<ActiveUser> = self
            .users
            .iter()
            .filter(|entry| keep(entry.value()))
            .map(|entry| ActiveUser {
                user_id: *entry.key(),
                token: entry.value().token.clone(),
            })
            .collect();
        users.sort_by_key(|user| user.user_id);
        users
    }
}

/// `now - window`, clamped to the earliest representable instant
fn window_start(now: DateTime<Utc>, window: ChronoDuration) -> DateTime<Utc> {
    now.checked_sub_signed(window).unwrap_or(DateTime::<Utc>::MIN_UTC)
}

fn seen_since(activity: &Activity, cutoff: DateTime<Utc>) -> bool {
    activity.last_seen.is_some_and(|seen| seen >= cutoff)
}

#[async_trait]
impl UserDirectory for ActivityTracker {
    async fn active_users(&self, now: DateTime<Utc>) -> Result<Vec<ActiveUser>, SchedulerError> {
        let cutoff = window_start(now, self.active_window);
        Ok(self.collect(|activity| activity.seeded || seen_since(activity, cutoff)))
    }

    async fn recently_active(
        &self,
        window: Duration,
        now: DateTime<Utc>,
    ) -> Result<Vec<ActiveUser>, SchedulerError> {
        let cutoff = window_start(now, to_chrono(window));
        Ok(self.collect(|activity| seen_since(activity, cutoff)))
    }

    async fn prune_inactive(&self, now: DateTime<Utc>) -> usize {
        let cutoff = window_start(now, self.active_window);
        let before = self.users.len();
        self.users
            .retain(|_, activity| activity.seeded || seen_since(activity, cutoff));
        let pruned = before.saturating_sub(self.users.len());
        if pruned > 0 {
            tracing::debug!(pruned, remaining = self.users.len(), "pruned inactive users");
        }
        pruned
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use wtd_core::SeedUser;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 3, 10, 8, 0, 0).unwrap()
    }

    fn tracker() -> ActivityTracker {
        let config = SchedulerConfig {
            seed_users: vec![SeedUser {
                user_id: 1,
                token: "seed".to_string(),
            }],
            ..SchedulerConfig::default()
        };
        ActivityTracker::new(&config)
    }

    fn ids(users: &[ActiveUser]) -> Vec<u64> {
        users.iter().map(|u| u.user_id.0).collect()
    }

    #[tokio::test]
    async fn seeds_are_always_active_but_never_recent() {
        let tracker = tracker();
        let active = tracker.active_users(now()).await.unwrap();
        assert_eq!(ids(&active), vec![1]);
        assert_eq!(active[0].token, "seed");

        let recent = tracker
            .recently_active(Duration::from_secs(3600), now())
            .await
            .unwrap();
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn activity_window_filters_old_users() {
        let tracker = tracker();
        tracker.record(UserId(2), "t2", now() - ChronoDuration::minutes(10));
        tracker.record(UserId(3), "t3", now() - ChronoDuration::days(3));
        tracker.record(UserId(4), "t4", now() - ChronoDuration::days(45));

        let active = tracker.active_users(now()).await.unwrap();
        assert_eq!(ids(&active), vec![1, 2, 3]);

        let recent = tracker
            .recently_active(Duration::from_secs(3600), now())
            .await
            .unwrap();
        assert_eq!(ids(&recent), vec![2]);
    }

    #[tokio::test]
    async fn record_keeps_latest_sighting_and_token() {
        let tracker = tracker();
        tracker.record(UserId(1), "fresh", now());
        tracker.record(UserId(1), "", now() - ChronoDuration::days(2));

        let recent = tracker
            .recently_active(Duration::from_secs(60), now())
            .await
            .unwrap();
        assert_eq!(recent, vec![ActiveUser { user_id: UserId(1), token: "fresh".to_string() }]);
        assert_eq!(tracker.len(), 1);
    }

    #[tokio::test]
    async fn prune_drops_only_lapsed_unseeded_users() {
        let tracker = tracker();
        tracker.record(UserId(2), "t2", now() - ChronoDuration::days(3));
        tracker.record(UserId(3), "t3", now() - ChronoDuration::days(45));
        tracker.record(UserId(4), "t4", now() - ChronoDuration::days(400));

        assert_eq!(tracker.prune_inactive(now()).await, 2);
        assert_eq!(tracker.len(), 2);
        assert_eq!(ids(&tracker.active_users(now()).await.unwrap()), vec![1, 2]);
        assert_eq!(tracker.prune_inactive(now()).await, 0);
    }

    #[tokio::test]
    async fn huge_windows_saturate_instead_of_panicking() {
        let config = SchedulerConfig {
            active_window_days: i64::MAX,
            ..SchedulerConfig::default()
        };
        let tracker = ActivityTracker::new(&config);
        tracker.record(UserId(2), "t2", now() - ChronoDuration::days(5_000));

        assert_eq!(ids(&tracker.active_users(now()).await.unwrap()), vec![2]);
        let recent = tracker
            .recently_active(Duration::from_secs(u64::MAX), now())
            .await
            .unwrap();
        assert_eq!(ids(&recent), vec![2]);
        assert_eq!(tracker.prune_inactive(now()).await, 0);
    }
}
