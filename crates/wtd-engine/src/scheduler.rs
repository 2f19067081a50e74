//! Precompute scheduler
//!
//! Three independent loops, each its own task:
//! - daily full recompute at a fixed UTC hour
//! - periodic refresh of recently active users whose entry is missing or stale
//! - periodic cache sweep
//!
//! A failed or panicking cycle is logged and followed by that loop's
//! backoff; it never stops the other loops. Loops end only when [`PrecomputeScheduler::stop`]
//! cancels them.

use crate::cache::RecommendationCache;
use crate::directory::{ActiveUser, UserDirectory};
use crate::engine::{panic_message, RecommendationEngine};
use crate::error::SchedulerError;
use chrono::{DateTime, Duration as ChronoDuration, Utc};
use futures::FutureExt;
use parking_lot::Mutex;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use wtd_cache::SweepStats;
use wtd_core::SchedulerConfig;

const PROGRESS_EVERY: usize = 10;

/// Outcome of one precompute cycle
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleStats {
    /// Users the directory returned
    pub considered: usize,
    /// Users whose set was generated and cached
    pub regenerated: usize,
    /// Users left alone because their entry was fresh
    pub skipped: usize,
    /// Users whose generation failed; nothing was cached for them
    pub failed: usize,
    /// The cycle stopped early on shutdown
    pub interrupted: bool,
}

/// Next occurrence of `hour:00:00` UTC strictly after `now`
#[must_use]
pub fn next_daily_run(now: DateTime<Utc>, hour: u32) -> DateTime<Utc> {
    let today = now
        .date_naive()
        .and_hms_opt(hour % 24, 0, 0)
        .map_or(now, |at| at.and_utc());
    if today > now {
        today
    } else {
        today + ChronoDuration::days(1)
    }
}

/// Background precompute loops over a shared engine and cache
pub struct PrecomputeScheduler {
    engine: Arc<RecommendationEngine>,
    cache: RecommendationCache,
    directory: Arc<dyn UserDirectory>,
    config: SchedulerConfig,
    cancel: CancellationToken,
    tasks: Mutex<Vec<JoinHandle<()>>>,
}

impl std::fmt::Debug for PrecomputeScheduler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PrecomputeScheduler")
            .field("config", &self.config)
            .field("running", &self.is_running())
            .finish_non_exhaustive()
    }
}

impl PrecomputeScheduler {
    #[must_use]
    pub fn new(
        engine: Arc<RecommendationEngine>,
        cache: RecommendationCache,
        directory: Arc<dyn UserDirectory>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            engine,
            cache,
            directory,
            config,
            cancel: CancellationToken::new(),
            tasks: Mutex::new(Vec::new()),
        }
    }

    /// Whether loops are spawned and not yet stopped
    #[must_use]
    pub fn is_running(&self) -> bool {
        !self.cancel.is_cancelled() && !self.tasks.lock().is_empty()
    }

    /// Spawn the three loops; a no-op when disabled in config.
    ///
    /// A stopped scheduler cannot be started again.
    pub fn start(self: &Arc<Self>) -> Result<(), SchedulerError> {
        if !self.config.enabled {
            tracing::info!("precompute scheduler disabled");
            return Ok(());
        }

        let mut tasks = self.tasks.lock();
        if !tasks.is_empty() || self.cancel.is_cancelled() {
            return Err(SchedulerError::AlreadyStarted);
        }

        let daily = Arc::clone(self);
        tasks.push(tokio::spawn(async move { daily.daily_loop().await }));
        let refresh = Arc::clone(self);
        tasks.push(tokio::spawn(async move { refresh.refresh_loop().await }));
        let sweep = Arc::clone(self);
        tasks.push(tokio::spawn(async move { sweep.sweep_loop().await }));

        tracing::info!(
            daily_hour_utc = self.config.daily_hour_utc,
            refresh_interval_secs = self.config.refresh_interval_secs,
            sweep_interval_secs = self.config.sweep_interval_secs,
            "precompute scheduler started"
        );
        Ok(())
    }

    /// Cancel every loop and wait for them to finish
    pub async fn stop(&self) {
        self.cancel.cancel();
        let tasks = std::mem::take(&mut *self.tasks.lock());
        for task in tasks {
            if let Err(e) = task.await {
                tracing::warn!(error = %e, "scheduler task ended abnormally");
            }
        }
        tracing::info!("precompute scheduler stopped");
    }

    /// Forget lapsed users, then regenerate and cache every active user
    pub async fn run_daily_cycle(&self, now: DateTime<Utc>) -> Result<CycleStats, SchedulerError> {
        let pruned = self.directory.prune_inactive(now).await;
        let users = self.directory.active_users(now).await?;
        tracing::info!(users = users.len(), pruned, "daily recompute started");

        let stats = self.precompute(users, now, false).await;
        tracing::info!(
            regenerated = stats.regenerated,
            failed = stats.failed,
            interrupted = stats.interrupted,
            "daily recompute finished"
        );
        Ok(stats)
    }

    /// Regenerate recently active users whose entry is missing or stale
    pub async fn run_refresh_cycle(&self, now: DateTime<Utc>) -> Result<CycleStats, SchedulerError> {
        let users = self
            .directory
            .recently_active(self.config.recent_activity(), now)
            .await?;
        tracing::info!(users = users.len(), "active-user refresh started");

        let stats = self.precompute(users, now, true).await;
        tracing::info!(
            regenerated = stats.regenerated,
            skipped = stats.skipped,
            failed = stats.failed,
            "active-user refresh finished"
        );
        Ok(stats)
    }

    /// Remove expired and unreadable cache entries
    pub async fn run_sweep_cycle(&self, now: DateTime<Utc>) -> Result<SweepStats, SchedulerError> {
        tracing::info!("cache sweep started");
        let stats = self.cache.sweep(now).await;
        tracing::info!(
            scanned = stats.scanned,
            expired = stats.expired,
            corrupt = stats.corrupt,
            "cache sweep finished"
        );
        Ok(stats)
    }

    async fn precompute(
        &self,
        users: Vec<ActiveUser>,
        now: DateTime<Utc>,
        only_stale: bool,
    ) -> CycleStats {
        let mut stats = CycleStats {
            considered: users.len(),
            ..CycleStats::default()
        };

        for (done, user) in users.into_iter().enumerate() {
            if done > 0 && !self.pause(self.config.per_user_pause()).await {
                tracing::info!(done, "precompute interrupted by shutdown");
                stats.interrupted = true;
                break;
            }

            if only_stale && !self.is_stale(&user, now).await {
                stats.skipped += 1;
                continue;
            }

            let generation = self.engine.run(user.user_id, &user.token, now).await;
            if generation.is_failed() {
                stats.failed += 1;
            } else {
                self.cache.put(&generation.set).await;
                stats.regenerated += 1;
            }

            if (done + 1) % PROGRESS_EVERY == 0 {
                tracing::info!(done = done + 1, total = stats.considered, "precompute progress");
            }
        }
        stats
    }

    async fn is_stale(&self, user: &ActiveUser, now: DateTime<Utc>) -> bool {
        match self.cache.get(user.user_id).await {
            Some(set) => set.is_older_than(self.config.staleness(), now) || set.is_expired(now),
            None => true,
        }
    }

    /// Sleep unless cancelled first; returns false on cancellation
    async fn pause(&self, duration: Duration) -> bool {
        tokio::select! {
            () = self.cancel.cancelled() => false,
            () = tokio::time::sleep(duration) => true,
        }
    }

    async fn daily_loop(self: Arc<Self>) {
        loop {
            let now = Utc::now();
            let next = next_daily_run(now, self.config.daily_hour_utc);
            tracing::info!(next_run = %next, "daily recompute scheduled");

            let wait = (next - now).to_std().unwrap_or_default();
            if !self.pause(wait).await {
                break;
            }
            let backoff = self.config.daily_backoff();
            if !self.settle("daily", self.run_daily_cycle(Utc::now()), backoff).await {
                break;
            }
        }
    }

    async fn refresh_loop(self: Arc<Self>) {
        loop {
            if !self.pause(self.config.refresh_interval()).await {
                break;
            }
            let backoff = self.config.refresh_backoff();
            if !self.settle("refresh", self.run_refresh_cycle(Utc::now()), backoff).await {
                break;
            }
        }
    }

    async fn sweep_loop(self: Arc<Self>) {
        loop {
            if !self.pause(self.config.sweep_interval()).await {
                break;
            }
            let backoff = self.config.sweep_backoff();
            if !self.settle("sweep", self.run_sweep_cycle(Utc::now()), backoff).await {
                break;
            }
        }
    }

    /// Run one cycle; on failure or panic log and back off. Returns false on cancellation.
    async fn settle<T>(
        &self,
        cycle: &'static str,
        run: impl Future<Output = Result<T, SchedulerError>>,
        backoff: Duration,
    ) -> bool {
        let outcome = match AssertUnwindSafe(run).catch_unwind().await {
            Ok(result) => result,
            Err(panic) => Err(SchedulerError::Panicked(panic_message(panic.as_ref()))),
        };
        match outcome {
            Ok(_) => !self.cancel.is_cancelled(),
            Err(e) => {
                tracing::error!(cycle, error = %e, backoff_secs = backoff.as_secs(), "scheduler cycle failed");
                metrics::counter!("wtd_scheduler_failures_total", "cycle" => cycle).increment(1);
                self.pause(backoff).await
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    #[test]
    fn daily_run_later_today() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 4, 30, 0).unwrap();
        assert_eq!(
            next_daily_run(now, 6),
            Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap()
        );
    }

    #[test]
    fn daily_run_rolls_to_tomorrow() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 6, 0, 0).unwrap();
        assert_eq!(
            next_daily_run(now, 6),
            Utc.with_ymd_and_hms(2025, 3, 11, 6, 0, 0).unwrap()
        );

        let late = Utc.with_ymd_and_hms(2025, 12, 31, 23, 59, 59).unwrap();
        assert_eq!(
            next_daily_run(late, 0),
            Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap()
        );
    }

    #[test]
    fn daily_run_is_on_the_hour() {
        let now = Utc.with_ymd_and_hms(2025, 3, 10, 17, 42, 13).unwrap();
        let next = next_daily_run(now, 9);
        assert_eq!((next.hour(), next.minute(), next.second()), (9, 0, 0));
        assert!(next > now);
    }
}
