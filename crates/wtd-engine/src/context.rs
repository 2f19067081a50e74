//! Context assembly
//!
//! All five reads run concurrently, each under its own timeout. The join
//! waits for every branch; a failed or late branch never cancels its
//! siblings. Each branch yields a result, and a failed one becomes an empty
//! default plus an entry in `UserContext::unavailable`.

use crate::error::ProviderError;
use crate::provider::DataProvider;
use chrono::{DateTime, Utc};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use wtd_core::{Source, UserContext, UserId};

/// Builds a `UserContext` from a provider
#[derive(Clone)]
pub struct ContextAssembler {
    provider: Arc<dyn DataProvider>,
    fetch_timeout: Duration,
}

impl std::fmt::Debug for ContextAssembler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ContextAssembler")
            .field("fetch_timeout", &self.fetch_timeout)
            .finish_non_exhaustive()
    }
}

impl ContextAssembler {
    #[inline]
    #[must_use]
    pub fn new(provider: Arc<dyn DataProvider>, fetch_timeout: Duration) -> Self {
        Self {
            provider,
            fetch_timeout,
        }
    }

    /// Fetch every source and assemble the snapshot at `now`
    pub async fn assemble(&self, user: UserId, token: &str, now: DateTime<Utc>) -> UserContext {
        let provider = &self.provider;
        let (selections, catalog, projects, goal, reports) = tokio::join!(
            self.bounded(Source::Selections, provider.selections(token)),
            self.bounded(Source::Catalog, provider.catalog()),
            self.bounded(Source::Projects, provider.open_projects()),
            self.bounded(Source::Goal, provider.current_goal(user)),
            self.bounded(Source::Reports, provider.reports(user)),
        );

        let mut ctx = UserContext::new(user, now);
        let selections = settle(&mut ctx, Source::Selections, selections);
        let catalog = settle(&mut ctx, Source::Catalog, catalog);
        let projects = settle(&mut ctx, Source::Projects, projects);
        let goal = settle(&mut ctx, Source::Goal, goal);
        let reports = settle(&mut ctx, Source::Reports, reports);
        let ctx = ctx
            .with_selections(selections)
            .with_catalog(catalog)
            .with_projects(projects)
            .with_goal(goal)
            .with_reports(reports);

        if !ctx.unavailable.is_empty() {
            tracing::warn!(
                user_id = %user,
                unavailable = ?ctx.unavailable,
                "context assembled with missing sources"
            );
        }
        ctx
    }

    async fn bounded<T>(
        &self,
        source: Source,
        fetch: impl Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        tokio::time::timeout(self.fetch_timeout, fetch)
            .await
            .unwrap_or(Err(ProviderError::Timeout(source)))
    }
}

/// Unwrap a branch result, recording the source as unavailable on failure
fn settle<T: Default>(ctx: &mut UserContext, source: Source, result: Result<T, ProviderError>) -> T {
    match result {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(user_id = %ctx.user_id, source = %source, error = %e, "upstream fetch failed");
            metrics::counter!("wtd_upstream_failures_total", "source" => source.as_str()).increment(1);
            ctx.mark_unavailable(source);
            T::default()
        }
    }
}
