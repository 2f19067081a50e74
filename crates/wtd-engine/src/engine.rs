//! Recommendation engine
//!
//! One generation call: assemble context, run every generator family, score
//! each candidate, select the shortlist. The call never fails; a hard
//! failure inside it, a panic included, yields an empty set and is counted.

use crate::context::ContextAssembler;
use crate::error::EngineError;
use crate::provider::DataProvider;
use chrono::{DateTime, Utc};
use futures::FutureExt;
use std::any::Any;
use std::collections::BTreeSet;
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use wtd_core::{
    AgentConfig, DiversitySelector, Generators, RecommendationSet, ScoredCandidate, Scorer,
    Source, UserId,
};

/// Result of one generation call
#[derive(Debug, Clone)]
pub struct Generation {
    /// Always present; empty on failure
    pub set: RecommendationSet,
    /// Sources that could not be loaded
    pub unavailable: BTreeSet<Source>,
    /// Candidates produced before selection
    pub candidates: usize,
    /// Set when orchestration failed and `set` is the empty fallback
    pub failure: Option<String>,
}

impl Generation {
    #[inline]
    #[must_use]
    pub fn is_failed(&self) -> bool {
        self.failure.is_some()
    }
}

/// Engine counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    pub generated: u64,
    pub failed: u64,
}

/// Orchestrates one generation cycle per call
#[derive(Debug)]
pub struct RecommendationEngine {
    assembler: ContextAssembler,
    generators: Generators,
    scorer: Scorer,
    selector: DiversitySelector,
    ttl: Duration,
    generated: AtomicU64,
    failed: AtomicU64,
}

impl RecommendationEngine {
    /// Create from a provider and validated config
    #[must_use]
    pub fn new(provider: Arc<dyn DataProvider>, config: &AgentConfig) -> Self {
        let scorer = Scorer::new(&config.scoring);
        Self {
            assembler: ContextAssembler::new(provider, config.provider.fetch_timeout()),
            generators: Generators::new(config.generators, scorer),
            scorer,
            selector: DiversitySelector::new(),
            ttl: config.cache.ttl(),
            generated: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    /// The scorer in use
    #[inline]
    #[must_use]
    pub fn scorer(&self) -> &Scorer {
        &self.scorer
    }

    /// Generate the shortlist for `user` now
    pub async fn generate(&self, user: UserId, token: &str) -> RecommendationSet {
        self.run(user, token, Utc::now()).await.set
    }

    /// Generate at a given clock reading, reporting how it went
    pub async fn run(&self, user: UserId, token: &str, now: DateTime<Utc>) -> Generation {
        let attempt = AssertUnwindSafe(self.try_run(user, token, now))
            .catch_unwind()
            .await;

        let error = match attempt {
            Ok(Ok(generation)) => {
                self.generated.fetch_add(1, Ordering::Relaxed);
                return generation;
            }
            Ok(Err(e)) => e,
            Err(panic) => EngineError::Panicked(panic_message(panic.as_ref())),
        };

        self.failed.fetch_add(1, Ordering::Relaxed);
        metrics::counter!("wtd_generation_failures_total").increment(1);
        tracing::error!(user_id = %user, error = %error, "generation failed, returning empty set");

        Generation {
            set: RecommendationSet::empty(user, now, self.ttl),
            unavailable: BTreeSet::new(),
            candidates: 0,
            failure: Some(error.to_string()),
        }
    }

    /// Counters since start
    #[must_use]
    pub fn stats(&self) -> EngineStats {
        EngineStats {
            generated: self.generated.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }

    async fn try_run(
        &self,
        user: UserId,
        token: &str,
        now: DateTime<Utc>,
    ) -> Result<Generation, EngineError> {
        let ctx = self.assembler.assemble(user, token, now).await;

        let candidates = self.generators.generate_all(&ctx);
        let pool_size = candidates.len();
        let scored = candidates
            .into_iter()
            .map(|candidate| self.scorer.score(candidate, &ctx))
            .collect::<Result<Vec<ScoredCandidate>, _>>()?;

        let items = self.selector.select(scored);
        let set = RecommendationSet::new(user, items, now, self.ttl);

        tracing::info!(
            user_id = %user,
            candidates = pool_size,
            selected = set.len(),
            "recommendations generated"
        );

        Ok(Generation {
            set,
            unavailable: ctx.unavailable,
            candidates: pool_size,
            failure: None,
        })
    }
}

pub(crate) fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
