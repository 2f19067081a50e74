//! Agent configuration
//!
//! Every tunable of the agent lives in [`AgentConfig`]:
//! - Scoring weights and urgency-level thresholds
//! - Generator horizons, floors and score gates
//! - Cache backend, namespace and TTL
//! - Upstream provider location and fetch timeout
//! - Scheduler hours, intervals and backoffs
//!
//! Configuration is loaded once at process start from an optional TOML file,
//! overlaid with `WTD__SECTION__KEY` environment variables and validated
//! before any component is constructed.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Prefix of environment variables that override config values.
///
/// `WTD__CACHE__TTL_SECS=600` sets `cache.ttl_secs`.
pub const ENV_PREFIX: &str = "WTD__";

const WEIGHT_SUM_TOLERANCE: f64 = 1e-6;
const MAX_ACTIVE_WINDOW_DAYS: i64 = 3650;
const MAX_RECENT_ACTIVITY_SECS: u64 = 366 * 24 * 3600;

/// Top-level agent configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    /// Scorer weights and urgency thresholds
    pub scoring: ScoringConfig,
    /// Candidate generator tunables
    pub generators: GeneratorConfig,
    /// Cache store settings
    pub cache: CacheConfig,
    /// Upstream data provider settings
    pub provider: ProviderConfig,
    /// Precompute scheduler settings
    pub scheduler: SchedulerConfig,
    /// Log output settings
    pub logging: LoggingConfig,
}

impl AgentConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Load from an optional TOML file plus process environment overrides.
    ///
    /// # Errors
    /// Returns `ConfigError` if the file cannot be read or parsed, an override
    /// is malformed, or the merged config fails validation.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        Self::load_with_env(path, std::env::vars())
    }

    /// Load from an optional TOML file plus the given environment pairs.
    ///
    /// # Errors
    /// Same as [`AgentConfig::load`].
    pub fn load_with_env<I>(path: Option<&Path>, vars: I) -> Result<Self, ConfigError>
    where
        I: IntoIterator<Item = (String, String)>,
    {
        let mut table = match path {
            Some(path) => {
                let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
                    path: path.to_path_buf(),
                    source,
                })?;
                toml::from_str::<toml::Table>(&text)?
            }
            None => toml::Table::new(),
        };

        apply_env_overrides(&mut table, vars)?;

        let config: Self = toml::Value::Table(table).try_into()?;
        config.validate()?;

        tracing::debug!(
            cache_backend = ?config.cache.backend,
            ttl_secs = config.cache.ttl_secs,
            "configuration loaded"
        );
        Ok(config)
    }

    /// Parse and validate a TOML document.
    ///
    /// # Errors
    /// Returns `ConfigError` on parse or validation failure.
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Render the effective configuration as TOML.
    ///
    /// # Errors
    /// Returns `ConfigError::Render` if serialization fails.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }

    /// Check every cross-field invariant.
    ///
    /// # Errors
    /// Returns the first violated invariant.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.scoring.weights.validate()?;
        self.scoring.thresholds.validate()?;

        if self.cache.ttl_secs == 0 {
            return Err(ConfigError::ZeroDuration("cache.ttl_secs"));
        }
        if self.cache.namespace.trim().is_empty() {
            return Err(ConfigError::Invalid {
                field: "cache.namespace",
                reason: "must not be empty".to_string(),
            });
        }
        if self.provider.fetch_timeout_ms == 0 {
            return Err(ConfigError::ZeroDuration("provider.fetch_timeout_ms"));
        }

        let sched = &self.scheduler;
        if sched.daily_hour_utc > 23 {
            return Err(ConfigError::InvalidHour(sched.daily_hour_utc));
        }
        for (name, value) in [
            ("scheduler.daily_backoff_secs", sched.daily_backoff_secs),
            ("scheduler.refresh_interval_secs", sched.refresh_interval_secs),
            ("scheduler.refresh_backoff_secs", sched.refresh_backoff_secs),
            ("scheduler.staleness_secs", sched.staleness_secs),
            ("scheduler.sweep_interval_secs", sched.sweep_interval_secs),
            ("scheduler.sweep_backoff_secs", sched.sweep_backoff_secs),
            ("scheduler.recent_activity_secs", sched.recent_activity_secs),
        ] {
            if value == 0 {
                return Err(ConfigError::ZeroDuration(name));
            }
        }
        if sched.recent_activity_secs > MAX_RECENT_ACTIVITY_SECS {
            return Err(ConfigError::Invalid {
                field: "scheduler.recent_activity_secs",
                reason: format!("must be at most {MAX_RECENT_ACTIVITY_SECS}"),
            });
        }
        if !(1..=MAX_ACTIVE_WINDOW_DAYS).contains(&sched.active_window_days) {
            return Err(ConfigError::Invalid {
                field: "scheduler.active_window_days",
                reason: format!("must be between 1 and {MAX_ACTIVE_WINDOW_DAYS}"),
            });
        }
        if sched.staleness_secs >= self.cache.ttl_secs {
            return Err(ConfigError::StalenessNotBelowTtl {
                staleness_secs: sched.staleness_secs,
                ttl_secs: self.cache.ttl_secs,
            });
        }

        let gen = &self.generators;
        if gen.report_window_days <= 0 {
            return Err(ConfigError::Invalid {
                field: "generators.report_window_days",
                reason: "must be positive".to_string(),
            });
        }
        if !gen.report_hours_floor.is_finite()
            || !gen.popular_min_score.is_finite()
            || !gen.project_min_score.is_finite()
        {
            return Err(ConfigError::Invalid {
                field: "generators",
                reason: "floors and score gates must be finite".to_string(),
            });
        }

        Ok(())
    }

    /// With scoring weights
    #[inline]
    #[must_use]
    pub fn with_weights(mut self, weights: ScoringWeights) -> Self {
        self.scoring.weights = weights;
        self
    }

    /// With cache TTL
    #[inline]
    #[must_use]
    pub fn with_cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache.ttl_secs = ttl.as_secs();
        self
    }
}

/// Scorer configuration
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig {
    /// Sub-score weights
    pub weights: ScoringWeights,
    /// Hours-to-deadline thresholds for urgency levels
    pub thresholds: UrgencyThresholds,
}

/// Weights of the four sub-scores; must sum to 1.0
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringWeights {
    pub urgency: f64,
    pub importance: f64,
    pub personal_fit: f64,
    pub growth_value: f64,
}

impl ScoringWeights {
    /// Create weights
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

    /// Sum of all weights
    #[inline]
    #[must_use]
    pub fn sum(&self) -> f64 {
        self.urgency + self.importance + self.personal_fit + self.growth_value
    }

    /// Check range and sum.
    ///
    /// # Errors
    /// `WeightOutOfRange` or `WeightSum`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        for (name, value) in [
            ("urgency", self.urgency),
            ("importance", self.importance),
            ("personal_fit", self.personal_fit),
            ("growth_value", self.growth_value),
        ] {
            if !value.is_finite() || !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::WeightOutOfRange { name, value });
            }
        }

        let sum = self.sum();
        if (sum - 1.0).abs() > WEIGHT_SUM_TOLERANCE {
            return Err(ConfigError::WeightSum { sum });
        }
        Ok(())
    }
}

impl Default for ScoringWeights {
    fn default() -> Self {
        Self::new(0.35, 0.30, 0.25, 0.10)
    }
}

/// Upper bounds, in hours remaining, of each urgency level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UrgencyThresholds {
    pub critical_hours: i64,
    pub high_hours: i64,
    pub medium_hours: i64,
    pub low_hours: i64,
}

impl UrgencyThresholds {
    /// Check strict ordering.
    ///
    /// # Errors
    /// `ThresholdOrder` if the thresholds do not increase.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let ordered = self.critical_hours < self.high_hours
            && self.high_hours < self.medium_hours
            && self.medium_hours < self.low_hours;
        if ordered {
            Ok(())
        } else {
            Err(ConfigError::ThresholdOrder {
                critical: self.critical_hours,
                high: self.high_hours,
                medium: self.medium_hours,
                low: self.low_hours,
            })
        }
    }
}

impl Default for UrgencyThresholds {
    fn default() -> Self {
        Self {
            critical_hours: 24,
            high_hours: 72,
            medium_hours: 168,
            low_hours: 720,
        }
    }
}

/// Candidate generator tunables
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneratorConfig {
    /// Course deadlines within this many days become urgent candidates
    pub urgent_horizon_days: i64,
    /// Minimum completion count for a course to count as popular
    pub popularity_floor: u32,
    /// Score gate for popular-course candidates
    pub popular_min_score: f64,
    /// Score gate for project-claim candidates
    pub project_min_score: f64,
    /// Days since the last goal checkpoint before a review is suggested
    pub goal_stale_days: i64,
    /// Trailing window for logged hours
    pub report_window_days: i64,
    /// Logged hours within the window below which a reminder is emitted
    pub report_hours_floor: f64,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            urgent_horizon_days: 3,
            popularity_floor: 5,
            popular_min_score: 60.0,
            project_min_score: 50.0,
            goal_stale_days: 21,
            report_window_days: 30,
            report_hours_floor: 10.0,
        }
    }
}

/// Cache backend selection
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// Networked Redis store, degrading to an in-process map when unreachable
    #[default]
    Redis,
    /// In-process TTL cache, for single-node deployments and tests
    Memory,
}

/// Cache store settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub backend: CacheBackendKind,
    /// Redis connection URL
    pub url: String,
    /// Key namespace shared by every entry this agent writes
    pub namespace: String,
    /// Lifetime of a cached recommendation set
    pub ttl_secs: u64,
    /// Bound on the initial connection attempt
    pub connect_timeout_ms: u64,
    /// Max entries of the in-process backend
    pub memory_capacity: u64,
}

impl CacheConfig {
    /// Cache TTL
    #[inline]
    #[must_use]
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_secs)
    }

    /// Connection attempt timeout
    #[inline]
    #[must_use]
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_millis(self.connect_timeout_ms)
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Redis,
            url: "redis://127.0.0.1:6379/0".to_string(),
            namespace: "what_to_do".to_string(),
            ttl_secs: 7200,
            connect_timeout_ms: 2000,
            memory_capacity: 100_000,
        }
    }
}

/// Upstream provider settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProviderConfig {
    /// Base URL of the learning platform API
    pub base_url: String,
    /// Per-fetch timeout, applied to HTTP requests and to each engine fan-out branch
    pub fetch_timeout_ms: u64,
    /// Serve built-in fixture data instead of calling the platform
    pub fixtures: bool,
}

impl ProviderConfig {
    /// Per-fetch timeout
    #[inline]
    #[must_use]
    pub fn fetch_timeout(&self) -> Duration {
        Duration::from_millis(self.fetch_timeout_ms)
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            base_url: "https://zishu.co/api".to_string(),
            fetch_timeout_ms: 10_000,
            fixtures: false,
        }
    }
}

/// A user known to the scheduler before any request arrives
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SeedUser {
    pub user_id: u64,
    #[serde(default)]
    pub token: String,
}

/// Precompute scheduler settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Start the background loops with the process
    pub enabled: bool,
    /// Wall-clock hour (UTC) of the daily full recompute
    pub daily_hour_utc: u32,
    /// Wait after a failed daily cycle
    pub daily_backoff_secs: u64,
    /// Period of the active-user refresh
    pub refresh_interval_secs: u64,
    /// Wait after a failed refresh cycle
    pub refresh_backoff_secs: u64,
    /// Cached sets older than this are refreshed for recently active users
    pub staleness_secs: u64,
    /// Users seen within this window count as recently active
    pub recent_activity_secs: u64,
    /// Users seen within this many days are included in the daily recompute
    pub active_window_days: i64,
    /// Period of the cache sweep
    pub sweep_interval_secs: u64,
    /// Wait after a failed sweep
    pub sweep_backoff_secs: u64,
    /// Pause between users within one cycle
    pub per_user_pause_ms: u64,
    /// Users always included in the daily recompute
    pub seed_users: Vec<SeedUser>,
}

impl SchedulerConfig {
    #[inline]
    #[must_use]
    pub fn daily_backoff(&self) -> Duration {
        Duration::from_secs(self.daily_backoff_secs)
    }

    #[inline]
    #[must_use]
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    #[inline]
    #[must_use]
    pub fn refresh_backoff(&self) -> Duration {
        Duration::from_secs(self.refresh_backoff_secs)
    }

    #[inline]
    #[must_use]
    pub fn staleness(&self) -> Duration {
        Duration::from_secs(self.staleness_secs)
    }

    #[inline]
    #[must_use]
    pub fn recent_activity(&self) -> Duration {
        Duration::from_secs(self.recent_activity_secs)
    }

    #[inline]
    #[must_use]
    pub fn sweep_interval(&self) -> Duration {
        Duration::from_secs(self.sweep_interval_secs)
    }

    #[inline]
    #[must_use]
    pub fn sweep_backoff(&self) -> Duration {
        Duration::from_secs(self.sweep_backoff_secs)
    }

    #[inline]
    #[must_use]
    pub fn per_user_pause(&self) -> Duration {
        Duration::from_millis(self.per_user_pause_ms)
    }
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            daily_hour_utc: 6,
            daily_backoff_secs: 3600,
            refresh_interval_secs: 3600,
            refresh_backoff_secs: 1800,
            staleness_secs: 3600,
            recent_activity_secs: 3600,
            active_window_days: 30,
            sweep_interval_secs: 6 * 3600,
            sweep_backoff_secs: 3600,
            per_user_pause_ms: 100,
            seed_users: Vec::new(),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

/// Log output settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default filter directive; `RUST_LOG` takes precedence
    pub level: String,
    pub format: LogFormat,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: LogFormat::Pretty,
        }
    }
}

fn apply_env_overrides<I>(table: &mut toml::Table, vars: I) -> Result<(), ConfigError>
where
    I: IntoIterator<Item = (String, String)>,
{
    for (key, raw) in vars {
        let Some(path) = key.strip_prefix(ENV_PREFIX) else {
            continue;
        };
        let segments: Vec<String> = path.split("__").map(str::to_ascii_lowercase).collect();
        if segments.iter().any(String::is_empty) {
            return Err(ConfigError::InvalidEnv {
                key,
                reason: "empty path segment".to_string(),
            });
        }

        let value = parse_env_value(&raw);
        if let Err(reason) = insert_path(table, &segments, value) {
            return Err(ConfigError::InvalidEnv { key, reason });
        }
        tracing::debug!(key = %key, "applied environment override");
    }
    Ok(())
}

fn insert_path(table: &mut toml::Table, segments: &[String], value: toml::Value) -> Result<(), String> {
    let Some((last, parents)) = segments.split_last() else {
        return Err("empty key".to_string());
    };

    let mut current = table;
    for segment in parents {
        let entry = current
            .entry(segment.clone())
            .or_insert(toml::Value::Table(toml::Table::new()));
        current = match entry {
            toml::Value::Table(inner) => inner,
            _ => return Err(format!("{segment} is not a table")),
        };
    }
    current.insert(last.clone(), value);
    Ok(())
}

/// Interpret an environment value as the most specific TOML scalar.
///
/// Arrays and inline tables use TOML syntax; a quoted value is always a string.
fn parse_env_value(raw: &str) -> toml::Value {
    let trimmed = raw.trim();

    if trimmed.starts_with('[') || trimmed.starts_with('{') || trimmed.starts_with('"') {
        if let Ok(mut doc) = toml::from_str::<toml::Table>(&format!("value = {trimmed}")) {
            if let Some(value) = doc.remove("value") {
                return value;
            }
        }
    }
    if let Ok(value) = trimmed.parse::<i64>() {
        return toml::Value::Integer(value);
    }
    if trimmed.chars().any(|c| c.is_ascii_digit()) {
        if let Ok(value) = trimmed.parse::<f64>() {
            return toml::Value::Float(value);
        }
    }
    if let Ok(value) = trimmed.parse::<bool>() {
        return toml::Value::Boolean(value);
    }
    toml::Value::String(raw.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn env(pairs: &[(&str, &str)]) -> Vec<(String, String)> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn default_config_is_valid() {
        let config = AgentConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.cache.namespace, "what_to_do");
        assert_eq!(config.cache.ttl_secs, 7200);
        assert!((config.scoring.weights.sum() - 1.0).abs() < 1e-9);
    }

    #[test]
    fn weights_must_sum_to_one() {
        let config = AgentConfig::default().with_weights(ScoringWeights::new(0.5, 0.3, 0.25, 0.1));
        assert!(matches!(config.validate(), Err(ConfigError::WeightSum { .. })));
    }

    #[test]
    fn negative_weight_rejected() {
        let weights = ScoringWeights::new(1.2, -0.2, 0.0, 0.0);
        assert!(matches!(
            weights.validate(),
            Err(ConfigError::WeightOutOfRange { name: "urgency", .. })
        ));
    }

    #[test]
    fn thresholds_must_increase() {
        let mut config = AgentConfig::default();
        config.scoring.thresholds.high_hours = 12;
        assert!(matches!(config.validate(), Err(ConfigError::ThresholdOrder { .. })));
    }

    #[test]
    fn staleness_must_be_below_ttl() {
        let config = AgentConfig::default().with_cache_ttl(Duration::from_secs(1800));
        assert!(matches!(
            config.validate(),
            Err(ConfigError::StalenessNotBelowTtl { .. })
        ));
    }

    #[test]
    fn activity_windows_are_bounded() {
        let mut config = AgentConfig::default();
        config.scheduler.recent_activity_secs = u64::MAX;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Invalid { field: "scheduler.recent_activity_secs", .. })
        ));

        config.scheduler.recent_activity_secs = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::ZeroDuration("scheduler.recent_activity_secs"))
        ));

        config.scheduler.recent_activity_secs = 3600;
        for days in [i64::MAX, i64::MIN, 0, -30] {
            config.scheduler.active_window_days = days;
            assert!(
                matches!(
                    config.validate(),
                    Err(ConfigError::Invalid { field: "scheduler.active_window_days", .. })
                ),
                "{days} days accepted"
            );
        }

        config.scheduler.active_window_days = 3650;
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let config = AgentConfig::from_toml_str(
            r#"
            [cache]
            backend = "memory"
            ttl_secs = 600

            [scheduler]
            staleness_secs = 300
            "#,
        )
        .unwrap();

        assert_eq!(config.cache.backend, CacheBackendKind::Memory);
        assert_eq!(config.cache.ttl_secs, 600);
        assert_eq!(config.cache.namespace, "what_to_do");
        assert_eq!(config.generators, GeneratorConfig::default());
    }

    #[test]
    fn env_overrides_file_values() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(
            file,
            "[scoring.weights]\nurgency = 0.4\nimportance = 0.3\npersonal_fit = 0.2\ngrowth_value = 0.1"
        )
        .unwrap();

        let config = AgentConfig::load_with_env(
            Some(file.path()),
            env(&[
                ("WTD__CACHE__NAMESPACE", "staging"),
                ("WTD__SCHEDULER__DAILY_HOUR_UTC", "3"),
                ("WTD__PROVIDER__FIXTURES", "true"),
                ("WTD__GENERATORS__REPORT_HOURS_FLOOR", "12.5"),
                ("UNRELATED", "ignored"),
            ]),
        )
        .unwrap();

        assert!((config.scoring.weights.urgency - 0.4).abs() < 1e-9);
        assert_eq!(config.cache.namespace, "staging");
        assert_eq!(config.scheduler.daily_hour_utc, 3);
        assert!(config.provider.fixtures);
        assert!((config.generators.report_hours_floor - 12.5).abs() < 1e-9);
    }

    #[test]
    fn env_override_can_break_validation() {
        let result = AgentConfig::load_with_env(None, env(&[("WTD__SCORING__WEIGHTS__URGENCY", "0.9")]));
        assert!(matches!(result, Err(ConfigError::WeightSum { .. })));
    }

    #[test]
    fn env_seed_users_use_toml_syntax() {
        let config = AgentConfig::load_with_env(
            None,
            env(&[(
                "WTD__SCHEDULER__SEED_USERS",
                r#"[{ user_id = 51, token = "t-51" }, { user_id = 7 }]"#,
            )]),
        )
        .unwrap();

        assert_eq!(config.scheduler.seed_users.len(), 2);
        assert_eq!(config.scheduler.seed_users[0].token, "t-51");
        assert_eq!(config.scheduler.seed_users[1].token, "");
    }

    #[test]
    fn env_override_into_scalar_fails() {
        let result = AgentConfig::load_with_env(
            None,
            env(&[("WTD__CACHE__TTL_SECS", "5"), ("WTD__CACHE__TTL_SECS__INNER", "5")]),
        );
        assert!(matches!(result, Err(ConfigError::InvalidEnv { .. })));
    }

    #[test]
    fn missing_file_reports_path() {
        let result = AgentConfig::load_with_env(Some(Path::new("/nonexistent/wtd.toml")), Vec::new());
        assert!(matches!(result, Err(ConfigError::Io { .. })));
    }

    #[test]
    fn rendered_config_round_trips() {
        let config = AgentConfig::default();
        let text = config.to_toml_string().unwrap();
        assert_eq!(AgentConfig::from_toml_str(&text).unwrap(), config);
    }
}
