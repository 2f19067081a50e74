//! Request telemetry
//!
//! The service hands one [`RequestSample`] per call to a [`TelemetrySink`].
//! [`PerformanceMonitor`] keeps lock-free totals and mirrors them to the
//! `metrics` facade.

use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

/// One served request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestSample {
    pub latency: Duration,
    pub cache_hit: bool,
    pub error: bool,
}

/// Receiver of request samples
pub trait TelemetrySink: Send + Sync + std::fmt::Debug {
    fn record(&self, sample: RequestSample);
}

/// Point-in-time view of the monitor
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct PerformanceSnapshot {
    pub calls: u64,
    pub cache_hits: u64,
    pub cache_misses: u64,
    pub errors: u64,
    /// Hits over calls, 0 when idle
    pub hit_rate: f64,
    /// Errors over calls, 0 when idle
    pub error_rate: f64,
    pub mean_latency_ms: f64,
}

/// Atomic request counters
#[derive(Debug, Default)]
pub struct PerformanceMonitor {
    calls: AtomicU64,
    hits: AtomicU64,
    misses: AtomicU64,
    errors: AtomicU64,
    latency_micros: AtomicU64,
}

impl PerformanceMonitor {
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current totals and rates
    #[must_use]
    pub fn snapshot(&self) -> PerformanceSnapshot {
        let calls = self.calls.load(Ordering::Relaxed);
        let cache_hits = self.hits.load(Ordering::Relaxed);
        let errors = self.errors.load(Ordering::Relaxed);
        let latency_micros = self.latency_micros.load(Ordering::Relaxed);

        let ratio = |n: u64| if calls == 0 { 0.0 } else { n as f64 / calls as f64 };
        PerformanceSnapshot {
            calls,
            cache_hits,
            cache_misses: self.misses.load(Ordering::Relaxed),
            errors,
            hit_rate: ratio(cache_hits),
            error_rate: ratio(errors),
            mean_latency_ms: ratio(latency_micros) / 1000.0,
        }
    }

    /// Zero every counter
    pub fn reset(&self) {
        for counter in [
            &self.calls,
            &self.hits,
            &self.misses,
            &self.errors,
            &self.latency_micros,
        ] {
            counter.store(0, Ordering::Relaxed);
        }
        tracing::info!("performance counters reset");
    }
}

impl TelemetrySink for PerformanceMonitor {
    fn record(&self, sample: RequestSample) {
        let micros = u64::try_from(sample.latency.as_micros()).unwrap_or(u64::MAX);

        self.calls.fetch_add(1, Ordering::Relaxed);
        self.latency_micros.fetch_add(micros, Ordering::Relaxed);
        if sample.cache_hit {
            self.hits.fetch_add(1, Ordering::Relaxed);
        } else {
            self.misses.fetch_add(1, Ordering::Relaxed);
        }
        if sample.error {
            self.errors.fetch_add(1, Ordering::Relaxed);
        }

        let outcome = if sample.cache_hit { "hit" } else { "miss" };
        metrics::counter!("wtd_requests_total", "cache" => outcome).increment(1);
        if sample.error {
            metrics::counter!("wtd_request_errors_total").increment(1);
        }
        metrics::histogram!("wtd_request_latency_seconds").record(sample.latency.as_secs_f64());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(ms: u64, cache_hit: bool, error: bool) -> RequestSample {
        RequestSample {
            latency: Duration::from_millis(ms),
            cache_hit,
            error,
        }
    }

    #[test]
    fn idle_monitor_reports_zero_rates() {
        let snapshot = PerformanceMonitor::new().snapshot();
        assert_eq!(snapshot, PerformanceSnapshot::default());
    }

    #[test]
    fn rates_and_mean_latency() {
        let monitor = PerformanceMonitor::new();
        monitor.record(sample(10, true, false));
        monitor.record(sample(30, false, false));
        monitor.record(sample(50, false, true));
        monitor.record(sample(30, true, false));

        let snapshot = monitor.snapshot();
        assert_eq!(snapshot.calls, 4);
        assert_eq!(snapshot.cache_hits, 2);
        assert_eq!(snapshot.cache_misses, 2);
        assert!((snapshot.hit_rate - 0.5).abs() < 1e-9);
        assert!((snapshot.error_rate - 0.25).abs() < 1e-9);
        assert!((snapshot.mean_latency_ms - 30.0).abs() < 1e-9);
    }

    #[test]
    fn reset_clears_totals() {
        let monitor = PerformanceMonitor::new();
        monitor.record(sample(5, true, true));
        monitor.reset();
        assert_eq!(monitor.snapshot().calls, 0);
    }
}
