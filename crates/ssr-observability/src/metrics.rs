//! Aggregate render metrics.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};
use ssr_core::{RenderObserver, RenderPhase, RequestId, Resolution, TimingContext};

/// Point-in-time view of collected render metrics.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RenderStats {
    /// Renders that produced a document.
    pub rendered: u64,
    /// Renders short-circuited by a redirect.
    pub redirected: u64,
    /// Renders passed through without rendering.
    pub skipped: u64,
    /// Renders whose operation failed.
    pub failed: u64,
    /// Summed race durations (microseconds).
    pub race_us_total: u64,
    /// Summed render durations (microseconds).
    pub total_us_total: u64,
}

impl RenderStats {
    /// Total number of resolved renders.
    pub fn total(&self) -> u64 {
        self.rendered + self.redirected + self.skipped + self.failed
    }

    /// Mean render duration in microseconds.
    pub fn mean_total_us(&self) -> Option<u64> {
        self.total_us_total.checked_div(self.total())
    }

    /// Format as JSON.
    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    /// Format as human-readable summary.
    pub fn to_summary(&self) -> String {
        let mut lines = vec![format!("Renders: {}", self.total())];

        lines.push(format!("  Rendered: {}", self.rendered));
        lines.push(format!("  Redirected: {}", self.redirected));
        lines.push(format!("  Skipped: {}", self.skipped));
        lines.push(format!("  Failed: {}", self.failed));

        if let Some(mean) = self.mean_total_us() {
            lines.push(format!("  Mean duration: {}us ({:.2}ms)", mean, mean as f64 / 1000.0));
        }

        lines.join("\n")
    }
}

/// Observer counting renders by resolution.
///
/// Shareable across concurrent renders; wrap it in an `Arc` and hand it to
/// the orchestrator.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    rendered: AtomicU64,
    redirected: AtomicU64,
    skipped: AtomicU64,
    failed: AtomicU64,
    race_us_total: AtomicU64,
    total_us_total: AtomicU64,
}

impl MetricsCollector {
    /// Create an empty collector.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one resolved render.
    pub fn record(&self, resolution: Resolution, timing: &TimingContext) {
        let counter = match resolution {
            Resolution::Rendered => &self.rendered,
            Resolution::Redirected => &self.redirected,
            Resolution::Skipped => &self.skipped,
            Resolution::Failed => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);

        if let Some(race) = timing.race_duration() {
            self.race_us_total
                .fetch_add(race.as_micros() as u64, Ordering::Relaxed);
        }
        self.total_us_total
            .fetch_add(timing.elapsed().as_micros() as u64, Ordering::Relaxed);
    }

    /// Current totals.
    pub fn snapshot(&self) -> RenderStats {
        RenderStats {
            rendered: self.rendered.load(Ordering::Relaxed),
            redirected: self.redirected.load(Ordering::Relaxed),
            skipped: self.skipped.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            race_us_total: self.race_us_total.load(Ordering::Relaxed),
            total_us_total: self.total_us_total.load(Ordering::Relaxed),
        }
    }
}

impl RenderObserver for MetricsCollector {
    fn on_phase(&self, _request_id: &RequestId, phase: RenderPhase, timing: &TimingContext) {
        if let RenderPhase::Resolved(resolution) = phase {
            self.record(resolution, timing);
        }
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;

    fn raced_timing() -> TimingContext {
        let mut timing = TimingContext::new();
        timing.mark("race_start");
        std::thread::sleep(Duration::from_millis(1));
        timing.mark("race_settled");
        timing
    }

    // === MetricsCollector Tests ===

    #[test]
    fn test_counts_by_resolution() {
        let collector = MetricsCollector::new();
        let id = RequestId::from_string("r");
        let timing = raced_timing();

        collector.on_phase(&id, RenderPhase::Pending, &timing);
        collector.on_phase(&id, RenderPhase::Raced, &timing);
        collector.on_phase(&id, RenderPhase::Resolved(Resolution::Rendered), &timing);
        collector.on_phase(&id, RenderPhase::Resolved(Resolution::Redirected), &timing);
        collector.on_phase(&id, RenderPhase::Resolved(Resolution::Redirected), &timing);
        collector.on_phase(&id, RenderPhase::Resolved(Resolution::Skipped), &TimingContext::new());

        let stats = collector.snapshot();
        assert_eq!(stats.rendered, 1);
        assert_eq!(stats.redirected, 2);
        assert_eq!(stats.skipped, 1);
        assert_eq!(stats.failed, 0);
        assert_eq!(stats.total(), 4);
        assert!(stats.race_us_total >= 3_000);
    }

    #[test]
    fn test_empty_stats() {
        let stats = MetricsCollector::new().snapshot();

        assert_eq!(stats, RenderStats::default());
        assert_eq!(stats.mean_total_us(), None);
        assert!(!stats.to_summary().contains("Mean duration"));
    }

    // === RenderStats Tests ===

    #[test]
    fn test_stats_formats() {
        let stats = RenderStats {
            rendered: 3,
            redirected: 1,
            skipped: 0,
            failed: 0,
            race_us_total: 400,
            total_us_total: 8_000,
        };

        let json: serde_json::Value = serde_json::from_str(&stats.to_json()).unwrap();
        assert_eq!(json["rendered"], 3);
        assert_eq!(json["total_us_total"], 8_000);

        let summary = stats.to_summary();
        assert!(summary.starts_with("Renders: 4"));
        assert!(summary.contains("Mean duration: 2000us (2.00ms)"));
    }
}
