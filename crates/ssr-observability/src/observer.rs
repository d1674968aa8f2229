//! Lifecycle observer that reports through `tracing`.

use ssr_core::{RenderObserver, RenderPhase, RequestId, Resolution, TimingContext};

/// Emits one `tracing` event per render phase.
///
/// Resolved phases carry the race and total durations in microseconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl TracingObserver {
    /// Create a tracing observer.
    pub fn new() -> Self {
        Self
    }
}

impl RenderObserver for TracingObserver {
    fn on_phase(&self, request_id: &RequestId, phase: RenderPhase, timing: &TimingContext) {
        match phase {
            RenderPhase::Pending => {
                tracing::trace!(request_id = %request_id, "render pending");
            }
            RenderPhase::Raced => {
                tracing::debug!(request_id = %request_id, "render racing redirect signal");
            }
            RenderPhase::Resolved(resolution) => {
                let race_us = timing.race_duration().map(|d| d.as_micros() as u64);
                let total_us = timing.elapsed().as_micros() as u64;

                if resolution == Resolution::Failed {
                    tracing::warn!(
                        request_id = %request_id,
                        resolution = %resolution,
                        race_us,
                        total_us,
                        "render resolved"
                    );
                } else {
                    tracing::info!(
                        request_id = %request_id,
                        resolution = %resolution,
                        race_us,
                        total_us,
                        "render resolved"
                    );
                }
            }
        }
    }
}
