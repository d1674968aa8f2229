//! Render lifecycle tracking.

use std::collections::HashMap;
use std::fmt;
use std::time::{Duration, Instant};

use crate::context::RequestId;

/// How a render pass ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Resolution {
    /// The template was passed through without rendering.
    Skipped,
    /// The render operation completed and a document was assembled.
    Rendered,
    /// A redirect short-circuited the render.
    Redirected,
    /// The render operation returned an error.
    Failed,
}

impl Resolution {
    /// Get the name of this resolution.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Skipped => "skipped",
            Self::Rendered => "rendered",
            Self::Redirected => "redirected",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for Resolution {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Lifecycle phases of a single render pass.
///
/// Phases only move forward: `Pending -> Raced -> Resolved`, or straight
/// from `Pending` to `Resolved(Skipped)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RenderPhase {
    /// Render invoked, nothing started yet.
    Pending,
    /// The render operation and the redirect signal are racing.
    Raced,
    /// The race settled (or was skipped).
    Resolved(Resolution),
}

impl RenderPhase {
    /// Check whether `next` is a legal successor of this phase.
    pub fn can_advance_to(&self, next: &RenderPhase) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::Raced)
                | (Self::Pending, Self::Resolved(Resolution::Skipped))
                | (Self::Raced, Self::Resolved(Resolution::Rendered))
                | (Self::Raced, Self::Resolved(Resolution::Redirected))
                | (Self::Raced, Self::Resolved(Resolution::Failed))
        )
    }

    /// Check whether this is the terminal phase.
    pub fn is_resolved(&self) -> bool {
        matches!(self, Self::Resolved(_))
    }
}

/// Timing context for observability.
#[derive(Debug, Clone)]
pub struct TimingContext {
    start: Instant,
    marks: HashMap<String, Instant>,
}

impl TimingContext {
    /// Create a new timing context.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            marks: HashMap::new(),
        }
    }

    /// Record a timing mark.
    pub fn mark(&mut self, name: &str) {
        self.marks.insert(name.to_string(), Instant::now());
    }

    /// Get elapsed time since start.
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Time from start to a named mark.
    pub fn time_to(&self, name: &str) -> Option<Duration> {
        self.marks.get(name).map(|t| t.duration_since(self.start))
    }

    /// Time between two named marks.
    pub fn between(&self, from: &str, to: &str) -> Option<Duration> {
        let from = self.marks.get(from)?;
        let to = self.marks.get(to)?;
        Some(to.saturating_duration_since(*from))
    }

    /// Time spent racing the render against the redirect signal.
    pub fn race_duration(&self) -> Option<Duration> {
        self.between("race_start", "race_settled")
    }
}

impl Default for TimingContext {
    fn default() -> Self {
        Self::new()
    }
}

/// Observer trait for render lifecycle events.
pub trait RenderObserver: Send + Sync {
    /// Called on every phase transition.
    fn on_phase(&self, request_id: &RequestId, phase: RenderPhase, timing: &TimingContext);
}
