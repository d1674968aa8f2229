//! Observability for server rendering.
//!
//! This crate provides:
//! - `init_logging` - Global `tracing` subscriber with JSON or human output
//! - `TracingObserver` - Render lifecycle events as `tracing` events
//! - `MetricsCollector` - Render counts and durations by resolution

mod logging;
mod metrics;
mod observer;

pub use logging::*;
pub use metrics::*;
pub use observer::*;

// Re-export lifecycle types from ssr-core for convenience
pub use ssr_core::{RenderObserver, RenderPhase, RequestId, Resolution, TimingContext};
