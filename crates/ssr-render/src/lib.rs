//! Render orchestration for single-pass server rendering.
//!
//! This crate coordinates one render pass:
//! - `RenderOperation` - The framework-specific render collaborator
//! - `race` - First-settled-wins between the render and a redirect
//! - `RenderOrchestrator` - Runs the race and assembles the final result

mod operation;
mod orchestrator;
mod race;

pub use operation::*;
pub use orchestrator::*;
pub use race::*;
