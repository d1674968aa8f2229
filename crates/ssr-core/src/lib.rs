//! Core abstractions for single-pass server rendering.
//!
//! This crate provides the fundamental types shared by the render pipeline:
//! - `Resolver` / `Promise` - Single-resolution signal used to short-circuit a render
//! - `ResponseAccumulator` - Response metadata built up while rendering
//! - `RenderContext` - Per-render capabilities handed to application code
//! - `RenderRequest` / `RenderOutcome` - Input and terminal result of a render
//! - `Manifest` - Module to asset mapping for dependency preloading
//! - `RenderPhase` - Render lifecycle tracking
//! - `RendererConfig` - Renderer configuration

mod config;
mod context;
mod deferred;
mod error;
mod lifecycle;
mod manifest;
mod page;
mod response;

pub use config::*;
pub use context::*;
pub use deferred::*;
pub use error::*;
pub use lifecycle::*;
pub use manifest::*;
pub use page::*;
pub use response::*;
