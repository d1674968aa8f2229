//! Public SDK for single-pass server rendering.
//!
//! This crate re-exports all rendering functionality:
//!
//! ```ignore
//! use ssr_sdk::prelude::*;
//!
//! async fn handle(url: &str) -> Result<http::Response<String>, SsrError> {
//!     let orchestrator = RenderOrchestrator::new(RendererConfig::load("ssr.toml")?)?
//!         .with_observer(Arc::new(TracingObserver::new()));
//!
//!     let page = |ctx: RenderContext, _helpers: RenderHelpers| async move {
//!         if ctx.url().path() == "/admin" {
//!             ctx.redirect("/login");
//!         }
//!         ctx.set_initial_state(serde_json::json!({ "path": ctx.url().path() }));
//!         anyhow::Ok(PageDescriptor::new().with_body("<h1>Hello</h1>"))
//!     };
//!
//!     orchestrator
//!         .render(RenderRequest::new(url), &page)
//!         .await?
//!         .into_http_response()
//! }
//! ```

pub use ssr_core;
pub use ssr_document;
pub use ssr_observability;
pub use ssr_render;

/// Prelude for convenient imports.
pub mod prelude {
    pub use ssr_core::*;
    pub use ssr_document::*;
    pub use ssr_observability::*;
    pub use ssr_render::*;
}
