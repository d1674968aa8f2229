//! The render collaborator.

use std::future::Future;

use async_trait::async_trait;
use ssr_core::{Extra, PageDescriptor, RenderContext, ResponseAccumulator};

/// Helpers handed to a render operation next to its context.
#[derive(Debug, Clone)]
pub struct RenderHelpers {
    response: ResponseAccumulator,
    extra: Extra,
}

impl RenderHelpers {
    /// Create helpers bound to a response accumulator.
    pub fn new(response: ResponseAccumulator, extra: Extra) -> Self {
        Self { response, extra }
    }

    /// Check whether a redirect has been requested.
    ///
    /// Long renders can poll this to stop early.
    pub fn is_redirect(&self) -> bool {
        self.response.is_redirect()
    }

    /// Get an extra request field.
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.extra.get(key)
    }

    /// Response accumulator shared with the context.
    pub fn response(&self) -> &ResponseAccumulator {
        &self.response
    }
}

/// Framework-specific rendering of one page.
///
/// An operation may request a redirect through the context at any point,
/// including from tasks it spawns, and may never complete afterwards.
#[async_trait]
pub trait RenderOperation: Send + Sync {
    /// Render the page for `ctx`.
    async fn render(&self, ctx: RenderContext, helpers: RenderHelpers) -> anyhow::Result<PageDescriptor>;
}

#[async_trait]
impl<F, Fut> RenderOperation for F
where
    F: Fn(RenderContext, RenderHelpers) -> Fut + Send + Sync,
    Fut: Future<Output = anyhow::Result<PageDescriptor>> + Send + 'static,
{
    async fn render(&self, ctx: RenderContext, helpers: RenderHelpers) -> anyhow::Result<PageDescriptor> {
        (self)(ctx, helpers).await
    }
}

#[cfg(test)]
mod tests {
    use ssr_core::{defer, RequestId};

    use super::*;

    struct StaticPage(&'static str);

    #[async_trait]
    impl RenderOperation for StaticPage {
        async fn render(&self, _ctx: RenderContext, _helpers: RenderHelpers) -> anyhow::Result<PageDescriptor> {
            Ok(PageDescriptor::new().with_body(self.0))
        }
    }

    fn context() -> (RenderContext, RenderHelpers) {
        let (resolver, _promise) = defer();
        let response = ResponseAccumulator::new(resolver);
        let mut extra = Extra::new();
        extra.insert("locale".to_string(), serde_json::json!("en"));
        let ctx = RenderContext::new(
            RequestId::from_string("req-1"),
            "/".parse().unwrap(),
            extra.clone(),
            response.clone(),
        );
        (ctx, RenderHelpers::new(response, extra))
    }

    #[tokio::test]
    async fn test_struct_operation() {
        let (ctx, helpers) = context();

        let page = StaticPage("<p>static</p>").render(ctx, helpers).await.unwrap();

        assert_eq!(page.body, "<p>static</p>");
    }

    #[tokio::test]
    async fn test_closure_operation() {
        let (ctx, helpers) = context();
        let op = |ctx: RenderContext, helpers: RenderHelpers| async move {
            let locale = helpers.extra("locale").and_then(|v| v.as_str()).unwrap_or("?").to_string();
            anyhow::Ok(PageDescriptor::new().with_body(format!("{} {}", ctx.url().path(), locale)))
        };

        let page = op.render(ctx, helpers).await.unwrap();

        assert_eq!(page.body, "/ en");
    }

    #[tokio::test]
    async fn test_helpers_observe_context_redirect() {
        let (ctx, helpers) = context();

        assert!(!helpers.is_redirect());
        ctx.redirect("/login");
        assert!(helpers.is_redirect());
        assert_eq!(helpers.response().snapshot().location(), Some("/login"));
    }
}
