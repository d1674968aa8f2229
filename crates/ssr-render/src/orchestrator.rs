//! Render orchestration.

use std::sync::Arc;

use ssr_core::{
    defer, RenderContext, RenderObserver, RenderOutcome, RenderPhase, RenderRequest,
    RenderedDocument, RendererConfig, RequestId, Resolution, ResponseAccumulator, SsrError,
    TimingContext,
};
use ssr_document::{render_preload_links, DocumentAssembler, JsonStateCodec, StateCodec};
use tracing::Instrument;

use crate::operation::{RenderHelpers, RenderOperation};
use crate::race::{race, RaceWinner};

/// Runs render operations and turns their results into documents or
/// redirects.
///
/// One orchestrator serves any number of concurrent renders; every call to
/// [`render`](Self::render) gets its own signal, accumulator and context.
pub struct RenderOrchestrator {
    config: RendererConfig,
    assembler: DocumentAssembler,
    codec: Arc<dyn StateCodec>,
    observer: Option<Arc<dyn RenderObserver>>,
}

impl RenderOrchestrator {
    /// Create an orchestrator from validated configuration.
    pub fn new(config: RendererConfig) -> Result<Self, SsrError> {
        config.validate()?;
        let assembler = DocumentAssembler::from_config(&config)?;

        Ok(Self {
            config,
            assembler,
            codec: Arc::new(JsonStateCodec),
            observer: None,
        })
    }

    /// Replace the initial-state codec.
    pub fn with_codec(mut self, codec: impl StateCodec + 'static) -> Self {
        self.codec = Arc::new(codec);
        self
    }

    /// Attach a lifecycle observer.
    pub fn with_observer(mut self, observer: Arc<dyn RenderObserver>) -> Self {
        self.observer = Some(observer);
        self
    }

    /// Renderer configuration.
    pub fn config(&self) -> &RendererConfig {
        &self.config
    }

    /// Initial-state codec.
    pub fn codec(&self) -> &dyn StateCodec {
        self.codec.as_ref()
    }

    /// Render one request.
    ///
    /// Resolves to a redirect as soon as the operation requests one, even if
    /// the operation never completes. Otherwise the operation's page is
    /// assembled into the request template (or the configured one). An
    /// operation error is returned as [`SsrError::Render`] unless a redirect
    /// was requested first.
    pub async fn render<R>(&self, request: RenderRequest, operation: &R) -> Result<RenderOutcome, SsrError>
    where
        R: RenderOperation + ?Sized,
    {
        let request_id = RequestId::generate();
        let span = tracing::info_span!("render", request_id = %request_id, url = %request.url);

        self.run(request_id, request, operation).instrument(span).await
    }

    async fn run<R>(
        &self,
        request_id: RequestId,
        request: RenderRequest,
        operation: &R,
    ) -> Result<RenderOutcome, SsrError>
    where
        R: RenderOperation + ?Sized,
    {
        let mut pass = RenderPass::new(request_id, self.observer.clone());
        let template = request
            .template
            .as_deref()
            .unwrap_or_else(|| self.config.template_or_placeholder());

        if request.skip {
            pass.advance(RenderPhase::Resolved(Resolution::Skipped));
            return Ok(RenderOutcome::Document(RenderedDocument::passthrough(template)));
        }

        let url = request.parse_url()?;
        let (resolver, signal) = defer();
        let response = ResponseAccumulator::new(resolver);
        let context = RenderContext::new(
            pass.request_id.clone(),
            url,
            request.extra.clone(),
            response.clone(),
        );
        let helpers = RenderHelpers::new(response.clone(), request.extra.clone());

        pass.advance(RenderPhase::Raced);
        let winner = race(operation.render(context.clone(), helpers), signal).await;
        pass.timing.mark("race_settled");

        let cleaned = context.run_cleanups();
        if cleaned > 0 {
            tracing::debug!(callbacks = cleaned, "ran render cleanups");
        }

        // A redirect beats whatever the render produced, errors included.
        if response.is_redirect() {
            pass.advance(RenderPhase::Resolved(Resolution::Redirected));
            return Ok(RenderOutcome::Redirect(response.snapshot()));
        }

        let mut page = match winner {
            RaceWinner::Rendered(Ok(page)) => page,
            RaceWinner::Rendered(Err(err)) => {
                tracing::error!(error = %err, "render operation failed");
                pass.advance(RenderPhase::Resolved(Resolution::Failed));
                return Err(SsrError::Render(err));
            }
            RaceWinner::Redirected(meta) => {
                // The status was overwritten after the signal fired, and the
                // render is already gone. The signalled metadata is always a
                // redirect, so it stands.
                tracing::warn!(
                    location = meta.location().unwrap_or_default(),
                    "redirect withdrawn after it short-circuited the render"
                );
                pass.advance(RenderPhase::Resolved(Resolution::Redirected));
                return Ok(RenderOutcome::Redirect(meta));
            }
        };

        let initial_state = self.codec.encode(&context.initial_state());

        if let Some(manifest) = &request.manifest {
            let modules = context.modules();
            page.dependencies = manifest.resolve_dependencies(modules.as_slice());

            if request.preload && !page.dependencies.is_empty() {
                let links = render_preload_links(page.dependencies.as_slice());
                page.head_tags.insert_str(0, &links);
            }
        }

        let html = self.assembler.assemble(template, &page, &initial_state);
        pass.timing.mark("assembled");
        pass.advance(RenderPhase::Resolved(Resolution::Rendered));

        Ok(RenderOutcome::Document(RenderedDocument::new(
            html,
            initial_state,
            page,
            response.snapshot(),
        )))
    }
}

impl std::fmt::Debug for RenderOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderOrchestrator")
            .field("config", &self.config)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

/// Phase tracking for a single render invocation.
struct RenderPass {
    request_id: RequestId,
    phase: RenderPhase,
    timing: TimingContext,
    observer: Option<Arc<dyn RenderObserver>>,
}

impl RenderPass {
    fn new(request_id: RequestId, observer: Option<Arc<dyn RenderObserver>>) -> Self {
        let pass = Self {
            request_id,
            phase: RenderPhase::Pending,
            timing: TimingContext::new(),
            observer,
        };
        pass.notify();
        pass
    }

    fn advance(&mut self, next: RenderPhase) {
        debug_assert!(
            self.phase.can_advance_to(&next),
            "illegal render phase transition {:?} -> {:?}",
            self.phase,
            next
        );

        match next {
            RenderPhase::Raced => self.timing.mark("race_start"),
            RenderPhase::Resolved(_) => self.timing.mark("resolved"),
            RenderPhase::Pending => {}
        }

        tracing::trace!(from = ?self.phase, to = ?next, "render phase");
        self.phase = next;
        self.notify();
    }

    fn notify(&self) {
        if let Some(observer) = &self.observer {
            observer.on_phase(&self.request_id, self.phase, &self.timing);
        }
    }
}
