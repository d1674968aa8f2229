//! Render request and the per-render context handed to application code.

use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use http::Uri;

use crate::error::SsrError;
use crate::manifest::Manifest;
use crate::response::{ResponseAccumulator, ResponseMeta};

/// Extra request fields passed through to the render operation.
pub type Extra = HashMap<String, serde_json::Value>;

/// Cleanup callback registered by a render operation.
pub type CleanupFn = Box<dyn FnOnce() + Send>;

/// Unique render identifier for tracing.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RequestId(pub String);

impl RequestId {
    /// Generate a new request ID.
    pub fn generate() -> Self {
        static COUNTER: AtomicU64 = AtomicU64::new(0);

        let nanos = std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let seq = COUNTER.fetch_add(1, Ordering::Relaxed);
        Self(format!("{:x}-{:x}", nanos, seq))
    }

    /// Create from an existing ID string.
    pub fn from_string(id: impl Into<String>) -> Self {
        Self(id.into())
    }
}

impl fmt::Display for RequestId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Input of a single render. Immutable once handed to the orchestrator.
#[derive(Debug, Clone, Default)]
pub struct RenderRequest {
    /// Requested URL (absolute, or a path such as `/about?tab=1`).
    pub url: String,
    /// HTML template; falls back to the configured template.
    pub template: Option<String>,
    /// Client manifest for dependency resolution.
    pub manifest: Option<Arc<Manifest>>,
    /// Prepend preload links for resolved dependencies.
    pub preload: bool,
    /// Pass the template through without rendering.
    pub skip: bool,
    /// Extra fields for the render operation.
    pub extra: Extra,
}

impl RenderRequest {
    /// Create a request for `url`.
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Default::default()
        }
    }

    /// Set the HTML template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }

    /// Set the shared manifest.
    pub fn with_manifest(mut self, manifest: Arc<Manifest>) -> Self {
        self.manifest = Some(manifest);
        self
    }

    /// Enable or disable dependency preloading.
    pub fn with_preload(mut self, enabled: bool) -> Self {
        self.preload = enabled;
        self
    }

    /// Enable or disable template passthrough.
    pub fn with_skip(mut self, skip: bool) -> Self {
        self.skip = skip;
        self
    }

    /// Add an extra field.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra.insert(key.into(), value);
        self
    }

    /// Parse the URL. Bare paths are accepted as-is.
    pub fn parse_url(&self) -> Result<Uri, SsrError> {
        let url = if self.url.is_empty() { "/" } else { self.url.as_str() };
        url.parse::<Uri>().map_err(|e| SsrError::InvalidUrl {
            url: self.url.clone(),
            reason: e.to_string(),
        })
    }
}

/// Per-render capabilities handed to the render operation.
///
/// Cloning is cheap and every clone refers to the same render. A context is
/// owned by exactly one render invocation and discarded afterwards.
#[derive(Clone)]
pub struct RenderContext {
    inner: Arc<ContextInner>,
}

struct ContextInner {
    request_id: RequestId,
    url: Uri,
    extra: Extra,
    response: ResponseAccumulator,
    initial_state: Mutex<serde_json::Value>,
    modules: Mutex<Vec<String>>,
    cleanups: Mutex<Vec<CleanupFn>>,
}

impl RenderContext {
    /// Create a context bound to `response`.
    pub fn new(request_id: RequestId, url: Uri, extra: Extra, response: ResponseAccumulator) -> Self {
        Self {
            inner: Arc::new(ContextInner {
                request_id,
                url,
                extra,
                response,
                initial_state: Mutex::new(serde_json::Value::Object(Default::default())),
                modules: Mutex::new(Vec::new()),
                cleanups: Mutex::new(Vec::new()),
            }),
        }
    }

    /// Render identifier.
    pub fn request_id(&self) -> &RequestId {
        &self.inner.request_id
    }

    /// Requested URL.
    pub fn url(&self) -> &Uri {
        &self.inner.url
    }

    /// Always `false`: contexts built here run on the server.
    pub fn is_client(&self) -> bool {
        false
    }

    /// Get an extra request field.
    pub fn extra(&self, key: &str) -> Option<&serde_json::Value> {
        self.inner.extra.get(key)
    }

    /// All extra request fields.
    pub fn extras(&self) -> &Extra {
        &self.inner.extra
    }

    /// Redirect to `location` with a 302 status.
    pub fn redirect(&self, location: impl Into<String>) {
        self.inner.response.redirect(location);
    }

    /// Redirect to `location` with an explicit status.
    pub fn redirect_with_status(&self, location: impl Into<String>, status: u16) {
        self.inner.response.redirect_with_status(location, status);
    }

    /// Merge response metadata (status, status text, headers).
    pub fn write_response(&self, partial: ResponseMeta) {
        self.inner.response.write_response(partial);
    }

    /// Check whether a redirect has been requested.
    pub fn is_redirect(&self) -> bool {
        self.inner.response.is_redirect()
    }

    /// Response accumulator backing this context.
    pub fn response(&self) -> &ResponseAccumulator {
        &self.inner.response
    }

    /// Replace the initial state.
    pub fn set_initial_state(&self, state: serde_json::Value) {
        *self.lock_state() = state;
    }

    /// Modify the initial state in place.
    pub fn update_initial_state<F>(&self, update: F)
    where
        F: FnOnce(&mut serde_json::Value),
    {
        update(&mut *self.lock_state());
    }

    /// Copy of the current initial state.
    pub fn initial_state(&self) -> serde_json::Value {
        self.lock_state().clone()
    }

    /// Record a module rendered on this page, for dependency resolution.
    pub fn register_module(&self, module: impl Into<String>) {
        self.inner
            .modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(module.into());
    }

    /// Modules registered so far, in registration order.
    pub fn modules(&self) -> Vec<String> {
        self.inner
            .modules
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Register a callback to run once the render pass has settled.
    ///
    /// Callbacks run on both the normal and the redirect path.
    pub fn on_cleanup<F>(&self, callback: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.inner
            .cleanups
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Box::new(callback));
    }

    /// Run and clear registered cleanup callbacks, in registration order.
    ///
    /// Returns how many callbacks ran.
    pub fn run_cleanups(&self) -> usize {
        let callbacks = std::mem::take(
            &mut *self
                .inner
                .cleanups
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        );
        let count = callbacks.len();
        for callback in callbacks {
            callback();
        }
        count
    }

    fn lock_state(&self) -> std::sync::MutexGuard<'_, serde_json::Value> {
        self.inner
            .initial_state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }
}

impl fmt::Debug for RenderContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RenderContext")
            .field("request_id", &self.inner.request_id)
            .field("url", &self.inner.url)
            .field("response", &self.inner.response.snapshot())
            .finish_non_exhaustive()
    }
}
