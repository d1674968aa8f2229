//! Response metadata accumulated while rendering.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{Deserialize, Serialize};

use crate::deferred::Resolver;

/// HTTP response headers.
pub type Headers = HashMap<String, String>;

/// Default status used by [`ResponseAccumulator::redirect`].
pub const DEFAULT_REDIRECT_STATUS: u16 = 302;

/// Check whether a status code is a redirect (`300..=399`).
pub fn is_redirect_status(status: Option<u16>) -> bool {
    matches!(status, Some(300..=399))
}

/// Response metadata written by application code during a render.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResponseMeta {
    /// HTTP status code.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    /// HTTP status text.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status_text: Option<String>,
    /// Response headers.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub headers: Option<Headers>,
}

impl ResponseMeta {
    /// Create empty response metadata.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create redirect metadata pointing at `location`.
    pub fn redirect(location: impl Into<String>, status: u16) -> Self {
        Self::new()
            .with_header("location", location)
            .with_status(status)
    }

    /// Set the status code.
    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    /// Set the status text.
    pub fn with_status_text(mut self, text: impl Into<String>) -> Self {
        self.status_text = Some(text.into());
        self
    }

    /// Add a single header.
    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers
            .get_or_insert_with(HashMap::new)
            .insert(name.into(), value.into());
        self
    }

    /// Replace the header map.
    pub fn with_headers(mut self, headers: Headers) -> Self {
        self.headers = Some(headers);
        self
    }

    /// Shallow-merge `partial` into `self`.
    ///
    /// Fields are applied in declaration order and every field set on
    /// `partial` replaces the current one. `headers` is replaced wholesale,
    /// never merged key by key.
    pub fn merge(&mut self, partial: ResponseMeta) {
        if let Some(status) = partial.status {
            self.status = Some(status);
        }
        if let Some(status_text) = partial.status_text {
            self.status_text = Some(status_text);
        }
        if let Some(headers) = partial.headers {
            self.headers = Some(headers);
        }
    }

    /// Check whether the status code is a redirect.
    pub fn is_redirect(&self) -> bool {
        is_redirect_status(self.status)
    }

    /// Get a header value by name (case-insensitive).
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers.as_ref().and_then(|headers| {
            headers
                .iter()
                .find(|(k, _)| k.eq_ignore_ascii_case(name))
                .map(|(_, v)| v.as_str())
        })
    }

    /// Get the redirect target, if any.
    pub fn location(&self) -> Option<&str> {
        self.header("location")
    }

    /// Check whether nothing has been written.
    pub fn is_empty(&self) -> bool {
        self.status.is_none() && self.status_text.is_none() && self.headers.is_none()
    }
}

/// Shared, incrementally built response metadata for one render.
///
/// Bound to the resolver of the render's short-circuit signal: the write
/// that turns the merged status into a redirect resolves the signal before
/// returning, so a redirect is observable as soon as it is decided.
#[derive(Debug, Clone)]
pub struct ResponseAccumulator {
    state: Arc<Mutex<ResponseMeta>>,
    signal: Resolver<ResponseMeta>,
}

impl ResponseAccumulator {
    /// Create an empty accumulator bound to `signal`.
    pub fn new(signal: Resolver<ResponseMeta>) -> Self {
        Self {
            state: Arc::new(Mutex::new(ResponseMeta::default())),
            signal,
        }
    }

    /// Merge `partial` into the accumulated metadata.
    pub fn write_response(&self, partial: ResponseMeta) {
        let redirect = {
            let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
            state.merge(partial);
            state.is_redirect().then(|| state.clone())
        };

        if let Some(snapshot) = redirect {
            let location = snapshot.location().unwrap_or_default().to_string();
            if self.signal.resolve(snapshot) {
                tracing::debug!(location = %location, "redirect requested during render");
            }
        }
    }

    /// Redirect to `location` with a 302 status.
    pub fn redirect(&self, location: impl Into<String>) {
        self.redirect_with_status(location, DEFAULT_REDIRECT_STATUS);
    }

    /// Redirect to `location` with an explicit status.
    pub fn redirect_with_status(&self, location: impl Into<String>, status: u16) {
        self.write_response(ResponseMeta::redirect(location, status));
    }

    /// Check whether the accumulated status is currently a redirect.
    pub fn is_redirect(&self) -> bool {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .is_redirect()
    }

    /// Copy of the accumulated metadata.
    pub fn snapshot(&self) -> ResponseMeta {
        self.state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[cfg(test)]
mod tests {
    use std::io;

    use futures::FutureExt;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::deferred::defer;

    #[derive(Clone, Default)]
    struct LogBuffer(Arc<Mutex<Vec<u8>>>);

    impl LogBuffer {
        fn contents(&self) -> String {
            String::from_utf8_lossy(&self.0.lock().unwrap()).into_owned()
        }
    }

    impl io::Write for LogBuffer {
        fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
            self.0.lock().unwrap().extend_from_slice(buf);
            Ok(buf.len())
        }

        fn flush(&mut self) -> io::Result<()> {
            Ok(())
        }
    }

    impl<'a> MakeWriter<'a> for LogBuffer {
        type Writer = LogBuffer;

        fn make_writer(&'a self) -> Self::Writer {
            self.clone()
        }
    }

    // === ResponseMeta Tests ===

    #[test]
    fn test_is_redirect_status_bounds() {
        assert!(!is_redirect_status(None));
        assert!(!is_redirect_status(Some(299)));
        assert!(is_redirect_status(Some(300)));
        assert!(is_redirect_status(Some(302)));
        assert!(is_redirect_status(Some(399)));
        assert!(!is_redirect_status(Some(400)));
    }

    #[test]
    fn test_merge_last_write_wins() {
        let mut meta = ResponseMeta::new().with_status(200).with_status_text("OK");
        meta.merge(ResponseMeta::new().with_status(404));

        assert_eq!(meta.status, Some(404));
        assert_eq!(meta.status_text.as_deref(), Some("OK"));
    }

    #[test]
    fn test_merge_replaces_headers_wholesale() {
        let mut meta = ResponseMeta::new()
            .with_header("x-one", "1")
            .with_header("x-two", "2");
        meta.merge(ResponseMeta::new().with_header("x-three", "3"));

        let headers = meta.headers.unwrap();
        assert_eq!(headers.len(), 1);
        assert_eq!(headers.get("x-three").map(String::as_str), Some("3"));
    }

    #[test]
    fn test_redirect_constructor() {
        let meta = ResponseMeta::redirect("/login", 301);

        assert_eq!(meta.status, Some(301));
        assert_eq!(meta.location(), Some("/login"));
        assert!(meta.is_redirect());
    }

    #[test]
    fn test_header_lookup_ignores_case() {
        let meta = ResponseMeta::new().with_header("Location", "/a");

        assert_eq!(meta.header("location"), Some("/a"));
    }

    #[test]
    fn test_serializes_camel_case_without_empty_fields() {
        let meta = ResponseMeta::new().with_status(404).with_status_text("Not Found");
        let json = serde_json::to_value(&meta).unwrap();

        assert_eq!(
            json,
            serde_json::json!({"status": 404, "statusText": "Not Found"})
        );
    }

    // === ResponseAccumulator Tests ===

    #[test]
    fn test_accumulator_non_redirect_does_not_resolve() {
        let (resolver, promise) = defer();
        let response = ResponseAccumulator::new(resolver);

        response.write_response(ResponseMeta::new().with_status(404));

        assert!(!response.is_redirect());
        assert!(promise.now_or_never().is_none());
    }

    #[test]
    fn test_accumulator_redirect_resolves_signal_synchronously() {
        let (resolver, promise) = defer();
        let response = ResponseAccumulator::new(resolver);

        response.redirect("/foo");

        assert!(response.is_redirect());
        let settled = promise.now_or_never().expect("signal resolved in the same call");
        assert_eq!(settled.status, Some(302));
        assert_eq!(settled.location(), Some("/foo"));
    }

    #[test]
    fn test_accumulator_redirect_from_merged_state() {
        let (resolver, promise) = defer();
        let response = ResponseAccumulator::new(resolver);

        response.write_response(ResponseMeta::new().with_header("location", "/bar"));
        response.write_response(ResponseMeta::new().with_status(307));

        let settled = promise.now_or_never().unwrap();
        assert_eq!(settled.status, Some(307));
        assert_eq!(settled.location(), Some("/bar"));
    }

    #[test]
    fn test_accumulator_first_redirect_is_signalled() {
        let (resolver, promise) = defer();
        let response = ResponseAccumulator::new(resolver);

        response.redirect_with_status("/first", 301);
        response.redirect("/second");

        assert_eq!(promise.now_or_never().unwrap().location(), Some("/first"));
        assert_eq!(response.snapshot().location(), Some("/second"));
    }

    #[test]
    fn test_accumulator_logs_signalled_location() {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::DEBUG)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();

        tracing::subscriber::with_default(subscriber, || {
            let (resolver, _promise) = defer();
            let response = ResponseAccumulator::new(resolver);

            response.redirect("/first");
            response.redirect("/second");
        });

        let output = logs.contents();
        assert_eq!(output.matches("redirect requested during render").count(), 1);
        assert!(output.contains("location=/first"));
        assert!(!output.contains("location=/second"));
    }

    #[test]
    fn test_accumulator_clones_share_state() {
        let (resolver, _promise) = defer();
        let response = ResponseAccumulator::new(resolver);
        let handle = response.clone();

        handle.write_response(ResponseMeta::new().with_status(201));

        assert_eq!(response.snapshot().status, Some(201));
    }

    #[test]
    fn test_is_redirect_is_side_effect_free() {
        let (resolver, _promise) = defer();
        let response = ResponseAccumulator::new(resolver);

        assert!(!response.is_redirect());
        assert!(!response.is_redirect());
        assert!(response.snapshot().is_empty());
    }
}
