//! Page parts produced by a render and the terminal render result.

use serde::{Deserialize, Serialize};

use crate::error::SsrError;
use crate::response::ResponseMeta;

/// Page parts returned by a render operation.
///
/// Every field is optional in spirit and defaults to empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct PageDescriptor {
    /// Markup placed inside the mount container.
    pub body: String,
    /// Tags inserted before `</head>`.
    pub head_tags: String,
    /// Attributes added to the `<html>` tag.
    pub html_attrs: String,
    /// Attributes added to the `<body>` tag.
    pub body_attrs: String,
    /// Asset files the page depends on.
    pub dependencies: Vec<String>,
}

impl PageDescriptor {
    /// Create an empty page descriptor.
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the body markup.
    pub fn with_body(mut self, body: impl Into<String>) -> Self {
        self.body = body.into();
        self
    }

    /// Set the head tags.
    pub fn with_head_tags(mut self, tags: impl Into<String>) -> Self {
        self.head_tags = tags.into();
        self
    }

    /// Set the `<html>` attributes.
    pub fn with_html_attrs(mut self, attrs: impl Into<String>) -> Self {
        self.html_attrs = attrs.into();
        self
    }

    /// Set the `<body>` attributes.
    pub fn with_body_attrs(mut self, attrs: impl Into<String>) -> Self {
        self.body_attrs = attrs.into();
        self
    }

    /// Add a dependency file.
    pub fn with_dependency(mut self, file: impl Into<String>) -> Self {
        self.dependencies.push(file.into());
        self
    }
}

/// Fully merged result of a completed (non-redirect) render.
///
/// The union is built in a fixed order:
/// 1. `page` starts from the render operation's descriptor; when a manifest
///    is supplied its `dependencies` are replaced by the resolved files and
///    preload links are prepended to `head_tags`.
/// 2. `initial_state` is the encoded application state.
/// 3. `html` is the assembled document.
/// 4. `response` is the accumulated metadata, which alone decides status
///    and headers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedDocument {
    /// The final HTML document.
    pub html: String,
    /// Encoded initial state embedded in the document.
    pub initial_state: String,
    /// Page parts used to build the document.
    #[serde(flatten)]
    pub page: PageDescriptor,
    /// Response metadata written during the render.
    #[serde(flatten)]
    pub response: ResponseMeta,
}

impl RenderedDocument {
    /// Merge the render results into a document.
    pub fn new(
        html: String,
        initial_state: String,
        page: PageDescriptor,
        response: ResponseMeta,
    ) -> Self {
        Self {
            html,
            initial_state,
            page,
            response,
        }
    }

    /// Document for a skipped render: the template passes through as-is.
    pub fn passthrough(template: impl Into<String>) -> Self {
        Self::new(
            template.into(),
            String::new(),
            PageDescriptor::default(),
            ResponseMeta::default(),
        )
    }

    /// Effective status code (200 unless the application set one).
    pub fn status(&self) -> u16 {
        self.response.status.unwrap_or(200)
    }
}

/// Terminal outcome of a render: exactly one of document or redirect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The render completed and produced a document.
    Document(RenderedDocument),
    /// The render was short-circuited; only response metadata remains.
    Redirect(ResponseMeta),
}

impl RenderOutcome {
    /// Check if this outcome is a redirect.
    pub fn is_redirect(&self) -> bool {
        matches!(self, Self::Redirect(_))
    }

    /// Get the document, if the render completed.
    pub fn document(&self) -> Option<&RenderedDocument> {
        match self {
            Self::Document(doc) => Some(doc),
            Self::Redirect(_) => None,
        }
    }

    /// Get the response metadata of either variant.
    pub fn response(&self) -> &ResponseMeta {
        match self {
            Self::Document(doc) => &doc.response,
            Self::Redirect(meta) => meta,
        }
    }

    /// Convert into an HTTP response.
    ///
    /// Documents get a `text/html` content type unless the application set
    /// one; redirects carry an empty body.
    pub fn into_http_response(self) -> Result<http::Response<String>, SsrError> {
        let (meta, body, default_status) = match self {
            Self::Document(doc) => (doc.response, doc.html, 200),
            Self::Redirect(meta) => (meta, String::new(), 302),
        };

        let mut builder = http::Response::builder().status(meta.status.unwrap_or(default_status));

        let headers = meta.headers.unwrap_or_default();
        let has_content_type = headers
            .keys()
            .any(|name| name.eq_ignore_ascii_case("content-type"));
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if !has_content_type && !body.is_empty() {
            builder = builder.header(http::header::CONTENT_TYPE, "text/html; charset=utf-8");
        }

        Ok(builder.body(body)?)
    }
}
