//! Structural substitution of render results into the HTML template.

use regex::{Captures, Regex};
use ssr_core::{PageDescriptor, RendererConfig, SsrError};

use crate::state::EMPTY_STATE;

/// Attribute marking a mount container whose content was rendered on the
/// server.
pub const SERVER_RENDERED_ATTR: &str = r#"data-server-rendered="true""#;

/// Stitches page parts into an HTML template.
///
/// Only the `<html>`/`<body>` opening tags, the first `</head>` and the
/// empty mount container are rewritten; everything else in the template is
/// left byte-for-byte intact, and `body` is inserted verbatim.
#[derive(Debug, Clone)]
pub struct DocumentAssembler {
    container_id: String,
    state_variable: String,
    dev_mode: bool,
    container: Regex,
}

impl DocumentAssembler {
    /// Create an assembler for the given mount container and state variable.
    pub fn new(
        container_id: impl Into<String>,
        state_variable: impl Into<String>,
        dev_mode: bool,
    ) -> Result<Self, SsrError> {
        let container_id = container_id.into();
        let pattern = format!(
            r#"<div id="{}"([\s\w\-"'=\[\]]*)></div>"#,
            regex::escape(&container_id)
        );
        let container = Regex::new(&pattern)
            .map_err(|e| SsrError::Config(format!("mount container pattern: {}", e)))?;

        Ok(Self {
            container_id,
            state_variable: state_variable.into(),
            dev_mode,
            container,
        })
    }

    /// Create an assembler from renderer configuration.
    pub fn from_config(config: &RendererConfig) -> Result<Self, SsrError> {
        Self::new(
            config.container_id.as_str(),
            config.state_variable.as_str(),
            config.dev_mode,
        )
    }

    /// Mount container id.
    pub fn container_id(&self) -> &str {
        &self.container_id
    }

    /// Assemble the final document.
    ///
    /// An empty `initial_state` is embedded as `{}`. If the template has no
    /// mount container the container step is a no-op; in development mode
    /// that also logs a warning.
    pub fn assemble(&self, template: &str, page: &PageDescriptor, initial_state: &str) -> String {
        if self.dev_mode && !template.contains(&format!(r#"id="{}""#, self.container_id)) {
            tracing::warn!(
                container_id = %self.container_id,
                "mount container was not found in the HTML template"
            );
        }

        let mut html = template.to_string();

        if !page.html_attrs.is_empty() {
            html = html.replacen("<html", &format!("<html {} ", page.html_attrs), 1);
        }

        if !page.body_attrs.is_empty() {
            html = html.replacen("<body", &format!("<body {} ", page.body_attrs), 1);
        }

        if !page.head_tags.is_empty() {
            html = html.replacen("</head>", &format!("{}</head>", page.head_tags), 1);
        }

        let state = if initial_state.is_empty() {
            EMPTY_STATE
        } else {
            initial_state
        };

        // The closure's output is used literally, so `$1`-like sequences in
        // the body or state are never expanded.
        self.container
            .replacen(&html, 1, |caps: &Captures| {
                format!(
                    r#"<div id="{id}" {marker}{attrs}>{body}</div><script>window.{var}={state}</script>"#,
                    id = self.container_id,
                    marker = SERVER_RENDERED_ATTR,
                    attrs = caps.get(1).map_or("", |m| m.as_str()),
                    body = page.body,
                    var = self.state_variable,
                    state = state,
                )
            })
            .into_owned()
    }
}

#[cfg(test)]
mod tests {
    use std::io;
    use std::sync::{Arc, Mutex};

    use serde_json::json;
    use tracing_subscriber::fmt::MakeWriter;

    use super::*;
    use crate::state::{deserialize_state, serialize_state};

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

    fn assemble_with_logs(dev_mode: bool, template: &str) -> String {
        let logs = LogBuffer::default();
        let subscriber = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::TRACE)
            .with_ansi(false)
            .with_writer(logs.clone())
            .finish();
        let assembler = DocumentAssembler::new("app", "__INITIAL_STATE__", dev_mode).unwrap();

        tracing::subscriber::with_default(subscriber, || {
            assembler.assemble(template, &PageDescriptor::default(), "{}");
        });

        logs.contents()
    }

    const TEMPLATE: &str = "<!DOCTYPE html>\n<html>\n<head>\n<meta charset=\"utf-8\">\n</head>\n<body>\n<div id=\"app\"></div>\n<script type=\"module\" src=\"/main.js\"></script>\n</body>\n</html>";

    fn assembler() -> DocumentAssembler {
        DocumentAssembler::from_config(&RendererConfig::default()).unwrap()
    }

    fn state_script(html: &str) -> &str {
        let start = html.find("window.__INITIAL_STATE__=").unwrap() + "window.__INITIAL_STATE__=".len();
        let end = start + html[start..].find("</script>").unwrap();
        &html[start..end]
    }

    // === Container Tests ===

    #[test]
    fn test_container_receives_body_marker_and_state() {
        let page = PageDescriptor::new().with_body("<p>Hi</p>");
        let html = assembler().assemble(TEMPLATE, &page, "{}");

        assert!(html.contains(
            r#"<div id="app" data-server-rendered="true"><p>Hi</p></div><script>window.__INITIAL_STATE__={}</script>"#
        ));
        assert!(html.starts_with("<!DOCTYPE html>\n<html>\n<head>"));
        assert!(html.ends_with("<script type=\"module\" src=\"/main.js\"></script>\n</body>\n</html>"));
    }

    #[test]
    fn test_empty_state_defaults_to_empty_object() {
        let html = assembler().assemble(TEMPLATE, &PageDescriptor::default(), "");

        assert_eq!(state_script(&html), "{}");
    }

    #[test]
    fn test_container_keeps_existing_attributes() {
        let template = r#"<body><div id="app" class="shell" data-x='1'></div></body>"#;
        let page = PageDescriptor::new().with_body("ok");
        let html = assembler().assemble(template, &page, "{}");

        assert!(html.contains(
            r#"<div id="app" data-server-rendered="true" class="shell" data-x='1'>ok</div>"#
        ));
    }

    #[test]
    fn test_dollar_sequences_are_literal() {
        let page = PageDescriptor::new().with_body("<p>$1 $0 ${1} $$</p>");
        let html = assembler().assemble(TEMPLATE, &page, r#"{"price":"$1"}"#);

        assert!(html.contains("<p>$1 $0 ${1} $$</p>"));
        assert_eq!(state_script(&html), r#"{"price":"$1"}"#);
    }

    #[test]
    fn test_encoded_state_survives_assembly() {
        let value = json!({"label": "$1 off", "html": "</script><b>x</b>", "n": [1, 2]});
        let html = assembler().assemble(TEMPLATE, &PageDescriptor::default(), &serialize_state(&value));

        assert_eq!(deserialize_state(state_script(&html)), value);
        assert_eq!(html.matches("</script>").count(), 2);
    }

    #[test]
    fn test_only_first_container_replaced() {
        let template = r#"<div id="app"></div><div id="app"></div>"#;
        let html = assembler().assemble(template, &PageDescriptor::new().with_body("x"), "{}");

        assert_eq!(html.matches(SERVER_RENDERED_ATTR).count(), 1);
        assert!(html.ends_with(r#"<div id="app"></div>"#));
    }

    #[test]
    fn test_non_empty_container_is_not_matched() {
        let template = r#"<div id="app"><noscript>JS</noscript></div>"#;
        let html = assembler().assemble(template, &PageDescriptor::new().with_body("x"), "{}");

        assert_eq!(html, template);
    }

    #[test]
    fn test_missing_container_leaves_template_untouched() {
        let template = "<html><head></head><body><main></main></body></html>";
        let dev = DocumentAssembler::new("app", "__INITIAL_STATE__", true).unwrap();

        assert_eq!(dev.assemble(template, &PageDescriptor::default(), "{}"), template);
        assert_eq!(assembler().assemble(template, &PageDescriptor::default(), "{}"), template);
    }

    #[test]
    fn test_missing_container_warns_only_in_dev_mode() {
        let template = "<html><head></head><body><main></main></body></html>";

        let dev = assemble_with_logs(true, template);
        assert!(dev.contains("WARN"));
        assert!(dev.contains("mount container was not found in the HTML template"));
        assert!(dev.contains("container_id=app"));

        assert!(!assemble_with_logs(false, template).contains("mount container was not found"));
    }

    #[test]
    fn test_present_container_does_not_warn_in_dev_mode() {
        assert!(!assemble_with_logs(true, TEMPLATE).contains("mount container was not found"));
    }

    #[test]
    fn test_custom_container_and_state_variable() {
        let config = RendererConfig::new()
            .with_container_id("root.main")
            .with_state_variable("__STATE__");
        let assembler = DocumentAssembler::from_config(&config).unwrap();
        let template = r#"<div id="rootxmain"></div><div id="root.main"></div>"#;

        let html = assembler.assemble(template, &PageDescriptor::new().with_body("b"), "[]");

        assert!(html.starts_with(r#"<div id="rootxmain"></div>"#));
        assert!(html.ends_with(
            r#"<div id="root.main" data-server-rendered="true">b</div><script>window.__STATE__=[]</script>"#
        ));
    }

    // === Head/Html/Body Tests ===

    #[test]
    fn test_head_tags_inserted_before_head_close_only() {
        let page = PageDescriptor::new().with_head_tags("<title>X</title>");
        let template = "<html><head><meta charset=\"utf-8\"></head><body></body></html>";
        let html = assembler().assemble(template, &page, "{}");

        assert_eq!(
            html,
            "<html><head><meta charset=\"utf-8\"><title>X</title></head><body></body></html>"
        );
    }

    #[test]
    fn test_html_and_body_attrs() {
        let page = PageDescriptor::new()
            .with_html_attrs(r#"lang="en""#)
            .with_body_attrs(r#"class="dark""#);
        let html = assembler().assemble("<html><head></head><body></body></html>", &page, "{}");

        assert_eq!(
            html,
            r#"<html lang="en" ><head></head><body class="dark" ></body></html>"#
        );
    }

    #[test]
    fn test_empty_parts_leave_template_alone_outside_container() {
        let html = assembler().assemble(TEMPLATE, &PageDescriptor::default(), "{}");
        let expected = TEMPLATE.replace(
            r#"<div id="app"></div>"#,
            r#"<div id="app" data-server-rendered="true"></div><script>window.__INITIAL_STATE__={}</script>"#,
        );

        assert_eq!(html, expected);
    }
}
