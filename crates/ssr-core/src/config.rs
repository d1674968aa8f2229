//! Renderer configuration.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::SsrError;
use crate::manifest::Manifest;

/// Build-time token standing in for the HTML template.
///
/// Used when neither the request nor the configuration supplies a template.
pub const TEMPLATE_PLACEHOLDER: &str = "__SSR_HTML__";

/// Configuration shared by the document assembler and the orchestrator.
///
/// Development mode is carried here explicitly rather than read from any
/// global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RendererConfig {
    /// Value of the `id` attribute identifying the mount container.
    pub container_id: String,

    /// Global variable the embedded state is assigned to.
    pub state_variable: String,

    /// Enables development-only diagnostics.
    pub dev_mode: bool,

    /// Inline HTML template.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template: Option<String>,

    /// Template file, read into `template` on load.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub template_path: Option<PathBuf>,

    /// Client manifest file used for dependency preloading.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub manifest_path: Option<PathBuf>,
}

impl Default for RendererConfig {
    fn default() -> Self {
        Self {
            container_id: "app".to_string(),
            state_variable: "__INITIAL_STATE__".to_string(),
            dev_mode: false,
            template: None,
            template_path: None,
            manifest_path: None,
        }
    }
}

impl RendererConfig {
    /// Create a configuration with defaults.
    pub fn new() -> Self {
        Self::default()
    }

    /// Load config from a TOML file, or JSON when the path ends in `.json`.
    ///
    /// A configured `template_path` is read immediately, relative paths
    /// resolving against the config file's directory.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SsrError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SsrError::io(path, e))?;

        let mut config: Self = if path.extension().is_some_and(|ext| ext == "json") {
            serde_json::from_str(&content)
                .map_err(|e| SsrError::Config(format!("{}: {}", path.display(), e)))?
        } else {
            toml::from_str(&content)
                .map_err(|e| SsrError::Config(format!("{}: {}", path.display(), e)))?
        };

        let base = path.parent().unwrap_or_else(|| Path::new("."));
        config.template_path = config.template_path.map(|p| base.join(p));
        config.manifest_path = config.manifest_path.map(|p| base.join(p));

        if let Some(template_path) = &config.template_path {
            let template = std::fs::read_to_string(template_path)
                .map_err(|e| SsrError::io(template_path, e))?;
            config.template = Some(template);
        }

        config.validate()?;
        Ok(config)
    }

    /// Check that identifiers are usable in markup and script.
    pub fn validate(&self) -> Result<(), SsrError> {
        if self.container_id.is_empty() || self.container_id.contains('"') {
            return Err(SsrError::Config(format!(
                "invalid container_id {:?}",
                self.container_id
            )));
        }

        let mut chars = self.state_variable.chars();
        let valid_start = chars
            .next()
            .is_some_and(|c| c == '_' || c == '$' || c.is_ascii_alphabetic());
        if !valid_start || !chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric()) {
            return Err(SsrError::Config(format!(
                "invalid state_variable {:?}",
                self.state_variable
            )));
        }

        Ok(())
    }

    /// Load the configured manifest, if any.
    pub fn load_manifest(&self) -> Result<Option<Manifest>, SsrError> {
        self.manifest_path
            .as_deref()
            .map(Manifest::load)
            .transpose()
    }

    /// Template to use when a request does not bring its own.
    pub fn template_or_placeholder(&self) -> &str {
        self.template.as_deref().unwrap_or(TEMPLATE_PLACEHOLDER)
    }

    /// Set the mount container id.
    pub fn with_container_id(mut self, id: impl Into<String>) -> Self {
        self.container_id = id.into();
        self
    }

    /// Set the state variable name.
    pub fn with_state_variable(mut self, name: impl Into<String>) -> Self {
        self.state_variable = name.into();
        self
    }

    /// Enable or disable development mode.
    pub fn with_dev_mode(mut self, enabled: bool) -> Self {
        self.dev_mode = enabled;
        self
    }

    /// Set the default template.
    pub fn with_template(mut self, template: impl Into<String>) -> Self {
        self.template = Some(template.into());
        self
    }
}
