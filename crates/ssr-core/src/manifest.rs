//! Client build manifest used for dependency preloading.

use std::collections::{HashMap, HashSet};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::SsrError;

/// Mapping from module identifier to the ordered asset files it needs.
///
/// Loaded once and shared read-only across renders.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Manifest {
    modules: HashMap<String, Vec<String>>,
}

impl Manifest {
    /// Create an empty manifest.
    pub fn new() -> Self {
        Self::default()
    }

    /// Add the files of a module.
    pub fn with_module<I, S>(mut self, module: impl Into<String>, files: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.modules
            .insert(module.into(), files.into_iter().map(Into::into).collect());
        self
    }

    /// Parse a manifest from JSON text.
    pub fn from_json(json: &str) -> Result<Self, SsrError> {
        serde_json::from_str(json).map_err(|e| SsrError::Manifest(e.to_string()))
    }

    /// Read and parse a manifest file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SsrError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| SsrError::io(path, e))?;
        Self::from_json(&content)
    }

    /// Files for a single module.
    pub fn files(&self, module: &str) -> Option<&[String]> {
        self.modules.get(module).map(Vec::as_slice)
    }

    /// Number of modules in the manifest.
    pub fn len(&self) -> usize {
        self.modules.len()
    }

    /// Check if the manifest is empty.
    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    /// Resolve the asset files needed by `modules`.
    ///
    /// Files are de-duplicated and keep the order in which they were first
    /// seen across the modules. Unknown modules contribute nothing.
    pub fn resolve_dependencies<S: AsRef<str>>(&self, modules: &[S]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut files = Vec::new();

        for module in modules {
            let Some(module_files) = self.modules.get(module.as_ref()) else {
                continue;
            };
            for file in module_files {
                if seen.insert(file.as_str()) {
                    files.push(file.clone());
                }
            }
        }

        files
    }
}
