//! Error types for the render pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while preparing or running a render.
///
/// State serialization problems are deliberately absent: the state codec
/// degrades to an empty object instead of failing a render.
#[derive(Error, Debug)]
pub enum SsrError {
    /// The request URL could not be parsed.
    #[error("Invalid request URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    /// The render operation failed. Propagated to the caller untouched.
    #[error("Render error: {0}")]
    Render(#[source] anyhow::Error),

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Manifest could not be parsed.
    #[error("Manifest error: {0}")]
    Manifest(String),

    /// A file needed by the renderer could not be read.
    #[error("Failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The render outcome could not be turned into an HTTP response.
    #[error("Response error: {0}")]
    Response(String),
}

impl SsrError {
    /// Wrap an I/O error with the path that caused it.
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        SsrError::Io {
            path: path.into(),
            source,
        }
    }
}

impl From<http::Error> for SsrError {
    fn from(err: http::Error) -> Self {
        SsrError::Response(err.to_string())
    }
}
