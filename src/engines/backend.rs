//! Rendering backend trait and shared types.
//!
//! The [`RenderBackend`] trait groups the external collaborators the pipeline
//! consumes: markdown conversion, template rendering (by registered name or
//! straight from a source file), and first-paragraph extraction.
//!
//! The production implementation is
//! [`StandardBackend`](super::standard::StandardBackend).

use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Reading template {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Walking templates directory: {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Invalid template '{name}': {source}")]
    Template {
        name: String,
        source: mustache::Error,
    },
    #[error("No template named '{0}'")]
    MissingTemplate(String),
    #[error("Rendering '{name}': {source}")]
    Render {
        name: String,
        source: mustache::Error,
    },
}

/// Trait for rendering backends.
///
/// Every operation is a pure function of its inputs plus the backend's own
/// fixed configuration (such as the template search root).
pub trait RenderBackend {
    /// Convert markdown to an HTML fragment.
    fn markdown_to_html(&self, markdown: &str) -> String;

    /// Render the template registered as `name` against `context`.
    fn render_template(&self, name: &str, context: &Value) -> Result<String, EngineError>;

    /// Render the template source stored at `path` against `context`.
    fn render_file(&self, path: &Path, context: &Value) -> Result<String, EngineError>;

    /// Serialized markup of the first paragraph element in `html`, if any.
    fn first_paragraph(&self, html: &str) -> Option<String>;
}
