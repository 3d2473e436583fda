//! Rendering engines: markdown, templates, fragment queries.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Markdown → HTML** | `pulldown_cmark::html::push_html` (smart punctuation on) |
//! | **Named template** | `mustache::Template::render_to_string`, compiled at startup |
//! | **View source file** | `mustache::Context::compile`, then render |
//! | **Teaser** | `tl` query for the first `p` element |
//!
//! The module is split into:
//! - **Backend**: [`RenderBackend`] trait + [`EngineError`]
//! - **Standard**: [`StandardBackend`], the production implementation

pub mod backend;
pub mod standard;

pub use backend::{EngineError, RenderBackend};
pub use standard::StandardBackend;
