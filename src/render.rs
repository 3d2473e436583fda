//! Template contexts and layout composition shared by content and views.
//!
//! A page context is the record itself (effective properties plus derived
//! fields, flattened) with the whole resolved collection under
//! `all_metadata`. Content adds `content`; views add `status` and one list per
//! content type. Layouts get the same context plus the rendered page in
//! `yield`:
//!
//! ```text
//! content_type template / view source  →  inner
//! layout template (context + yield: inner)  →  page
//! ```

use crate::engines::{EngineError, RenderBackend};
use crate::files::FsError;
use crate::paths::PathError;
use crate::types::Record;
use serde_json::{Map, Value};
use std::path::PathBuf;
use thiserror::Error;

pub const ALL_METADATA: &str = "all_metadata";
pub const CONTENT: &str = "content";
pub const STATUS: &str = "status";
pub const YIELD: &str = "yield";

#[derive(Error, Debug)]
pub enum RenderError {
    #[error("{}: content_type is required for content", .0.display())]
    MissingContentType(PathBuf),
    #[error("{}: no output path assigned", .0.display())]
    Unplaced(PathBuf),
    #[error("{}: {source}", path.display())]
    Engine { path: PathBuf, source: EngineError },
    #[error(transparent)]
    Path(#[from] PathError),
    #[error(transparent)]
    Fs(#[from] FsError),
    #[error("Serializing context: {0}")]
    Json(#[from] serde_json::Error),
}

impl RenderError {
    pub(crate) fn engine(record: &Record) -> impl FnOnce(EngineError) -> RenderError {
        let path = record.source_path.clone();
        move |source| RenderError::Engine { path, source }
    }
}

/// The record's own fields plus the shared `all_metadata` list.
pub fn page_context(
    record: &Record,
    all_metadata: &Value,
) -> Result<Map<String, Value>, RenderError> {
    let mut context = record.to_context()?;
    context.insert(ALL_METADATA.to_string(), all_metadata.clone());
    Ok(context)
}

/// Wrap `inner` in the `layout` template, or return it as-is when the
/// record has layouts disabled.
pub fn wrap_in_layout(
    backend: &impl RenderBackend,
    layout: Option<&str>,
    mut context: Map<String, Value>,
    inner: String,
) -> Result<String, EngineError> {
    let Some(layout) = layout else {
        return Ok(inner);
    };
    context.insert(YIELD.to_string(), Value::String(inner));
    backend.render_template(layout, &Value::Object(context))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engines::backend::tests::{MockBackend, RecordedCall};
    use crate::properties::Properties;
    use crate::types::Kind;
    use serde_json::json;

    #[test]
    fn context_flattens_record_and_adds_all_metadata() {
        let mut props = Properties::new();
        props.insert("title", "Hello");
        let record = Record::new(Kind::Content, "/s/src/a.md", props);

        let context = page_context(&record, &json!([{"title": "Other"}])).unwrap();
        assert_eq!(context["title"], json!("Hello"));
        assert_eq!(context["kind"], json!("content"));
        assert_eq!(context[ALL_METADATA], json!([{"title": "Other"}]));
    }

    #[test]
    fn layout_receives_inner_as_yield() {
        let backend = MockBackend::new();
        let mut context = Map::new();
        context.insert("title".to_string(), json!("T"));

        let out =
            wrap_in_layout(&backend, Some("default_layout"), context, "<p>x</p>".into()).unwrap();
        assert_eq!(out, "[default_layout|<p>x</p>]");
        assert_eq!(backend.get_contexts()[0]["title"], json!("T"));
    }

    #[test]
    fn no_layout_returns_inner_untouched() {
        let backend = MockBackend::new();
        let out = wrap_in_layout(&backend, None, Map::new(), "<rss/>".into()).unwrap();
        assert_eq!(out, "<rss/>");
        assert!(backend.get_calls().is_empty());
    }

    #[test]
    fn engine_errors_name_the_source_file() {
        let backend = MockBackend::failing_on("broken");
        let record = Record::new(Kind::Content, "/s/src/blog/a.md", Properties::new());
        let err = wrap_in_layout(&backend, Some("broken"), Map::new(), String::new())
            .map_err(RenderError::engine(&record))
            .unwrap_err();
        assert!(err.to_string().contains("/s/src/blog/a.md"));
        assert_eq!(
            backend.get_calls(),
            vec![RecordedCall::Template("broken".to_string())]
        );
    }
}
