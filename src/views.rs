//! Views: template sources rendered straight into both output trees.
//!
//! A view is rendered once per [`Status`]. Its context is the record plus
//! `status`, `all_metadata`, and one list per content type holding the
//! content visible at that status:
//!
//! ```text
//! status = preview     posts: every post
//! status = published   posts: posts with published: true
//! ```
//!
//! Unlike content, a view is always written to both trees. The output name
//! is the source name minus the view extension (`feed.xml.mustache` →
//! `feed.xml`); clean URLs never apply.

use crate::config::Roots;
use crate::engines::RenderBackend;
use crate::files;
use crate::paths::{self, PathError};
use crate::properties::{CONTENT_TYPE, PUBLISHED, truthy};
use crate::render::{self, RenderError, STATUS};
use crate::types::{Kind, Record, Status};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Assign a view's output paths and URL. Called before the collection is
/// serialized so pages and other views can link to it.
pub fn place(record: &mut Record, roots: &Roots, view_extension: &str) -> Result<(), PathError> {
    debug_assert_eq!(record.kind, Kind::View);
    let preview = paths::view_output_path(
        &record.source_path,
        &roots.source,
        &roots.preview,
        view_extension,
    )?;
    let published = paths::view_output_path(
        &record.source_path,
        &roots.source,
        &roots.published,
        view_extension,
    )?;
    record.url_path = Some(paths::url_path(&preview, &roots.preview)?);
    record.preview_path = Some(preview);
    record.published_path = Some(published);
    Ok(())
}

/// `<content_type>s` lists of the content visible at `status`, in
/// collection order.
pub fn collections(all_metadata: &Value, status: Status) -> Map<String, Value> {
    let mut lists = Map::new();
    let records = all_metadata.as_array().map(Vec::as_slice).unwrap_or_default();
    for record in records {
        if record.get("kind").and_then(Value::as_str) != Some(Kind::Content.as_str()) {
            continue;
        }
        let Some(content_type) = record.get(CONTENT_TYPE).and_then(Value::as_str) else {
            continue;
        };
        let visible = match status {
            Status::Preview => true,
            Status::Published => record.get(PUBLISHED).is_some_and(truthy),
        };
        if !visible {
            continue;
        }
        let list = lists
            .entry(format!("{content_type}s"))
            .or_insert_with(|| Value::Array(Vec::new()));
        if let Value::Array(items) = list {
            items.push(record.clone());
        }
    }
    lists
}

/// Render a view for one status.
pub fn render(
    backend: &impl RenderBackend,
    status: Status,
    record: &Record,
    all_metadata: &Value,
) -> Result<String, RenderError> {
    let mut context = render::page_context(record, all_metadata)?;
    context.insert(STATUS.to_string(), Value::String(status.as_str().to_string()));
    context.extend(collections(all_metadata, status));

    let inner = backend
        .render_file(&record.source_path, &Value::Object(context.clone()))
        .map_err(RenderError::engine(record))?;
    render::wrap_in_layout(backend, record.properties.layout(), context, inner)
        .map_err(RenderError::engine(record))
}

/// Render and write a view to the preview and published trees.
pub fn publish(
    backend: &impl RenderBackend,
    record: &Record,
    all_metadata: &Value,
) -> Result<Vec<PathBuf>, RenderError> {
    let mut written = Vec::with_capacity(Status::ALL.len());
    for status in Status::ALL {
        let target = match status {
            Status::Preview => record.preview_path.as_ref(),
            Status::Published => record.published_path.as_ref(),
        }
        .ok_or_else(|| RenderError::Unplaced(record.source_path.clone()))?;
        let page = render(backend, status, record, all_metadata)?;
        files::write_file(target, &page)?;
        written.push(target.clone());
    }
    Ok(written)
}
