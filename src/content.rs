//! Content pages: markdown fragment, teaser, composition, output.
//!
//! Content is rendered in two passes so any page can reference any other:
//!
//! 1. [`prepare`] converts the markdown body to a fragment, stores it in the
//!    temp tree, derives the teaser and assigns output paths and the URL.
//! 2. [`compose`] renders the stored fragment through the record's
//!    `content_type` template, wraps it in the layout, and [`publish`] writes
//!    the page.
//!
//! Pages always go to the preview tree and only go to the published tree
//! when the record is `published`.

use crate::config::Roots;
use crate::declaration;
use crate::engines::RenderBackend;
use crate::files;
use crate::paths;
use crate::render::{self, CONTENT, RenderError};
use crate::types::{Kind, Record};
use serde_json::Value;

/// Markdown body of a content record, converted to HTML.
pub fn render_fragment(
    backend: &impl RenderBackend,
    record: &Record,
) -> Result<String, RenderError> {
    let text = files::read_file(&record.source_path)?;
    let doc = declaration::split_front_matter(&text);
    Ok(backend.markdown_to_html(doc.body))
}

/// First pass for one content record.
///
/// Fails before writing anything when the record has no `content_type`.
pub fn prepare(
    backend: &impl RenderBackend,
    record: &mut Record,
    roots: &Roots,
) -> Result<(), RenderError> {
    debug_assert_eq!(record.kind, Kind::Content);
    if record.properties.content_type().is_none() {
        return Err(RenderError::MissingContentType(record.source_path.clone()));
    }

    let fragment = render_fragment(backend, record)?;
    let fragment_path = paths::fragment_path(&record.source_path, &roots.source, &roots.temp)?;
    files::write_file(&fragment_path, &fragment)?;
    record.fragment_path = Some(fragment_path);

    if record.properties.teaser().is_none() {
        record.teaser = backend.first_paragraph(&fragment);
    }

    let clean_urls = record.properties.clean_urls();
    let preview = paths::content_output_path(
        &record.source_path,
        &roots.source,
        &roots.preview,
        clean_urls,
    )?;
    record.url_path = Some(paths::url_path(&preview, &roots.preview)?);
    record.published_path = if record.properties.published() {
        Some(paths::content_output_path(
            &record.source_path,
            &roots.source,
            &roots.published,
            clean_urls,
        )?)
    } else {
        None
    };
    record.preview_path = Some(preview);
    Ok(())
}

/// Render a prepared record's page.
pub fn compose(
    backend: &impl RenderBackend,
    record: &Record,
    all_metadata: &Value,
) -> Result<String, RenderError> {
    let content_type = record
        .properties
        .content_type()
        .ok_or_else(|| RenderError::MissingContentType(record.source_path.clone()))?;
    let fragment_path = record
        .fragment_path
        .as_deref()
        .ok_or_else(|| RenderError::Unplaced(record.source_path.clone()))?;
    let fragment = files::read_file(fragment_path)?;

    let mut context = render::page_context(record, all_metadata)?;
    context.insert(CONTENT.to_string(), Value::String(fragment));

    let inner = backend
        .render_template(content_type, &Value::Object(context.clone()))
        .map_err(RenderError::engine(record))?;
    render::wrap_in_layout(backend, record.properties.layout(), context, inner)
        .map_err(RenderError::engine(record))
}

/// Write a composed page to its output locations.
pub fn publish(record: &Record, page: &str) -> Result<(), RenderError> {
    let preview = record
        .preview_path
        .as_deref()
        .ok_or_else(|| RenderError::Unplaced(record.source_path.clone()))?;
    files::write_file(preview, page)?;
    if let Some(published) = &record.published_path {
        files::write_file(published, page)?;
    }
    Ok(())
}
