//! CLI output formatting for the build steps.
//!
//! Output is **source-centric**: every line leads with the entry's path
//! relative to the source root, followed by what became of it.
//!
//! # Output Format
//!
//! ## Step banners
//!
//! ```text
//! ==> Preparing site/preview, site/published, site/tmp
//! ==> Step 1: Resolving site/src
//! ==> Step 2: Rendering fragments
//! ```
//!
//! ## Resolved metadata (`verbose`)
//!
//! ```text
//! 001 directory /
//!     layout: "default_layout"
//!     clean_urls: true
//!     inherit_metadata: true
//! 002 content index.md
//!     title: "Home"
//!     ...
//! 003 directory blog/
//!     content_type: "post"
//! ```
//!
//! ## Build
//!
//! ```text
//! Pages
//! 001 index.md → / (preview, published)
//! 002 blog/draft.md → /blog/draft/ (preview)
//!
//! Views
//! 001 feeds/posts.xml.mustache → /feeds/posts.xml (preview, published)
//!
//! Built 2 pages (1 published), 1 view, 3 assets
//! ```
//!
//! # Architecture
//!
//! Each step has a `format_*` function (returns `Vec<String>`) for testability
//! and a `print_*` wrapper that writes to stdout. Format functions are pure:
//! no I/O, no side effects.

use crate::config::Roots;
use crate::pipeline::{BuildReport, Step};
use crate::types::{Kind, Record};
use serde_json::Value;
use std::path::Path;

/// Format a 1-based positional index as 3-digit zero-padded.
fn format_index(pos: usize) -> String {
    format!("{:0>3}", pos)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn plural(count: usize, noun: &str) -> String {
    if count == 1 {
        format!("{count} {noun}")
    } else {
        format!("{count} {noun}s")
    }
}

/// `blog/post.md`, `blog/` for directories, `/` for the source root.
fn display_source(record: &Record, source_root: &Path) -> String {
    let relative = record
        .source_path
        .strip_prefix(source_root)
        .unwrap_or(&record.source_path)
        .to_string_lossy()
        .replace('\\', "/");
    match (record.kind, relative.is_empty()) {
        (Kind::Directory, true) => "/".to_string(),
        (Kind::Directory, false) => format!("{relative}/"),
        _ => relative,
    }
}

fn property_value(value: &Value) -> String {
    serde_json::to_string(value).unwrap_or_else(|_| value.to_string())
}

// ============================================================================
// Step banners
// ============================================================================

pub fn format_step(step: Step, roots: &Roots) -> String {
    match step {
        Step::Prepare => format!(
            "==> Preparing {}, {}, {}",
            roots.preview.display(),
            roots.published.display(),
            roots.temp.display()
        ),
        Step::Resolve => format!("==> Step 1: Resolving {}", roots.source.display()),
        Step::RenderFragments => "==> Step 2: Rendering fragments".to_string(),
        Step::PublishAssets => "==> Step 3: Copying assets".to_string(),
        Step::ComposeContent => "==> Step 4: Composing pages".to_string(),
        Step::RenderViews => "==> Step 5: Rendering views".to_string(),
    }
}

// ============================================================================
// Resolved metadata
// ============================================================================

/// Format the resolved collection: one header per record, its effective
/// properties indented below.
pub fn format_records(records: &[Record], source_root: &Path) -> Vec<String> {
    let mut lines = Vec::new();
    for (i, record) in records.iter().enumerate() {
        lines.push(format!(
            "{} {} {}",
            format_index(i + 1),
            record.kind,
            display_source(record, source_root)
        ));
        for (key, value) in record.properties.iter() {
            lines.push(format!("{}{}: {}", indent(1), key, property_value(value)));
        }
    }
    lines
}

pub fn print_records(records: &[Record], source_root: &Path) {
    for line in format_records(records, source_root) {
        println!("{}", line);
    }
}

// ============================================================================
// Build output
// ============================================================================

/// Format a build summary: pages with their URLs and trees, views, totals.
pub fn format_build_output(report: &BuildReport) -> Vec<String> {
    let mut lines = Vec::new();

    if !report.pages.is_empty() {
        lines.push("Pages".to_string());
        for (i, page) in report.pages.iter().enumerate() {
            let trees = if page.published {
                "preview, published"
            } else {
                "preview"
            };
            lines.push(format!(
                "{} {} → {} ({})",
                format_index(i + 1),
                page.source.display(),
                page.url_path,
                trees
            ));
        }
        lines.push(String::new());
    }

    if !report.views.is_empty() {
        lines.push("Views".to_string());
        for (i, view) in report.views.iter().enumerate() {
            lines.push(format!(
                "{} {} → {} (preview, published)",
                format_index(i + 1),
                view.source.display(),
                view.url_path
            ));
        }
        lines.push(String::new());
    }

    let published = report.pages.iter().filter(|p| p.published).count();
    lines.push(format!(
        "Built {} ({} published), {}, {}",
        plural(report.pages.len(), "page"),
        published,
        plural(report.views.len(), "view"),
        plural(report.assets, "asset")
    ));
    lines
}

pub fn print_build_output(report: &BuildReport) {
    for line in format_build_output(report) {
        println!("{}", line);
    }
}
