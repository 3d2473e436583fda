//! # twotree
//!
//! A static site builder that writes two parallel output trees from one
//! source tree: `preview/` with everything, `published/` with only what is
//! marked publishable. Directories carry metadata that their contents inherit,
//! markdown becomes pages, templates become views, everything else is copied.
//!
//! # Architecture: Resolve, Then Render
//!
//! ```text
//! src/  →  records (tmp/metadata.json)   one pre-order walk, four-layer metadata merge
//!       →  fragments (tmp/**.content.html)
//!       →  preview/ + published/          assets, pages, views
//! ```
//!
//! Every later step reads the same resolved collection. Templates see all of
//! it as `all_metadata`, so a listing page or feed can enumerate any content.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`resolve`] | Walks the source tree, classifies entries, merges inherited metadata |
//! | [`properties`] | Property mappings, reserved-key accessors, the overlay merge |
//! | [`declaration`] | YAML declaration files and content front matter |
//! | [`paths`] | Source → temp/output path mapping, clean URLs, public URL paths |
//! | [`content`] | Markdown fragments, teasers, page composition, published gating |
//! | [`views`] | Templates rendered once per status into both trees |
//! | [`assets`] | Parallel verbatim copies into both trees |
//! | [`render`] | Template contexts and layout wrapping shared by pages and views |
//! | [`engines`] | Markdown, templating and fragment-query backends |
//! | [`pipeline`] | Orchestrates the steps for one project |
//! | [`config`] | `twotree.toml` loading, validation and stock defaults |
//! | [`files`] | Filesystem helpers with path-carrying errors; output root preparation |
//! | [`types`] | Records, kinds and render statuses |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Inheritance Is Opt-Out, Per Record
//!
//! A record's effective properties are its own declarations over its
//! directory's resolved properties over the `[defaults]` table. Only
//! `inherit_metadata` is exempt: it is read from the record's own declaration,
//! so any directory or file can cut itself off from its parent and start
//! again from the defaults.
//!
//! ## Two Trees, Two Rules
//!
//! Content reaches `published/` only with `published: true`. Views and assets
//! always reach both trees; a feed or sitemap view filters by the `status` it
//! is rendered for instead.
//!
//! ## Templates Are Data
//!
//! Layouts, content types and views are mustache templates read at build
//! time. A site's look can change without rebuilding the binary.

pub mod assets;
pub mod config;
pub mod content;
pub mod declaration;
pub mod engines;
pub mod files;
pub mod output;
pub mod paths;
pub mod pipeline;
pub mod properties;
pub mod render;
pub mod resolve;
pub mod types;
pub mod views;

#[cfg(test)]
pub(crate) mod test_helpers;
