//! Shared types used across all pipeline stages.
//!
//! A [`Record`] is created once per filesystem entry by the resolver and then
//! handed, as one ordered collection, to every later stage. Stages only fill
//! in the derived fields they own:
//!
//! | Field | Owner |
//! |-------|-------|
//! | `fragment_path`, `teaser` | content fragments |
//! | `url_path`, `preview_path`, `published_path` | fragment pass, asset copies |
//!
//! Records serialize as a flat object (their effective properties plus the
//! `kind`, `source_path` and derived keys) which is exactly what templates see
//! in `all_metadata`.

use crate::properties::Properties;
use serde::Serialize;
use serde_json::Value;
use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use thiserror::Error;

/// What a filesystem entry was classified as.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Directory,
    Content,
    View,
    Asset,
}

impl Kind {
    pub fn as_str(self) -> &'static str {
        match self {
            Kind::Directory => "directory",
            Kind::Content => "content",
            Kind::View => "view",
            Kind::Asset => "asset",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug, PartialEq)]
pub enum StatusError {
    #[error("Unknown status '{0}' (expected 'preview' or 'published')")]
    Unknown(String),
}

/// Which output tree a render targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Status {
    Preview,
    Published,
}

impl Status {
    pub const ALL: [Status; 2] = [Status::Preview, Status::Published];

    pub fn as_str(self) -> &'static str {
        match self {
            Status::Preview => "preview",
            Status::Published => "published",
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Status {
    type Err = StatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "preview" => Ok(Status::Preview),
            "published" => Ok(Status::Published),
            other => Err(StatusError::Unknown(other.to_string())),
        }
    }
}

/// One resolved filesystem entry.
#[derive(Debug, Clone, Serialize)]
pub struct Record {
    pub kind: Kind,
    pub source_path: PathBuf,
    /// Effective (fully inherited) properties. Never modified after resolution.
    #[serde(flatten)]
    pub properties: Properties,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fragment_path: Option<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub url_path: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub preview_path: Option<PathBuf>,
    /// Set only for records that are written to the published tree.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_path: Option<PathBuf>,
    /// Teaser derived from the fragment; only set when none was declared.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub teaser: Option<String>,
}

impl Record {
    pub fn new(kind: Kind, source_path: impl Into<PathBuf>, properties: Properties) -> Self {
        Self {
            kind,
            source_path: source_path.into(),
            properties,
            fragment_path: None,
            url_path: None,
            preview_path: None,
            published_path: None,
            teaser: None,
        }
    }

    /// Declared teaser if present, otherwise the derived one.
    pub fn effective_teaser(&self) -> Option<Value> {
        self.properties
            .teaser()
            .cloned()
            .or_else(|| self.teaser.clone().map(Value::String))
    }

    /// The record as a template context object.
    pub fn to_context(&self) -> Result<serde_json::Map<String, Value>, serde_json::Error> {
        match serde_json::to_value(self)? {
            Value::Object(map) => Ok(map),
            // A struct with a flattened map always serializes to an object.
            _ => Ok(serde_json::Map::new()),
        }
    }
}
