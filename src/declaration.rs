//! Declared metadata: directory declaration files and content front matter.
//!
//! Both are YAML key-value documents and parse the same way.
//!
//! ## Front matter
//!
//! A content file starts with its front matter block, closed by a line made of
//! three or more hyphens. An opening fence line is optional:
//!
//! ```md
//! ---
//! title: Hello, world!
//! published: true
//! ---
//! # Hello
//! ```
//!
//! ```md
//! title: Hello, world!
//! ---
//! # Hello
//! ```
//!
//! A file without a closing fence has no front matter; all of it is body.

use crate::properties::Properties;
use serde_json::Value;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum DeclarationError {
    #[error("Invalid YAML in {}: {source}", path.display())]
    Yaml {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("Expected key-value pairs in {}, found {found}", path.display())]
    NotAMapping { path: PathBuf, found: &'static str },
}

/// A content file split into its front matter and markdown body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Document<'a> {
    pub front_matter: &'a str,
    pub body: &'a str,
}

fn is_fence(line: &str) -> bool {
    let line = line.trim_end_matches(['\r', '\n']);
    line.len() >= 3 && line.bytes().all(|b| b == b'-')
}

/// Split `text` at its front matter fence.
pub fn split_front_matter(text: &str) -> Document<'_> {
    let mut start = 0;
    let mut offset = 0;
    for (i, line) in text.split_inclusive('\n').enumerate() {
        let line_end = offset + line.len();
        if is_fence(line) {
            if i == 0 {
                start = line_end;
            } else {
                return Document {
                    front_matter: &text[start..offset],
                    body: &text[line_end..],
                };
            }
        }
        offset = line_end;
    }
    Document {
        front_matter: "",
        body: text,
    }
}

/// Parse a YAML declaration. Empty documents declare nothing.
///
/// `path` names the file in error messages.
pub fn parse_declaration(text: &str, path: &Path) -> Result<Properties, DeclarationError> {
    if text.trim().is_empty() {
        return Ok(Properties::new());
    }
    let value: Value = serde_yaml::from_str(text).map_err(|source| DeclarationError::Yaml {
        path: path.to_path_buf(),
        source,
    })?;
    match value {
        Value::Object(map) => Ok(Properties::from(map)),
        Value::Null => Ok(Properties::new()),
        other => Err(DeclarationError::NotAMapping {
            path: path.to_path_buf(),
            found: value_kind(&other),
        }),
    }
}

fn value_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "a list",
        Value::Object(_) => "a mapping",
    }
}
