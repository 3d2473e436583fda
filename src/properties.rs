//! Property mappings and the metadata inheritance chain.
//!
//! Every record carries an ordered mapping of properties. Most keys are opaque
//! and flow straight into template contexts; a small closed set is reserved
//! and read through the typed accessors on [`Properties`]:
//!
//! | Key | Type | Meaning |
//! |-----|------|---------|
//! | `layout` | string / `false` | outer template wrapping the page; `false` or null disables it |
//! | `inherit_metadata` | bool | inherit the parent directory's properties (default `true`) |
//! | `clean_urls` | bool | write `name.html` as `name/index.html` (content only) |
//! | `published` | bool | include content in the published tree |
//! | `content_type` | string | template composing a content fragment (required for content) |
//! | `teaser` | any | explicit teaser; otherwise derived from the fragment |
//!
//! ## Resolution
//!
//! Effective properties are built by overlaying, lowest precedence first:
//!
//! ```text
//! built-in defaults  <  parent's effective properties  <  own declarations
//! ```
//!
//! The parent layer is skipped when the record's own `inherit_metadata`
//! (which is never inherited) is false. See [`resolve_effective`].
//!
//! Flags use permissive truthiness: anything other than `false` or null
//! counts as set.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

pub const LAYOUT: &str = "layout";
pub const INHERIT_METADATA: &str = "inherit_metadata";
pub const CLEAN_URLS: &str = "clean_urls";
pub const PUBLISHED: &str = "published";
pub const CONTENT_TYPE: &str = "content_type";
pub const TEASER: &str = "teaser";

/// Ordered string-keyed property mapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Properties(Map<String, Value>);

impl Properties {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Insert a property, returning the value it replaced.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.0.insert(key.into(), value.into())
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.0.iter()
    }

    /// Layout template name, or `None` when layout wrapping is disabled.
    pub fn layout(&self) -> Option<&str> {
        self.get(LAYOUT).and_then(Value::as_str)
    }

    pub fn inherit_metadata(&self) -> bool {
        self.get(INHERIT_METADATA).is_none_or(truthy)
    }

    pub fn clean_urls(&self) -> bool {
        self.get(CLEAN_URLS).is_some_and(truthy)
    }

    pub fn published(&self) -> bool {
        self.get(PUBLISHED).is_some_and(truthy)
    }

    pub fn content_type(&self) -> Option<&str> {
        self.get(CONTENT_TYPE)
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }

    /// Explicitly declared teaser, if any.
    pub fn teaser(&self) -> Option<&Value> {
        self.get(TEASER).filter(|v| truthy(v))
    }
}

impl From<Map<String, Value>> for Properties {
    fn from(map: Map<String, Value>) -> Self {
        Self(map)
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Properties {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

/// `false` and null are unset; every other value is set.
pub fn truthy(value: &Value) -> bool {
    !matches!(value, Value::Null | Value::Bool(false))
}

/// Overlay `over` on top of `base`: every key present in `over` wins.
///
/// The merge is shallow. Nested mappings in `over` replace those in `base`
/// wholesale. Keys keep the position they first appeared at in `base`; keys
/// only in `over` are appended in their own order.
pub fn overlay(base: &Properties, over: &Properties) -> Properties {
    let mut merged = base.0.clone();
    for (key, value) in &over.0 {
        merged.insert(key.clone(), value.clone());
    }
    Properties(merged)
}

/// Compute a record's effective properties.
///
/// `inherit_metadata` is decided from `own` alone (defaulting to `true`) so a
/// child can always opt out of its parent, and the decision is recorded in the
/// result. `parent` must already be fully resolved.
pub fn resolve_effective(
    defaults: &Properties,
    parent: Option<&Properties>,
    own: &Properties,
) -> Properties {
    let mut declared = Properties::new();
    declared.insert(INHERIT_METADATA, true);
    let declared = overlay(&declared, own);

    let inherited = match parent {
        Some(parent) if declared.inherit_metadata() => overlay(parent, &declared),
        _ => declared,
    };

    overlay(defaults, &inherited)
}
