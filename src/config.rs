//! Project configuration module.
//!
//! Handles loading, validating, and merging the optional `twotree.toml` at the
//! project root. Stock defaults are overridden by whatever the file declares;
//! the result is one immutable [`BuildConfig`] passed explicitly to every stage.
//!
//! ## Project Layout
//!
//! ```text
//! project/
//! ├── twotree.toml     # This file (optional)
//! ├── src/             # Source tree: directories, content, views, assets
//! ├── templates/       # Layouts and content-type templates
//! ├── preview/         # Output: everything          (emptied each run)
//! ├── published/       # Output: publishable items   (emptied each run)
//! └── tmp/             # Intermediate fragments      (emptied each run)
//! ```
//!
//! ## Configuration Options
//!
//! ```toml
//! # All options are optional - defaults shown below
//!
//! source_dir = "src"
//! preview_dir = "preview"
//! published_dir = "published"
//! temp_dir = "tmp"
//! templates_dir = "templates"
//!
//! declaration_extension = "yml"   # Directory metadata files
//! content_extension = "md"        # Markdown content with front matter
//! view_extension = "mustache"     # Views rendered directly as templates
//! template_extension = "mustache" # Files registered from templates_dir
//!
//! [defaults]                      # Built-in metadata under every record
//! layout = "default_layout"
//! clean_urls = true
//!
//! [processing]
//! max_processes = 4               # Asset copy workers (omit for auto = CPU cores)
//! ```
//!
//! Unknown keys are rejected to catch typos early. Keys in `[defaults]` are
//! free-form: they apply even where a directory opts out of inheritance.

use crate::properties::Properties;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const CONFIG_FILE: &str = "twotree.toml";

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("TOML serialize error: {0}")]
    Serialize(#[from] toml::ser::Error),
    #[error("Config validation error: {0}")]
    Validation(String),
}

/// Build configuration loaded from `twotree.toml`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BuildConfig {
    pub source_dir: String,
    pub preview_dir: String,
    pub published_dir: String,
    pub temp_dir: String,
    pub templates_dir: String,
    pub declaration_extension: String,
    pub content_extension: String,
    pub view_extension: String,
    pub template_extension: String,
    /// Built-in default metadata, the lowest layer of every record.
    pub defaults: toml::Table,
    pub processing: ProcessingConfig,
}

impl Default for BuildConfig {
    fn default() -> Self {
        let mut defaults = toml::Table::new();
        defaults.insert("layout".into(), toml::Value::String("default_layout".into()));
        defaults.insert("clean_urls".into(), toml::Value::Boolean(true));

        Self {
            source_dir: "src".to_string(),
            preview_dir: "preview".to_string(),
            published_dir: "published".to_string(),
            temp_dir: "tmp".to_string(),
            templates_dir: "templates".to_string(),
            declaration_extension: "yml".to_string(),
            content_extension: "md".to_string(),
            view_extension: "mustache".to_string(),
            template_extension: "mustache".to_string(),
            defaults,
            processing: ProcessingConfig::default(),
        }
    }
}

impl BuildConfig {
    /// Validate directory names and extensions.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let dirs = [
            ("source_dir", &self.source_dir),
            ("preview_dir", &self.preview_dir),
            ("published_dir", &self.published_dir),
            ("temp_dir", &self.temp_dir),
            ("templates_dir", &self.templates_dir),
        ];
        for (key, dir) in &dirs {
            if dir.trim().is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
        }
        for (i, (key_a, a)) in dirs.iter().enumerate() {
            for (key_b, b) in &dirs[i + 1..] {
                if Path::new(a.as_str()) == Path::new(b.as_str()) {
                    return Err(ConfigError::Validation(format!(
                        "{key_a} and {key_b} must be different directories"
                    )));
                }
            }
        }

        let exts = [
            ("declaration_extension", &self.declaration_extension),
            ("content_extension", &self.content_extension),
            ("view_extension", &self.view_extension),
            ("template_extension", &self.template_extension),
        ];
        for (key, ext) in &exts {
            if ext.is_empty() {
                return Err(ConfigError::Validation(format!("{key} must not be empty")));
            }
            if ext.starts_with('.') {
                return Err(ConfigError::Validation(format!(
                    "{key} must not start with a dot"
                )));
            }
        }
        // template_extension may repeat another extension: templates_dir
        // never holds source files.
        for (i, (key_a, a)) in exts[..3].iter().enumerate() {
            for (key_b, b) in &exts[i + 1..3] {
                if a == b {
                    return Err(ConfigError::Validation(format!(
                        "{key_a} and {key_b} must differ"
                    )));
                }
            }
        }
        Ok(())
    }

    /// Default metadata as a property mapping.
    pub fn default_properties(&self) -> Properties {
        self.defaults
            .iter()
            .map(|(k, v)| (k.clone(), toml_to_json(v)))
            .collect()
    }

    /// Absolute-or-relative roots anchored at `project`.
    pub fn roots(&self, project: &Path) -> Roots {
        Roots {
            source: project.join(&self.source_dir),
            preview: project.join(&self.preview_dir),
            published: project.join(&self.published_dir),
            temp: project.join(&self.temp_dir),
            templates: project.join(&self.templates_dir),
        }
    }
}

/// The fixed directory roots of one project.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Roots {
    pub source: PathBuf,
    pub preview: PathBuf,
    pub published: PathBuf,
    pub temp: PathBuf,
    pub templates: PathBuf,
}

impl Roots {
    /// Roots emptied at the start of each run.
    pub fn prepared(&self) -> [&Path; 3] {
        [&self.published, &self.preview, &self.temp]
    }
}

/// Parallel processing settings.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ProcessingConfig {
    /// Maximum number of parallel asset copy workers.
    /// When absent or null, defaults to the number of CPU cores.
    /// Values larger than the core count are clamped down.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_processes: Option<usize>,
}

/// Resolve the effective thread count from config.
///
/// - `None` → use all available cores
/// - `Some(n)` → use `min(n, cores)` (user can constrain down, not up)
pub fn effective_threads(config: &ProcessingConfig) -> usize {
    let cores = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    config
        .max_processes
        .map(|n| n.clamp(1, cores))
        .unwrap_or(cores)
}

fn toml_to_json(value: &toml::Value) -> serde_json::Value {
    use serde_json::Value;
    match value {
        toml::Value::String(s) => Value::String(s.clone()),
        toml::Value::Integer(i) => Value::from(*i),
        toml::Value::Float(f) => serde_json::Number::from_f64(*f)
            .map(Value::Number)
            .unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(*b),
        toml::Value::Datetime(d) => Value::String(d.to_string()),
        toml::Value::Array(items) => Value::Array(items.iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .iter()
                .map(|(k, v)| (k.clone(), toml_to_json(v)))
                .collect(),
        ),
    }
}

// =============================================================================
// Config loading, merging, and validation
// =============================================================================

/// Returns the stock default config as a `toml::Value::Table`.
///
/// This is the canonical representation of all default values, used as the
/// base layer for merging user overrides on top.
pub fn stock_defaults_value() -> Result<toml::Value, ConfigError> {
    Ok(toml::Value::try_from(BuildConfig::default())?)
}

/// Recursively merge `overlay` on top of `base`.
///
/// - Tables are merged key-by-key (overlay keys override base keys).
/// - Non-table values in overlay replace base values entirely.
/// - Keys in base that are not in overlay are preserved.
/// - Base keys keep their position; new overlay keys are appended.
pub fn merge_toml(mut base: toml::Value, overlay: toml::Value) -> toml::Value {
    merge_into(&mut base, overlay);
    base
}

fn merge_into(base: &mut toml::Value, overlay: toml::Value) {
    match (base, overlay) {
        (toml::Value::Table(base_table), toml::Value::Table(overlay_table)) => {
            for (key, overlay_val) in overlay_table {
                match base_table.get_mut(&key) {
                    Some(base_val) => merge_into(base_val, overlay_val),
                    None => {
                        base_table.insert(key, overlay_val);
                    }
                }
            }
        }
        (base, overlay) => *base = overlay,
    }
}

/// Load `twotree.toml` from a directory as a raw TOML value.
///
/// Returns `Ok(None)` if the file does not exist.
/// Returns `Err` if the file exists but contains invalid TOML.
pub fn load_raw_config(project: &Path) -> Result<Option<toml::Value>, ConfigError> {
    let config_path = project.join(CONFIG_FILE);
    if !config_path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(&config_path).map_err(|source| ConfigError::Io {
        path: config_path.clone(),
        source,
    })?;
    let value: toml::Value = toml::from_str(&content)?;
    Ok(Some(value))
}

/// Merge an optional overlay onto a base value, then deserialize and validate.
pub fn resolve_config(
    base: toml::Value,
    overlay: Option<toml::Value>,
) -> Result<BuildConfig, ConfigError> {
    let merged = match overlay {
        Some(ov) => merge_toml(base, ov),
        None => base,
    };
    let config: BuildConfig = merged.try_into()?;
    config.validate()?;
    Ok(config)
}

/// Load config from `twotree.toml` in the given project directory.
///
/// Merges user values on top of stock defaults, rejects unknown keys,
/// and validates the result.
pub fn load_config(project: &Path) -> Result<BuildConfig, ConfigError> {
    let base = stock_defaults_value()?;
    let overlay = load_raw_config(project)?;
    resolve_config(base, overlay)
}

/// Returns a fully-commented stock `twotree.toml` with all keys and explanations.
///
/// Used by the `--print-config` CLI flag.
pub fn stock_config_toml() -> &'static str {
    r##"# twotree configuration
# =====================
# All settings are optional. Remove or comment out any you don't need.
# Values shown below are the defaults. Unknown keys cause an error.

# ---------------------------------------------------------------------------
# Directories (relative to the project root)
# ---------------------------------------------------------------------------
# Source tree: directories, content, views and assets.
source_dir = "src"

# Output trees. Both are emptied (hidden entries excepted) on every run.
# preview gets everything; published only content marked `published: true`.
preview_dir = "preview"
published_dir = "published"

# Intermediate HTML fragments.
temp_dir = "tmp"

# Layouts and content-type templates.
templates_dir = "templates"

# ---------------------------------------------------------------------------
# File classification
# ---------------------------------------------------------------------------
# YAML files holding metadata for the directory they sit in.
declaration_extension = "yml"

# Markdown content with a front matter block.
content_extension = "md"

# Views are rendered as templates; the suffix is dropped from the output name,
# so `feed.xml.mustache` becomes `feed.xml`.
view_extension = "mustache"

# Files under templates_dir registered as templates, by relative name.
template_extension = "mustache"

# ---------------------------------------------------------------------------
# Built-in metadata
# ---------------------------------------------------------------------------
# The lowest layer under every record. Applies even where a directory sets
# `inherit_metadata: false`.
[defaults]
layout = "default_layout"
clean_urls = true

# ---------------------------------------------------------------------------
# Processing
# ---------------------------------------------------------------------------
[processing]
# Maximum parallel asset copy workers.
# Omit or comment out to auto-detect (= number of CPU cores).
# max_processes = 4
"##
}
