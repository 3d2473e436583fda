//! Metadata resolution over the source tree.
//!
//! The resolver walks the source root once, pre-order, and produces one
//! [`Record`] per directory, content file, view and asset. Each record carries
//! its effective properties, merged from four layers (lowest first):
//!
//! ```text
//! [defaults] in twotree.toml          layout: default_layout, clean_urls: true
//!   parent directory (resolved)       only when inherit_metadata is true
//!     own declaration                 *.yml for directories, front matter for content
//!       inherit_metadata              always decided by the record itself
//! ```
//!
//! ## Classification
//!
//! | Entry | Becomes |
//! |---|---|
//! | directory | `Directory` record, then its files, then its subdirectories |
//! | `*.yml` | merged into the containing directory's declaration, no record |
//! | `*.md` | `Content` record, own properties from its front matter |
//! | `*.mustache` | `View` record |
//! | anything else (dotfiles too) | `Asset` record |
//!
//! Entries are visited in file-name order so the collection, and everything
//! derived from it, is stable across platforms.

use crate::config::BuildConfig;
use crate::declaration::{self, DeclarationError};
use crate::properties::{self, Properties};
use crate::types::{Kind, Record};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ResolveError {
    #[error("Reading {}: {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error(transparent)]
    Declaration(#[from] DeclarationError),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum EntryClass {
    Declaration,
    Record(Kind),
}

/// Walks a source tree and resolves every entry's effective properties.
pub struct Resolver<'a> {
    config: &'a BuildConfig,
    defaults: Properties,
}

impl<'a> Resolver<'a> {
    pub fn new(config: &'a BuildConfig) -> Self {
        Self {
            config,
            defaults: config.default_properties(),
        }
    }

    /// Resolve the whole tree below `source_root`, root directory first.
    pub fn resolve(&self, source_root: &Path) -> Result<Vec<Record>, ResolveError> {
        self.resolve_directory(source_root, None)
    }

    fn resolve_directory(
        &self,
        dir: &Path,
        parent: Option<&Properties>,
    ) -> Result<Vec<Record>, ResolveError> {
        let (subdirs, files): (Vec<PathBuf>, Vec<PathBuf>) =
            collect_entries(dir)?.into_iter().partition(|p| p.is_dir());

        let mut own = Properties::new();
        for path in &files {
            if self.classify(path) == EntryClass::Declaration {
                let declared = declaration::parse_declaration(&read_source(path)?, path)?;
                own = properties::overlay(&own, &declared);
            }
        }
        let effective = properties::resolve_effective(&self.defaults, parent, &own);

        let mut records = Vec::with_capacity(files.len() + 1);
        for path in &files {
            let kind = match self.classify(path) {
                EntryClass::Declaration => continue,
                EntryClass::Record(kind) => kind,
            };
            let own = match kind {
                Kind::Content => {
                    let text = read_source(path)?;
                    let doc = declaration::split_front_matter(&text);
                    declaration::parse_declaration(doc.front_matter, path)?
                }
                _ => Properties::new(),
            };
            let resolved = properties::resolve_effective(&self.defaults, Some(&effective), &own);
            records.push(Record::new(kind, path, resolved));
        }

        let mut tree = Vec::with_capacity(records.len() + 1);
        tree.push(Record::new(Kind::Directory, dir, effective.clone()));
        tree.extend(records);
        for subdir in &subdirs {
            tree.extend(self.resolve_directory(subdir, Some(&effective))?);
        }
        Ok(tree)
    }

    fn classify(&self, path: &Path) -> EntryClass {
        let extension = path.extension().and_then(|e| e.to_str());
        match extension {
            Some(ext) if ext == self.config.declaration_extension => EntryClass::Declaration,
            Some(ext) if ext == self.config.content_extension => EntryClass::Record(Kind::Content),
            Some(ext) if ext == self.config.view_extension => EntryClass::Record(Kind::View),
            _ => EntryClass::Record(Kind::Asset),
        }
    }
}

fn collect_entries(dir: &Path) -> Result<Vec<PathBuf>, ResolveError> {
    let read_error = |source| ResolveError::Io {
        path: dir.to_path_buf(),
        source,
    };
    let mut entries = fs::read_dir(dir)
        .map_err(read_error)?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<Result<Vec<_>, _>>()
        .map_err(read_error)?;
    entries.sort();
    Ok(entries)
}

fn read_source(path: &Path) -> Result<String, ResolveError> {
    fs::read_to_string(path).map_err(|source| ResolveError::Io {
        path: path.to_path_buf(),
        source,
    })
}
