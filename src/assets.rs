//! Asset publishing: verbatim copies into both output trees.
//!
//! Assets are never gated by metadata. Copies run in parallel on the global
//! rayon pool; paths are assigned to the records afterwards, in collection
//! order.

use crate::config::Roots;
use crate::files::{self, FsError};
use crate::paths;
use crate::render::RenderError;
use crate::types::{Kind, Record};
use rayon::prelude::*;
use std::path::PathBuf;

struct AssetCopy {
    index: usize,
    source: PathBuf,
    preview: PathBuf,
    published: PathBuf,
}

/// Copy every asset record to the preview and published roots and record
/// where it went. Returns the number of assets copied.
pub fn publish_assets(records: &mut [Record], roots: &Roots) -> Result<usize, RenderError> {
    let copies = records
        .iter()
        .enumerate()
        .filter(|(_, r)| r.kind == Kind::Asset)
        .map(|(index, r)| -> Result<AssetCopy, RenderError> {
            Ok(AssetCopy {
                index,
                source: r.source_path.clone(),
                preview: paths::relocate(&r.source_path, &roots.source, &roots.preview)?,
                published: paths::relocate(&r.source_path, &roots.source, &roots.published)?,
            })
        })
        .collect::<Result<Vec<_>, _>>()?;

    copies.par_iter().try_for_each(|copy| -> Result<(), FsError> {
        files::copy_file(&copy.source, &copy.preview)?;
        files::copy_file(&copy.source, &copy.published)
    })?;

    for copy in &copies {
        let record = &mut records[copy.index];
        record.url_path = Some(paths::url_path(&copy.preview, &roots.preview)?);
        record.preview_path = Some(copy.preview.clone());
        record.published_path = Some(copy.published.clone());
    }
    Ok(copies.len())
}
