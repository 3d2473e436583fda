//! Path mapping between the source, temp and output trees.
//!
//! Every output location is derived from a source location by re-anchoring
//! its root-relative path under another root:
//!
//! ```text
//! src/blog/post.md         → tmp/blog/post.content.html        (fragment)
//!                          → preview/blog/post/index.html      (clean URLs)
//!                          → preview/blog/post.html            (clean_urls: false)
//! src/feeds/rss.xml.mustache → published/feeds/rss.xml         (view)
//! preview/blog/post/index.html → /blog/post/                   (URL)
//! ```
//!
//! All functions here are pure; nothing touches the filesystem.

use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PathError {
    #[error("{} is not under {}", path.display(), root.display())]
    NotUnderRoot { path: PathBuf, root: PathBuf },
}

const FRAGMENT_EXTENSION: &str = "content.html";
const PAGE_EXTENSION: &str = "html";

/// Re-anchor `path` from `from_root` to `to_root`.
pub fn relocate(path: &Path, from_root: &Path, to_root: &Path) -> Result<PathBuf, PathError> {
    let relative = path
        .strip_prefix(from_root)
        .map_err(|_| PathError::NotUnderRoot {
            path: path.to_path_buf(),
            root: from_root.to_path_buf(),
        })?;
    Ok(to_root.join(relative))
}

/// Rewrite `…/name.html` to `…/name/index.html`.
///
/// Paths whose file name is `index.html` (already clean), `.html` (no name),
/// or that don't end in `.html` are returned unchanged.
pub fn clean_content_path(path: &Path) -> PathBuf {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return path.to_path_buf();
    };
    match name.strip_suffix(".html") {
        Some(stem) if !stem.is_empty() && stem != "index" => {
            path.with_file_name(stem).join("index.html")
        }
        _ => path.to_path_buf(),
    }
}

/// Public, root-relative URL for an output file. `…/index.html` becomes `…/`.
pub fn url_path(output_file: &Path, output_root: &Path) -> Result<String, PathError> {
    let relative = output_file
        .strip_prefix(output_root)
        .map_err(|_| PathError::NotUnderRoot {
            path: output_file.to_path_buf(),
            root: output_root.to_path_buf(),
        })?;

    let segments: Vec<String> = relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    let url = format!("/{}", segments.join("/"));

    match url.strip_suffix("index.html") {
        Some(dir) if dir.ends_with('/') => Ok(dir.to_string()),
        _ => Ok(url),
    }
}

/// Where a content file's HTML fragment is stored between passes.
pub fn fragment_path(
    source: &Path,
    source_root: &Path,
    temp_root: &Path,
) -> Result<PathBuf, PathError> {
    Ok(relocate(source, source_root, temp_root)?.with_extension(FRAGMENT_EXTENSION))
}

/// Final page location for a content file under `target_root`.
pub fn content_output_path(
    source: &Path,
    source_root: &Path,
    target_root: &Path,
    clean_urls: bool,
) -> Result<PathBuf, PathError> {
    let path = relocate(source, source_root, target_root)?.with_extension(PAGE_EXTENSION);
    Ok(if clean_urls {
        clean_content_path(&path)
    } else {
        path
    })
}

/// Output location for a view: the view suffix is dropped and whatever
/// extension remains (`feed.xml.mustache` → `feed.xml`) is kept as-is.
pub fn view_output_path(
    source: &Path,
    source_root: &Path,
    target_root: &Path,
    view_extension: &str,
) -> Result<PathBuf, PathError> {
    let path = relocate(source, source_root, target_root)?;
    let suffix = format!(".{view_extension}");
    let stripped = path
        .file_name()
        .and_then(|n| n.to_str())
        .and_then(|n| n.strip_suffix(&suffix))
        .filter(|n| !n.is_empty())
        .map(str::to_string);
    Ok(match stripped {
        Some(name) => path.with_file_name(name),
        None => path,
    })
}
