//! Shared test utilities for the twotree test suite.
//!
//! Provides fixture setup and lookup helpers over resolved records and build
//! reports. Lookups panic with the list of what *was* found, so a failing
//! test says why.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = setup_fixtures();
//! let src = tmp.path().join("src");
//! let records = Resolver::new(&BuildConfig::default()).resolve(&src).unwrap();
//!
//! let post = find_record(&records, &src, "blog/first-post.md");
//! assert_eq!(post.properties.content_type(), Some("post"));
//! ```

use std::path::Path;
use tempfile::TempDir;

use crate::pipeline::{BuildReport, PageReport};
use crate::types::Record;

// =========================================================================
// Fixture setup
// =========================================================================

/// Copy `fixtures/site/` to a temp directory and return it.
///
/// The copy is a complete project (`src/`, `templates/`); tests may mutate
/// it freely.
pub fn setup_fixtures() -> TempDir {
    let tmp = TempDir::new().unwrap();
    let fixtures = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/site");
    copy_dir_recursive(&fixtures, tmp.path()).unwrap();
    tmp
}

fn copy_dir_recursive(src: &Path, dst: &Path) -> std::io::Result<()> {
    for entry in std::fs::read_dir(src)? {
        let entry = entry?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if src_path.is_dir() {
            std::fs::create_dir_all(&dst_path)?;
            copy_dir_recursive(&src_path, &dst_path)?;
        } else {
            std::fs::copy(&src_path, &dst_path)?;
        }
    }
    Ok(())
}

// =========================================================================
// Record lookups
// =========================================================================

/// Source paths relative to `root`, in collection order. The root itself is `""`.
pub fn relative_paths(records: &[Record], root: &Path) -> Vec<String> {
    records
        .iter()
        .map(|r| {
            r.source_path
                .strip_prefix(root)
                .unwrap_or_else(|_| {
                    panic!(
                        "{} is outside {}",
                        r.source_path.display(),
                        root.display()
                    )
                })
                .to_string_lossy()
                .replace('\\', "/")
        })
        .collect()
}

/// Find the record for `relative` (a path under `root`, `""` for the root).
pub fn find_record<'a>(records: &'a [Record], root: &Path, relative: &str) -> &'a Record {
    let paths = relative_paths(records, root);
    let index = paths
        .iter()
        .position(|p| p == relative)
        .unwrap_or_else(|| panic!("Record '{}' not found. Available: {:?}", relative, paths));
    &records[index]
}

// =========================================================================
// Report lookups
// =========================================================================

pub fn find_page<'a>(report: &'a BuildReport, relative: &str) -> &'a PageReport {
    report
        .pages
        .iter()
        .find(|p| p.source == Path::new(relative))
        .unwrap_or_else(|| {
            let sources: Vec<_> = report
                .pages
                .iter()
                .map(|p| p.source.display().to_string())
                .collect();
            panic!("Page '{}' not found. Available: {:?}", relative, sources)
        })
}
