//! Filesystem helpers that keep the failing path in their errors.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FsError {
    #[error("Reading {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("Writing {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("Copying {} to {}: {source}", from.display(), to.display())]
    Copy {
        from: PathBuf,
        to: PathBuf,
        source: io::Error,
    },
    #[error("Creating directory {}: {source}", path.display())]
    CreateDir { path: PathBuf, source: io::Error },
    #[error("Removing {}: {source}", path.display())]
    Remove { path: PathBuf, source: io::Error },
}

pub fn read_file(path: &Path) -> Result<String, FsError> {
    fs::read_to_string(path).map_err(|source| FsError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Write `contents` to `path`, creating missing parent directories.
pub fn write_file(path: &Path, contents: &str) -> Result<(), FsError> {
    create_parent(path)?;
    fs::write(path, contents).map_err(|source| FsError::Write {
        path: path.to_path_buf(),
        source,
    })
}

/// Byte-for-byte copy, creating missing parent directories.
pub fn copy_file(from: &Path, to: &Path) -> Result<(), FsError> {
    create_parent(to)?;
    fs::copy(from, to).map_err(|source| FsError::Copy {
        from: from.to_path_buf(),
        to: to.to_path_buf(),
        source,
    })?;
    Ok(())
}

fn create_parent(path: &Path) -> Result<(), FsError> {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => create_dir(parent),
        _ => Ok(()),
    }
}

fn create_dir(path: &Path) -> Result<(), FsError> {
    fs::create_dir_all(path).map_err(|source| FsError::CreateDir {
        path: path.to_path_buf(),
        source,
    })
}

/// Make `root` an existing, empty directory.
///
/// Entries whose name starts with `.` directly inside `root` are left alone,
/// so a `.git` checkout of a deployed tree survives rebuilds. A regular file
/// sitting at `root` is replaced by a directory.
pub fn prepare_target(root: &Path) -> Result<(), FsError> {
    if root.exists() && !root.is_dir() {
        fs::remove_file(root).map_err(remove_error(root))?;
    }
    if !root.exists() {
        return create_dir(root);
    }

    let entries = fs::read_dir(root).map_err(|source| FsError::Read {
        path: root.to_path_buf(),
        source,
    })?;
    for entry in entries {
        let entry = entry.map_err(|source| FsError::Read {
            path: root.to_path_buf(),
            source,
        })?;
        if entry.file_name().to_string_lossy().starts_with('.') {
            continue;
        }
        let path = entry.path();
        let is_dir = entry
            .file_type()
            .map(|t| t.is_dir())
            .map_err(remove_error(&path))?;
        if is_dir {
            fs::remove_dir_all(&path).map_err(remove_error(&path))?;
        } else {
            fs::remove_file(&path).map_err(remove_error(&path))?;
        }
    }
    Ok(())
}

fn remove_error(path: &Path) -> impl FnOnce(io::Error) -> FsError {
    let path = path.to_path_buf();
    move |source| FsError::Remove { path, source }
}
