//! File-system helpers shared by the planners and executors.
use std::io;
use std::path::{Component, Path, PathBuf};

use walkdir::WalkDir;

use crate::error::{ExecutionError, HauntError};

/// Enumerate every non-directory entry under `package_dir`.
///
/// Returns paths relative to `package_dir`, sorted so plans and registry
/// entries are deterministic.  Symlinks inside the package are reported as
/// entries in their own right and never followed, even when they point at a
/// directory.
///
/// # Errors
///
/// Returns [`HauntError::Inspect`] if any part of the tree cannot be read.
pub fn discover_files(package_dir: &Path) -> Result<Vec<PathBuf>, HauntError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(package_dir)
        .min_depth(1)
        .follow_links(false)
        .sort_by_file_name()
    {
        let entry = entry.map_err(|e| HauntError::Inspect {
            path: e
                .path()
                .map_or_else(|| package_dir.to_path_buf(), Path::to_path_buf),
            source: e.into(),
        })?;
        if entry.file_type().is_dir() {
            continue;
        }
        if let Ok(relative) = entry.path().strip_prefix(package_dir) {
            files.push(relative.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

/// Resolve `path` to an absolute, canonical form without requiring it to exist.
///
/// Existing paths are canonicalized.  For paths that do not exist (or whose
/// final component is a dangling link) the longest existing ancestor is
/// canonicalized and the remaining components are appended after `.` and
/// `..` have been folded lexically.
#[must_use]
pub fn resolve_path(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    if let Ok(canonical) = dunce::canonicalize(&absolute) {
        return canonical;
    }

    let normalized = normalize_lexically(&absolute);
    let mut tail = Vec::new();
    let mut current = normalized.as_path();
    while let Some(parent) = current.parent() {
        if let Some(name) = current.file_name() {
            tail.push(name.to_os_string());
        }
        if let Ok(canonical) = dunce::canonicalize(parent) {
            return tail
                .iter()
                .rev()
                .fold(canonical, |acc, component| acc.join(component));
        }
        current = parent;
    }
    normalized
}

/// Fold `.` and `..` components without touching the filesystem.
fn normalize_lexically(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Whether anything, including a dangling symlink, exists at `path`.
///
/// # Errors
///
/// Returns [`HauntError::Inspect`] when the lookup fails for a reason other
/// than the path being absent.
pub fn lstat(path: &Path) -> Result<Option<std::fs::Metadata>, HauntError> {
    match std::fs::symlink_metadata(path) {
        Ok(meta) => Ok(Some(meta)),
        Err(e) if is_absent(&e) => Ok(None),
        Err(source) => Err(HauntError::Inspect {
            path: path.to_path_buf(),
            source,
        }),
    }
}

/// `NotFound`, or a non-directory somewhere in the path prefix.
fn is_absent(e: &io::Error) -> bool {
    matches!(
        e.kind(),
        io::ErrorKind::NotFound | io::ErrorKind::NotADirectory
    )
}

/// Ensure the parent directory of `path` exists, creating it (and any
/// ancestors) if necessary.
///
/// # Errors
///
/// Returns an error if the directory cannot be created.
pub fn ensure_parent_dir(path: &Path) -> Result<(), ExecutionError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|source| ExecutionError::Io {
            action: "create parent directory",
            path: parent.to_path_buf(),
            source,
        })?;
    }
    Ok(())
}

/// Remove an existing file or symlink at `path`, including broken symlinks.
///
/// Never removes a real directory.  Does nothing if `path` does not exist.
///
/// # Errors
///
/// Returns [`ExecutionError::IsADirectory`] for a real directory, or an I/O
/// error if the entry cannot be removed.
pub fn remove_existing(path: &Path) -> Result<bool, ExecutionError> {
    let meta = match std::fs::symlink_metadata(path) {
        Ok(meta) => meta,
        Err(e) if is_absent(&e) => return Ok(false),
        Err(source) => {
            return Err(ExecutionError::Io {
                action: "inspect",
                path: path.to_path_buf(),
                source,
            });
        }
    };
    if meta.is_dir() {
        return Err(ExecutionError::IsADirectory {
            path: path.to_path_buf(),
        });
    }
    remove_link(path, &meta)?;
    tracing::debug!("removed existing {}", path.display());
    Ok(true)
}

/// Unlink a file or symlink, handling platform differences.
///
/// On Windows, directory symlinks must be removed with `remove_dir` (not
/// `remove_file`); `symlink_metadata().is_dir()` returns `false` for them, so
/// the raw `FILE_ATTRIBUTE_DIRECTORY` flag is checked instead.
pub(crate) fn remove_link(path: &Path, meta: &std::fs::Metadata) -> Result<(), ExecutionError> {
    let result = if is_dir_like(meta) {
        std::fs::remove_dir(path)
    } else {
        std::fs::remove_file(path)
    };
    result.map_err(|source| ExecutionError::Io {
        action: "remove",
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(windows)]
fn is_dir_like(meta: &std::fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    meta.file_attributes() & 0x10 != 0 // FILE_ATTRIBUTE_DIRECTORY
}

#[cfg(not(windows))]
const fn is_dir_like(_meta: &std::fs::Metadata) -> bool {
    false
}

/// Remove directories left empty after link removal.
///
/// Walks upward from the parent of each path in `removed`, deleting empty
/// directories until it reaches a non-empty one or `stop_at`.  `stop_at`
/// itself is never removed, nor is anything outside it.  Returns the pruned
/// directories in removal order.
///
/// # Errors
///
/// Returns an error if an empty directory cannot be removed.
pub fn prune_empty_parents(
    stop_at: &Path,
    removed: &[PathBuf],
) -> Result<Vec<PathBuf>, ExecutionError> {
    let mut pruned = Vec::new();
    for link in removed {
        let mut dir = link.parent();
        while let Some(current) = dir {
            if current == stop_at || !current.starts_with(stop_at) || !is_empty_dir(current) {
                break;
            }
            std::fs::remove_dir(current).map_err(|source| ExecutionError::Io {
                action: "remove empty directory",
                path: current.to_path_buf(),
                source,
            })?;
            tracing::debug!("pruned empty directory {}", current.display());
            pruned.push(current.to_path_buf());
            dir = current.parent();
        }
    }
    Ok(pruned)
}

/// A real (non-symlink) directory with no entries.
fn is_empty_dir(path: &Path) -> bool {
    std::fs::symlink_metadata(path).is_ok_and(|m| m.is_dir())
        && std::fs::read_dir(path).is_ok_and(|mut entries| entries.next().is_none())
}
