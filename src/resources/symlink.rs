//! Symlink resource.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use super::fs::{ensure_parent_dir, remove_existing, remove_link, resolve_path};
use crate::error::ExecutionError;

/// A symlink that is planned or installed.
///
/// Both paths are absolute at rest.  Only the target written to disk is
/// relative (see [`relative_source_path`](Self::relative_source_path)), so a
/// tree of links keeps working when the package and target move together.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Symlink {
    /// Where the symlink lives.
    pub link_path: PathBuf,
    /// What the symlink refers to.
    pub source_path: PathBuf,
}

impl Symlink {
    /// Create a new symlink description.
    #[must_use]
    pub const fn new(link_path: PathBuf, source_path: PathBuf) -> Self {
        Self {
            link_path,
            source_path,
        }
    }

    /// The parent directory of `link_path`, against which relative link
    /// targets are resolved.
    fn link_dir(&self) -> &Path {
        self.link_path.parent().unwrap_or_else(|| Path::new("/"))
    }

    /// `source_path` expressed relative to the directory containing the link.
    #[must_use]
    pub fn relative_source_path(&self) -> PathBuf {
        pathdiff::diff_paths(&self.source_path, self.link_dir())
            .unwrap_or_else(|| self.source_path.clone())
    }

    /// Whether a link target read from `link_path` refers to `source_path`.
    ///
    /// `target` may be relative (to the link's directory) or absolute.  Both
    /// sides are resolved before comparing, so equivalent spellings of the
    /// same location match.
    #[must_use]
    pub fn points_to(&self, target: &Path) -> bool {
        resolve_path(&self.link_dir().join(target)) == resolve_path(&self.source_path)
    }

    /// Whether `link_path` is currently a symlink that refers to `source_path`.
    #[must_use]
    pub fn exists(&self) -> bool {
        std::fs::read_link(&self.link_path).is_ok_and(|target| self.points_to(&target))
    }

    /// Create the symlink on disk with a relative target.
    ///
    /// Parent directories are created as needed.  When `force` is set any
    /// file or symlink already at `link_path` is unlinked first; a real
    /// directory is never removed.  Returns `false` when the link was already
    /// correct and nothing was written.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::PathOccupied`] when something appeared at
    /// `link_path` since planning (and `force` is off),
    /// [`ExecutionError::IsADirectory`] when `force` meets a directory, or an
    /// I/O error from the underlying calls.
    pub fn create(&self, force: bool) -> Result<bool, ExecutionError> {
        if self.exists() {
            return Ok(false);
        }
        if force {
            remove_existing(&self.link_path)?;
        }
        ensure_parent_dir(&self.link_path)?;

        let relative = self.relative_source_path();
        write_link(&relative, &self.source_path, &self.link_path).map_err(|source| {
            if source.kind() == std::io::ErrorKind::AlreadyExists {
                ExecutionError::PathOccupied {
                    path: self.link_path.clone(),
                }
            } else {
                ExecutionError::Io {
                    action: "create symlink",
                    path: self.link_path.clone(),
                    source,
                }
            }
        })?;
        tracing::debug!("linked {} -> {}", self.link_path.display(), relative.display());
        Ok(true)
    }

    /// Remove the symlink after confirming it still points at `source_path`.
    ///
    /// # Errors
    ///
    /// Fails if the link vanished, is no longer a symlink, or now points
    /// somewhere else; the filesystem is left untouched in those cases.
    pub fn remove(&self) -> Result<(), ExecutionError> {
        let meta = match std::fs::symlink_metadata(&self.link_path) {
            Ok(meta) => meta,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ExecutionError::LinkVanished {
                    path: self.link_path.clone(),
                });
            }
            Err(source) => {
                return Err(ExecutionError::Io {
                    action: "inspect",
                    path: self.link_path.clone(),
                    source,
                });
            }
        };
        if !meta.file_type().is_symlink() {
            return Err(ExecutionError::NotASymlink {
                path: self.link_path.clone(),
            });
        }
        let actual = std::fs::read_link(&self.link_path).map_err(|source| ExecutionError::Io {
            action: "read symlink",
            path: self.link_path.clone(),
            source,
        })?;
        if !self.points_to(&actual) {
            return Err(ExecutionError::LinkRepointed {
                path: self.link_path.clone(),
                points_to: actual,
                expected: self.source_path.clone(),
            });
        }
        remove_link(&self.link_path, &meta)?;
        tracing::debug!("removed {}", self.link_path.display());
        Ok(())
    }
}

impl fmt::Display for Symlink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            self.link_path.display(),
            self.source_path.display()
        )
    }
}

/// Create a symlink at `link` whose on-disk target is `target`.
#[cfg(unix)]
fn write_link(target: &Path, _source: &Path, link: &Path) -> std::io::Result<()> {
    std::os::unix::fs::symlink(target, link)
}

/// Create a symlink at `link` whose on-disk target is `target`.
///
/// Windows distinguishes file and directory links, decided by what the
/// absolute `source` currently is.
#[cfg(windows)]
fn write_link(target: &Path, source: &Path, link: &Path) -> std::io::Result<()> {
    if source.is_dir() {
        std::os::windows::fs::symlink_dir(target, link)
    } else {
        std::os::windows::fs::symlink_file(target, link)
    }
}
