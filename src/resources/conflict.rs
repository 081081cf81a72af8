//! Conflict taxonomy and classifier.
use std::fmt;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use super::fs::lstat;
use super::symlink::Symlink;
use crate::error::HauntError;

/// Something occupying a path where a planned symlink would go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Conflict {
    /// A regular file.
    File {
        /// Colliding path.
        path: PathBuf,
    },
    /// A real directory.  Never replaced automatically.
    Directory {
        /// Colliding path.
        path: PathBuf,
    },
    /// A symlink that already resolves to the planned source.
    CorrectSymlink {
        /// Colliding path.
        path: PathBuf,
        /// Current link target, as stored on disk.
        points_to: PathBuf,
    },
    /// A symlink to some other existing location.
    DifferentSymlink {
        /// Colliding path.
        path: PathBuf,
        /// Current link target, as stored on disk.
        points_to: PathBuf,
    },
    /// A symlink whose target does not exist.
    BrokenSymlink {
        /// Colliding path.
        path: PathBuf,
        /// Current link target, as stored on disk.
        points_to: PathBuf,
    },
}

impl Conflict {
    /// The colliding path.
    #[must_use]
    pub fn path(&self) -> &Path {
        match self {
            Self::File { path }
            | Self::Directory { path }
            | Self::CorrectSymlink { path, .. }
            | Self::DifferentSymlink { path, .. }
            | Self::BrokenSymlink { path, .. } => path,
        }
    }

    /// The current link target for symlink conflicts.
    #[must_use]
    pub fn points_to(&self) -> Option<&Path> {
        match self {
            Self::File { .. } | Self::Directory { .. } => None,
            Self::CorrectSymlink { points_to, .. }
            | Self::DifferentSymlink { points_to, .. }
            | Self::BrokenSymlink { points_to, .. } => Some(points_to),
        }
    }

    /// Whether this conflict obstructs the install (everything except an
    /// already-correct link).
    #[must_use]
    pub const fn is_blocking(&self) -> bool {
        match self {
            Self::CorrectSymlink { .. } => false,
            Self::File { .. }
            | Self::Directory { .. }
            | Self::DifferentSymlink { .. }
            | Self::BrokenSymlink { .. } => true,
        }
    }

    /// Whether force mode may unlink the obstruction and create the link.
    #[must_use]
    pub const fn is_replaceable(&self) -> bool {
        match self {
            Self::File { .. } | Self::DifferentSymlink { .. } | Self::BrokenSymlink { .. } => true,
            Self::Directory { .. } | Self::CorrectSymlink { .. } => false,
        }
    }

    /// Short human-readable kind, e.g. `"file"` or `"broken symlink"`.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::File { .. } => "file",
            Self::Directory { .. } => "directory",
            Self::CorrectSymlink { .. } => "correct symlink",
            Self::DifferentSymlink { .. } => "symlink",
            Self::BrokenSymlink { .. } => "broken symlink",
        }
    }
}

impl fmt::Display for Conflict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.path().display(), self.label())
    }
}

/// How install treats blocking conflicts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ConflictMode {
    /// Fail if any blocking conflict exists.
    #[default]
    Abort,
    /// Leave conflicting paths alone and link the rest.
    Skip,
    /// Replace conflicting files and symlinks.  Directories still fail.
    Force,
}

impl ConflictMode {
    /// Whether planned links may replace what occupies their path.
    #[must_use]
    pub const fn is_force(self) -> bool {
        matches!(self, Self::Force)
    }
}

impl fmt::Display for ConflictMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Abort => "abort",
            Self::Skip => "skip",
            Self::Force => "force",
        })
    }
}

/// Inspect `symlink.link_path` without following it and report what, if
/// anything, is in the way.
///
/// Returns `None` when the path is free.
///
/// # Errors
///
/// Returns [`HauntError::Inspect`] if the path cannot be examined.
pub fn classify(symlink: &Symlink) -> Result<Option<Conflict>, HauntError> {
    let path = &symlink.link_path;
    let Some(meta) = lstat(path)? else {
        return Ok(None);
    };

    let conflict = if meta.file_type().is_symlink() {
        let points_to = std::fs::read_link(path).map_err(|source| HauntError::Inspect {
            path: path.clone(),
            source,
        })?;
        if symlink.points_to(&points_to) {
            Conflict::CorrectSymlink {
                path: path.clone(),
                points_to,
            }
        } else if std::fs::metadata(path).is_err() {
            Conflict::BrokenSymlink {
                path: path.clone(),
                points_to,
            }
        } else {
            Conflict::DifferentSymlink {
                path: path.clone(),
                points_to,
            }
        }
    } else if meta.is_dir() {
        Conflict::Directory { path: path.clone() }
    } else {
        Conflict::File { path: path.clone() }
    };
    tracing::trace!("{}: {}", path.display(), conflict.label());
    Ok(Some(conflict))
}
