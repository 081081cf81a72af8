//! Domain-specific error types for the haunt engine.
//!
//! This module provides a structured error hierarchy using [`thiserror`].
//! Library code returns [`HauntError`] so the presentation layer can match on
//! the failure class; command handlers at the CLI boundary convert it to
//! [`anyhow::Error`] via the standard `?` operator.
//!
//! # Error hierarchy
//!
//! ```text
//! HauntError
//! ├── Input(InputError)        : bad package/target paths, name collisions
//! ├── Conflict(ConflictError)  : obstructions that block an install
//! ├── Registry(RegistryError)  : unreadable, malformed or future registry
//! ├── Execution(ExecutionError): mutations that failed or raced
//! └── Inspect { path, source } : read-only filesystem inspection failed
//! ```

use std::fmt;
use std::path::PathBuf;

use thiserror::Error;

use crate::resources::Conflict;

/// Convenience alias used throughout the library.
pub type Result<T, E = HauntError> = std::result::Result<T, E>;

/// Top-level error type for the haunt engine.
#[derive(Error, Debug)]
pub enum HauntError {
    /// The caller supplied an invalid package, target or package name.
    #[error(transparent)]
    Input(#[from] InputError),

    /// The plan contains conflicts the active policy does not tolerate.
    #[error(transparent)]
    Conflict(#[from] ConflictError),

    /// The registry file could not be loaded or saved.
    #[error("registry error: {0}")]
    Registry(#[from] RegistryError),

    /// A filesystem mutation failed or the filesystem changed after planning.
    #[error(transparent)]
    Execution(#[from] ExecutionError),

    /// A read-only filesystem inspection failed while planning.
    #[error("cannot inspect {}: {source}", path.display())]
    Inspect {
        /// Path that could not be inspected.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}

impl HauntError {
    /// Whether this failure may have left links or the registry half-updated.
    ///
    /// Only execution errors qualify: validation, conflict and registry
    /// errors are raised before the first mutation.
    #[must_use]
    pub const fn may_leave_partial_state(&self) -> bool {
        matches!(self, Self::Execution(_))
    }
}

/// Invalid input detected before any filesystem mutation.
#[derive(Error, Debug)]
pub enum InputError {
    /// The package directory does not exist.
    #[error("package directory does not exist: {}", path.display())]
    PackageDirNotFound {
        /// Path as given by the caller.
        path: PathBuf,
    },

    /// The package path exists but is not a directory.
    #[error("package path is not a directory: {}", path.display())]
    NotADirectory {
        /// Resolved package path.
        path: PathBuf,
    },

    /// The package directory is the filesystem root.
    #[error("package directory cannot be the filesystem root")]
    RootPackage,

    /// The target directory equals or is nested inside the package directory.
    #[error(
        "target directory {} is inside package directory {}",
        target.display(),
        package.display()
    )]
    TargetInsidePackage {
        /// Resolved target directory.
        target: PathBuf,
        /// Resolved package directory.
        package: PathBuf,
    },

    /// A package with the same name is registered from another directory.
    #[error(
        "package '{name}' is already installed from {}; cannot install from {}",
        existing.display(),
        requested.display()
    )]
    AlreadyInstalled {
        /// Package name.
        name: String,
        /// Directory recorded in the registry.
        existing: PathBuf,
        /// Directory the caller attempted to install from.
        requested: PathBuf,
    },

    /// No registry entry exists for the package name.
    #[error("package '{name}' not found in registry")]
    PackageNotInstalled {
        /// Package name that was looked up.
        name: String,
    },
}

/// Conflicts that block an install under the active policy.
///
/// Carries the full ordered list so the caller can report every path.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub struct ConflictError {
    /// Every blocking conflict, in plan order.
    pub conflicts: Vec<Conflict>,
}

impl ConflictError {
    /// Number of paths named in the display message before truncation.
    const SHOWN: usize = 3;

    /// Wrap a list of conflicts.
    #[must_use]
    pub const fn new(conflicts: Vec<Conflict>) -> Self {
        Self { conflicts }
    }

    /// Whether any of the conflicts is a real directory.
    #[must_use]
    pub fn has_directories(&self) -> bool {
        self.conflicts
            .iter()
            .any(|c| matches!(c, Conflict::Directory { .. }))
    }
}

impl fmt::Display for ConflictError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conflicts detected: ")?;
        for (i, conflict) in self.conflicts.iter().take(Self::SHOWN).enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}", conflict.path().display())?;
        }
        if self.conflicts.len() > Self::SHOWN {
            write!(f, ", ... ({} total)", self.conflicts.len())?;
        }
        Ok(())
    }
}

/// Errors that arise while loading or saving the registry file.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// The registry file could not be read or written.
    #[error("I/O error on {}: {source}", path.display())]
    Io {
        /// Registry file path.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },

    /// The registry file is not valid JSON.
    #[error("invalid JSON in registry: {source}")]
    InvalidJson {
        /// Parser error.
        source: serde_json::Error,
    },

    /// A required top-level key is absent.
    #[error("registry missing '{key}' key")]
    MissingKey {
        /// Name of the missing key.
        key: &'static str,
    },

    /// The registry was written by a newer version of the tool.
    #[error("registry version {found} is newer than supported version {supported}")]
    UnsupportedVersion {
        /// Version found in the file.
        found: u64,
        /// Highest version this build understands.
        supported: u64,
    },

    /// The in-memory registry could not be encoded for saving.
    #[error("cannot serialize registry: {source}")]
    Serialize {
        /// Encoder error.
        source: serde_json::Error,
    },

    /// The document is JSON but does not have the expected shape.
    #[error("malformed registry: {reason}")]
    Malformed {
        /// Human-readable description of the problem.
        reason: String,
    },
}

/// Errors raised while mutating the filesystem.
///
/// Any of these may leave a package partially installed or uninstalled.
#[derive(Error, Debug)]
pub enum ExecutionError {
    /// Something appeared at a path that was free when the plan was made.
    #[error("path already exists (filesystem changed after planning): {}", path.display())]
    PathOccupied {
        /// Path that is now occupied.
        path: PathBuf,
    },

    /// A real directory sits where a link was to be forced.
    #[error("cannot replace directory with symlink: {}", path.display())]
    IsADirectory {
        /// Directory path.
        path: PathBuf,
    },

    /// A link recorded for removal no longer exists.
    #[error("symlink vanished before removal: {}", path.display())]
    LinkVanished {
        /// Link path.
        path: PathBuf,
    },

    /// A link recorded for removal was replaced by something that is not a link.
    #[error("expected a symlink at {}", path.display())]
    NotASymlink {
        /// Path that is no longer a link.
        path: PathBuf,
    },

    /// A link recorded for removal now points somewhere else.
    #[error(
        "symlink {} points to {}, expected {}",
        path.display(),
        points_to.display(),
        expected.display()
    )]
    LinkRepointed {
        /// Link path.
        path: PathBuf,
        /// Current link target.
        points_to: PathBuf,
        /// Recorded source.
        expected: PathBuf,
    },

    /// A filesystem call failed.
    #[error("failed to {action} {}: {source}", path.display())]
    Io {
        /// Short description of the attempted operation.
        action: &'static str,
        /// Path the operation was applied to.
        path: PathBuf,
        /// Underlying I/O error.
        source: std::io::Error,
    },
}
