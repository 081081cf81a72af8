//! Package and target directory normalization.
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{HauntError, InputError};
use crate::resources::fs::resolve_path;

/// Resolve `package_dir` to a canonical absolute directory.
///
/// # Errors
///
/// Returns [`InputError::PackageDirNotFound`] if nothing exists at the path,
/// [`InputError::NotADirectory`] if it is not a directory, or
/// [`HauntError::Inspect`] if it cannot be examined.
pub fn normalize_package_dir(package_dir: &Path) -> Result<PathBuf, HauntError> {
    let resolved = match dunce::canonicalize(package_dir) {
        Ok(path) => path,
        Err(e) if matches!(e.kind(), io::ErrorKind::NotFound | io::ErrorKind::NotADirectory) => {
            return Err(InputError::PackageDirNotFound {
                path: resolve_path(package_dir),
            }
            .into());
        }
        Err(source) => {
            return Err(HauntError::Inspect {
                path: package_dir.to_path_buf(),
                source,
            });
        }
    };
    if !resolved.is_dir() {
        return Err(InputError::NotADirectory { path: resolved }.into());
    }
    Ok(resolved)
}

/// Resolve `target_dir` to an absolute path.  The directory need not exist.
#[must_use]
pub fn normalize_target_dir(target_dir: &Path) -> PathBuf {
    resolve_path(target_dir)
}

/// Reject installs that would link a package into itself.
///
/// Both arguments must already be normalized.
///
/// # Errors
///
/// Returns [`InputError::RootPackage`] when `package_dir` is the filesystem
/// root, or [`InputError::TargetInsidePackage`] when `target_dir` equals or
/// lies beneath `package_dir`.
pub fn validate_install_directories(
    package_dir: &Path,
    target_dir: &Path,
) -> Result<(), InputError> {
    if package_dir.parent().is_none() {
        return Err(InputError::RootPackage);
    }
    if target_dir.starts_with(package_dir) {
        return Err(InputError::TargetInsidePackage {
            target: target_dir.to_path_buf(),
            package: package_dir.to_path_buf(),
        });
    }
    Ok(())
}

/// Package name: the base name of the package directory.
pub(crate) fn package_name(package_dir: &Path) -> String {
    package_dir
        .file_name()
        .map_or_else(String::new, |name| name.to_string_lossy().into_owned())
}
