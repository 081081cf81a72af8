//! Install planning and execution.
use std::path::{Path, PathBuf};

use chrono::Utc;

use super::paths::{
    normalize_package_dir, normalize_target_dir, package_name, validate_install_directories,
};
use crate::error::{ConflictError, InputError, Result};
use crate::registry::{PackageEntry, Registry};
use crate::resources::fs::{discover_files, resolve_path};
use crate::resources::{Conflict, ConflictMode, Symlink, classify};

/// What an install would do, computed without touching the filesystem.
///
/// Under [`ConflictMode::Force`] a replaceable conflict's path appears both in
/// `conflicts` (to report the replacement) and in `symlinks_to_create`.
/// Otherwise each path appears in at most one list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InstallPlan {
    /// Base name of the package directory.
    pub package_name: String,
    /// Canonical package directory.
    pub package_dir: PathBuf,
    /// Absolute target directory.
    pub target_dir: PathBuf,
    /// Links to write, in package order.
    pub symlinks_to_create: Vec<Symlink>,
    /// Everything found in the way, in package order.
    pub conflicts: Vec<Conflict>,
}

impl InstallPlan {
    /// Whether a link is planned at `path`.
    fn creates(&self, path: &Path) -> bool {
        self.symlinks_to_create.iter().any(|s| s.link_path == path)
    }

    /// Links that go where nothing currently exists.
    pub fn new_symlinks(&self) -> impl Iterator<Item = &Symlink> {
        self.symlinks_to_create
            .iter()
            .filter(|s| !self.conflicts.iter().any(|c| c.path() == s.link_path))
    }

    /// Conflicts that a forced install replaces.
    pub fn replacements(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.is_blocking() && self.creates(c.path()))
    }

    /// Links that already point at the package.
    pub fn already_correct(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| !c.is_blocking())
    }

    /// Conflicts left untouched by the install.
    pub fn skipped(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts
            .iter()
            .filter(|c| c.is_blocking() && !self.creates(c.path()))
    }

    /// Every conflict that obstructs the install.
    pub fn blocking_conflicts(&self) -> impl Iterator<Item = &Conflict> {
        self.conflicts.iter().filter(|c| c.is_blocking())
    }

    /// Whether any conflict is a real directory.
    #[must_use]
    pub fn has_directory_conflicts(&self) -> bool {
        self.conflicts
            .iter()
            .any(|c| matches!(c, Conflict::Directory { .. }))
    }

    /// Check the plan against `mode` before anything is written.
    ///
    /// Directory conflicts fail under every mode.  Under
    /// [`ConflictMode::Abort`] any other blocking conflict fails too.
    ///
    /// # Errors
    ///
    /// Returns a [`ConflictError`] listing every blocking conflict.
    pub fn check_conflicts(&self, mode: ConflictMode) -> Result<(), ConflictError> {
        if self.has_directory_conflicts() || mode == ConflictMode::Abort {
            let blocking: Vec<Conflict> = self.blocking_conflicts().cloned().collect();
            if !blocking.is_empty() {
                return Err(ConflictError::new(blocking));
            }
        }
        Ok(())
    }

    /// Check that the package name is free in `registry`, or already bound
    /// to this plan's package directory.
    ///
    /// Entries written before the package directory was recorded never
    /// collide.
    ///
    /// # Errors
    ///
    /// Returns [`InputError::AlreadyInstalled`] if the name is registered
    /// from a different directory.
    pub fn check_registry(&self, registry: &Registry) -> Result<(), InputError> {
        if let Some(existing) = registry.get(&self.package_name)
            && let Some(existing_dir) = &existing.package_dir
            && *existing_dir != self.package_dir
        {
            return Err(InputError::AlreadyInstalled {
                name: self.package_name.clone(),
                existing: existing_dir.clone(),
                requested: self.package_dir.clone(),
            });
        }
        Ok(())
    }

    /// Every link the package owns once the plan has been applied: the links
    /// it creates plus those that were already correct, sorted by link path.
    #[must_use]
    pub fn owned_symlinks(&self) -> Vec<Symlink> {
        let mut owned = self.symlinks_to_create.clone();
        owned.extend(self.already_correct().map(|c| self.reconstruct(c)));
        owned.sort();
        owned.dedup_by(|a, b| a.link_path == b.link_path);
        owned
    }

    /// Rebuild the expected link for an already-correct conflict.
    fn reconstruct(&self, conflict: &Conflict) -> Symlink {
        let path = conflict.path();
        let source = path.strip_prefix(&self.target_dir).map_or_else(
            |_| {
                let parent = path.parent().unwrap_or(path);
                resolve_path(&parent.join(conflict.points_to().unwrap_or(path)))
            },
            |relative| self.package_dir.join(relative),
        );
        Symlink::new(path.to_path_buf(), source)
    }
}

/// Plan installing `package_dir` into `target_dir`.
///
/// Every file in the package is paired with a link at the same relative path
/// under `target_dir` and classified.  Free paths are always planned.  Under
/// [`ConflictMode::Force`] replaceable conflicts are planned as well;
/// directories and already-correct links never are.
///
/// # Errors
///
/// Returns an input error for a missing, non-directory or root package, or a
/// target inside the package.  Returns an inspect error if the package or
/// target tree cannot be examined.
pub fn compute_install_plan(
    package_dir: &Path,
    target_dir: &Path,
    mode: ConflictMode,
) -> Result<InstallPlan> {
    let package_dir = normalize_package_dir(package_dir)?;
    let target_dir = normalize_target_dir(target_dir);
    validate_install_directories(&package_dir, &target_dir)?;

    let mut symlinks_to_create = Vec::new();
    let mut conflicts = Vec::new();
    for relative in discover_files(&package_dir)? {
        let symlink = Symlink::new(target_dir.join(&relative), package_dir.join(&relative));
        match classify(&symlink)? {
            None => symlinks_to_create.push(symlink),
            Some(conflict) => {
                if mode.is_force() && conflict.is_replaceable() {
                    symlinks_to_create.push(symlink);
                }
                conflicts.push(conflict);
            }
        }
    }

    let plan = InstallPlan {
        package_name: package_name(&package_dir),
        package_dir,
        target_dir,
        symlinks_to_create,
        conflicts,
    };
    tracing::debug!(
        "planned {}: {} to create, {} conflict(s)",
        plan.package_name,
        plan.symlinks_to_create.len(),
        plan.conflicts.len()
    );
    Ok(plan)
}

/// Apply `plan` to the filesystem and record the result in `registry`.
///
/// All checks run before the first link is written.  The registry is only
/// modified after every link has been created.  The caller persists it.
///
/// # Errors
///
/// Returns [`InputError::AlreadyInstalled`] per
/// [`InstallPlan::check_registry`], a [`ConflictError`] per
/// [`InstallPlan::check_conflicts`], or an execution error if a link cannot
/// be created.  Execution errors may leave some links in place.
pub fn apply_install(
    plan: &InstallPlan,
    registry: &mut Registry,
    mode: ConflictMode,
) -> Result<PackageEntry> {
    plan.check_registry(registry)?;
    plan.check_conflicts(mode)?;

    let force = mode.is_force();
    for symlink in &plan.symlinks_to_create {
        symlink.create(force)?;
    }

    let entry = PackageEntry {
        name: plan.package_name.clone(),
        package_dir: Some(plan.package_dir.clone()),
        target_dir: plan.target_dir.clone(),
        symlinks: plan.owned_symlinks(),
        installed_at: Utc::now(),
    };
    registry.insert(entry.clone());
    Ok(entry)
}

/// Load the registry at `registry_path`, apply `plan`, and save.
///
/// # Errors
///
/// Returns any error from loading, [`apply_install`], or saving.  Nothing is
/// saved if applying fails.
pub fn execute_install_plan(
    plan: &InstallPlan,
    registry_path: &Path,
    mode: ConflictMode,
) -> Result<PackageEntry> {
    let mut registry = Registry::load(registry_path)?;
    let entry = apply_install(plan, &mut registry, mode)?;
    registry.save(registry_path)?;
    Ok(entry)
}
