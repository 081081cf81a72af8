//! Uninstall planning and execution.
use std::path::{Path, PathBuf};

use crate::error::{InputError, Result};
use crate::registry::Registry;
use crate::resources::Symlink;
use crate::resources::fs::{lstat, prune_empty_parents};

/// What an uninstall would do, reconciled against the live filesystem.
///
/// Every link recorded for the package lands in exactly one of the three
/// lists.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UninstallPlan {
    /// Registered package name.
    pub package_name: String,
    /// Directory the links were installed into; pruning stops here.
    pub target_dir: PathBuf,
    /// Links still pointing at the package.
    pub symlinks_to_remove: Vec<Symlink>,
    /// Recorded link paths where nothing exists any more.
    pub missing_symlinks: Vec<PathBuf>,
    /// Recorded links replaced or repointed since install.  Left alone.
    pub modified_symlinks: Vec<Symlink>,
}

/// Plan uninstalling `package_name` using an already-loaded registry.
///
/// Links are inspected without being followed.
///
/// # Errors
///
/// Returns [`InputError::PackageNotInstalled`] if the name is not registered,
/// or an inspect error if a link path cannot be examined.
pub fn plan_uninstall(package_name: &str, registry: &Registry) -> Result<UninstallPlan> {
    let entry = registry
        .get(package_name)
        .ok_or_else(|| InputError::PackageNotInstalled {
            name: package_name.to_string(),
        })?;

    let mut plan = UninstallPlan {
        package_name: package_name.to_string(),
        target_dir: entry.target_dir.clone(),
        symlinks_to_remove: Vec::new(),
        missing_symlinks: Vec::new(),
        modified_symlinks: Vec::new(),
    };
    for symlink in &entry.symlinks {
        if lstat(&symlink.link_path)?.is_none() {
            plan.missing_symlinks.push(symlink.link_path.clone());
        } else if symlink.exists() {
            plan.symlinks_to_remove.push(symlink.clone());
        } else {
            plan.modified_symlinks.push(symlink.clone());
        }
    }
    tracing::debug!(
        "planned uninstall of {}: {} to remove, {} missing, {} modified",
        plan.package_name,
        plan.symlinks_to_remove.len(),
        plan.missing_symlinks.len(),
        plan.modified_symlinks.len()
    );
    Ok(plan)
}

/// Load the registry at `registry_path` and plan uninstalling `package_name`.
///
/// # Errors
///
/// Returns a registry error if the file cannot be loaded, otherwise as
/// [`plan_uninstall`].
pub fn compute_uninstall_plan(package_name: &str, registry_path: &Path) -> Result<UninstallPlan> {
    let registry = Registry::load(registry_path)?;
    plan_uninstall(package_name, &registry)
}

/// Remove the planned links, prune emptied directories, and drop the
/// package from `registry`.  The caller persists it.
///
/// Returns the directories that were pruned.
///
/// # Errors
///
/// Returns [`InputError::PackageNotInstalled`] before touching anything if
/// the entry has disappeared from `registry`.  Returns an execution error if a
/// link vanished or changed after planning, or cannot be removed; links
/// removed before the failure stay removed and the entry is kept.
pub fn apply_uninstall(plan: &UninstallPlan, registry: &mut Registry) -> Result<Vec<PathBuf>> {
    if registry.get(&plan.package_name).is_none() {
        return Err(InputError::PackageNotInstalled {
            name: plan.package_name.clone(),
        }
        .into());
    }

    for symlink in &plan.symlinks_to_remove {
        symlink.remove()?;
    }
    let removed: Vec<PathBuf> = plan
        .symlinks_to_remove
        .iter()
        .map(|s| s.link_path.clone())
        .collect();
    let pruned = prune_empty_parents(&plan.target_dir, &removed)?;

    registry.remove(&plan.package_name);
    Ok(pruned)
}

/// Load the registry at `registry_path`, apply `plan`, and save.
///
/// # Errors
///
/// Returns any error from loading, [`apply_uninstall`], or saving.  Nothing
/// is saved if applying fails.
pub fn execute_uninstall_plan(plan: &UninstallPlan, registry_path: &Path) -> Result<Vec<PathBuf>> {
    let mut registry = Registry::load(registry_path)?;
    let pruned = apply_uninstall(plan, &mut registry)?;
    registry.save(registry_path)?;
    Ok(pruned)
}
