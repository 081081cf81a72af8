//! Human-readable rendering of plans and failures.
//!
//! Summary and report text is built by pure functions so it can be checked
//! without a terminal; the `render_*` functions route it through a [`Log`].
use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::ConflictError;
use crate::logging::Log;
use crate::operations::{InstallPlan, UninstallPlan};
use crate::resources::fs::resolve_path;
use crate::resources::{Conflict, ConflictMode};

/// Show `path` relative to `home` as `~/...` when it lies beneath it.
#[must_use]
pub fn display_path(path: &Path, home: Option<&Path>) -> String {
    match home.and_then(|home| path.strip_prefix(home).ok()) {
        Some(rest) if rest.as_os_str().is_empty() => "~".to_string(),
        Some(rest) => format!("~/{}", rest.display()),
        None => path.display().to_string(),
    }
}

/// `"1 symlink"` / `"2 symlinks"`.
fn symlinks(n: usize) -> String {
    format!("{n} symlink{}", if n == 1 { "" } else { "s" })
}

/// One-line outcome of an install, e.g.
/// `Installed shell (2 symlinks created, 1 already correct)`.
#[must_use]
pub fn install_summary(plan: &InstallPlan, dry_run: bool) -> String {
    let (created, replaced) = if dry_run {
        ("would be created", "would be replaced")
    } else {
        ("created", "replaced")
    };

    let mut parts = Vec::new();
    let new = plan.new_symlinks().count();
    if new > 0 {
        parts.push(format!("{} {created}", symlinks(new)));
    }
    let replacements = plan.replacements().count();
    if replacements > 0 {
        parts.push(format!("{replacements} {replaced}"));
    }
    let correct = plan.already_correct().count();
    if correct > 0 {
        parts.push(format!("{correct} already correct"));
    }
    let skipped = plan.skipped().count();
    if skipped > 0 {
        parts.push(format!("{skipped} skipped"));
    }

    let action = if dry_run { "Would install" } else { "Installed" };
    let detail = if parts.is_empty() {
        "no changes".to_string()
    } else {
        parts.join(", ")
    };
    format!("{action} {} ({detail})", plan.package_name)
}

/// One-line outcome of an uninstall, e.g.
/// `Uninstalled shell (2 symlinks removed, 1 missing)`.
#[must_use]
pub fn uninstall_summary(plan: &UninstallPlan, dry_run: bool) -> String {
    let removed = if dry_run {
        "would be removed"
    } else {
        "removed"
    };
    let mut parts = vec![format!(
        "{} {removed}",
        symlinks(plan.symlinks_to_remove.len())
    )];
    if !plan.missing_symlinks.is_empty() {
        parts.push(format!("{} missing", plan.missing_symlinks.len()));
    }
    if !plan.modified_symlinks.is_empty() {
        parts.push(format!(
            "{} skipped (modified)",
            plan.modified_symlinks.len()
        ));
    }
    let action = if dry_run {
        "Would uninstall"
    } else {
        "Uninstalled"
    };
    format!("{action} {} ({})", plan.package_name, parts.join(", "))
}

/// Multi-line description of blocking conflicts with a hint on how to
/// proceed.
///
/// Conflicts other than directories only fail an install under
/// [`ConflictMode::Abort`], so they always get the flag hint.
#[must_use]
pub fn conflict_report(err: &ConflictError, home: Option<&Path>) -> String {
    let mut out = String::from("conflicts detected:");
    for conflict in &err.conflicts {
        let _ = write!(
            out,
            "\n  {} ({})",
            display_path(conflict.path(), home),
            conflict.label()
        );
    }
    if err.has_directories() {
        out.push_str("\ndirectory conflicts require manual resolution (cannot be forced)");
    } else {
        out.push_str("\nrun with --on-conflict=skip or --on-conflict=force");
    }
    out
}

/// `link -> source` with home-relative paths.
fn arrow(link: &Path, source: &Path, home: Option<&Path>) -> String {
    format!(
        "  {} -> {}",
        display_path(link, home),
        display_path(source, home)
    )
}

/// Log a titled list, or nothing when `items` is empty.
fn section(log: &dyn Log, title: &str, items: &[String]) {
    if items.is_empty() {
        return;
    }
    log.info(title);
    for item in items {
        log.info(item);
    }
}

/// Print what an install does (or would do), section by section.
pub fn render_install_plan(
    log: &dyn Log,
    plan: &InstallPlan,
    mode: ConflictMode,
    dry_run: bool,
    home: Option<&Path>,
) {
    let new: Vec<String> = plan
        .new_symlinks()
        .map(|s| arrow(&s.link_path, &s.source_path, home))
        .collect();
    section(
        log,
        if dry_run {
            "Would create symlinks:"
        } else {
            "Creating symlinks:"
        },
        &new,
    );

    let replaced: Vec<String> = plan
        .replacements()
        .map(|c| format!("  {} ({})", display_path(c.path(), home), c.label()))
        .collect();
    section(
        log,
        if dry_run {
            "Would replace files/symlinks:"
        } else {
            "Replacing files/symlinks:"
        },
        &replaced,
    );

    let correct: Vec<String> = plan
        .already_correct()
        .map(|c| arrow(c.path(), &correct_source(c), home))
        .collect();
    section(log, "Already correct:", &correct);

    if mode == ConflictMode::Skip {
        let skipped: Vec<String> = plan
            .skipped()
            .map(|c| format!("  {} ({})", display_path(c.path(), home), c.label()))
            .collect();
        section(log, "Skipped (conflict):", &skipped);
    }
}

/// Absolute location an already-correct link resolves to.
fn correct_source(conflict: &Conflict) -> PathBuf {
    let path = conflict.path();
    let parent = path.parent().unwrap_or(path);
    resolve_path(&parent.join(conflict.points_to().unwrap_or(path)))
}

/// Print what an uninstall does (or would do), section by section.
pub fn render_uninstall_plan(
    log: &dyn Log,
    plan: &UninstallPlan,
    dry_run: bool,
    home: Option<&Path>,
) {
    let remove: Vec<String> = plan
        .symlinks_to_remove
        .iter()
        .map(|s| format!("  {}", display_path(&s.link_path, home)))
        .collect();
    section(
        log,
        if dry_run {
            "Would remove symlinks:"
        } else {
            "Removing symlinks:"
        },
        &remove,
    );

    let missing: Vec<String> = plan
        .missing_symlinks
        .iter()
        .map(|p| format!("  {}", display_path(p, home)))
        .collect();
    section(log, "Missing:", &missing);

    let modified: Vec<String> = plan
        .modified_symlinks
        .iter()
        .map(|s| format!("  {}", display_path(&s.link_path, home)))
        .collect();
    section(log, "Skipped (modified):", &modified);
}

/// Print the closing `✓` line for a finished (or previewed) command.
pub fn render_done(log: &dyn Log, summary: &str) {
    log.info(&format!("✓ {summary}"));
}
