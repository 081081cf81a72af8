#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::wildcard_imports,
    clippy::indexing_slicing
)]
//! Integration tests for installing packages.
//!
//! These drive the public planner/executor API and the `install` command
//! against real temporary directory trees.
#![cfg(unix)]

mod common;

use common::*;

use haunt::cli::InstallOpts;
use haunt::commands;
use haunt::error::{ExecutionError, HauntError, InputError};
use haunt::operations::{compute_install_plan, execute_install_plan};
use haunt::resources::{Conflict, ConflictMode, Symlink};

fn opts(fx: &Fixture, dry_run: bool, on_conflict: Option<ConflictMode>) -> InstallOpts {
    InstallOpts {
        package: fx.package.clone(),
        target: Some(fx.target.clone()),
        dry_run,
        on_conflict,
    }
}

// ---------------------------------------------------------------------------
// Worked example
// ---------------------------------------------------------------------------

#[test]
fn shell_package_into_empty_target() {
    let fx = Fixture::new("shell").files(&[".bashrc", ".config/nvim/init.vim"]);

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    assert_eq!(plan.symlinks_to_create.len(), 2);
    assert!(plan.conflicts.is_empty());

    execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap();

    assert!(links_to(&fx.link(".bashrc"), &fx.source(".bashrc")));
    assert!(links_to(
        &fx.link(".config/nvim/init.vim"),
        &fx.source(".config/nvim/init.vim")
    ));
    let registry = fx.registry();
    let entry = registry.get("shell").expect("entry for shell");
    assert_eq!(entry.symlinks.len(), 2);
    assert_eq!(entry.target_dir, fx.target);
    assert_eq!(entry.package_dir.as_deref(), Some(fx.package.as_path()));
}

#[test]
fn links_are_relative() {
    let fx = Fixture::new("shell").file(".bashrc");
    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap();

    let raw = std::fs::read_link(fx.link(".bashrc")).unwrap();
    assert!(raw.is_relative(), "expected relative link, got {}", raw.display());
}

// ---------------------------------------------------------------------------
// Idempotence
// ---------------------------------------------------------------------------

#[test]
fn installing_twice_matches_installing_once() {
    let fx = Fixture::new("shell").files(&[".bashrc", ".config/nvim/init.vim"]);

    let first = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    execute_install_plan(&first, &fx.registry, ConflictMode::Abort).unwrap();
    let once = fx.registry();

    let second = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    assert!(second.symlinks_to_create.is_empty());
    assert_eq!(second.already_correct().count(), 2);
    execute_install_plan(&second, &fx.registry, ConflictMode::Abort).unwrap();
    let twice = fx.registry();

    let a = once.get("shell").unwrap();
    let b = twice.get("shell").unwrap();
    assert_eq!(a.symlinks, b.symlinks);
    assert_eq!(a.target_dir, b.target_dir);
    assert_eq!(a.package_dir, b.package_dir);
    assert_eq!(once.packages.len(), twice.packages.len());
}

#[test]
fn correct_link_made_by_hand_is_adopted() {
    let fx = Fixture::new("shell").files(&[".bashrc", ".profile"]);
    let fx = {
        let source = fx.source(".bashrc");
        fx.target_link(".bashrc", &source)
    };

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    assert_eq!(plan.conflicts.len(), 1);
    assert!(matches!(plan.conflicts[0], Conflict::CorrectSymlink { .. }));
    assert!(
        plan.symlinks_to_create
            .iter()
            .all(|s| s.link_path != fx.link(".bashrc"))
    );

    execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap();
    let registry = fx.registry();
    let links: Vec<&Symlink> = registry.get("shell").unwrap().symlinks.iter().collect();
    assert!(links.contains(&&Symlink::new(fx.link(".bashrc"), fx.source(".bashrc"))));
    assert_eq!(links.len(), 2);
}

// ---------------------------------------------------------------------------
// Conflict policies
// ---------------------------------------------------------------------------

#[test]
fn abort_leaves_everything_untouched() {
    let fx = Fixture::new("shell")
        .files(&[".bashrc", ".profile"])
        .target_file(".bashrc");

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    let err = execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap_err();

    assert!(matches!(err, HauntError::Conflict(ref c) if c.conflicts.len() == 1));
    assert!(!fx.link(".profile").exists());
    assert_eq!(std::fs::read_to_string(fx.link(".bashrc")).unwrap(), "existing");
    assert!(!fx.registry.exists());
}

#[test]
fn skip_links_only_the_free_paths() {
    let fx = Fixture::new("shell")
        .files(&[".bashrc", ".profile"])
        .target_file(".bashrc");

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Skip).unwrap();
    execute_install_plan(&plan, &fx.registry, ConflictMode::Skip).unwrap();

    assert!(links_to(&fx.link(".profile"), &fx.source(".profile")));
    assert_eq!(std::fs::read_to_string(fx.link(".bashrc")).unwrap(), "existing");
    let registry = fx.registry();
    assert_eq!(registry.get("shell").unwrap().symlinks.len(), 1);
}

/// A package with `.bashrc`, `.profile` and `.vimrc`, where `.profile` is
/// already a link to another file and `.vimrc` a dangling link.
fn foreign_links() -> Fixture {
    let fx = Fixture::new("shell").files(&[".bashrc", ".profile", ".vimrc"]);
    std::fs::write(fx.root.join("elsewhere"), "elsewhere").unwrap();
    let elsewhere = fx.root.join("elsewhere");
    let gone = fx.root.join("gone");
    fx.target_link(".profile", &elsewhere)
        .target_link(".vimrc", &gone)
}

#[test]
fn abort_rejects_foreign_and_dangling_links() {
    let fx = foreign_links();

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    assert!(matches!(
        plan.conflicts.as_slice(),
        [
            Conflict::DifferentSymlink { .. },
            Conflict::BrokenSymlink { .. }
        ]
    ));
    let err = execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap_err();

    assert!(matches!(err, HauntError::Conflict(ref c) if c.conflicts.len() == 2));
    assert!(!fx.link(".bashrc").exists());
    assert_eq!(
        std::fs::read_link(fx.link(".profile")).unwrap(),
        fx.root.join("elsewhere")
    );
    assert_eq!(
        std::fs::read_link(fx.link(".vimrc")).unwrap(),
        fx.root.join("gone")
    );
    assert!(!fx.registry.exists());
}

#[test]
fn skip_leaves_foreign_and_dangling_links_alone() {
    let fx = foreign_links();

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Skip).unwrap();
    execute_install_plan(&plan, &fx.registry, ConflictMode::Skip).unwrap();

    assert!(links_to(&fx.link(".bashrc"), &fx.source(".bashrc")));
    assert_eq!(
        std::fs::read_link(fx.link(".profile")).unwrap(),
        fx.root.join("elsewhere")
    );
    assert_eq!(
        std::fs::read_link(fx.link(".vimrc")).unwrap(),
        fx.root.join("gone")
    );
    let registry = fx.registry();
    assert_eq!(
        registry.get("shell").unwrap().symlinks,
        vec![Symlink::new(fx.link(".bashrc"), fx.source(".bashrc"))]
    );
}

#[test]
fn force_replaces_files_and_foreign_links() {
    let fx = Fixture::new("shell")
        .files(&[".bashrc", ".profile", ".vimrc"])
        .target_file(".bashrc");
    std::fs::write(fx.root.join("elsewhere"), "elsewhere").unwrap();
    let fx = {
        let elsewhere = fx.root.join("elsewhere");
        let gone = fx.root.join("gone");
        fx.target_link(".profile", &elsewhere)
            .target_link(".vimrc", &gone)
    };

    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Force).unwrap();
    assert_eq!(plan.replacements().count(), 3);
    execute_install_plan(&plan, &fx.registry, ConflictMode::Force).unwrap();

    for rel in [".bashrc", ".profile", ".vimrc"] {
        assert!(links_to(&fx.link(rel), &fx.source(rel)), "{rel} not linked");
    }
    assert!(fx.root.join("elsewhere").exists());
}

#[test]
fn directories_block_every_policy() {
    let fx = Fixture::new("shell")
        .files(&[".bashrc", ".vim"])
        .target_dir(".vim");

    for mode in [ConflictMode::Abort, ConflictMode::Skip, ConflictMode::Force] {
        let plan = compute_install_plan(&fx.package, &fx.target, mode).unwrap();
        assert!(
            plan.symlinks_to_create
                .iter()
                .all(|s| s.link_path != fx.link(".vim"))
        );
        let err = execute_install_plan(&plan, &fx.registry, mode).unwrap_err();
        let conflicts = match err {
            HauntError::Conflict(conflicts) => Some(conflicts),
            _ => None,
        }
        .expect("expected a conflict error");
        assert!(conflicts.has_directories());
    }
    assert!(fx.link(".vim").is_dir());
    assert!(!fx.link(".bashrc").exists());
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

#[test]
fn missing_package_is_an_input_error() {
    let fx = Fixture::new("shell");
    let err =
        compute_install_plan(&fx.root.join("nope"), &fx.target, ConflictMode::Abort).unwrap_err();
    assert!(matches!(
        err,
        HauntError::Input(InputError::PackageDirNotFound { .. })
    ));
}

#[test]
fn target_inside_package_is_an_input_error() {
    let fx = Fixture::new("shell").file(".bashrc");
    let nested = fx.package.join("sub");
    let err = compute_install_plan(&fx.package, &nested, ConflictMode::Abort).unwrap_err();
    assert!(matches!(
        err,
        HauntError::Input(InputError::TargetInsidePackage { .. })
    ));
}

#[test]
fn same_name_from_another_directory_is_rejected() {
    let fx = Fixture::new("shell").file(".bashrc");
    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap();

    let other = fx.root.join("other").join("shell");
    std::fs::create_dir_all(&other).unwrap();
    std::fs::write(other.join(".zshrc"), "").unwrap();
    let plan = compute_install_plan(&other, &fx.target, ConflictMode::Abort).unwrap();
    let err = execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap_err();
    assert!(matches!(
        err,
        HauntError::Input(InputError::AlreadyInstalled { .. })
    ));
    assert!(!fx.link(".zshrc").exists());
}

// ---------------------------------------------------------------------------
// Races between planning and execution
// ---------------------------------------------------------------------------

#[test]
fn path_filled_after_planning_is_an_execution_error() {
    let fx = Fixture::new("shell").file(".bashrc");
    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    std::fs::write(fx.link(".bashrc"), "raced").unwrap();

    let err = execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap_err();
    assert!(matches!(
        err,
        HauntError::Execution(ExecutionError::PathOccupied { .. })
    ));
    assert!(err.may_leave_partial_state());
}

// ---------------------------------------------------------------------------
// install command
// ---------------------------------------------------------------------------

#[test]
fn command_dry_run_changes_nothing() {
    let fx = Fixture::new("shell").files(&[".bashrc", ".profile"]);
    let log = CapturedLog::default();

    commands::install::run(&fx.session(), &opts(&fx, true, None), &log).unwrap();

    assert!(!fx.link(".bashrc").exists());
    assert!(!fx.registry.exists());
    let text = log.text();
    assert!(text.contains("info: Would create symlinks:"));
    assert!(text.contains("info:   ~/.bashrc -> "));
    assert!(text.contains("Would install shell (2 symlinks would be created)"));
}

#[test]
fn command_dry_run_reports_conflicts() {
    let fx = Fixture::new("shell").file(".bashrc").target_file(".bashrc");
    let log = CapturedLog::default();

    let err = commands::install::run(&fx.session(), &opts(&fx, true, None), &log).unwrap_err();
    commands::report_error(&err, Some(&fx.target), &log);

    assert!(log.text().contains("error: conflicts detected:\n  ~/.bashrc (file)\nrun with"));
    assert!(!fx.registry.exists());
}

#[test]
fn command_dry_run_reports_name_taken_by_another_directory() {
    let fx = Fixture::new("shell").file(".bashrc");
    let plan = compute_install_plan(&fx.package, &fx.target, ConflictMode::Abort).unwrap();
    execute_install_plan(&plan, &fx.registry, ConflictMode::Abort).unwrap();

    let other = fx.root.join("other").join("shell");
    std::fs::create_dir_all(&other).unwrap();
    std::fs::write(other.join(".zshrc"), "").unwrap();
    let install = InstallOpts {
        package: other,
        ..opts(&fx, true, None)
    };
    let log = CapturedLog::default();

    let err = commands::install::run(&fx.session(), &install, &log).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HauntError>(),
        Some(HauntError::Input(InputError::AlreadyInstalled { .. }))
    ));
    assert!(!log.text().contains("Would install"));
    assert!(!fx.link(".zshrc").exists());
}

#[test]
fn command_lists_attempted_links_when_execution_fails() {
    // `.config` is a file, so the link for `.config/nvim/init.vim` plans as
    // free but its parent directory cannot be created.
    let fx = Fixture::new("shell")
        .files(&[".bashrc", ".config/nvim/init.vim"])
        .target_file(".config");
    let log = CapturedLog::default();

    let err = commands::install::run(&fx.session(), &opts(&fx, false, None), &log).unwrap_err();

    assert!(matches!(
        err.downcast_ref::<HauntError>(),
        Some(HauntError::Execution(_))
    ));
    let text = log.text();
    assert!(text.contains("info: Creating symlinks:\ninfo:   ~/.bashrc -> "));
    assert!(text.contains("info:   ~/.config/nvim/init.vim -> "));
    assert!(text.contains("warn: package may be partially installed"));
    assert!(!text.contains("✓"));
    assert!(links_to(&fx.link(".bashrc"), &fx.source(".bashrc")));
    assert!(!fx.registry.exists());
}

#[test]
fn command_prints_summary() {
    let fx = Fixture::new("shell").files(&[".bashrc", ".profile"]);
    let log = CapturedLog::default();

    commands::install::run(&fx.session(), &opts(&fx, false, None), &log).unwrap();

    let text = log.text();
    assert!(text.starts_with("stage: Installing "));
    assert!(text.contains("info: Creating symlinks:"));
    assert!(text.contains("info: ✓ Installed shell (2 symlinks created)"));
    assert!(fx.registry().get("shell").is_some());
}

#[test]
fn command_uses_configured_conflict_mode() {
    let fx = Fixture::new("shell")
        .files(&[".bashrc", ".profile"])
        .target_file(".bashrc");
    let mut session = fx.session();
    session.settings = haunt::config::Settings::from_toml("on_conflict = \"skip\"").unwrap();
    let log = CapturedLog::default();

    commands::install::run(&session, &opts(&fx, false, None), &log).unwrap();

    assert!(log.text().contains("Skipped (conflict):"));
    assert!(links_to(&fx.link(".profile"), &fx.source(".profile")));
}

#[test]
fn command_flag_beats_configured_mode() {
    let fx = Fixture::new("shell").file(".bashrc").target_file(".bashrc");
    let mut session = fx.session();
    session.settings = haunt::config::Settings::from_toml("on_conflict = \"skip\"").unwrap();
    let log = CapturedLog::default();

    commands::install::run(
        &session,
        &opts(&fx, false, Some(ConflictMode::Force)),
        &log,
    )
    .unwrap();

    assert!(links_to(&fx.link(".bashrc"), &fx.source(".bashrc")));
    assert!(log.text().contains("1 replaced"));
}
