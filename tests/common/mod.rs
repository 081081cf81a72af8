// Shared helpers for integration tests.
//
// Provides a temporary-directory-backed package, target tree and registry
// path with a fluent builder, plus a `Log` implementation that captures what
// the commands would print.
//
// Used by all integration test binaries that declare `mod common;`.
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::Mutex;

use haunt::commands::Session;
use haunt::config::{Environment, Settings};
use haunt::logging::Log;
use haunt::registry::Registry;

/// A temporary directory with symlinks in its path resolved, so paths built
/// from it compare equal to canonicalized paths (macOS `/tmp` is a symlink).
pub fn canonical_tempdir() -> (tempfile::TempDir, PathBuf) {
    let dir = tempfile::tempdir().expect("create temp dir");
    let root = dunce::canonicalize(dir.path()).expect("canonicalize temp dir");
    (dir, root)
}

/// An isolated package, target directory and registry file.
///
/// The tree is deleted when dropped (via the underlying
/// [`tempfile::TempDir`]).
pub struct Fixture {
    _dir: tempfile::TempDir,
    /// Canonical temp directory root.
    pub root: PathBuf,
    /// Package directory (`<root>/<name>`).
    pub package: PathBuf,
    /// Target directory (`<root>/home`), also used as the home directory.
    pub target: PathBuf,
    /// Registry file (`<root>/state/registry.json`), not created up front.
    pub registry: PathBuf,
}

impl Fixture {
    /// Create an empty package called `name` and an empty target.
    pub fn new(name: &str) -> Self {
        let (dir, root) = canonical_tempdir();
        let package = root.join(name);
        let target = root.join("home");
        std::fs::create_dir_all(&package).expect("create package dir");
        std::fs::create_dir_all(&target).expect("create target dir");
        Self {
            _dir: dir,
            registry: root.join("state").join("registry.json"),
            root,
            package,
            target,
        }
    }

    /// Add a file to the package.
    pub fn file(self, rel: &str) -> Self {
        write_file(&self.package.join(rel), rel);
        self
    }

    /// Add several files to the package.
    pub fn files(self, rels: &[&str]) -> Self {
        rels.iter().fold(self, |fx, rel| fx.file(rel))
    }

    /// Put a regular file in the target tree.
    pub fn target_file(self, rel: &str) -> Self {
        write_file(&self.target.join(rel), "existing");
        self
    }

    /// Put a directory in the target tree.
    pub fn target_dir(self, rel: &str) -> Self {
        std::fs::create_dir_all(self.target.join(rel)).expect("create target subdir");
        self
    }

    /// Put a symlink in the target tree pointing at `points_to`.
    #[cfg(unix)]
    pub fn target_link(self, rel: &str, points_to: &Path) -> Self {
        let link = self.target.join(rel);
        if let Some(parent) = link.parent() {
            std::fs::create_dir_all(parent).expect("create link parent");
        }
        std::os::unix::fs::symlink(points_to, link).expect("create symlink");
        self
    }

    /// Path of `rel` in the target tree.
    pub fn link(&self, rel: &str) -> PathBuf {
        self.target.join(rel)
    }

    /// Path of `rel` in the package.
    pub fn source(&self, rel: &str) -> PathBuf {
        self.package.join(rel)
    }

    /// Load the registry file.
    pub fn registry(&self) -> Registry {
        Registry::load(&self.registry).expect("load registry")
    }

    /// Write a settings file and return its path.
    pub fn settings_file(&self, contents: &str) -> PathBuf {
        let path = self.root.join("config.toml");
        std::fs::write(&path, contents).expect("write settings");
        path
    }

    /// A command session whose home and default target is [`Self::target`].
    pub fn session(&self) -> Session {
        Session {
            env: Environment {
                home: Some(self.target.clone()),
                ..Environment::default()
            },
            settings: Settings::default(),
            registry_path: self.registry.clone(),
        }
    }
}

fn write_file(path: &Path, contents: &str) {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).expect("create parent dir");
    }
    std::fs::write(path, contents).expect("write file");
}

/// Whether `path` is a symlink whose target resolves to `source`.
pub fn links_to(path: &Path, source: &Path) -> bool {
    path.symlink_metadata()
        .is_ok_and(|m| m.file_type().is_symlink())
        && dunce::canonicalize(path).ok().as_deref() == Some(source)
}

/// Captures every message routed through [`Log`].
#[derive(Default)]
pub struct CapturedLog {
    lines: Mutex<Vec<String>>,
}

impl CapturedLog {
    fn push(&self, level: &str, msg: &str) {
        self.lines
            .lock()
            .expect("lock captured log")
            .push(format!("{level}: {msg}"));
    }

    /// Every captured line, prefixed with its level.
    pub fn text(&self) -> String {
        self.lines.lock().expect("lock captured log").join("\n")
    }
}

impl Log for CapturedLog {
    fn stage(&self, msg: &str) {
        self.push("stage", msg);
    }
    fn info(&self, msg: &str) {
        self.push("info", msg);
    }
    fn debug(&self, msg: &str) {
        self.push("debug", msg);
    }
    fn warn(&self, msg: &str) {
        self.push("warn", msg);
    }
    fn error(&self, msg: &str) {
        self.push("error", msg);
    }
    fn dry_run(&self, msg: &str) {
        self.push("dry_run", msg);
    }
}
