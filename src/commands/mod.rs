//! Subcommand orchestration: resolve settings, run an operation, render it.
pub mod install;
pub mod render;
pub mod uninstall;
pub mod version;

use std::path::{Path, PathBuf};

use anyhow::Result;

use crate::cli::GlobalOpts;
use crate::config::{Environment, Settings};
use crate::error::HauntError;
use crate::logging::Log;

/// State shared by the `install` and `uninstall` commands.
///
/// Encapsulates settings loading and registry-path resolution so each
/// command does not repeat it.
#[derive(Debug)]
pub struct Session {
    /// Environment snapshot used for default paths.
    pub env: Environment,
    /// Parsed settings file (empty when none exists).
    pub settings: Settings,
    /// Registry file in effect for this run.
    pub registry_path: PathBuf,
}

impl Session {
    /// Load settings and resolve the registry path.
    ///
    /// # Errors
    ///
    /// Returns an error if the settings file is unreadable or invalid, or if
    /// the registry path needs a home directory that is unknown.
    pub fn init(global: &GlobalOpts, env: Environment, log: &dyn Log) -> Result<Self> {
        let settings = Settings::load(global.config.as_deref(), &env)?;
        let registry_path = settings.registry_path(global.registry.as_deref(), &env)?;
        log.debug(&format!("registry: {}", registry_path.display()));
        Ok(Self {
            env,
            settings,
            registry_path,
        })
    }

    /// Home directory used to abbreviate displayed paths.
    #[must_use]
    pub fn home(&self) -> Option<&Path> {
        self.env.home.as_deref()
    }

    /// Warn that a failed mutation may have left work half done.
    fn warn_partial_state(&self, err: &HauntError, action: &str, log: &dyn Log) {
        if err.may_leave_partial_state() {
            log.warn(&format!(
                "package may be partially {action}; check the filesystem and the registry at {}",
                render::display_path(&self.registry_path, self.home())
            ));
        }
    }
}

/// Print a failed command's error.
///
/// Conflicts get the full conflict report; everything else prints the error
/// and its causes on one line.
pub fn report_error(err: &anyhow::Error, home: Option<&Path>, log: &dyn Log) {
    match err.downcast_ref::<HauntError>() {
        Some(HauntError::Conflict(conflicts)) => {
            log.error(&render::conflict_report(conflicts, home));
        }
        _ => log.error(&format!("{err:#}")),
    }
}
