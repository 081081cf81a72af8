//! User settings and default-path resolution.
//!
//! Everything here belongs to the command-line front end.  The engine in
//! [`operations`](crate::operations) takes its paths and conflict mode as
//! arguments and never consults the environment.
//!
//! Precedence, highest first: command-line flag (or its environment
//! variable), settings file, built-in default.
pub mod paths;

use std::path::{Path, PathBuf};

use anyhow::{Context as _, Result};
use serde::Deserialize;

pub use paths::Environment;

use crate::resources::ConflictMode;

/// Contents of `config.toml`.  Every key is optional.
///
/// ```toml
/// target = "~"
/// on_conflict = "skip"
/// registry = "~/.local/state/haunt/registry.json"
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Default target directory.
    pub target: Option<PathBuf>,
    /// Default conflict mode for `install`.
    pub on_conflict: Option<ConflictMode>,
    /// Registry file location.
    pub registry: Option<PathBuf>,
}

impl Settings {
    /// Parse settings from TOML text.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid TOML, unknown keys, or bad values.
    pub fn from_toml(text: &str) -> Result<Self> {
        toml::from_str(text).context("Failed to parse settings")
    }

    /// Load settings from `explicit`, or from the default location.
    ///
    /// A missing file at the default location yields empty settings; a
    /// missing file that was named explicitly is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(explicit: Option<&Path>, env: &Environment) -> Result<Self> {
        let path = match explicit {
            Some(path) => path.to_path_buf(),
            None => match env.default_config_path() {
                Ok(path) if path.exists() => path,
                _ => return Ok(Self::default()),
            },
        };
        let content = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let settings = Self::from_toml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;
        tracing::debug!("loaded settings from {}", path.display());
        Ok(settings)
    }

    /// Target directory: `cli`, else the configured `target`, else home.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is needed and unknown.
    pub fn target_dir(&self, cli: Option<&Path>, env: &Environment) -> Result<PathBuf> {
        if let Some(path) = cli {
            return Ok(path.to_path_buf());
        }
        match &self.target {
            Some(path) => env.expand_tilde(path),
            None => Ok(env.home()?.to_path_buf()),
        }
    }

    /// Registry file: `cli`, else the configured `registry`, else the XDG
    /// state directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is needed and unknown.
    pub fn registry_path(&self, cli: Option<&Path>, env: &Environment) -> Result<PathBuf> {
        if let Some(path) = cli {
            return Ok(path.to_path_buf());
        }
        match &self.registry {
            Some(path) => env.expand_tilde(path),
            None => env.default_registry_path(),
        }
    }

    /// Conflict mode: `cli`, else the configured `on_conflict`, else abort.
    #[must_use]
    pub fn conflict_mode(&self, cli: Option<ConflictMode>) -> ConflictMode {
        cli.or(self.on_conflict).unwrap_or_default()
    }
}
