//! Default locations derived from the home directory and XDG base directories.
use std::path::{Path, PathBuf};

use anyhow::{Result, bail};

/// Application directory name under the XDG base directories.
const APP_DIR: &str = "haunt";

/// Snapshot of the environment variables that determine default paths.
///
/// Captured once at startup so resolution is a pure function of this value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    /// `$HOME`, or `%USERPROFILE%` on Windows.
    pub home: Option<PathBuf>,
    /// `$XDG_CONFIG_HOME`.
    pub xdg_config_home: Option<PathBuf>,
    /// `$XDG_STATE_HOME`.
    pub xdg_state_home: Option<PathBuf>,
}

impl Environment {
    /// Read the relevant variables from the current process.
    #[must_use]
    pub fn from_process() -> Self {
        let var = |name: &str| std::env::var_os(name).map(PathBuf::from);
        Self {
            home: var("HOME").or_else(|| var("USERPROFILE")),
            xdg_config_home: var("XDG_CONFIG_HOME"),
            xdg_state_home: var("XDG_STATE_HOME"),
        }
    }

    /// The home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if neither `HOME` nor `USERPROFILE` is set.
    pub fn home(&self) -> Result<&Path> {
        match self.home.as_deref() {
            Some(home) if !home.as_os_str().is_empty() => Ok(home),
            _ => bail!("cannot determine home directory: HOME is not set"),
        }
    }

    /// Replace a leading `~` component with the home directory.
    ///
    /// # Errors
    ///
    /// Returns an error if the path starts with `~` and the home directory is
    /// unknown.
    pub fn expand_tilde(&self, path: &Path) -> Result<PathBuf> {
        match path.strip_prefix("~") {
            Ok(rest) => Ok(self.home()?.join(rest)),
            Err(_) => Ok(path.to_path_buf()),
        }
    }

    /// `$XDG_CONFIG_HOME/haunt/config.toml`, default `~/.config/haunt/config.toml`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is needed and unknown.
    pub fn default_config_path(&self) -> Result<PathBuf> {
        Ok(self
            .xdg_base(self.xdg_config_home.as_deref(), ".config")?
            .join(APP_DIR)
            .join("config.toml"))
    }

    /// `$XDG_STATE_HOME/haunt/registry.json`, default
    /// `~/.local/state/haunt/registry.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory is needed and unknown.
    pub fn default_registry_path(&self) -> Result<PathBuf> {
        Ok(self
            .xdg_base(self.xdg_state_home.as_deref(), ".local/state")?
            .join(APP_DIR)
            .join("registry.json"))
    }

    /// An XDG base directory, ignoring empty or relative values as the XDG
    /// base directory specification requires.
    fn xdg_base(&self, value: Option<&Path>, fallback: &str) -> Result<PathBuf> {
        match value {
            Some(dir) if dir.is_absolute() => Ok(dir.to_path_buf()),
            _ => Ok(self.home()?.join(fallback)),
        }
    }
}
