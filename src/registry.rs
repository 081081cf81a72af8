//! Persistent record of installed packages and the links each one owns.
//!
//! The registry is a single JSON document:
//!
//! ```json
//! {
//!   "version": 1,
//!   "packages": {
//!     "shell": {
//!       "name": "shell",
//!       "package_dir": "/home/user/dotfiles/shell",
//!       "target_dir": "/home/user",
//!       "symlinks": [{ "link_path": "...", "source_path": "..." }],
//!       "installed_at": "2025-01-01T00:00:00Z"
//!     }
//!   }
//! }
//! ```
//!
//! It is loaded whole, mutated in memory, and rewritten atomically.  There is
//! no lock: two processes saving the same file at once race, and the last
//! rename wins.
use std::collections::BTreeMap;
use std::io::Write as _;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::RegistryError;
use crate::resources::Symlink;

/// Highest registry format version this build reads and writes.
pub const REGISTRY_VERSION: u64 = 1;

/// Registry record for one installed package.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PackageEntry {
    /// Package name (base name of the package directory).
    pub name: String,
    /// Directory the package was installed from.
    ///
    /// Absent in entries written before the field existed; such entries may
    /// be reinstalled from any directory.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package_dir: Option<PathBuf>,
    /// Directory the links were created in.
    pub target_dir: PathBuf,
    /// Every link the package owns, sorted by link path.
    pub symlinks: Vec<Symlink>,
    /// When the package was last installed.
    pub installed_at: DateTime<Utc>,
}

/// Versioned mapping from package name to [`PackageEntry`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Registry {
    /// Format version.
    pub version: u64,
    /// Installed packages keyed by name.
    pub packages: BTreeMap<String, PackageEntry>,
}

impl Default for Registry {
    fn default() -> Self {
        Self {
            version: REGISTRY_VERSION,
            packages: BTreeMap::new(),
        }
    }
}

impl Registry {
    /// Load the registry at `path`, or an empty one if the file does not exist.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or is not a valid registry.
    pub fn load(path: &Path) -> Result<Self, RegistryError> {
        let text = match std::fs::read_to_string(path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::debug!("no registry at {}, starting empty", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(RegistryError::Io {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };
        Self::from_json(&text)
    }

    /// Parse a registry document.
    ///
    /// The version is checked before `packages` is looked at, so a file from
    /// a newer release is rejected without interpreting its entries.
    ///
    /// # Errors
    ///
    /// Returns an error for invalid JSON, a missing `version` or `packages`
    /// key, a version newer than [`REGISTRY_VERSION`], or entries that do not
    /// have the expected shape.
    pub fn from_json(text: &str) -> Result<Self, RegistryError> {
        let value: serde_json::Value =
            serde_json::from_str(text).map_err(|source| RegistryError::InvalidJson { source })?;
        let serde_json::Value::Object(mut root) = value else {
            return Err(RegistryError::Malformed {
                reason: "top level is not an object".to_string(),
            });
        };

        let version = root
            .get("version")
            .ok_or(RegistryError::MissingKey { key: "version" })?
            .as_u64()
            .ok_or_else(|| RegistryError::Malformed {
                reason: "'version' is not a non-negative integer".to_string(),
            })?;
        if version > REGISTRY_VERSION {
            return Err(RegistryError::UnsupportedVersion {
                found: version,
                supported: REGISTRY_VERSION,
            });
        }

        let packages = root
            .remove("packages")
            .ok_or(RegistryError::MissingKey { key: "packages" })?;
        let packages: BTreeMap<String, PackageEntry> =
            serde_json::from_value(packages).map_err(|e| RegistryError::Malformed {
                reason: e.to_string(),
            })?;

        Ok(Self { version, packages })
    }

    /// Serialize to pretty-printed JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if serialization fails.
    pub fn to_json(&self) -> Result<String, RegistryError> {
        serde_json::to_string_pretty(self).map_err(|source| RegistryError::Serialize { source })
    }

    /// Write the registry to `path` atomically.
    ///
    /// The document is written to a temporary file in the same directory and
    /// renamed over `path`, so readers see either the old or the new file.
    /// Parent directories are created as needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directory, temporary file, or rename fails.
    pub fn save(&self, path: &Path) -> Result<(), RegistryError> {
        let io_err = |source| RegistryError::Io {
            path: path.to_path_buf(),
            source,
        };
        let dir = path
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or_else(|| Path::new("."));
        std::fs::create_dir_all(dir).map_err(io_err)?;

        let mut json = self.to_json()?;
        json.push('\n');

        let mut tmp = tempfile::NamedTempFile::new_in(dir).map_err(io_err)?;
        tmp.write_all(json.as_bytes()).map_err(io_err)?;
        tmp.flush().map_err(io_err)?;
        tmp.persist(path).map_err(|e| io_err(e.error))?;
        tracing::debug!(
            "saved registry ({} package(s)) to {}",
            self.packages.len(),
            path.display()
        );
        Ok(())
    }

    /// Look up a package by name.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&PackageEntry> {
        self.packages.get(name)
    }

    /// Insert or replace the entry for `entry.name`.
    pub fn insert(&mut self, entry: PackageEntry) {
        self.packages.insert(entry.name.clone(), entry);
    }

    /// Remove and return the entry for `name`.
    pub fn remove(&mut self, name: &str) -> Option<PackageEntry> {
        self.packages.remove(name)
    }
}
