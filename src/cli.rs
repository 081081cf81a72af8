//! Command-line interface definition.
use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::resources::ConflictMode;

/// Top-level CLI entry point.
#[derive(Parser, Debug)]
#[command(
    name = "haunt",
    about = "Install dotfile packages as symlinks and remove them again",
    version = option_env!("HAUNT_VERSION").unwrap_or(env!("CARGO_PKG_VERSION"))
)]
pub struct Cli {
    /// Subcommand to run.
    #[command(subcommand)]
    pub command: Command,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Options shared across all subcommands.
    #[command(flatten)]
    pub global: GlobalOpts,
}

/// Options shared across all subcommands.
#[derive(Parser, Debug, Clone)]
pub struct GlobalOpts {
    /// Registry file [default: $XDG_STATE_HOME/haunt/registry.json]
    #[arg(long, global = true, env = "HAUNT_REGISTRY", value_name = "PATH")]
    pub registry: Option<PathBuf>,

    /// Settings file [default: $XDG_CONFIG_HOME/haunt/config.toml]
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

/// Available subcommands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// Symlink every file of a package into the target directory
    Install(InstallOpts),
    /// Remove the symlinks a package installed
    Uninstall(UninstallOpts),
    /// Print version information
    Version,
}

impl Command {
    /// Short name used for the log file.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Install(_) => "install",
            Self::Uninstall(_) => "uninstall",
            Self::Version => "version",
        }
    }
}

/// Options for the `install` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct InstallOpts {
    /// Package directory to install
    #[arg(value_name = "PACKAGE")]
    pub package: PathBuf,

    /// Directory to create symlinks in [default: home directory]
    #[arg(value_name = "TARGET")]
    pub target: Option<PathBuf>,

    /// Show what would be done without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,

    /// How to handle existing files at link paths [default: abort]
    #[arg(long, value_enum, value_name = "MODE")]
    pub on_conflict: Option<ConflictMode>,
}

/// Options for the `uninstall` subcommand.
#[derive(Parser, Debug, Clone)]
pub struct UninstallOpts {
    /// Name of the installed package
    #[arg(value_name = "NAME")]
    pub package: String,

    /// Show what would be done without changing anything
    #[arg(short = 'n', long)]
    pub dry_run: bool,
}
