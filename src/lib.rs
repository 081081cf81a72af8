//! Symlink dotfiles manager with a persistent install registry.
//!
//! A *package* is a directory of files.  Installing it creates one symlink
//! per file under a target directory (usually the home directory) and
//! records the links in a JSON registry so a later uninstall removes exactly
//! those links and nothing else.
//!
//! The public API is organised into four layers:
//!
//! - **[`resources`]**: filesystem primitives (symlinks, conflict classification, path helpers)
//! - **[`registry`]**: the persistent record of installed packages
//! - **[`operations`]**: plan, then execute, installs and uninstalls
//! - **[`commands`]**: subcommand orchestration and rendering for the CLI
//!
//! [`operations`] never reads the environment or settings; [`config`]
//! resolves those for the command layer.
#![deny(clippy::or_fun_call)]
#![deny(clippy::bool_to_int_with_if)]

pub mod cli;
pub mod commands;
pub mod config;
pub mod error;
pub mod logging;
pub mod operations;
pub mod registry;
pub mod resources;
