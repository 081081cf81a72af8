//! Planners and executors.
//!
//! Planners only read: they inspect the package, the target tree, and the
//! registry and return an immutable plan.  Executors consume a plan and are
//! the only code that mutates links or the registry, so a caller can render a
//! plan as a dry run and stop there.
pub mod install;
pub mod paths;
pub mod uninstall;

pub use install::{InstallPlan, apply_install, compute_install_plan, execute_install_plan};
pub use paths::{normalize_package_dir, normalize_target_dir, validate_install_directories};
pub use uninstall::{
    UninstallPlan, apply_uninstall, compute_uninstall_plan, execute_uninstall_plan,
    plan_uninstall,
};
