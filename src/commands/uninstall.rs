//! Command: uninstall a package.
use anyhow::Result;

use super::Session;
use super::render::{render_done, render_uninstall_plan, uninstall_summary};
use crate::cli::UninstallOpts;
use crate::logging::Log;
use crate::operations::{compute_uninstall_plan, execute_uninstall_plan};

/// Run the uninstall command.
///
/// # Errors
///
/// Returns an error if the package is not installed, the registry cannot be
/// read or written, or a recorded link changed after planning.
pub fn run(session: &Session, opts: &UninstallOpts, log: &dyn Log) -> Result<()> {
    log.stage(&format!("Uninstalling {}", opts.package));

    let plan = compute_uninstall_plan(&opts.package, &session.registry_path)?;
    log.debug(&format!("target: {}", plan.target_dir.display()));

    if opts.dry_run {
        log.dry_run("no changes will be made");
        render_uninstall_plan(log, &plan, true, session.home());
        render_done(log, &uninstall_summary(&plan, true));
        return Ok(());
    }

    render_uninstall_plan(log, &plan, false, session.home());
    match execute_uninstall_plan(&plan, &session.registry_path) {
        Ok(pruned) => {
            for dir in &pruned {
                log.debug(&format!("removed empty directory {}", dir.display()));
            }
            render_done(log, &uninstall_summary(&plan, false));
            Ok(())
        }
        Err(err) => {
            session.warn_partial_state(&err, "uninstalled", log);
            Err(err.into())
        }
    }
}
