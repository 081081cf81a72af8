//! Command: install a package.
use anyhow::Result;

use super::Session;
use super::render::{install_summary, render_done, render_install_plan};
use crate::cli::InstallOpts;
use crate::error::HauntError;
use crate::logging::Log;
use crate::operations::{compute_install_plan, execute_install_plan};
use crate::registry::Registry;

/// Run the install command.
///
/// # Errors
///
/// Returns an error if the package or target is invalid, a conflict blocks
/// the install under the active mode, or a filesystem or registry operation
/// fails.
pub fn run(session: &Session, opts: &InstallOpts, log: &dyn Log) -> Result<()> {
    let target = session
        .settings
        .target_dir(opts.target.as_deref(), &session.env)?;
    let mode = session.settings.conflict_mode(opts.on_conflict);

    log.stage(&format!("Installing {}", opts.package.display()));
    log.debug(&format!("target: {}", target.display()));
    log.debug(&format!("on conflict: {mode}"));

    let plan = compute_install_plan(&opts.package, &target, mode)?;
    log.debug(&format!(
        "planned {} link(s), {} conflict(s)",
        plan.symlinks_to_create.len(),
        plan.conflicts.len()
    ));

    // The executor repeats these before its first write.
    let registry = Registry::load(&session.registry_path).map_err(HauntError::from)?;
    plan.check_registry(&registry).map_err(HauntError::from)?;
    plan.check_conflicts(mode).map_err(HauntError::from)?;

    if opts.dry_run {
        log.dry_run("no changes will be made");
        render_install_plan(log, &plan, mode, true, session.home());
        render_done(log, &install_summary(&plan, true));
        return Ok(());
    }

    render_install_plan(log, &plan, mode, false, session.home());
    match execute_install_plan(&plan, &session.registry_path, mode) {
        Ok(entry) => {
            log.debug(&format!(
                "recorded {} link(s) for '{}'",
                entry.symlinks.len(),
                entry.name
            ));
            render_done(log, &install_summary(&plan, false));
            Ok(())
        }
        Err(err) => {
            session.warn_partial_state(&err, "installed", log);
            Err(err.into())
        }
    }
}
