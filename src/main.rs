//! `haunt` binary entry point.
use std::process::ExitCode;

use clap::Parser;

use haunt::cli::{Cli, Command};
use haunt::commands::{self, Session};
use haunt::config::Environment;
use haunt::logging::{Logger, init_subscriber};

fn main() -> ExitCode {
    let _ = enable_ansi_support::enable_ansi_support();
    let args = Cli::parse();
    init_subscriber(args.verbose, args.command.name());
    let log = Logger::new(args.command.name());
    let env = Environment::from_process();
    let home = env.home.clone();

    let result = match &args.command {
        Command::Install(opts) => Session::init(&args.global, env, &log)
            .and_then(|session| commands::install::run(&session, opts, &log)),
        Command::Uninstall(opts) => Session::init(&args.global, env, &log)
            .and_then(|session| commands::uninstall::run(&session, opts, &log)),
        Command::Version => {
            commands::version::run();
            Ok(())
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            commands::report_error(&err, home.as_deref(), &log);
            if let Some(path) = log.log_path() {
                log.debug(&format!("log written to {}", path.display()));
            }
            ExitCode::FAILURE
        }
    }
}
