use vidup_core::logging;

mod cli;

use crate::cli::CliCommand;

fn main() {
    // Initialize logging as early as possible.
    if let Err(err) = logging::init_logging() {
        match logging::init_logging_stderr() {
            Ok(()) => tracing::warn!("log file unavailable, logging to stderr: {:#}", err),
            Err(e) => eprintln!("vidup: logging disabled: {:#}; {:#}", err, e),
        }
    }

    if let Err(err) = CliCommand::run_from_args() {
        eprintln!("vidup error: {:#}", err);
        std::process::exit(1);
    }
}
