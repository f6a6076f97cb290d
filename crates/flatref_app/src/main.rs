mod cli;
mod commands;
mod config;
mod logging;

use std::process::ExitCode;

use clap::Parser;
use flatref_logging::{flatref_error, level_for_verbosity};

use crate::cli::Cli;

fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::initialize(
        level_for_verbosity(cli.verbose, cli.quiet),
        cli.log_file.as_deref(),
    );

    match commands::run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            flatref_error!("{:#}", err);
            ExitCode::from(commands::exit_code_for(&err))
        }
    }
}
