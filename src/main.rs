//! fmcollage - Command-line tool for building album cover collages

use std::process::ExitCode;

use fmcollage::cli;

fn main() -> ExitCode {
    cli::run()
}
