//! Entry point for the `hotspots` binary.
#![forbid(unsafe_code)]

use std::process::ExitCode;

use log::LevelFilter;
use simple_logger::SimpleLogger;

#[expect(
    clippy::print_stderr,
    reason = "the binary reports fatal errors on stderr even when logging is off"
)]
fn main() -> ExitCode {
    if let Err(err) = SimpleLogger::new().with_level(LevelFilter::Info).env().init() {
        eprintln!("hotspots: failed to install logger: {err}");
    }
    match hotspot_cli::run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("hotspots: {err}");
            ExitCode::FAILURE
        }
    }
}
