pub mod cli;
pub mod jq_exec;
pub mod logging;

use std::process::ExitCode;

fn main() -> ExitCode {
    if let Err(error) = logging::init_logging() {
        eprintln!("{error:#}");
    }
    let command_line_interface = cli::CommandLineInterface::load();
    match command_line_interface.run() {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::from(2)
        }
    }
}
