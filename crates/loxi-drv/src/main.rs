use std::env;
use std::path::Path;
use std::process::ExitCode;

use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() -> ExitCode {
    // Quiet by default; RUST_LOG opts into pipeline tracing.
    let _ = SimpleLogger::new()
        .with_level(LevelFilter::Off)
        .env()
        .init();

    let args: Vec<String> = env::args().skip(1).collect();

    match args.len() {
        0 => match loxi_drv::run_prompt() {
            Ok(()) => ExitCode::SUCCESS,
            Err(error) => {
                eprintln!("error: {:#}", error);
                ExitCode::FAILURE
            }
        },
        1 => match loxi_drv::run_file(Path::new(&args[0])) {
            Ok(code) => ExitCode::from(code as u8),
            Err(error) => {
                eprintln!("error: {:#}", error);
                ExitCode::FAILURE
            }
        },
        _ => {
            eprintln!("Usage: loxi [script]");
            ExitCode::from(loxi_drv::EXIT_USAGE as u8)
        }
    }
}
