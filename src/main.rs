//! wakebuf CLI entry point.
//!
//! ## CLI Subcommands
//!
//! - `wakebuf-cli demo [--otlp]` - Simulate a wake cycle and print buffered telemetry
//! - `wakebuf-cli config show|defaults|validate` - Inspect configuration
//! - `wakebuf-cli version` - Print version

use std::process::ExitCode;

use wakebuf::cli::{self, config_cmd, DemoOutput};
use wakebuf::config as wakebuf_config;
use wakebuf::telemetry::init_logging;

fn main() -> ExitCode {
    let args: Vec<String> = std::env::args().collect();
    let command = args.get(1).map(|s| s.as_str()).unwrap_or("help");

    match command {
        "demo" => {
            let config = wakebuf_config::load();
            if let Err(e) = init_logging(&config.log) {
                eprintln!("Logging disabled: {}", e);
            }
            let output = if args.iter().skip(2).any(|a| a == "--otlp") {
                DemoOutput::Otlp
            } else {
                DemoOutput::Snapshot
            };
            let telemetry = config.build();
            let code = cli::run_demo(&telemetry, &config.resource(), output);
            ExitCode::from(code as u8)
        }
        "config" => {
            let subcommand = args.get(2).map(|s| s.as_str()).unwrap_or("show");
            match subcommand {
                "show" => {
                    config_cmd::run_show();
                    ExitCode::SUCCESS
                }
                "defaults" => {
                    config_cmd::run_defaults();
                    ExitCode::SUCCESS
                }
                "validate" => ExitCode::from(config_cmd::run_validate() as u8),
                _ => {
                    eprintln!("Unknown config subcommand: {}", subcommand);
                    print_command_help("config");
                    ExitCode::FAILURE
                }
            }
        }
        "help" | "--help" | "-h" => {
            match args.get(2) {
                Some(subcommand) => print_command_help(subcommand),
                None => println!("{}", cli::usage()),
            }
            ExitCode::SUCCESS
        }
        "version" | "--version" | "-V" => {
            println!("wakebuf {}", env!("CARGO_PKG_VERSION"));
            ExitCode::SUCCESS
        }
        _ => {
            eprintln!("Unknown command: {}", command);
            eprintln!("{}", cli::usage());
            ExitCode::FAILURE
        }
    }
}

fn print_command_help(command: &str) {
    match cli::command_help(command) {
        Some(text) => println!("{}", text),
        None => {
            eprintln!("No help for unknown command: {}", command);
            println!("{}", cli::usage());
        }
    }
}
