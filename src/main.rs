//! prepcat - exam-preparation catalog search
//!
//! Faceted search, trending and comparison over a JSON catalog.

use std::process::ExitCode;

use clap::Parser;
use tracing_subscriber::{EnvFilter, fmt, prelude::*};

use prepcat::Result;
use prepcat::app::AppContext;
use prepcat::cli::Cli;
use prepcat::cli::output::RobotError;

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(&cli);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if cli.robot {
                // Robot mode: JSON error output to stdout
                let error = RobotError {
                    error: true,
                    code: e.code(),
                    message: e.to_string(),
                };
                println!("{}", serde_json::to_string(&error).unwrap_or_default());
            } else {
                eprintln!("Error: {e}");
            }
            if e.is_caller_fixable() {
                ExitCode::from(2)
            } else {
                ExitCode::FAILURE
            }
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let ctx = AppContext::from_cli(cli)?;
    prepcat::cli::commands::run(&ctx, &cli.command)
}

fn init_tracing(cli: &Cli) {
    if cli.quiet {
        return;
    }

    let filter = match cli.verbose {
        0 => "warn,prepcat=info",
        1 => "info,prepcat=debug",
        2 => "debug,prepcat=trace",
        _ => "trace",
    };

    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    if cli.robot {
        // JSON logging for robot mode
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(env_filter)
            .with(fmt::layer().with_writer(std::io::stderr))
            .init();
    }
}
