//! Command-line interface.

use std::path::PathBuf;

use clap::Parser;

pub mod commands;
pub mod output;

pub use commands::Commands;

#[derive(Parser, Debug)]
#[command(name = "prepcat", version, about = "Search, rank and compare exam-preparation subjects")]
pub struct Cli {
    /// Catalog file: a JSON array of subject records
    #[arg(long, global = true, env = "PREPCAT_CATALOG")]
    pub catalog: Option<PathBuf>,

    /// Config file (defaults: <config dir>/prepcat/config.toml, ./prepcat.toml)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Machine-readable JSON output on stdout
    #[arg(long, global = true)]
    pub robot: bool,

    /// Increase log verbosity (-v, -vv, -vvv)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Suppress all logging
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}
