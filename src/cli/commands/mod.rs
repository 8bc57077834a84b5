//! CLI command implementations
//!
//! Each subcommand has its own module with:
//! - Args struct for command-line arguments
//! - run() function to execute the command

use clap::Subcommand;

pub mod compare;
pub mod popular;
pub mod search;
pub mod show;
pub mod stats;
pub mod suggest;
pub mod trending;

use crate::app::AppContext;
use crate::error::Result;

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Faceted search over the catalog
    Search(search::SearchArgs),

    /// Recently updated subjects by trending score
    Trending(trending::TrendingArgs),

    /// Compare two or more subjects side by side
    Compare(compare::CompareArgs),

    /// Show one subject (records a view)
    Show(show::ShowArgs),

    /// Most popular active subjects
    Popular(popular::PopularArgs),

    /// Autocomplete names, tags and keywords
    Suggest(suggest::SuggestArgs),

    /// Per-category breakdown
    Stats(stats::StatsArgs),
}

/// Dispatch a command to its handler
pub fn run(ctx: &AppContext, command: &Commands) -> Result<()> {
    match command {
        Commands::Search(args) => search::run(ctx, args),
        Commands::Trending(args) => trending::run(ctx, args),
        Commands::Compare(args) => compare::run(ctx, args),
        Commands::Show(args) => show::run(ctx, args),
        Commands::Popular(args) => popular::run(ctx, args),
        Commands::Suggest(args) => suggest::run(ctx, args),
        Commands::Stats(args) => stats::run(ctx, args),
    }
}
