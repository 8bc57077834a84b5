//! prepcat suggest - Autocomplete names, tags and keywords

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::emit;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct SuggestArgs {
    /// Prefix to complete
    pub prefix: String,

    /// Maximum number of suggestions
    #[arg(long, short, default_value = "10")]
    pub limit: usize,
}

pub fn run(ctx: &AppContext, args: &SuggestArgs) -> Result<()> {
    let suggestions = ctx.block_on(ctx.engine.suggest(&args.prefix, args.limit, &ctx.cancel))?;

    emit(ctx.robot, &suggestions, |suggestions, layout| {
        for suggestion in suggestions {
            layout.push_line(suggestion.clone());
        }
    })
}
