//! prepcat trending - Recently updated subjects by trending score

use chrono::Utc;
use clap::Args;

use crate::app::AppContext;
use crate::cli::output::emit;
use crate::error::Result;
use crate::search::trending::TrendPeriod;

#[derive(Args, Debug)]
pub struct TrendingArgs {
    /// day, week or month (default from config)
    #[arg(long, short)]
    pub period: Option<String>,

    /// Maximum number of results
    #[arg(long, short)]
    pub limit: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &TrendingArgs) -> Result<()> {
    let period = args.period.as_deref().map(TrendPeriod::parse).transpose()?;
    let entries = ctx.block_on(ctx.engine.trending(period, args.limit, Utc::now(), &ctx.cancel))?;

    emit(ctx.robot, &entries, |entries, layout| {
        let period = period.map_or_else(
            || ctx.config().trending.default_period.clone(),
            |p| p.to_string(),
        );
        layout.title(&format!("Trending this {period}"));
        for (i, entry) in entries.iter().enumerate() {
            layout.subject_line(
                i + 1,
                &entry.subject,
                Some(format!("trending {:.2}", entry.trending_score)),
            );
        }
        if entries.is_empty() {
            layout.push_line("Nothing updated in this window.");
        }
    })
}
