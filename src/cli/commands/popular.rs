//! prepcat popular - Most popular active subjects

use clap::Args;

use crate::app::AppContext;
use crate::catalog::Category;
use crate::cli::output::{emit, rating_label};
use crate::error::{PrepError, Result};

#[derive(Args, Debug)]
pub struct PopularArgs {
    /// Restrict to one category
    #[arg(long, short)]
    pub category: Option<String>,

    /// Maximum number of results
    #[arg(long, short)]
    pub limit: Option<usize>,
}

pub fn run(ctx: &AppContext, args: &PopularArgs) -> Result<()> {
    let category = args
        .category
        .as_deref()
        .map(|raw| {
            Category::parse(raw)
                .ok_or_else(|| PrepError::invalid_enum("category", raw, &Category::names()))
        })
        .transpose()?;
    let hits = ctx.block_on(ctx.engine.popular(args.limit, category, &ctx.cancel))?;

    emit(ctx.robot, &hits, |hits, layout| {
        layout.title("Popular subjects");
        for (i, hit) in hits.iter().enumerate() {
            let mut extra = rating_label(&hit.subject);
            if let Some(score) = hit.score {
                extra.push_str(&format!(", score {score:.2}"));
            }
            layout.subject_line(i + 1, &hit.subject, Some(extra));
        }
    })
}
