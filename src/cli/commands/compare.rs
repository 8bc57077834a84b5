//! prepcat compare - Side-by-side comparison

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::{emit, rating_label};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct CompareArgs {
    /// Subject ids, in display order
    #[arg(required = true, num_args = 1..)]
    pub ids: Vec<String>,
}

pub fn run(ctx: &AppContext, args: &CompareArgs) -> Result<()> {
    let comparison = ctx.block_on(ctx.engine.compare(&args.ids, &ctx.cancel))?;

    emit(ctx.robot, &comparison, |comparison, layout| {
        layout.title(&format!("Comparing {} subjects", comparison.subjects.len()));
        for (i, compared) in comparison.subjects.iter().enumerate() {
            layout.subject_line(i + 1, &compared.subject, None);
            layout
                .kv("rating", rating_label(&compared.subject))
                .kv("popularity", compared.subject.popularity)
                .kv("popularity rank", compared.popularity_rank)
                .kv("rating rank", compared.rating_rank)
                .kv("engagement", format!("{:.2}", compared.metrics.engagement_score));
        }

        let summary = &comparison.summary;
        layout.section("Summary");
        layout
            .kv("avg rating", format!("{:.2}", summary.avg_rating))
            .kv("avg popularity", format!("{:.2}", summary.avg_popularity))
            .kv("avg hours", format!("{:.0}", summary.avg_estimated_hours));
        let common = if summary.common_series.is_empty() {
            "-".to_string()
        } else {
            summary.common_series.join(", ")
        };
        layout.kv("common series", common);
    })
}
