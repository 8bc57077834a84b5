//! prepcat stats - Per-category breakdown

use clap::Args;

use crate::app::AppContext;
use crate::cli::output::emit;
use crate::error::Result;

#[derive(Args, Debug)]
pub struct StatsArgs {}

pub fn run(ctx: &AppContext, _args: &StatsArgs) -> Result<()> {
    let stats = ctx.block_on(ctx.engine.category_stats(&ctx.cancel))?;

    emit(ctx.robot, &stats, |stats, layout| {
        layout.title("Catalog by category");
        for row in stats {
            layout.section(row.category.as_str());
            layout
                .kv("subjects", row.count)
                .kv("avg rating", format!("{:.2}", row.avg_rating))
                .kv("students", row.total_students)
                .kv("exams", row.total_exams)
                .kv("completion", format!("{:.2}", row.avg_completion_rate));
        }
    })
}
