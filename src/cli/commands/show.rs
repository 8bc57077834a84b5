//! prepcat show - Show one subject

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::catalog::Subject;
use crate::cli::output::{HumanLayout, emit, rating_label};
use crate::error::Result;

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Subject id
    pub id: String,
}

pub fn run(ctx: &AppContext, args: &ShowArgs) -> Result<()> {
    debug!(id = %args.id, "looking up subject");
    let subject = ctx.block_on(ctx.engine.get(&args.id, &ctx.cancel))?;
    emit(ctx.robot, &subject, render)
}

fn render(subject: &Subject, layout: &mut HumanLayout) {
    layout.title(&subject.name);
    if !subject.description.is_empty() {
        layout.push_line(subject.description.clone()).push_line("");
    }
    layout
        .kv("id", &subject.id)
        .kv("category", subject.category)
        .kv("subcategory", subject.subcategory.as_deref().unwrap_or("-"))
        .kv("difficulty", subject.difficulty)
        .kv("rating", rating_label(subject))
        .kv("popularity", subject.popularity)
        .kv("students", subject.statistics.total_students)
        .kv("exams", subject.exam_count())
        .kv(
            "hours",
            subject
                .estimated_hours
                .map_or_else(|| "-".to_string(), |h| h.to_string()),
        )
        .kv("active", subject.is_active)
        .kv("updated", subject.updated_at.format("%Y-%m-%d %H:%M UTC"));
    if !subject.series.is_empty() {
        layout.kv("series", subject.series.join(", "));
    }
    if !subject.tags.is_empty() {
        layout.kv("tags", subject.tags.join(", "));
    }
}
