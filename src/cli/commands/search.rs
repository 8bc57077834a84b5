//! prepcat search - Faceted search over the catalog

use clap::Args;
use tracing::debug;

use crate::app::AppContext;
use crate::cli::output::{HumanLayout, emit, rating_label};
use crate::error::Result;
use crate::search::SearchResponse;
use crate::search::facets::FacetBucket;
use crate::search::filter::{RawParams, RawValue};

/// Values are passed through as text and validated by the engine, so the
/// CLI reports the same errors as any other caller.
#[derive(Args, Debug, Default)]
pub struct SearchArgs {
    /// Free-text query over names, tags and keywords
    pub query: Option<String>,

    /// Category filter (repeatable or comma-separated)
    #[arg(long)]
    pub category: Vec<String>,

    #[arg(long)]
    pub subcategory: Vec<String>,

    /// Exam series; matches subjects sharing any listed series
    #[arg(long)]
    pub series: Vec<String>,

    /// easy, medium or hard
    #[arg(long)]
    pub difficulty: Vec<String>,

    /// Matches subjects carrying any listed tag
    #[arg(long)]
    pub tags: Vec<String>,

    #[arg(long)]
    pub min_rating: Option<String>,

    #[arg(long)]
    pub min_hours: Option<String>,

    #[arg(long)]
    pub max_hours: Option<String>,

    #[arg(long)]
    pub has_exams: Option<String>,

    /// Only subjects above the popularity threshold
    #[arg(long)]
    pub popular: bool,

    /// Include retired subjects
    #[arg(long)]
    pub include_inactive: bool,

    #[arg(long)]
    pub page: Option<String>,

    #[arg(long, short)]
    pub limit: Option<String>,

    /// relevance, name, popularity, rating, difficulty, estimatedHours,
    /// examCount, createdAt or popularityScore
    #[arg(long)]
    pub sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    pub sort_order: Option<String>,

    /// Skip facet computation
    #[arg(long)]
    pub no_facets: bool,
}

impl SearchArgs {
    #[must_use]
    pub fn to_params(&self) -> RawParams {
        let mut params = RawParams::new();
        let scalars = [
            ("query", &self.query),
            ("minRating", &self.min_rating),
            ("minEstimatedHours", &self.min_hours),
            ("maxEstimatedHours", &self.max_hours),
            ("hasExams", &self.has_exams),
            ("page", &self.page),
            ("limit", &self.limit),
            ("sortBy", &self.sort_by),
            ("sortOrder", &self.sort_order),
        ];
        for (key, value) in scalars {
            if let Some(value) = value {
                params.insert(key, value.as_str());
            }
        }
        let lists = [
            ("category", &self.category),
            ("subcategory", &self.subcategory),
            ("series", &self.series),
            ("difficulty", &self.difficulty),
            ("tags", &self.tags),
        ];
        for (key, values) in lists {
            if !values.is_empty() {
                params.insert(key, RawValue::List(values.clone()));
            }
        }
        if self.popular {
            params.insert("isPopular", "true");
        }
        if self.include_inactive {
            params.insert("isActive", "false");
        }
        if self.no_facets {
            params.insert("facets", "false");
        }
        params
    }
}

pub fn run(ctx: &AppContext, args: &SearchArgs) -> Result<()> {
    let request = ctx.engine.request(&args.to_params())?;
    debug!(page = request.page, limit = request.limit, "running search");
    let response = ctx.block_on(ctx.engine.search(&request, &ctx.cancel))?;
    emit(ctx.robot, &response, render)
}

fn render(response: &SearchResponse, layout: &mut HumanLayout) {
    let pagination = response.pagination;
    layout.title(&format!(
        "{} result(s), page {} of {}",
        pagination.total,
        pagination.current,
        pagination.pages.max(1)
    ));
    let offset = (pagination.current - 1) * pagination.limit;
    for (i, hit) in response.items.iter().enumerate() {
        let mut extra = rating_label(&hit.subject);
        if let Some(score) = hit.score {
            extra.push_str(&format!(", score {score:.2}"));
        }
        layout.subject_line(offset + i + 1, &hit.subject, Some(extra));
    }
    if response.items.is_empty() {
        layout.push_line("No subjects on this page.");
    }

    if let Some(facets) = &response.facets {
        layout.section("Facets");
        layout.kv("categories", buckets(&facets.categories));
        layout.kv("difficulties", buckets(&facets.difficulties));
        layout.kv("series", buckets(&facets.series));
        layout.kv("tags", buckets(&facets.tags));
        layout.kv("avg rating", format!("{:.2}", facets.avg_rating));
        layout.kv("avg hours", facets.avg_estimated_hours);
    }
}

fn buckets<T: std::fmt::Display>(buckets: &[FacetBucket<T>]) -> String {
    if buckets.is_empty() {
        return "-".to_string();
    }
    buckets
        .iter()
        .map(|b| format!("{} ({})", b.value, b.count))
        .collect::<Vec<_>>()
        .join(", ")
}
