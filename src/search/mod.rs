//! Search orchestrator.
//!
//! Each call is a single pass: build the predicate, ask the catalog store for
//! candidates, rank, summarize facets, paginate. The store call is the only
//! suspension point and is bounded by a cancellation token and a deadline.

pub mod cache;
pub mod compare;
pub mod facets;
pub mod filter;
pub mod ranking;
pub mod text;
pub mod trending;

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use itertools::Itertools;
use serde::Serialize;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use crate::catalog::store::Candidate;
use crate::catalog::{CatalogStore, Category, QueryWindow, Subject};
use crate::config::Config;
use crate::error::{PrepError, Result};

use self::cache::{CacheStats, SearchCache};
use self::compare::{Comparison, ComparisonEngine};
use self::facets::{FacetExtractor, FacetSummary, round_to};
use self::filter::{FilterBuilder, Predicate, RawParams, parse_bool, parse_usize};
use self::ranking::{SortField, SortOrder, SortSpec};
use self::trending::{TrendPeriod, TrendingCalculator, TrendingEntry};

/// A validated search request.
///
/// Equality and hashing go through the normalized filters, so two spellings
/// of the same request share a cache entry.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SearchRequest {
    pub filters: Predicate,
    /// 1-based.
    pub page: usize,
    pub limit: usize,
    pub sort: SortSpec,
    /// The `facets` parameter; `search.facets_enabled` can still veto it.
    pub include_facets: bool,
}

impl SearchRequest {
    /// Parses filters, paging and sort parameters.
    pub fn from_params(params: &RawParams, config: &Config) -> Result<Self> {
        let filters = FilterBuilder::new(&config.scoring).build(params)?;

        let page = match params.get("page") {
            Some(raw) => parse_usize("page", raw.scalar("page")?)?,
            None => 1,
        };
        if page == 0 {
            return Err(PrepError::invalid_value("page", "0"));
        }

        let limit = match params.get("limit") {
            Some(raw) => parse_usize("limit", raw.scalar("limit")?)?,
            None => config.search.default_limit,
        };
        check_limit("limit", limit, config.search.max_limit)?;

        let field = params
            .get("sortBy")
            .map(|raw| raw.scalar("sortBy").and_then(SortField::parse))
            .transpose()?
            .unwrap_or(SortField::Relevance);
        let order = params
            .get("sortOrder")
            .map(|raw| raw.scalar("sortOrder").and_then(SortOrder::parse))
            .transpose()?;

        let include_facets = params
            .get("facets")
            .map(|raw| parse_bool("facets", raw.scalar("facets")?))
            .transpose()?
            .unwrap_or(true);

        Ok(Self {
            filters,
            page,
            limit,
            sort: SortSpec::new(field, order),
            include_facets,
        })
    }

    #[must_use]
    pub const fn skip(&self) -> usize {
        self.page.saturating_sub(1).saturating_mul(self.limit)
    }

    #[must_use]
    pub const fn text_mode(&self) -> bool {
        self.filters.text.is_some()
    }
}

/// Rejects a zero limit and anything above `max`.
fn check_limit(field: &str, limit: usize, max: usize) -> Result<()> {
    if limit == 0 {
        return Err(PrepError::invalid_value(field, "0"));
    }
    if limit > max {
        return Err(PrepError::LimitExceeded {
            field: field.to_string(),
            requested: limit,
            max,
        });
    }
    Ok(())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Pagination {
    /// Requested page, 1-based, even when past the last page.
    pub current: usize,
    /// Zero when nothing matched.
    pub pages: usize,
    /// Matches before pagination.
    pub total: usize,
    pub limit: usize,
}

impl Pagination {
    #[must_use]
    pub const fn new(current: usize, limit: usize, total: usize) -> Self {
        let pages = if limit == 0 { 0 } else { total.div_ceil(limit) };
        Self {
            current,
            pages,
            total,
            limit,
        }
    }
}

/// One ranked record. `score` is the text score in text mode, the popularity
/// score for score-ranked modes, absent otherwise.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchHit {
    #[serde(flatten)]
    pub subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub score: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchResponse {
    /// The requested page, in ranked order.
    pub items: Vec<SearchHit>,
    pub pagination: Pagination,
    /// Computed over every match, not just this page.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub facets: Option<FacetSummary>,
}

/// Per-category breakdown over active records.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryStats {
    pub category: Category,
    pub count: usize,
    pub avg_rating: f64,
    pub total_students: u64,
    pub total_exams: u64,
    pub avg_completion_rate: f64,
}

pub struct SearchEngine<S> {
    store: Arc<S>,
    config: Config,
    cache: Option<SearchCache>,
}

impl<S: CatalogStore> SearchEngine<S> {
    #[must_use]
    pub fn new(store: Arc<S>, config: Config) -> Self {
        let cache = SearchCache::from_config(&config.cache);
        Self {
            store,
            config,
            cache,
        }
    }

    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Arc<S> {
        &self.store
    }

    /// `None` when the result cache is disabled.
    #[must_use]
    pub fn cache_stats(&self) -> Option<CacheStats> {
        self.cache.as_ref().map(SearchCache::stats)
    }

    /// Parses `params` against this engine's configuration.
    pub fn request(&self, params: &RawParams) -> Result<SearchRequest> {
        SearchRequest::from_params(params, &self.config)
    }

    pub async fn search(
        &self,
        request: &SearchRequest,
        cancel: &CancellationToken,
    ) -> Result<SearchResponse> {
        if let Some(hit) = self.cache.as_ref().and_then(|cache| cache.get(request)) {
            debug!(page = request.page, "served from cache");
            return Ok(hit);
        }

        let text_mode = request.text_mode();
        let with_facets = request.include_facets && self.config.search.facets_enabled;
        let delegate_sort = !(text_mode && request.sort.field == SortField::Relevance)
            && self.store.sorts_natively(&request.sort);

        let (items, total, facets) = if delegate_sort && !with_facets {
            let window = QueryWindow::page(request.skip(), request.limit);
            let page = self
                .call_store(
                    cancel,
                    "query",
                    self.store.query(&request.filters, Some(&request.sort), window),
                )
                .await?;
            (page.records, page.total, None)
        } else {
            let sort = delegate_sort.then_some(&request.sort);
            let page = self
                .call_store(
                    cancel,
                    "query",
                    self.store.query(&request.filters, sort, QueryWindow::all()),
                )
                .await?;
            let mut candidates = page.records;
            if !delegate_sort {
                ranking::rank(&mut candidates, &request.sort, text_mode, &self.config.scoring);
            }
            let facets = with_facets.then(|| {
                FacetExtractor::from_config(&self.config.search)
                    .extract(candidates.iter().map(|candidate| &candidate.subject))
            });
            let total = candidates.len();
            let items = candidates
                .into_iter()
                .skip(request.skip())
                .take(request.limit)
                .collect();
            (items, total, facets)
        };

        if total == 0 {
            debug!("no matching records");
        }

        let response = SearchResponse {
            items: self.hits(items, &request.sort, text_mode),
            pagination: Pagination::new(request.page, request.limit, total),
            facets,
        };
        debug!(
            total,
            returned = response.items.len(),
            sort = %request.sort.field,
            "search complete"
        );

        if let Some(cache) = &self.cache {
            cache.put(request, response.clone());
        }
        Ok(response)
    }

    /// Records updated inside `period`, best trending score first.
    pub async fn trending(
        &self,
        period: Option<TrendPeriod>,
        limit: Option<usize>,
        now: DateTime<Utc>,
        cancel: &CancellationToken,
    ) -> Result<Vec<TrendingEntry>> {
        let period = match period {
            Some(period) => period,
            None => TrendPeriod::parse(&self.config.trending.default_period)?,
        };
        let limit = limit.unwrap_or(self.config.trending.default_limit);
        check_limit("limit", limit, self.config.trending.max_limit)?;

        let predicate = Predicate {
            updated_since: Some(period.cutoff(now)),
            ..Predicate::active()
        };
        let page = self
            .call_store(cancel, "query", self.store.query(&predicate, None, QueryWindow::all()))
            .await?;
        let subjects = page.records.into_iter().map(|c| c.subject).collect();

        let entries =
            TrendingCalculator::new(&self.config.scoring).rank(subjects, period, now, limit);
        debug!(%period, returned = entries.len(), "trending computed");
        Ok(entries)
    }

    /// Side-by-side comparison of `ids`, in caller order.
    pub async fn compare(&self, ids: &[String], cancel: &CancellationToken) -> Result<Comparison> {
        let engine = ComparisonEngine::new(&self.config.compare, &self.config.scoring);
        let ids = engine.normalize_ids(ids)?;
        let records = self
            .call_store(cancel, "get_by_ids", self.store.get_by_ids(&ids))
            .await?;
        engine.compare(&ids, records)
    }

    /// Direct lookup by id; inactive records are returned too.
    ///
    /// A successful read is reported to the store as a view. That report is
    /// best effort and never fails the lookup.
    pub async fn get(&self, id: &str, cancel: &CancellationToken) -> Result<Subject> {
        let ids = [id.trim().to_string()];
        let subject = self
            .call_store(cancel, "get_by_ids", self.store.get_by_ids(&ids))
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| PrepError::EntityNotFound { ids: ids.to_vec() })?;

        if let Err(err) = self
            .call_store(cancel, "record_view", self.store.record_view(&subject.id))
            .await
        {
            warn!(id = %subject.id, error = %err, "failed to record view");
        }
        Ok(subject)
    }

    /// Active records by popularity score, optionally within one category.
    pub async fn popular(
        &self,
        limit: Option<usize>,
        category: Option<Category>,
        cancel: &CancellationToken,
    ) -> Result<Vec<SearchHit>> {
        let limit = limit.unwrap_or(self.config.search.default_limit);
        check_limit("limit", limit, self.config.search.max_limit)?;

        let predicate = Predicate {
            categories: category.into_iter().collect(),
            ..Predicate::active()
        };
        let sort = SortSpec::new(SortField::PopularityScore, None);
        let native = self.store.sorts_natively(&sort);
        let window = if native {
            QueryWindow::page(0, limit)
        } else {
            QueryWindow::all()
        };
        let page = self
            .call_store(
                cancel,
                "query",
                self.store.query(&predicate, native.then_some(&sort), window),
            )
            .await?;

        let mut candidates = page.records;
        if !native {
            ranking::rank(&mut candidates, &sort, false, &self.config.scoring);
        }
        candidates.truncate(limit);
        Ok(self.hits(candidates, &sort, false))
    }

    /// Autocomplete: names (most popular first), then tags, then keywords
    /// that start with `prefix`, ignoring case. Values are distinct.
    pub async fn suggest(
        &self,
        prefix: &str,
        limit: usize,
        cancel: &CancellationToken,
    ) -> Result<Vec<String>> {
        check_limit("limit", limit, self.config.search.max_limit)?;
        let prefix = prefix.trim().to_lowercase();
        if prefix.is_empty() {
            return Ok(Vec::new());
        }

        let page = self
            .call_store(
                cancel,
                "query",
                self.store.query(&Predicate::active(), None, QueryWindow::all()),
            )
            .await?;
        let mut subjects: Vec<Subject> = page.records.into_iter().map(|c| c.subject).collect();
        subjects.sort_by(|a, b| b.popularity.cmp(&a.popularity));

        let starts = |value: &&String| value.to_lowercase().starts_with(&prefix);
        let names = subjects.iter().map(|s| &s.name).filter(starts);
        let tags = subjects.iter().flat_map(|s| &s.tags).filter(starts);
        let keywords = subjects.iter().flat_map(|s| &s.keywords).filter(starts);

        Ok(names
            .chain(tags)
            .chain(keywords)
            .unique_by(|value| value.to_lowercase())
            .take(limit)
            .cloned()
            .collect())
    }

    /// Per-category counts and averages over active records, largest first.
    pub async fn category_stats(&self, cancel: &CancellationToken) -> Result<Vec<CategoryStats>> {
        let page = self
            .call_store(
                cancel,
                "query",
                self.store.query(&Predicate::active(), None, QueryWindow::all()),
            )
            .await?;
        let groups = page
            .records
            .into_iter()
            .map(|c| c.subject)
            .into_group_map_by(|subject| subject.category);

        Ok(groups
            .into_iter()
            .map(|(category, subjects)| summarize_category(category, &subjects))
            .sorted_by(|a, b| b.count.cmp(&a.count).then(a.category.cmp(&b.category)))
            .collect())
    }

    fn hits(&self, candidates: Vec<Candidate>, sort: &SortSpec, text_mode: bool) -> Vec<SearchHit> {
        candidates
            .into_iter()
            .map(|candidate| SearchHit {
                score: ranking::display_score(&candidate, sort, text_mode, &self.config.scoring)
                    .map(|score| round_to(score, 2)),
                subject: candidate.subject,
            })
            .collect()
    }

    /// Runs one store call under the request's cancellation token and the
    /// configured deadline.
    async fn call_store<T, F>(&self, cancel: &CancellationToken, op: &str, call: F) -> Result<T>
    where
        F: Future<Output = Result<T>>,
    {
        if cancel.is_cancelled() {
            return Err(PrepError::Cancelled);
        }
        let deadline = Duration::from_millis(self.config.store.timeout_ms);
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                debug!(op, "store call cancelled");
                Err(PrepError::Cancelled)
            }
            result = tokio::time::timeout(deadline, call) => match result {
                Ok(result) => result,
                Err(_) => Err(PrepError::StoreUnavailable(format!(
                    "{op} timed out after {}ms",
                    deadline.as_millis()
                ))),
            },
        }
    }
}

fn summarize_category(category: Category, subjects: &[Subject]) -> CategoryStats {
    let rated: Vec<f64> = subjects
        .iter()
        .filter(|s| s.is_rated())
        .map(|s| s.rating.average)
        .collect();
    let completion: f64 = subjects.iter().map(|s| s.statistics.completion_rate).sum();
    CategoryStats {
        category,
        count: subjects.len(),
        avg_rating: round_to(mean(rated.iter().sum(), rated.len()), 2),
        total_students: subjects.iter().map(|s| s.statistics.total_students).sum(),
        total_exams: subjects.iter().map(|s| s.statistics.total_exams).sum(),
        avg_completion_rate: round_to(mean(completion, subjects.len()), 2),
    }
}

fn mean(sum: f64, n: usize) -> f64 {
    if n == 0 { 0.0 } else { sum / n as f64 }
}
