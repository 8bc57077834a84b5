//! The catalog store collaborator.
//!
//! The engine never speaks a storage query language. It hands a
//! [`Predicate`], an optional [`SortSpec`] and a [`QueryWindow`] to the store
//! and gets records back; translating those into SQL, an aggregation
//! pipeline or an index scan is the store's business.

use std::future::Future;

use serde::Serialize;

use crate::catalog::Subject;
use crate::error::Result;
use crate::search::filter::Predicate;
use crate::search::ranking::SortSpec;

/// Skip/limit window applied after filtering and sorting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct QueryWindow {
    pub skip: usize,
    /// `None` returns every match after `skip`.
    pub limit: Option<usize>,
}

impl QueryWindow {
    #[must_use]
    pub const fn all() -> Self {
        Self {
            skip: 0,
            limit: None,
        }
    }

    #[must_use]
    pub const fn page(skip: usize, limit: usize) -> Self {
        Self {
            skip,
            limit: Some(limit),
        }
    }
}

/// A matching record with its text score, when the predicate had a query.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Candidate {
    pub subject: Subject,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub text_score: Option<f64>,
}

impl Candidate {
    #[must_use]
    pub const fn new(subject: Subject) -> Self {
        Self {
            subject,
            text_score: None,
        }
    }

    #[must_use]
    pub const fn scored(subject: Subject, text_score: Option<f64>) -> Self {
        Self {
            subject,
            text_score,
        }
    }
}

/// One window of matches plus the total match count before windowing.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct QueryPage {
    pub records: Vec<Candidate>,
    pub total: usize,
}

/// Durable storage for catalog records.
///
/// Implementations must return matches in a deterministic order for a given
/// snapshot; when `sort` is supplied and [`CatalogStore::sorts_natively`]
/// accepted it, the order must equal a stable sort by that spec.
pub trait CatalogStore: Send + Sync {
    fn query(
        &self,
        predicate: &Predicate,
        sort: Option<&SortSpec>,
        window: QueryWindow,
    ) -> impl Future<Output = Result<QueryPage>> + Send;

    /// Records for `ids`, in request order. Missing ids are omitted, inactive
    /// records are included.
    fn get_by_ids(&self, ids: &[String]) -> impl Future<Output = Result<Vec<Subject>>> + Send;

    /// Whether `query` can apply `spec` itself.
    fn sorts_natively(&self, _spec: &SortSpec) -> bool {
        false
    }

    /// Popularity increment after a direct lookup. Optional.
    fn record_view(&self, _id: &str) -> impl Future<Output = Result<()>> + Send {
        async { Ok(()) }
    }
}
