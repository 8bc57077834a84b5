//! In-memory catalog store.
//!
//! Reference implementation of [`CatalogStore`] backed by a `Vec` in
//! insertion order. Used by the CLI (loaded from a JSON file), the tests and
//! the benches. Latency and outages can be simulated.

use std::path::Path;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use parking_lot::RwLock;
use tracing::debug;

use crate::catalog::Subject;
use crate::catalog::store::{CatalogStore, Candidate, QueryPage, QueryWindow};
use crate::config::ScoringConfig;
use crate::error::{PrepError, Result};
use crate::search::filter::Predicate;
use crate::search::ranking::{self, SortSpec};

pub struct InMemoryCatalog {
    records: RwLock<Vec<Subject>>,
    latency: Option<Duration>,
    available: AtomicBool,
}

impl InMemoryCatalog {
    #[must_use]
    pub fn new(records: Vec<Subject>) -> Self {
        Self {
            records: RwLock::new(records),
            latency: None,
            available: AtomicBool::new(true),
        }
    }

    /// Load a JSON array of records.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        let catalog = Self::from_json_str(&raw)?;
        debug!(path = %path.display(), records = catalog.len(), "catalog loaded");
        Ok(catalog)
    }

    pub fn from_json_str(raw: &str) -> Result<Self> {
        let records: Vec<Subject> = serde_json::from_str(raw)?;
        Ok(Self::new(records))
    }

    /// Delay every call by `latency` before answering.
    #[must_use]
    pub const fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    /// Simulate an outage: calls fail with `StoreUnavailable` while false.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Insert or replace a record by id.
    pub fn upsert(&self, subject: Subject) {
        let mut records = self.records.write();
        if let Some(existing) = records.iter_mut().find(|r| r.id == subject.id) {
            *existing = subject;
        } else {
            records.push(subject);
        }
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.read().is_empty()
    }

    /// Current snapshot of one record.
    #[must_use]
    pub fn snapshot(&self, id: &str) -> Option<Subject> {
        self.records.read().iter().find(|r| r.id == id).cloned()
    }

    async fn pause(&self) -> Result<()> {
        if let Some(latency) = self.latency {
            tokio::time::sleep(latency).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PrepError::StoreUnavailable("in-memory catalog offline".to_string()))
        }
    }

    fn run_query(&self, predicate: &Predicate, sort: Option<&SortSpec>, window: QueryWindow) -> QueryPage {
        let mut matches: Vec<Candidate> = self
            .records
            .read()
            .iter()
            .filter(|subject| predicate.matches(subject))
            .map(|subject| Candidate::scored(subject.clone(), predicate.text_score(subject)))
            .collect();

        if let Some(spec) = sort.filter(|spec| self.sorts_natively(spec)) {
            ranking::rank(&mut matches, spec, false, &ScoringConfig::default());
        }

        let total = matches.len();
        let records = matches
            .into_iter()
            .skip(window.skip)
            .take(window.limit.unwrap_or(usize::MAX))
            .collect();
        QueryPage { records, total }
    }

    fn find_many(&self, ids: &[String]) -> Vec<Subject> {
        let records = self.records.read();
        ids.iter()
            .filter_map(|id| records.iter().find(|r| &r.id == id).cloned())
            .collect()
    }

    fn bump_popularity(&self, id: &str) -> Result<()> {
        let mut records = self.records.write();
        let record = records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or_else(|| PrepError::EntityNotFound {
                ids: vec![id.to_string()],
            })?;
        record.popularity = record.popularity.saturating_add(1);
        Ok(())
    }
}

impl CatalogStore for InMemoryCatalog {
    async fn query(
        &self,
        predicate: &Predicate,
        sort: Option<&SortSpec>,
        window: QueryWindow,
    ) -> Result<QueryPage> {
        self.pause().await?;
        Ok(self.run_query(predicate, sort, window))
    }

    async fn get_by_ids(&self, ids: &[String]) -> Result<Vec<Subject>> {
        self.pause().await?;
        Ok(self.find_many(ids))
    }

    fn sorts_natively(&self, spec: &SortSpec) -> bool {
        !spec.field.is_computed()
    }

    async fn record_view(&self, id: &str) -> Result<()> {
        self.pause().await?;
        self.bump_popularity(id)
    }
}
