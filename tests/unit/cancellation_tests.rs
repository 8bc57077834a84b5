use std::sync::Arc;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use prepcat::PrepError;
use prepcat::catalog::store::{CatalogStore, QueryPage, QueryWindow};
use prepcat::catalog::{InMemoryCatalog, Subject};
use prepcat::config::Config;
use prepcat::search::SearchEngine;
use prepcat::search::filter::{Predicate, RawParams};
use prepcat::search::ranking::SortSpec;

use crate::common::{engine_with, sample_catalog};

fn slow_engine(latency: Duration, timeout_ms: u64) -> SearchEngine<InMemoryCatalog> {
    let mut config = Config::default();
    config.store.timeout_ms = timeout_ms;
    engine_with(sample_catalog().with_latency(latency), config)
}

#[tokio::test(start_paused = true)]
async fn cancelling_mid_call_abandons_the_search() {
    let engine = slow_engine(Duration::from_secs(2), 10_000);
    let request = engine.request(&RawParams::new()).unwrap();
    let cancel = CancellationToken::new();

    let trigger = cancel.clone();
    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        trigger.cancel();
    });

    let err = engine.search(&request, &cancel).await.unwrap_err();
    assert!(matches!(err, PrepError::Cancelled));
    assert!(!err.is_caller_fixable());
}

#[tokio::test(start_paused = true)]
async fn slow_store_hits_the_deadline() {
    let engine = slow_engine(Duration::from_secs(5), 100);
    let request = engine.request(&RawParams::new()).unwrap();
    let err = engine
        .search(&request, &CancellationToken::new())
        .await
        .unwrap_err();
    assert!(matches!(err, PrepError::StoreUnavailable(_)), "{err:?}");
}

#[tokio::test(start_paused = true)]
async fn latency_under_the_deadline_succeeds() {
    let engine = slow_engine(Duration::from_millis(20), 1_000);
    let request = engine.request(&RawParams::new()).unwrap();
    let response = engine
        .search(&request, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(response.pagination.total, 6);
}

#[tokio::test]
async fn offline_store_is_unavailable() {
    let catalog = Arc::new(sample_catalog());
    let engine = SearchEngine::new(Arc::clone(&catalog), Config::default());
    catalog.set_available(false);

    let ids = vec!["math-jee".to_string(), "phys-neet".to_string()];
    let err = engine
        .compare(&ids, &CancellationToken::new())
        .await
        .unwrap_err();
    assert_eq!(err.code(), "store_unavailable");

    catalog.set_available(true);
    assert!(engine.compare(&ids, &CancellationToken::new()).await.is_ok());
}

/// Serves reads from the sample catalog but fails every view report.
struct ReadOnlyViews(InMemoryCatalog);

impl CatalogStore for ReadOnlyViews {
    async fn query(
        &self,
        predicate: &Predicate,
        sort: Option<&SortSpec>,
        window: QueryWindow,
    ) -> prepcat::Result<QueryPage> {
        self.0.query(predicate, sort, window).await
    }

    async fn get_by_ids(&self, ids: &[String]) -> prepcat::Result<Vec<Subject>> {
        self.0.get_by_ids(ids).await
    }

    async fn record_view(&self, _id: &str) -> prepcat::Result<()> {
        Err(PrepError::StoreUnavailable("views are read-only".to_string()))
    }
}

#[tokio::test]
async fn failed_view_report_does_not_fail_lookup() {
    let engine = SearchEngine::new(Arc::new(ReadOnlyViews(sample_catalog())), Config::default());
    let subject = engine
        .get("bio-neet", &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(subject.name, "NEET Biology");
}

#[tokio::test]
async fn engine_without_native_sort_ranks_locally() {
    let engine = SearchEngine::new(Arc::new(ReadOnlyViews(sample_catalog())), Config::default());
    let request = engine
        .request(
            &RawParams::new()
                .with("sortBy", "popularity")
                .with("facets", "false")
                .with("limit", "2"),
        )
        .unwrap();
    let response = engine
        .search(&request, &CancellationToken::new())
        .await
        .unwrap();
    let ids: Vec<_> = response.items.iter().map(|h| h.subject.id.as_str()).collect();
    assert_eq!(ids, vec!["bio-neet", "math-jee"]);
    assert_eq!(response.pagination.total, 6);
}
