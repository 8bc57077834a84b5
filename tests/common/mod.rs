//! Helpers shared by the integration test binaries.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::Arc;

use prepcat::catalog::InMemoryCatalog;
use prepcat::config::Config;
use prepcat::search::SearchEngine;

pub fn fixture_path(relative: &str) -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("tests/fixtures")
        .join(relative)
}

/// The sample catalog: six active subjects plus one retired.
pub fn sample_catalog() -> InMemoryCatalog {
    InMemoryCatalog::from_json_file(fixture_path("catalog.json")).expect("load sample catalog")
}

pub fn engine_with(catalog: InMemoryCatalog, config: Config) -> SearchEngine<InMemoryCatalog> {
    SearchEngine::new(Arc::new(catalog), config)
}

pub fn sample_engine() -> SearchEngine<InMemoryCatalog> {
    engine_with(sample_catalog(), Config::default())
}

pub fn ids<'a, I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = &'a prepcat::catalog::Subject>,
{
    items.into_iter().map(|s| s.id.clone()).collect()
}
