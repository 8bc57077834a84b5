use std::fs;

use prepcat::config::{Config, TagFacetOrder};
use prepcat::test_utils::{TestCase, run_table_tests};

use crate::common::fixture_path;

fn load_fixture(name: &str) -> prepcat::Result<Config> {
    let content = fs::read_to_string(fixture_path(&format!("configs/{name}"))).expect("read fixture");
    Config::from_toml(&content)
}

#[test]
fn config_fixtures_parse() -> Result<(), String> {
    let cases = vec![
        TestCase::new(
            "default",
            "default.toml",
            (20usize, 100usize, TagFacetOrder::Frequency, 100u64, false, 5_000u64),
        ),
        TestCase::new(
            "tuned",
            "tuned.toml",
            (5usize, 10usize, TagFacetOrder::FirstSeen, 50u64, true, 250u64),
        ),
    ];

    run_table_tests(cases, |name| {
        let config = load_fixture(name).expect("valid fixture");
        (
            config.search.default_limit,
            config.search.max_limit,
            config.search.tag_facet_order,
            config.scoring.popular_threshold,
            config.cache.enabled,
            config.store.timeout_ms,
        )
    })
}

#[test]
fn partial_file_keeps_remaining_defaults() {
    let config = load_fixture("tuned.toml").unwrap();
    assert_eq!(config.trending.default_period, "month");
    assert_eq!(config.trending.max_limit, 50);
    assert!((config.scoring.rating_weight - 10.0).abs() < f64::EPSILON);
    assert_eq!(config.compare.max_ids, 3);
    assert_eq!(config.cache.ttl_seconds, 30);
}

#[test]
fn inconsistent_limits_are_rejected() {
    let err = load_fixture("invalid.toml").unwrap_err();
    assert_eq!(err.code(), "config");
    assert!(err.to_string().contains("default_limit"));
}

#[test]
fn explicit_path_wins_and_must_exist() {
    let dir = tempfile::tempdir().unwrap();
    fs::write(dir.path().join("prepcat.toml"), "[search]\ndefault_limit = 7\n").unwrap();

    let explicit = fixture_path("configs/tuned.toml");
    let config = Config::load(Some(&explicit), dir.path()).unwrap();
    assert_eq!(config.search.default_limit, 5);

    let missing = dir.path().join("nope.toml");
    assert!(Config::load(Some(&missing), dir.path()).is_err());
}

#[test]
fn tuned_config_changes_engine_behaviour() {
    let config = load_fixture("tuned.toml").unwrap();
    let engine = crate::common::engine_with(crate::common::sample_catalog(), config);
    let params = prepcat::search::filter::RawParams::new().with("limit", "11");
    assert_eq!(engine.request(&params).unwrap_err().code(), "limit_exceeded");

    let popular = prepcat::search::filter::RawParams::new().with("isPopular", "true");
    let request = engine.request(&popular).unwrap();
    assert_eq!(request.filters.popularity_above, Some(50));
    assert_eq!(request.limit, 5);
}
