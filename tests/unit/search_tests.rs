use std::sync::Arc;

use chrono::Duration;
use tokio_util::sync::CancellationToken;

use prepcat::PrepError;
use prepcat::catalog::{Category, InMemoryCatalog};
use prepcat::config::Config;
use prepcat::search::filter::RawParams;
use prepcat::search::trending::TrendPeriod;
use prepcat::search::{SearchEngine, SearchResponse};
use prepcat::test_utils::fixtures::{SubjectBuilder, fixed_now};

use crate::common::{engine_with, ids, sample_catalog, sample_engine};

async fn search(engine: &SearchEngine<InMemoryCatalog>, params: RawParams) -> SearchResponse {
    let request = engine.request(&params).expect("valid request");
    engine
        .search(&request, &CancellationToken::new())
        .await
        .expect("search succeeds")
}

fn hit_ids(response: &SearchResponse) -> Vec<String> {
    ids(response.items.iter().map(|hit| &hit.subject))
}

fn math_and_phys() -> SearchEngine<InMemoryCatalog> {
    let math = SubjectBuilder::new("math", "Math")
        .popularity(150)
        .rating(4.5, 10)
        .series(&["A", "C"])
        .build();
    let phys = SubjectBuilder::new("phys", "Phys")
        .popularity(80)
        .rating(4.2, 10)
        .series(&["C"])
        .category(Category::Physics)
        .build();
    engine_with(InMemoryCatalog::new(vec![phys, math]), Config::default())
}

#[tokio::test]
async fn popularity_desc_orders_math_before_phys() {
    let engine = math_and_phys();
    let response = search(
        &engine,
        RawParams::new().with("sortBy", "popularity").with("sortOrder", "desc"),
    )
    .await;
    assert_eq!(hit_ids(&response), vec!["math", "phys"]);
}

#[tokio::test]
async fn min_rating_keeps_only_math() {
    let engine = math_and_phys();
    let response = search(&engine, RawParams::new().with("minRating", "4.3")).await;
    assert_eq!(hit_ids(&response), vec!["math"]);
    assert_eq!(response.pagination.total, 1);
}

#[tokio::test]
async fn comparison_reports_common_series() {
    let engine = math_and_phys();
    let ids = vec!["math".to_string(), "phys".to_string()];
    let comparison = engine.compare(&ids, &CancellationToken::new()).await.unwrap();
    assert_eq!(comparison.summary.common_series, vec!["C"]);
    assert_eq!(comparison.subjects[0].subject.id, "math");
    assert_eq!(comparison.subjects[0].popularity_rank, 1);
}

#[tokio::test]
async fn day_window_drops_stale_but_popular_subject() {
    let now = fixed_now();
    let engine = engine_with(
        InMemoryCatalog::new(vec![
            SubjectBuilder::new("stale", "Stale")
                .popularity(10_000)
                .updated_at(now - Duration::days(10))
                .build(),
            SubjectBuilder::new("fresh", "Fresh")
                .popularity(5)
                .updated_at(now - Duration::hours(2))
                .build(),
        ]),
        Config::default(),
    );
    let entries = engine
        .trending(Some(TrendPeriod::Day), None, now, &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(ids(entries.iter().map(|e| &e.subject)), vec!["fresh"]);
}

#[tokio::test]
async fn inactive_records_are_hidden_by_default() {
    let engine = sample_engine();
    let response = search(&engine, RawParams::new()).await;
    assert_eq!(response.pagination.total, 6);
    assert!(!hit_ids(&response).contains(&"math-archive".to_string()));

    let retired = search(&engine, RawParams::new().with("isActive", "false")).await;
    assert_eq!(hit_ids(&retired), vec!["math-archive"]);
}

#[tokio::test]
async fn text_query_matches_tags() {
    let engine = sample_engine();
    let response = search(&engine, RawParams::new().with("query", "algebra")).await;
    assert_eq!(hit_ids(&response), vec!["math-jee", "reason-cat"]);
    assert!(response.items.iter().all(|hit| hit.score.is_some()));
}

#[tokio::test]
async fn series_filter_and_facets() {
    let engine = sample_engine();
    let response = search(&engine, RawParams::new().with("series", "NEET")).await;
    assert_eq!(response.pagination.total, 3);

    let facets = response.facets.expect("facets on by default");
    let series: Vec<_> = facets
        .series
        .iter()
        .map(|b| (b.value.as_str(), b.count))
        .collect();
    assert_eq!(series, vec![("NEET", 3), ("JEE", 1)]);
    let categories: Vec<_> = facets.categories.iter().map(|b| b.value).collect();
    assert_eq!(
        categories,
        vec![Category::Physics, Category::Chemistry, Category::Biology]
    );
    assert!((facets.avg_rating - 4.5).abs() < 1e-9);
    assert!((facets.avg_estimated_hours - 95.0).abs() < 1e-9);
}

#[tokio::test]
async fn unknown_series_matches_nothing() {
    let engine = sample_engine();
    let response = search(&engine, RawParams::new().with("series", "GATE")).await;
    assert!(response.items.is_empty());
    assert_eq!(response.pagination.pages, 0);
}

#[tokio::test]
async fn popular_flag_uses_threshold() {
    let engine = sample_engine();
    let response = search(&engine, RawParams::new().with("isPopular", "true")).await;
    assert_eq!(hit_ids(&response), vec!["bio-neet", "math-jee"]);
}

#[tokio::test]
async fn hours_range_and_exam_flags() {
    let engine = sample_engine();
    let ranged = search(
        &engine,
        RawParams::new()
            .with("minEstimatedHours", "50")
            .with("maxEstimatedHours", "100")
            .with("sortBy", "estimatedHours"),
    )
    .await;
    assert_eq!(hit_ids(&ranged), vec!["reason-cat", "phys-neet", "bio-neet"]);

    let no_exams = search(&engine, RawParams::new().with("hasExams", "false")).await;
    assert_eq!(hit_ids(&no_exams), vec!["chem-basics"]);
}

#[tokio::test]
async fn missing_hours_sort_first_ascending() {
    let engine = sample_engine();
    let response = search(&engine, RawParams::new().with("sortBy", "estimatedHours")).await;
    assert_eq!(
        hit_ids(&response),
        vec!["chem-basics", "eng-ssc", "reason-cat", "phys-neet", "bio-neet", "math-jee"]
    );
}

#[tokio::test]
async fn pagination_windows_the_ranked_list() {
    let engine = sample_engine();
    let first = search(
        &engine,
        RawParams::new().with("sortBy", "name").with("limit", "4"),
    )
    .await;
    let second = search(
        &engine,
        RawParams::new()
            .with("sortBy", "name")
            .with("limit", "4")
            .with("page", "2"),
    )
    .await;
    assert_eq!(first.pagination.pages, 2);
    assert_eq!(hit_ids(&first), vec!["reason-cat", "chem-basics", "math-jee", "bio-neet"]);
    assert_eq!(hit_ids(&second), vec!["phys-neet", "eng-ssc"]);
    assert_eq!(second.pagination.current, 2);
}

#[test]
fn request_validation_errors() {
    let engine = sample_engine();
    let cases = [
        (RawParams::new().with("category", "astrology"), "invalid_enum_value"),
        (RawParams::new().with("difficulty", "brutal"), "invalid_enum_value"),
        (RawParams::new().with("minRating", "abc"), "invalid_filter_value"),
        (RawParams::new().with("hasExams", "maybe"), "invalid_filter_value"),
        (RawParams::new().with("sortBy", "vibes"), "invalid_enum_value"),
        (RawParams::new().with("limit", "1000"), "limit_exceeded"),
    ];
    for (params, code) in cases {
        let err = engine.request(&params).unwrap_err();
        assert_eq!(err.code(), code, "{params:?}");
        assert!(err.is_caller_fixable());
    }
}

#[tokio::test]
async fn compare_validates_ids() {
    let engine = sample_engine();
    let cancel = CancellationToken::new();

    let single = vec!["math-jee".to_string()];
    assert!(matches!(
        engine.compare(&single, &cancel).await,
        Err(PrepError::InsufficientIds { count: 1 })
    ));

    let missing = vec!["math-jee".to_string(), "ghost".to_string()];
    match engine.compare(&missing, &cancel).await {
        Err(PrepError::EntityNotFound { ids }) => assert_eq!(ids, vec!["ghost"]),
        other => panic!("unexpected {other:?}"),
    }

    let with_retired = vec!["math-archive".to_string(), "math-jee".to_string()];
    let comparison = engine.compare(&with_retired, &cancel).await.unwrap();
    assert_eq!(comparison.summary.common_series, vec!["JEE"]);
    assert_eq!(comparison.subjects[0].popularity_rank, 1);
}

#[tokio::test]
async fn trending_week_over_sample() {
    let engine = sample_engine();
    let entries = engine
        .trending(None, None, fixed_now(), &CancellationToken::new())
        .await
        .unwrap();
    assert_eq!(
        ids(entries.iter().map(|e| &e.subject)),
        vec!["bio-neet", "math-jee", "reason-cat"]
    );
    assert!(entries.windows(2).all(|w| w[0].trending_score >= w[1].trending_score));
}

#[tokio::test]
async fn get_records_a_view() {
    let catalog = Arc::new(sample_catalog());
    let engine = SearchEngine::new(Arc::clone(&catalog), Config::default());
    let subject = engine.get("eng-ssc", &CancellationToken::new()).await.unwrap();
    assert_eq!(subject.popularity, 60);
    assert_eq!(catalog.snapshot("eng-ssc").unwrap().popularity, 61);
}

#[tokio::test]
async fn suggestions_and_stats() {
    let engine = sample_engine();
    let cancel = CancellationToken::new();
    let suggestions = engine.suggest("ne", 5, &cancel).await.unwrap();
    assert_eq!(suggestions, vec!["NEET Biology", "NEET Physics"]);

    let stats = engine.category_stats(&cancel).await.unwrap();
    let order: Vec<_> = stats.iter().map(|s| s.category).collect();
    assert_eq!(
        order,
        vec![
            Category::Mathematics,
            Category::Physics,
            Category::Chemistry,
            Category::Biology,
            Category::English,
            Category::Reasoning,
        ]
    );
    assert!(stats.iter().all(|s| s.count == 1));
    let chemistry = &stats[2];
    assert!(chemistry.avg_rating.abs() < f64::EPSILON);
    assert_eq!(chemistry.total_students, 15);
}

#[tokio::test]
async fn cache_serves_repeat_requests() {
    let mut config = Config::default();
    config.cache.enabled = true;
    let engine = engine_with(sample_catalog(), config);

    let first = search(&engine, RawParams::new().with("series", "JEE,NEET")).await;
    let second = search(
        &engine,
        RawParams::from_pairs([("series", "NEET"), ("series", "JEE")]),
    )
    .await;
    assert_eq!(first, second);

    let stats = engine.cache_stats().expect("cache enabled");
    assert_eq!((stats.hits, stats.misses), (1, 1));
}
