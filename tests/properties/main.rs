//! Property tests over generated catalogs.

use chrono::Duration;
use proptest::prelude::*;

use prepcat::catalog::store::Candidate;
use prepcat::catalog::{Category, Subject};
use prepcat::config::{CompareConfig, ScoringConfig, TagFacetOrder};
use prepcat::search::compare::ComparisonEngine;
use prepcat::search::facets::FacetExtractor;
use prepcat::search::filter::{FilterBuilder, RawParams};
use prepcat::search::ranking::{self, SortField, SortOrder, SortSpec, compare_field};
use prepcat::search::trending::{TrendPeriod, TrendingCalculator};
use prepcat::test_utils::fixtures::{SubjectBuilder, fixed_now};

const SERIES: [&str; 4] = ["JEE", "NEET", "SSC", "CAT"];
const TAGS: [&str; 5] = ["algebra", "optics", "grammar", "logic", "botany"];

fn pick(pool: &'static [&'static str], mask: u8) -> Vec<&'static str> {
    pool.iter()
        .enumerate()
        .filter(|(i, _)| mask & (1 << i) != 0)
        .map(|(_, v)| *v)
        .collect()
}

prop_compose! {
    fn arb_subject(index: usize)(
        popularity in 0u64..1_000,
        rating in 0.0f64..5.0,
        raters in 0u64..3,
        students in 0u64..2_000,
        category in 0usize..Category::ALL.len(),
        level in 1u8..=3,
        series_mask in any::<u8>(),
        tag_mask in any::<u8>(),
        hours in proptest::option::of(1u32..300),
        age_hours in 0i64..(24 * 60),
    ) -> Subject {
        let mut builder = SubjectBuilder::new(&format!("s{index}"), &format!("Subject {index}"))
            .popularity(popularity)
            .rating(rating, raters)
            .students(students)
            .category(Category::ALL[category])
            .difficulty_level(level)
            .series(&pick(&SERIES, series_mask))
            .tags(&pick(&TAGS, tag_mask))
            .updated_at(fixed_now() - Duration::hours(age_hours));
        if let Some(hours) = hours {
            builder = builder.hours(hours);
        }
        builder.build()
    }
}

fn arb_catalog() -> impl Strategy<Value = Vec<Subject>> {
    (0usize..24).prop_flat_map(|len| (0..len).map(arb_subject).collect::<Vec<_>>())
}

fn arb_sort() -> impl Strategy<Value = SortSpec> {
    (
        prop::sample::select(SortField::ALL.to_vec()),
        prop::option::of(prop_oneof![Just(SortOrder::Asc), Just(SortOrder::Desc)]),
    )
        .prop_map(|(field, order)| SortSpec::new(field, order))
}

proptest! {
    #[test]
    fn facets_list_exactly_the_present_values(subjects in arb_catalog()) {
        let summary = FacetExtractor::new(50, TagFacetOrder::Frequency).extract(&subjects);

        let mut expected: Vec<Category> = subjects.iter().map(|s| s.category).collect();
        expected.sort();
        expected.dedup();
        let mut got: Vec<Category> = summary.categories.iter().map(|b| b.value).collect();
        got.sort();
        prop_assert_eq!(got, expected);

        let counted: usize = summary.categories.iter().map(|b| b.count).sum();
        prop_assert_eq!(counted, subjects.len());
        prop_assert!(summary.tags.len() <= 50);
        prop_assert!(summary.avg_rating.is_finite());
        prop_assert!(summary.avg_estimated_hours.is_finite());
        for bucket in &summary.series {
            let holders = subjects.iter().filter(|s| s.series.contains(&bucket.value)).count();
            prop_assert_eq!(bucket.count, holders);
        }
    }

    #[test]
    fn ranking_is_a_stable_permutation(subjects in arb_catalog(), spec in arb_sort()) {
        let scoring = ScoringConfig::default();
        let mut ranked: Vec<Candidate> = subjects.iter().cloned().map(Candidate::new).collect();
        ranking::rank(&mut ranked, &spec, false, &scoring);
        prop_assert_eq!(ranked.len(), subjects.len());

        let position = |id: &str| subjects.iter().position(|s| s.id == id).unwrap_or(usize::MAX);
        for pair in ranked.windows(2) {
            let (a, b) = (&pair[0].subject, &pair[1].subject);
            let ordering = match spec.field {
                SortField::Relevance | SortField::PopularityScore => ranking::popularity_score(a, &scoring)
                    .total_cmp(&ranking::popularity_score(b, &scoring)),
                field => compare_field(field, a, b),
            };
            let ordering = spec.order.apply(ordering);
            prop_assert!(ordering != std::cmp::Ordering::Greater);
            if ordering == std::cmp::Ordering::Equal {
                prop_assert!(position(&a.id) < position(&b.id));
            }
        }
    }

    #[test]
    fn comparison_preserves_caller_order(subjects in arb_catalog(), seed in any::<u64>()) {
        prop_assume!(subjects.len() >= 2);
        let take = 2 + (seed as usize % (subjects.len().min(10) - 1));
        let mut ids: Vec<String> = subjects.iter().take(take).map(|s| s.id.clone()).collect();
        let n = ids.len();
        ids.rotate_left(seed as usize % n);

        let engine = ComparisonEngine::new(&CompareConfig::default(), &ScoringConfig::default());
        let comparison = engine.compare(&ids, subjects.clone()).unwrap();
        let order: Vec<String> = comparison.subjects.iter().map(|c| c.subject.id.clone()).collect();
        prop_assert_eq!(&order, &ids);

        let mut ranks: Vec<usize> = comparison.subjects.iter().map(|c| c.popularity_rank).collect();
        ranks.sort_unstable();
        prop_assert_eq!(ranks, (1..=ids.len()).collect::<Vec<_>>());
    }

    #[test]
    fn trending_respects_window_and_order(subjects in arb_catalog(), limit in 1usize..20) {
        let now = fixed_now();
        let calculator = TrendingCalculator::new(&ScoringConfig::default());
        for period in [TrendPeriod::Day, TrendPeriod::Week, TrendPeriod::Month] {
            let entries = calculator.rank(subjects.clone(), period, now, limit);
            let in_window = subjects.iter().filter(|s| s.updated_at >= period.cutoff(now)).count();
            prop_assert_eq!(entries.len(), in_window.min(limit));
            prop_assert!(entries.iter().all(|e| e.subject.updated_at >= period.cutoff(now)));
            prop_assert!(entries.windows(2).all(|w| w[0].trending_score >= w[1].trending_score));
        }
    }

    #[test]
    fn filter_builder_never_panics(key in "[a-zA-Z_]{1,16}", value in ".{0,24}") {
        let params = RawParams::new().with(&key, value.as_str());
        let _ = FilterBuilder::new(&ScoringConfig::default()).build(&params);
    }

    #[test]
    fn min_rating_filter_is_sound(subjects in arb_catalog(), threshold in 0.0f64..5.0) {
        let params = RawParams::new().with("minRating", threshold.to_string());
        let predicate = FilterBuilder::new(&ScoringConfig::default()).build(&params).unwrap();
        for subject in &subjects {
            prop_assert_eq!(predicate.matches(subject), subject.rating_average() >= threshold);
        }
    }
}
