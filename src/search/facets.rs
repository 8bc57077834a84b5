//! Facet extraction over the filtered, pre-pagination candidate set.
//!
//! Facets summarize; they never narrow or reorder the result set.

use std::collections::HashMap;
use std::hash::Hash;

use serde::Serialize;

use crate::catalog::{Category, Difficulty, Subject};
use crate::config::{SearchConfig, TagFacetOrder};

/// One facet value and the number of candidates carrying it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FacetBucket<T> {
    pub value: T,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FacetSummary {
    pub categories: Vec<FacetBucket<Category>>,
    pub difficulties: Vec<FacetBucket<Difficulty>>,
    pub series: Vec<FacetBucket<String>>,
    pub tags: Vec<FacetBucket<String>>,
    /// Mean rating of rated candidates, 2 decimals; 0 when none are rated.
    pub avg_rating: f64,
    /// Mean of present `estimatedHours`, whole hours; 0 when none.
    pub avg_estimated_hours: f64,
}

impl FacetSummary {
    /// Summary of an empty candidate set.
    #[must_use]
    pub const fn empty() -> Self {
        Self {
            categories: Vec::new(),
            difficulties: Vec::new(),
            series: Vec::new(),
            tags: Vec::new(),
            avg_rating: 0.0,
            avg_estimated_hours: 0.0,
        }
    }
}

#[derive(Debug, Clone)]
pub struct FacetExtractor {
    tag_cap: usize,
    tag_order: TagFacetOrder,
}

impl FacetExtractor {
    #[must_use]
    pub const fn new(tag_cap: usize, tag_order: TagFacetOrder) -> Self {
        Self { tag_cap, tag_order }
    }

    #[must_use]
    pub const fn from_config(config: &SearchConfig) -> Self {
        Self::new(config.tag_facet_cap, config.tag_facet_order)
    }

    pub fn extract<'a>(&self, subjects: impl IntoIterator<Item = &'a Subject>) -> FacetSummary {
        let mut categories = Counter::default();
        let mut difficulties = Counter::default();
        let mut series = Counter::default();
        let mut tags = Counter::default();
        let mut rating = Mean::default();
        let mut hours = Mean::default();

        for subject in subjects {
            categories.add(subject.category);
            difficulties.add(subject.difficulty);
            for value in dedup(&subject.series) {
                series.add(value.clone());
            }
            for value in dedup(&subject.tags) {
                tags.add(value.clone());
            }
            if subject.is_rated() {
                rating.add(subject.rating.average);
            }
            if let Some(h) = subject.estimated_hours {
                hours.add(f64::from(h));
            }
        }

        let mut categories = categories.by_frequency();
        categories.sort_by(|a, b| b.count.cmp(&a.count).then(a.value.cmp(&b.value)));

        let mut difficulties = difficulties.first_seen();
        difficulties.sort_by_key(|bucket| bucket.value);

        let mut tags = match self.tag_order {
            TagFacetOrder::Frequency => tags.by_frequency(),
            TagFacetOrder::FirstSeen => tags.first_seen(),
        };
        tags.truncate(self.tag_cap);

        FacetSummary {
            categories,
            difficulties,
            series: series.by_frequency(),
            tags,
            avg_rating: round_to(rating.value(), 2),
            avg_estimated_hours: round_to(hours.value(), 0),
        }
    }
}

fn dedup(values: &[String]) -> impl Iterator<Item = &String> {
    values
        .iter()
        .enumerate()
        .filter(|(i, value)| !values[..*i].contains(value))
        .map(|(_, value)| value)
}

/// Occurrence counts remembering first-seen order.
struct Counter<T> {
    order: Vec<T>,
    counts: HashMap<T, usize>,
}

impl<T> Default for Counter<T> {
    fn default() -> Self {
        Self {
            order: Vec::new(),
            counts: HashMap::new(),
        }
    }
}

impl<T: Clone + Eq + Hash> Counter<T> {
    fn add(&mut self, value: T) {
        let count = self.counts.entry(value.clone()).or_insert(0);
        if *count == 0 {
            self.order.push(value);
        }
        *count += 1;
    }

    fn first_seen(self) -> Vec<FacetBucket<T>> {
        let Self { order, counts } = self;
        order
            .into_iter()
            .map(|value| {
                let count = counts.get(&value).copied().unwrap_or(0);
                FacetBucket { value, count }
            })
            .collect()
    }

    /// Descending count; ties keep first-seen order.
    fn by_frequency(self) -> Vec<FacetBucket<T>> {
        let mut buckets = self.first_seen();
        buckets.sort_by(|a, b| b.count.cmp(&a.count));
        buckets
    }
}

#[derive(Default)]
struct Mean {
    sum: f64,
    n: usize,
}

impl Mean {
    fn add(&mut self, value: f64) {
        self.sum += value;
        self.n += 1;
    }

    fn value(&self) -> f64 {
        if self.n == 0 {
            0.0
        } else {
            self.sum / self.n as f64
        }
    }
}

/// Round half away from zero to `places` decimals.
#[must_use]
pub fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}
