//! Side-by-side comparison of two or more subjects.
//!
//! Ranks are local to one comparison. The output keeps the caller's id order
//! regardless of how the subjects rank.

use serde::Serialize;

use crate::catalog::{Category, Difficulty, Subject};
use crate::config::{CompareConfig, ScoringConfig};
use crate::error::{PrepError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonMetrics {
    pub difficulty_level: u8,
    pub engagement_score: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparedSubject {
    #[serde(flatten)]
    pub subject: Subject,
    pub metrics: ComparisonMetrics,
    pub popularity_rank: usize,
    pub rating_rank: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ComparisonSummary {
    pub avg_rating: f64,
    pub avg_popularity: f64,
    pub avg_estimated_hours: f64,
    /// Series shared by every compared subject, in the first subject's order.
    pub common_series: Vec<String>,
    pub categories: Vec<Category>,
    pub difficulties: Vec<Difficulty>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Comparison {
    pub subjects: Vec<ComparedSubject>,
    pub summary: ComparisonSummary,
}

#[derive(Debug, Clone)]
pub struct ComparisonEngine {
    max_ids: usize,
    students_weight: f64,
    popularity_weight: f64,
}

impl ComparisonEngine {
    #[must_use]
    pub const fn new(config: &CompareConfig, scoring: &ScoringConfig) -> Self {
        Self {
            max_ids: config.max_ids,
            students_weight: scoring.engagement_students_weight,
            popularity_weight: scoring.engagement_popularity_weight,
        }
    }

    /// Trims and de-duplicates ids (first occurrence wins) and checks bounds.
    pub fn normalize_ids(&self, ids: &[String]) -> Result<Vec<String>> {
        let mut unique: Vec<String> = Vec::with_capacity(ids.len());
        for id in ids.iter().map(|id| id.trim()).filter(|id| !id.is_empty()) {
            if !unique.iter().any(|seen| seen == id) {
                unique.push(id.to_string());
            }
        }
        if unique.len() < 2 {
            return Err(PrepError::InsufficientIds {
                count: unique.len(),
            });
        }
        if unique.len() > self.max_ids {
            return Err(PrepError::LimitExceeded {
                field: "ids".to_string(),
                requested: unique.len(),
                max: self.max_ids,
            });
        }
        Ok(unique)
    }

    /// `students·0.1 + popularity·0.01` with the default weights.
    #[must_use]
    pub fn engagement_score(&self, subject: &Subject) -> f64 {
        subject.statistics.total_students as f64 * self.students_weight
            + subject.popularity as f64 * self.popularity_weight
    }

    /// Compares `records` in the order of `ids` (already normalized).
    /// Every id must resolve; missing ones are reported together.
    pub fn compare(&self, ids: &[String], records: Vec<Subject>) -> Result<Comparison> {
        let mut ordered: Vec<Subject> = Vec::with_capacity(ids.len());
        let mut missing = Vec::new();
        for id in ids {
            match records.iter().find(|record| &record.id == id) {
                Some(record) => ordered.push(record.clone()),
                None => missing.push(id.clone()),
            }
        }
        if !missing.is_empty() {
            return Err(PrepError::EntityNotFound { ids: missing });
        }

        let popularity_ranks = ranks_by(&ordered, |a, b| b.popularity.cmp(&a.popularity));
        let rating_ranks = ranks_by(&ordered, |a, b| {
            b.rating_average().total_cmp(&a.rating_average())
        });

        let summary = summarize(&ordered);
        let subjects = ordered
            .into_iter()
            .enumerate()
            .map(|(i, subject)| ComparedSubject {
                metrics: ComparisonMetrics {
                    difficulty_level: subject.difficulty.level(),
                    engagement_score: self.engagement_score(&subject),
                },
                popularity_rank: popularity_ranks[i],
                rating_rank: rating_ranks[i],
                subject,
            })
            .collect();

        Ok(Comparison { subjects, summary })
    }
}

/// 1-based rank per position under a stable sort by `cmp`.
fn ranks_by<F>(subjects: &[Subject], cmp: F) -> Vec<usize>
where
    F: Fn(&Subject, &Subject) -> std::cmp::Ordering,
{
    let mut order: Vec<usize> = (0..subjects.len()).collect();
    order.sort_by(|&a, &b| cmp(&subjects[a], &subjects[b]));
    let mut ranks = vec![0; subjects.len()];
    for (rank, index) in order.into_iter().enumerate() {
        ranks[index] = rank + 1;
    }
    ranks
}

fn summarize(subjects: &[Subject]) -> ComparisonSummary {
    let rated: Vec<f64> = subjects
        .iter()
        .filter(|s| s.is_rated())
        .map(|s| s.rating.average)
        .collect();
    let popularity: Vec<f64> = subjects.iter().map(|s| s.popularity as f64).collect();
    let hours: Vec<f64> = subjects
        .iter()
        .filter_map(|s| s.estimated_hours.map(f64::from))
        .collect();

    let common_series = subjects.first().map_or_else(Vec::new, |first| {
        let mut common: Vec<String> = Vec::new();
        for series in &first.series {
            if !common.contains(series) && subjects.iter().all(|s| s.series.contains(series)) {
                common.push(series.clone());
            }
        }
        common
    });

    let mut categories = Vec::new();
    let mut difficulties = Vec::new();
    for subject in subjects {
        if !categories.contains(&subject.category) {
            categories.push(subject.category);
        }
        if !difficulties.contains(&subject.difficulty) {
            difficulties.push(subject.difficulty);
        }
    }

    ComparisonSummary {
        avg_rating: mean(&rated),
        avg_popularity: mean(&popularity),
        avg_estimated_hours: mean(&hours),
        common_series,
        categories,
        difficulties,
    }
}

fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.0
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}
