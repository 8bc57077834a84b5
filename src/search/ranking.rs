//! Ranking engine: sort modes, directions and the composite popularity score.
//!
//! Every ordering goes through a stable sort, so records with equal keys keep
//! the order the catalog store returned them in.

use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::catalog::Subject;
use crate::catalog::store::Candidate;
use crate::config::ScoringConfig;
use crate::error::{PrepError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortField {
    Relevance,
    Name,
    Popularity,
    Rating,
    Difficulty,
    EstimatedHours,
    ExamCount,
    CreatedAt,
    PopularityScore,
}

impl SortField {
    pub const ALL: [Self; 9] = [
        Self::Relevance,
        Self::Name,
        Self::Popularity,
        Self::Rating,
        Self::Difficulty,
        Self::EstimatedHours,
        Self::ExamCount,
        Self::CreatedAt,
        Self::PopularityScore,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Relevance => "relevance",
            Self::Name => "name",
            Self::Popularity => "popularity",
            Self::Rating => "rating",
            Self::Difficulty => "difficulty",
            Self::EstimatedHours => "estimatedHours",
            Self::ExamCount => "examCount",
            Self::CreatedAt => "createdAt",
            Self::PopularityScore => "popularityScore",
        }
    }

    pub fn parse(raw: &str) -> Result<Self> {
        let normalized: String = raw
            .trim()
            .chars()
            .filter(|c| *c != '_' && *c != '-')
            .flat_map(char::to_lowercase)
            .collect();
        Self::ALL
            .into_iter()
            .find(|field| field.as_str().to_lowercase() == normalized)
            .ok_or_else(|| {
                let allowed: Vec<&str> = Self::ALL.iter().map(|f| f.as_str()).collect();
                PrepError::invalid_enum("sortBy", raw, &allowed)
            })
    }

    /// Descending for score-like modes, ascending otherwise.
    #[must_use]
    pub const fn default_order(self) -> SortOrder {
        match self {
            Self::Relevance | Self::Popularity | Self::PopularityScore => SortOrder::Desc,
            _ => SortOrder::Asc,
        }
    }

    /// Modes whose key is derived from more than one stored field.
    #[must_use]
    pub const fn is_computed(self) -> bool {
        matches!(self, Self::Relevance | Self::PopularityScore)
    }
}

impl fmt::Display for SortField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    Asc,
    Desc,
}

impl SortOrder {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "asc" | "ascending" | "1" => Ok(Self::Asc),
            "desc" | "descending" | "-1" => Ok(Self::Desc),
            _ => Err(PrepError::invalid_enum("sortOrder", raw, &["asc", "desc"])),
        }
    }

    #[must_use]
    pub const fn apply(self, ordering: Ordering) -> Ordering {
        match self {
            Self::Asc => ordering,
            Self::Desc => ordering.reverse(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortSpec {
    pub field: SortField,
    pub order: SortOrder,
}

impl SortSpec {
    /// Uses the field's default direction when `order` is `None`.
    #[must_use]
    pub const fn new(field: SortField, order: Option<SortOrder>) -> Self {
        let order = match order {
            Some(order) => order,
            None => field.default_order(),
        };
        Self { field, order }
    }
}

impl Default for SortSpec {
    fn default() -> Self {
        Self::new(SortField::Relevance, None)
    }
}

/// `popularity·w₁ + rating·w₂ + students·w₃`
#[must_use]
pub fn popularity_score(subject: &Subject, scoring: &ScoringConfig) -> f64 {
    subject.popularity as f64 * scoring.popularity_weight
        + subject.rating_average() * scoring.rating_weight
        + subject.statistics.total_students as f64 * scoring.students_weight
}

/// Orders candidates in place.
///
/// `text_mode` is true when the request carried a text query; `relevance`
/// then orders by text score and otherwise falls back to the popularity score.
pub fn rank(candidates: &mut [Candidate], spec: &SortSpec, text_mode: bool, scoring: &ScoringConfig) {
    match spec.field {
        SortField::Relevance if text_mode => candidates.sort_by(|a, b| {
            spec.order
                .apply(a.text_score.unwrap_or(0.0).total_cmp(&b.text_score.unwrap_or(0.0)))
        }),
        SortField::Relevance | SortField::PopularityScore => candidates.sort_by(|a, b| {
            let left = popularity_score(&a.subject, scoring);
            let right = popularity_score(&b.subject, scoring);
            spec.order.apply(left.total_cmp(&right))
        }),
        field => candidates
            .sort_by(|a, b| spec.order.apply(compare_field(field, &a.subject, &b.subject))),
    }
}

/// Score reported alongside a ranked candidate, when the mode has one.
#[must_use]
pub fn display_score(
    candidate: &Candidate,
    spec: &SortSpec,
    text_mode: bool,
    scoring: &ScoringConfig,
) -> Option<f64> {
    match spec.field {
        SortField::Relevance if text_mode => candidate.text_score,
        SortField::Relevance | SortField::PopularityScore => {
            Some(popularity_score(&candidate.subject, scoring))
        }
        _ => candidate.text_score,
    }
}

/// Ascending comparison on a stored field. Absent `estimatedHours` sorts
/// before any present value.
#[must_use]
pub fn compare_field(field: SortField, a: &Subject, b: &Subject) -> Ordering {
    match field {
        SortField::Name => a.name.cmp(&b.name),
        SortField::Popularity => a.popularity.cmp(&b.popularity),
        SortField::Rating => a.rating_average().total_cmp(&b.rating_average()),
        SortField::Difficulty => a.difficulty.level().cmp(&b.difficulty.level()),
        SortField::EstimatedHours => a.estimated_hours.cmp(&b.estimated_hours),
        SortField::ExamCount => a.exam_count().cmp(&b.exam_count()),
        SortField::CreatedAt => a.created_at.cmp(&b.created_at),
        SortField::Relevance | SortField::PopularityScore => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utils::fixtures::SubjectBuilder;

    fn candidates(subjects: Vec<Subject>) -> Vec<Candidate> {
        subjects.into_iter().map(Candidate::new).collect()
    }

    fn ids(candidates: &[Candidate]) -> Vec<&str> {
        candidates.iter().map(|c| c.subject.id.as_str()).collect()
    }

    #[test]
    fn parse_accepts_camel_and_snake_case() {
        assert_eq!(SortField::parse("estimatedHours").unwrap(), SortField::EstimatedHours);
        assert_eq!(SortField::parse("exam_count").unwrap(), SortField::ExamCount);
        assert_eq!(SortField::parse("POPULARITYSCORE").unwrap(), SortField::PopularityScore);
        assert!(matches!(
            SortField::parse("randomness"),
            Err(PrepError::InvalidEnumValue { .. })
        ));
    }

    #[test]
    fn default_directions() {
        assert_eq!(SortSpec::new(SortField::Relevance, None).order, SortOrder::Desc);
        assert_eq!(SortSpec::new(SortField::Popularity, None).order, SortOrder::Desc);
        assert_eq!(SortSpec::new(SortField::PopularityScore, None).order, SortOrder::Desc);
        assert_eq!(SortSpec::new(SortField::Name, None).order, SortOrder::Asc);
        assert_eq!(SortSpec::new(SortField::Rating, None).order, SortOrder::Asc);
    }

    #[test]
    fn popularity_score_formula() {
        let subject = SubjectBuilder::new("a", "A")
            .popularity(150)
            .rating(4.5, 10)
            .students(200)
            .build();
        let score = popularity_score(&subject, &ScoringConfig::default());
        assert!((score - (150.0 + 45.0 + 20.0)).abs() < 1e-9);
    }

    #[test]
    fn popularity_desc_orders_by_raw_popularity() {
        let mut list = candidates(vec![
            SubjectBuilder::new("phys", "Phys").popularity(80).build(),
            SubjectBuilder::new("math", "Math").popularity(150).build(),
        ]);
        rank(
            &mut list,
            &SortSpec::new(SortField::Popularity, Some(SortOrder::Desc)),
            false,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&list), vec!["math", "phys"]);
    }

    #[test]
    fn ties_keep_store_order_in_both_directions() {
        let make = || {
            candidates(vec![
                SubjectBuilder::new("a", "A").difficulty_level(2).build(),
                SubjectBuilder::new("b", "B").difficulty_level(2).build(),
                SubjectBuilder::new("c", "C").difficulty_level(1).build(),
            ])
        };
        let scoring = ScoringConfig::default();

        let mut asc = make();
        rank(&mut asc, &SortSpec::new(SortField::Difficulty, Some(SortOrder::Asc)), false, &scoring);
        assert_eq!(ids(&asc), vec!["c", "a", "b"]);

        let mut desc = make();
        rank(&mut desc, &SortSpec::new(SortField::Difficulty, Some(SortOrder::Desc)), false, &scoring);
        assert_eq!(ids(&desc), vec!["a", "b", "c"]);
    }

    #[test]
    fn relevance_uses_text_score_in_text_mode() {
        let mut list = candidates(vec![
            SubjectBuilder::new("low", "Low").popularity(1000).build(),
            SubjectBuilder::new("high", "High").build(),
        ]);
        list[0].text_score = Some(1.0);
        list[1].text_score = Some(5.0);
        rank(&mut list, &SortSpec::default(), true, &ScoringConfig::default());
        assert_eq!(ids(&list), vec!["high", "low"]);
    }

    #[test]
    fn relevance_without_query_falls_back_to_popularity_score() {
        let mut list = candidates(vec![
            SubjectBuilder::new("quiet", "Quiet").popularity(10).build(),
            SubjectBuilder::new("loved", "Loved").popularity(5).rating(5.0, 3).build(),
        ]);
        rank(&mut list, &SortSpec::default(), false, &ScoringConfig::default());
        assert_eq!(ids(&list), vec!["loved", "quiet"]);
    }

    #[test]
    fn missing_hours_sort_first_ascending() {
        let mut list = candidates(vec![
            SubjectBuilder::new("ten", "Ten").hours(10).build(),
            SubjectBuilder::new("none", "None").build(),
            SubjectBuilder::new("five", "Five").hours(5).build(),
        ]);
        rank(
            &mut list,
            &SortSpec::new(SortField::EstimatedHours, None),
            false,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&list), vec!["none", "five", "ten"]);
    }

    #[test]
    fn exam_count_uses_exam_ids() {
        let mut list = candidates(vec![
            SubjectBuilder::new("two", "Two").exam_ids(&["e1", "e2"]).build(),
            SubjectBuilder::new("one", "One").exam_ids(&["e3"]).build(),
        ]);
        rank(
            &mut list,
            &SortSpec::new(SortField::ExamCount, None),
            false,
            &ScoringConfig::default(),
        );
        assert_eq!(ids(&list), vec!["one", "two"]);
    }
}
