//! Filter builder: raw request parameters to a typed [`Predicate`].
//!
//! Parameters arrive as strings or string lists (query strings, JSON bodies,
//! CLI flags). Parsing is strict: a malformed number or boolean is an error,
//! never a silent default.

use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::catalog::{Category, Difficulty, Subject};
use crate::config::ScoringConfig;
use crate::error::{PrepError, Result};
use crate::search::text::TextQuery;

/// A raw parameter value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RawValue {
    Scalar(String),
    List(Vec<String>),
}

impl RawValue {
    /// All values, with comma-separated entries split and blanks dropped.
    #[must_use]
    pub fn values(&self) -> Vec<String> {
        let parts: Vec<&str> = match self {
            Self::Scalar(value) => vec![value.as_str()],
            Self::List(values) => values.iter().map(String::as_str).collect(),
        };
        parts
            .into_iter()
            .flat_map(|part| part.split(','))
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(ToString::to_string)
            .collect()
    }

    /// The single value of a scalar parameter.
    pub(crate) fn scalar(&self, field: &str) -> Result<&str> {
        match self {
            Self::Scalar(value) => Ok(value.trim()),
            Self::List(values) if values.len() == 1 => Ok(values[0].trim()),
            Self::List(values) => Err(PrepError::invalid_value(field, values.join(","))),
        }
    }
}

impl From<&str> for RawValue {
    fn from(value: &str) -> Self {
        Self::Scalar(value.to_string())
    }
}

impl From<String> for RawValue {
    fn from(value: String) -> Self {
        Self::Scalar(value)
    }
}

impl From<Vec<String>> for RawValue {
    fn from(values: Vec<String>) -> Self {
        Self::List(values)
    }
}

impl From<&[&str]> for RawValue {
    fn from(values: &[&str]) -> Self {
        Self::List(values.iter().map(ToString::to_string).collect())
    }
}

/// Raw request parameters keyed by normalized name.
///
/// Keys are matched ignoring case, `_` and `-`, so `minRating`,
/// `min_rating` and `min-rating` address the same parameter.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawParams {
    values: BTreeMap<String, RawValue>,
}

fn normalize_key(key: &str) -> String {
    key.chars()
        .filter(|c| *c != '_' && *c != '-')
        .flat_map(char::to_lowercase)
        .collect()
}

impl RawParams {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert; replaces any previous value for the key.
    #[must_use]
    pub fn with(mut self, key: &str, value: impl Into<RawValue>) -> Self {
        self.insert(key, value);
        self
    }

    pub fn insert(&mut self, key: &str, value: impl Into<RawValue>) {
        self.values.insert(normalize_key(key), value.into());
    }

    /// Query-string style pairs; repeated keys accumulate into a list.
    pub fn from_pairs<K, V, I>(pairs: I) -> Self
    where
        K: AsRef<str>,
        V: Into<String>,
        I: IntoIterator<Item = (K, V)>,
    {
        let mut params = Self::new();
        for (key, value) in pairs {
            let key = normalize_key(key.as_ref());
            let value = value.into();
            let merged = match params.values.remove(&key) {
                None => RawValue::Scalar(value),
                Some(RawValue::Scalar(first)) => RawValue::List(vec![first, value]),
                Some(RawValue::List(mut list)) => {
                    list.push(value);
                    RawValue::List(list)
                }
            };
            params.values.insert(key, merged);
        }
        params
    }

    /// Parameters from a JSON object. Scalars are stringified, arrays become
    /// lists, `null` entries are skipped.
    pub fn from_json(value: &serde_json::Value) -> Result<Self> {
        let object = value
            .as_object()
            .ok_or_else(|| PrepError::invalid_value("params", value.to_string()))?;
        let mut params = Self::new();
        for (key, entry) in object {
            match entry {
                serde_json::Value::Null => {}
                serde_json::Value::Array(items) => {
                    let list = items
                        .iter()
                        .map(|item| json_scalar(key, item))
                        .collect::<Result<Vec<_>>>()?;
                    params.insert(key, RawValue::List(list));
                }
                other => params.insert(key, RawValue::Scalar(json_scalar(key, other)?)),
            }
        }
        Ok(params)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&RawValue> {
        self.values.get(&normalize_key(key))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &RawValue)> {
        self.values.iter()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

fn json_scalar(key: &str, value: &serde_json::Value) -> Result<String> {
    match value {
        serde_json::Value::String(s) => Ok(s.clone()),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(PrepError::invalid_value(key, other.to_string())),
    }
}

/// Validated, storage-agnostic filter criteria.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Predicate {
    /// Free-text query; its presence switches search into text mode.
    pub text: Option<TextQuery>,
    /// Exact-match inclusion sets. Empty means unconstrained.
    pub categories: Vec<Category>,
    pub subcategories: Vec<String>,
    pub difficulties: Vec<Difficulty>,
    /// Any-overlap sets. Unknown values simply match nothing.
    pub series: Vec<String>,
    pub tags: Vec<String>,
    /// Inclusive lower bound on the rating average.
    pub min_rating: Option<f64>,
    /// Inclusive hour range. Records without hours fail either bound.
    pub min_estimated_hours: Option<u32>,
    pub max_estimated_hours: Option<u32>,
    /// `true` requires at least one exam, `false` requires none.
    pub has_exams: Option<bool>,
    /// Set by `isPopular=true`: popularity must exceed this value.
    pub popularity_above: Option<u64>,
    /// `Some(true)` unless the caller overrides it; `None` keeps inactive records.
    pub is_active: Option<bool>,
    /// Restricts to records updated at or after this instant.
    pub updated_since: Option<DateTime<Utc>>,
}

impl Predicate {
    /// Matches every active record.
    #[must_use]
    pub fn active() -> Self {
        Self {
            is_active: Some(true),
            ..Self::default()
        }
    }

    /// Evaluates all criteria, including the text query when present.
    #[must_use]
    pub fn matches(&self, subject: &Subject) -> bool {
        self.matches_fields(subject)
            && self
                .text
                .as_ref()
                .is_none_or(|text| text.score(subject).is_some())
    }

    /// Text score for `subject`, or `None` when no text query is set.
    #[must_use]
    pub fn text_score(&self, subject: &Subject) -> Option<f64> {
        self.text.as_ref().and_then(|text| text.score(subject))
    }

    fn matches_fields(&self, subject: &Subject) -> bool {
        if let Some(active) = self.is_active {
            if subject.is_active != active {
                return false;
            }
        }
        if !self.categories.is_empty() && !self.categories.contains(&subject.category) {
            return false;
        }
        if !self.subcategories.is_empty()
            && !subject
                .subcategory
                .as_ref()
                .is_some_and(|sub| self.subcategories.contains(sub))
        {
            return false;
        }
        if !self.difficulties.is_empty() && !self.difficulties.contains(&subject.difficulty) {
            return false;
        }
        if !self.series.is_empty() && !overlaps(&self.series, &subject.series) {
            return false;
        }
        if !self.tags.is_empty() && !overlaps(&self.tags, &subject.tags) {
            return false;
        }
        if let Some(min) = self.min_rating {
            if subject.rating_average() < min {
                return false;
            }
        }
        if self.min_estimated_hours.is_some() || self.max_estimated_hours.is_some() {
            let Some(hours) = subject.estimated_hours else {
                return false;
            };
            if self.min_estimated_hours.is_some_and(|min| hours < min)
                || self.max_estimated_hours.is_some_and(|max| hours > max)
            {
                return false;
            }
        }
        if let Some(has_exams) = self.has_exams {
            if (subject.statistics.total_exams > 0) != has_exams {
                return false;
            }
        }
        if let Some(threshold) = self.popularity_above {
            if subject.popularity <= threshold {
                return false;
            }
        }
        if let Some(since) = self.updated_since {
            if subject.updated_at < since {
                return false;
            }
        }
        true
    }
}

/// Order-insensitive for the set-valued criteria, so `series=A,B` and
/// `series=B,A` compare equal. Ratings compare bitwise, matching `Hash`.
impl PartialEq for Predicate {
    fn eq(&self, other: &Self) -> bool {
        self.text.as_ref().map(|text| &text.terms) == other.text.as_ref().map(|text| &text.terms)
            && sorted(&self.categories) == sorted(&other.categories)
            && sorted(&self.subcategories) == sorted(&other.subcategories)
            && sorted(&self.difficulties) == sorted(&other.difficulties)
            && sorted(&self.series) == sorted(&other.series)
            && sorted(&self.tags) == sorted(&other.tags)
            && self.min_rating.map(f64::to_bits) == other.min_rating.map(f64::to_bits)
            && self.min_estimated_hours == other.min_estimated_hours
            && self.max_estimated_hours == other.max_estimated_hours
            && self.has_exams == other.has_exams
            && self.popularity_above == other.popularity_above
            && self.is_active == other.is_active
            && self.updated_since == other.updated_since
    }
}

impl Eq for Predicate {}

impl Hash for Predicate {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.text.as_ref().map(|text| &text.terms).hash(state);
        sorted(&self.categories).hash(state);
        sorted(&self.subcategories).hash(state);
        sorted(&self.difficulties).hash(state);
        sorted(&self.series).hash(state);
        sorted(&self.tags).hash(state);
        self.min_rating.map(f64::to_bits).hash(state);
        self.min_estimated_hours.hash(state);
        self.max_estimated_hours.hash(state);
        self.has_exams.hash(state);
        self.popularity_above.hash(state);
        self.is_active.hash(state);
        self.updated_since.hash(state);
    }
}

fn sorted<T: Ord + Clone>(values: &[T]) -> Vec<T> {
    let mut values = values.to_vec();
    values.sort();
    values.dedup();
    values
}

fn overlaps(wanted: &[String], present: &[String]) -> bool {
    wanted.iter().any(|value| present.contains(value))
}

/// Turns [`RawParams`] into a [`Predicate`].
#[derive(Debug, Clone)]
pub struct FilterBuilder {
    popular_threshold: u64,
}

impl FilterBuilder {
    #[must_use]
    pub const fn new(scoring: &ScoringConfig) -> Self {
        Self {
            popular_threshold: scoring.popular_threshold,
        }
    }

    pub fn build(&self, params: &RawParams) -> Result<Predicate> {
        let mut predicate = Predicate::active();

        let query = params
            .get("query")
            .or_else(|| params.get("q"))
            .map(|raw| raw.scalar("query"))
            .transpose()?;
        predicate.text = query.and_then(TextQuery::parse);

        if let Some(raw) = params.get("category") {
            predicate.categories = raw
                .values()
                .into_iter()
                .map(|value| {
                    Category::parse(&value)
                        .ok_or_else(|| PrepError::invalid_enum("category", value, &Category::names()))
                })
                .collect::<Result<_>>()?;
        }
        if let Some(raw) = params.get("subcategory") {
            predicate.subcategories = raw.values();
        }
        if let Some(raw) = params.get("difficulty") {
            predicate.difficulties = raw
                .values()
                .into_iter()
                .map(|value| {
                    Difficulty::parse(&value).ok_or_else(|| {
                        PrepError::invalid_enum("difficulty", value, &Difficulty::names())
                    })
                })
                .collect::<Result<_>>()?;
        }
        if let Some(raw) = params.get("series") {
            predicate.series = raw.values();
        }
        if let Some(raw) = params.get("tags") {
            predicate.tags = raw.values();
        }

        predicate.min_rating = params
            .get("minRating")
            .map(|raw| parse_float("minRating", raw.scalar("minRating")?))
            .transpose()?;
        predicate.min_estimated_hours = params
            .get("minEstimatedHours")
            .map(|raw| parse_u32("minEstimatedHours", raw.scalar("minEstimatedHours")?))
            .transpose()?;
        predicate.max_estimated_hours = params
            .get("maxEstimatedHours")
            .map(|raw| parse_u32("maxEstimatedHours", raw.scalar("maxEstimatedHours")?))
            .transpose()?;
        if let (Some(min), Some(max)) = (predicate.min_estimated_hours, predicate.max_estimated_hours) {
            if min > max {
                return Err(PrepError::invalid_value(
                    "maxEstimatedHours",
                    format!("{max} (below minEstimatedHours {min})"),
                ));
            }
        }

        predicate.has_exams = params
            .get("hasExams")
            .map(|raw| parse_bool("hasExams", raw.scalar("hasExams")?))
            .transpose()?;

        let is_popular = params
            .get("isPopular")
            .map(|raw| parse_bool("isPopular", raw.scalar("isPopular")?))
            .transpose()?;
        if is_popular == Some(true) {
            predicate.popularity_above = Some(self.popular_threshold);
        }

        if let Some(raw) = params.get("isActive") {
            predicate.is_active = Some(parse_bool("isActive", raw.scalar("isActive")?)?);
        }

        Ok(predicate)
    }
}

pub(crate) fn parse_bool(field: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(PrepError::invalid_value(field, raw)),
    }
}

pub(crate) fn parse_float(field: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .ok()
        .filter(|value| value.is_finite())
        .ok_or_else(|| PrepError::invalid_value(field, raw))
}

pub(crate) fn parse_u32(field: &str, raw: &str) -> Result<u32> {
    raw.trim()
        .parse::<u32>()
        .map_err(|_| PrepError::invalid_value(field, raw))
}

pub(crate) fn parse_usize(field: &str, raw: &str) -> Result<usize> {
    raw.trim()
        .parse::<usize>()
        .map_err(|_| PrepError::invalid_value(field, raw))
}
