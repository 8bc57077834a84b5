//! Free-text matching against name, tags and keywords.
//!
//! No stemming or synonyms: a term matches a field when it equals one of the
//! field's tokens (full weight) or appears inside the field text (half weight).

use serde::Serialize;

use crate::catalog::Subject;

pub const NAME_WEIGHT: f64 = 3.0;
pub const TAG_WEIGHT: f64 = 2.0;
pub const KEYWORD_WEIGHT: f64 = 1.0;

/// Bonus applied when a multi-term query occurs verbatim in the name.
pub const PHRASE_BONUS: f64 = NAME_WEIGHT;

const PARTIAL_FACTOR: f64 = 0.5;

/// Lowercase alphanumeric tokens, in order, duplicates kept.
#[must_use]
pub fn tokenize(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|token| !token.is_empty())
        .map(str::to_lowercase)
        .collect()
}

/// A parsed text query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TextQuery {
    pub raw: String,
    pub terms: Vec<String>,
}

impl TextQuery {
    /// Returns `None` when the input has no searchable tokens.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let mut terms = tokenize(raw);
        if terms.is_empty() {
            return None;
        }
        let mut seen = std::collections::HashSet::new();
        terms.retain(|term| seen.insert(term.clone()));
        Some(Self {
            raw: raw.trim().to_string(),
            terms,
        })
    }

    /// Relevance of `subject` for this query; `None` when nothing matches.
    #[must_use]
    pub fn score(&self, subject: &Subject) -> Option<f64> {
        let name = FieldText::new(std::iter::once(subject.name.as_str()));
        let tags = FieldText::new(subject.tags.iter().map(String::as_str));
        let keywords = FieldText::new(subject.keywords.iter().map(String::as_str));

        let mut score = 0.0;
        for term in &self.terms {
            score += name.weigh(term, NAME_WEIGHT);
            score += tags.weigh(term, TAG_WEIGHT);
            score += keywords.weigh(term, KEYWORD_WEIGHT);
        }
        if score <= 0.0 {
            return None;
        }
        if self.terms.len() > 1 && name.lowered.contains(&self.terms.join(" ")) {
            score += PHRASE_BONUS;
        }
        Some(score)
    }
}

struct FieldText {
    lowered: String,
    tokens: Vec<String>,
}

impl FieldText {
    fn new<'a>(values: impl Iterator<Item = &'a str>) -> Self {
        let lowered = values.map(str::to_lowercase).collect::<Vec<_>>().join(" ");
        let tokens = tokenize(&lowered);
        Self { lowered, tokens }
    }

    fn weigh(&self, term: &str, weight: f64) -> f64 {
        if self.tokens.iter().any(|token| token == term) {
            weight
        } else if self.lowered.contains(term) {
            weight * PARTIAL_FACTOR
        } else {
            0.0
        }
    }
}
