//! Time-decayed popularity ranking over a recency window.

use std::fmt;

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::catalog::Subject;
use crate::config::ScoringConfig;
use crate::error::{PrepError, Result};

const MILLIS_PER_DAY: f64 = 86_400_000.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendPeriod {
    Day,
    #[default]
    Week,
    Month,
}

impl TrendPeriod {
    pub fn parse(raw: &str) -> Result<Self> {
        match raw.trim().to_lowercase().as_str() {
            "day" => Ok(Self::Day),
            "week" => Ok(Self::Week),
            "month" => Ok(Self::Month),
            _ => Err(PrepError::invalid_enum("period", raw, &["day", "week", "month"])),
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Day => "day",
            Self::Week => "week",
            Self::Month => "month",
        }
    }

    /// Window length; a month is 30 days.
    #[must_use]
    pub fn window(self) -> Duration {
        match self {
            Self::Day => Duration::days(1),
            Self::Week => Duration::days(7),
            Self::Month => Duration::days(30),
        }
    }

    /// Oldest `updatedAt` still inside the window.
    #[must_use]
    pub fn cutoff(self, now: DateTime<Utc>) -> DateTime<Utc> {
        now - self.window()
    }
}

impl fmt::Display for TrendPeriod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TrendingEntry {
    #[serde(flatten)]
    pub subject: Subject,
    pub trending_score: f64,
}

#[derive(Debug, Clone)]
pub struct TrendingCalculator {
    popularity_weight: f64,
    rating_weight: f64,
    students_weight: f64,
}

impl TrendingCalculator {
    #[must_use]
    pub const fn new(scoring: &ScoringConfig) -> Self {
        Self {
            popularity_weight: scoring.trending_popularity_weight,
            rating_weight: scoring.trending_rating_weight,
            students_weight: scoring.trending_students_weight,
        }
    }

    /// `popularity·0.4 + rating·20 + students·0.1 − ageInDays` with the
    /// default weights. Updates stamped in the future count as age 0.
    #[must_use]
    pub fn score(&self, subject: &Subject, now: DateTime<Utc>) -> f64 {
        let age_days =
            (now - subject.updated_at).num_milliseconds().max(0) as f64 / MILLIS_PER_DAY;
        subject.popularity as f64 * self.popularity_weight
            + subject.rating_average() * self.rating_weight
            + subject.statistics.total_students as f64 * self.students_weight
            - age_days
    }

    /// Scores the in-window candidates, best first, at most `limit`.
    /// Candidates updated before the window are dropped, not down-ranked.
    #[must_use]
    pub fn rank(
        &self,
        candidates: Vec<Subject>,
        period: TrendPeriod,
        now: DateTime<Utc>,
        limit: usize,
    ) -> Vec<TrendingEntry> {
        let cutoff = period.cutoff(now);
        let mut entries: Vec<TrendingEntry> = candidates
            .into_iter()
            .filter(|subject| subject.updated_at >= cutoff)
            .map(|subject| TrendingEntry {
                trending_score: self.score(&subject, now),
                subject,
            })
            .collect();
        entries.sort_by(|a, b| b.trending_score.total_cmp(&a.trending_score));
        entries.truncate(limit);
        entries
    }
}
