//! Concise [`Subject`] construction for tests and benches.

use chrono::{DateTime, TimeZone, Utc};

use crate::catalog::{Category, Difficulty, Rating, Statistics, Subject};

/// Reference instant shared by fixtures: 2026-06-01T12:00:00Z.
#[must_use]
pub fn fixed_now() -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0)
        .single()
        .unwrap_or_default()
}

/// Builds an active, unrated, medium-difficulty mathematics subject stamped
/// at [`fixed_now`] unless told otherwise.
#[derive(Debug, Clone)]
pub struct SubjectBuilder {
    subject: Subject,
}

impl SubjectBuilder {
    #[must_use]
    pub fn new(id: &str, name: &str) -> Self {
        let now = fixed_now();
        Self {
            subject: Subject {
                id: id.to_string(),
                name: name.to_string(),
                description: String::new(),
                category: Category::Mathematics,
                subcategory: None,
                series: Vec::new(),
                difficulty: Difficulty::Medium,
                tags: Vec::new(),
                keywords: Vec::new(),
                rating: Rating::default(),
                popularity: 0,
                statistics: Statistics::default(),
                estimated_hours: None,
                exam_ids: Vec::new(),
                is_active: true,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[must_use]
    pub fn description(mut self, description: &str) -> Self {
        self.subject.description = description.to_string();
        self
    }

    #[must_use]
    pub const fn category(mut self, category: Category) -> Self {
        self.subject.category = category;
        self
    }

    #[must_use]
    pub fn subcategory(mut self, subcategory: &str) -> Self {
        self.subject.subcategory = Some(subcategory.to_string());
        self
    }

    #[must_use]
    pub const fn difficulty(mut self, difficulty: Difficulty) -> Self {
        self.subject.difficulty = difficulty;
        self
    }

    /// 1 = easy, 2 = medium, anything higher = hard.
    #[must_use]
    pub const fn difficulty_level(self, level: u8) -> Self {
        let difficulty = match level {
            0 | 1 => Difficulty::Easy,
            2 => Difficulty::Medium,
            _ => Difficulty::Hard,
        };
        self.difficulty(difficulty)
    }

    #[must_use]
    pub fn series(mut self, series: &[&str]) -> Self {
        self.subject.series = owned(series);
        self
    }

    #[must_use]
    pub fn tags(mut self, tags: &[&str]) -> Self {
        self.subject.tags = owned(tags);
        self
    }

    #[must_use]
    pub fn keywords(mut self, keywords: &[&str]) -> Self {
        self.subject.keywords = owned(keywords);
        self
    }

    #[must_use]
    pub const fn rating(mut self, average: f64, count: u64) -> Self {
        self.subject.rating = Rating { average, count };
        self
    }

    #[must_use]
    pub const fn popularity(mut self, popularity: u64) -> Self {
        self.subject.popularity = popularity;
        self
    }

    #[must_use]
    pub const fn students(mut self, students: u64) -> Self {
        self.subject.statistics.total_students = students;
        self
    }

    #[must_use]
    pub const fn total_exams(mut self, exams: u64) -> Self {
        self.subject.statistics.total_exams = exams;
        self
    }

    #[must_use]
    pub const fn completion_rate(mut self, rate: f64) -> Self {
        self.subject.statistics.completion_rate = rate;
        self
    }

    #[must_use]
    pub const fn hours(mut self, hours: u32) -> Self {
        self.subject.estimated_hours = Some(hours);
        self
    }

    #[must_use]
    pub fn exam_ids(mut self, ids: &[&str]) -> Self {
        self.subject.exam_ids = owned(ids);
        self
    }

    #[must_use]
    pub const fn active(mut self, active: bool) -> Self {
        self.subject.is_active = active;
        self
    }

    #[must_use]
    pub const fn created_at(mut self, at: DateTime<Utc>) -> Self {
        self.subject.created_at = at;
        self
    }

    #[must_use]
    pub const fn updated_at(mut self, at: DateTime<Utc>) -> Self {
        self.subject.updated_at = at;
        self
    }

    #[must_use]
    pub fn build(self) -> Subject {
        self.subject
    }
}

fn owned(values: &[&str]) -> Vec<String> {
    values.iter().map(ToString::to_string).collect()
}
