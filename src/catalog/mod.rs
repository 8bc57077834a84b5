//! Catalog records and the store collaborator they come from.
//!
//! A [`Subject`] is a read-only snapshot for the duration of one request;
//! nothing in the engine mutates it.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

pub mod memory;
pub mod store;

pub use memory::InMemoryCatalog;
pub use store::{CatalogStore, QueryPage, QueryWindow};

/// Closed set of subject categories.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Mathematics,
    Physics,
    Chemistry,
    Biology,
    English,
    Reasoning,
    GeneralKnowledge,
    ComputerScience,
    Other,
}

impl Category {
    pub const ALL: [Self; 9] = [
        Self::Mathematics,
        Self::Physics,
        Self::Chemistry,
        Self::Biology,
        Self::English,
        Self::Reasoning,
        Self::GeneralKnowledge,
        Self::ComputerScience,
        Self::Other,
    ];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Mathematics => "mathematics",
            Self::Physics => "physics",
            Self::Chemistry => "chemistry",
            Self::Biology => "biology",
            Self::English => "english",
            Self::Reasoning => "reasoning",
            Self::GeneralKnowledge => "general_knowledge",
            Self::ComputerScience => "computer_science",
            Self::Other => "other",
        }
    }

    /// Case-insensitive parse; `-` and ` ` are accepted in place of `_`.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase().replace(['-', ' '], "_");
        Self::ALL.into_iter().find(|c| c.as_str() == normalized)
    }

    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|c| c.as_str()).collect()
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Ordinal difficulty. Declaration order is the ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Difficulty {
    Easy,
    Medium,
    Hard,
}

impl Difficulty {
    pub const ALL: [Self; 3] = [Self::Easy, Self::Medium, Self::Hard];

    /// easy=1, medium=2, hard=3
    #[must_use]
    pub const fn level(self) -> u8 {
        match self {
            Self::Easy => 1,
            Self::Medium => 2,
            Self::Hard => 3,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Easy => "easy",
            Self::Medium => "medium",
            Self::Hard => "hard",
        }
    }

    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        let normalized = raw.trim().to_lowercase();
        Self::ALL.into_iter().find(|d| d.as_str() == normalized)
    }

    #[must_use]
    pub fn names() -> Vec<&'static str> {
        Self::ALL.iter().map(|d| d.as_str()).collect()
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Rating {
    pub average: f64,
    pub count: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_exams: u64,
    pub total_students: u64,
    pub completion_rate: f64,
}

/// A searchable catalog entry.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub category: Category,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subcategory: Option<String>,
    #[serde(default)]
    pub series: Vec<String>,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub tags: Vec<String>,
    #[serde(default)]
    pub keywords: Vec<String>,
    #[serde(default)]
    pub rating: Rating,
    #[serde(default)]
    pub popularity: u64,
    #[serde(default)]
    pub statistics: Statistics,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub estimated_hours: Option<u32>,
    #[serde(default)]
    pub exam_ids: Vec<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

const fn default_active() -> bool {
    true
}

impl Subject {
    /// Rating average, reported as 0 when nobody has rated the subject.
    #[must_use]
    pub const fn rating_average(&self) -> f64 {
        if self.rating.count == 0 {
            0.0
        } else {
            self.rating.average
        }
    }

    #[must_use]
    pub const fn is_rated(&self) -> bool {
        self.rating.count > 0
    }

    #[must_use]
    pub fn exam_count(&self) -> usize {
        self.exam_ids.len()
    }
}
