//! Error taxonomy for the search engine and its CLI.

use thiserror::Error;

pub type Result<T> = std::result::Result<T, PrepError>;

#[derive(Debug, Error)]
pub enum PrepError {
    #[error("invalid value {raw_value:?} for filter `{field}`")]
    InvalidFilterValue { field: String, raw_value: String },

    #[error("invalid value {raw_value:?} for `{field}` (expected one of: {})", .allowed.join(", "))]
    InvalidEnumValue {
        field: String,
        raw_value: String,
        allowed: Vec<String>,
    },

    #[error("`{field}` of {requested} exceeds the maximum of {max}")]
    LimitExceeded {
        field: String,
        requested: usize,
        max: usize,
    },

    #[error("comparison needs at least 2 distinct ids, got {count}")]
    InsufficientIds { count: usize },

    #[error("entities not found: {}", .ids.join(", "))]
    EntityNotFound { ids: Vec<String> },

    #[error("catalog store unavailable: {0}")]
    StoreUnavailable(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("configuration error: {0}")]
    Config(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl PrepError {
    pub(crate) fn invalid_value(field: &str, raw_value: impl Into<String>) -> Self {
        Self::InvalidFilterValue {
            field: field.to_string(),
            raw_value: raw_value.into(),
        }
    }

    pub(crate) fn invalid_enum(field: &str, raw_value: impl Into<String>, allowed: &[&str]) -> Self {
        Self::InvalidEnumValue {
            field: field.to_string(),
            raw_value: raw_value.into(),
            allowed: allowed.iter().map(ToString::to_string).collect(),
        }
    }

    /// Stable machine-readable code used in robot output.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidFilterValue { .. } => "invalid_filter_value",
            Self::InvalidEnumValue { .. } => "invalid_enum_value",
            Self::LimitExceeded { .. } => "limit_exceeded",
            Self::InsufficientIds { .. } => "insufficient_ids",
            Self::EntityNotFound { .. } => "entity_not_found",
            Self::StoreUnavailable(_) => "store_unavailable",
            Self::Cancelled => "cancelled",
            Self::Config(_) => "config",
            Self::Io(_) => "io",
            Self::Serialization(_) => "serialization",
        }
    }

    /// Validation and not-found errors: the caller can fix the request.
    #[must_use]
    pub const fn is_caller_fixable(&self) -> bool {
        matches!(
            self,
            Self::InvalidFilterValue { .. }
                | Self::InvalidEnumValue { .. }
                | Self::LimitExceeded { .. }
                | Self::InsufficientIds { .. }
                | Self::EntityNotFound { .. }
        )
    }
}
