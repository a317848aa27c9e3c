//! Error taxonomy for match ingestion and rating replay

use chrono::NaiveDate;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum RatingError {
    /// A match fact that cannot be rated (self-play, negative score, empty id)
    #[error("invalid match: {reason}")]
    InvalidMatch { reason: String },

    /// A replay batch whose dates go backwards
    #[error("match history out of order at index {index}: {found} follows {previous}")]
    UnorderedHistory {
        index: usize,
        previous: NaiveDate,
        found: NaiveDate,
    },

    #[error("invalid rating config: {0}")]
    InvalidConfig(String),
}

impl RatingError {
    pub(crate) fn invalid_match(reason: impl Into<String>) -> Self {
        RatingError::InvalidMatch {
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, RatingError>;
