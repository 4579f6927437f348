use std::path::PathBuf;

use thiserror::Error;

/// Failures raised by the feedback core and its file readers.
///
/// Under the default permissive filter mode neither `MalformedTimestamp` nor
/// `InvalidFilterSpec` is returned; both are reserved for strict filtering.
/// An empty collection never errors, the satisfaction score is simply `0`.
#[derive(Debug, Error)]
pub enum FeedbackError {
    #[error("record for user {user_id} has malformed created_at {value:?}")]
    MalformedTimestamp { user_id: String, value: String },

    #[error("invalid filter: {0}")]
    InvalidFilterSpec(String),

    #[error("unsupported feedback file format: {}", .0.display())]
    UnsupportedFormat(PathBuf),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error(transparent)]
    Csv(#[from] csv::Error),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, FeedbackError>;
