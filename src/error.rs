//! Error types shared across storage, import/export and review sessions.
use thiserror::Error;

/// Failures from persistence and file import/export.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Story not found: {0}")]
    StoryNotFound(String),

    #[error("Association index {index} out of bounds for story {story_id}")]
    AssociationOutOfRange { story_id: String, index: usize },

    #[error("Stored value is invalid: {0}")]
    InvalidData(String),

    #[error("Database connection lock poisoned")]
    LockPoisoned,
}

pub type Result<T> = std::result::Result<T, AppError>;

/// Recall quality outside the 0-5 scale.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("Quality rating must be between 0 and 5, got {0}")]
pub struct InvalidQuality(pub u8);

/// Misuse of the review session state machine.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SessionError {
    #[error("Session is already complete")]
    SessionComplete,

    #[error("Current question has already been answered")]
    AlreadyAnswered,

    #[error("Current question has not been answered yet")]
    NotAnswered,

    #[error("Option {index} does not exist (question has {len} options)")]
    OptionOutOfRange { index: usize, len: usize },

    #[error("Plain quizzes are not rated")]
    RatingNotExpected,

    #[error("Rating {0} is not allowed for this answer")]
    RatingNotAllowed(&'static str),

    #[error("A recall rating is required before moving on")]
    RatingRequired,
}
