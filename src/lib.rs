pub mod config;
pub mod database;
pub mod error;
pub mod export;
pub mod models;

pub use error::{AppError, Result};
pub use models::{
    ItemId, Quality, QuizQuestion, ReviewCollaborator, ReviewQueueItem, ReviewRating,
    ReviewSession, SavedStory, ScheduleState, StoryLibrary,
};
