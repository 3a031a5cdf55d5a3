pub mod due_set;
pub mod library;
pub mod quality;
pub mod quiz_question;
pub mod review_item;
pub mod review_session;
pub mod schedule_state;
pub mod srs;
pub mod story;

pub use due_set::{QuestionSource, build_review_queue};
pub use library::StoryLibrary;
pub use quality::{Quality, ReviewRating};
pub use quiz_question::QuizQuestion;
pub use review_item::{DisplayContext, ItemId, ReviewQueueItem};
pub use review_session::{
    AnswerFeedback, ReviewCollaborator, ReviewSession, SessionMode, SessionState,
};
pub use schedule_state::ScheduleState;
pub use story::{MnemonicAssociation, SavedStory, Shape};
