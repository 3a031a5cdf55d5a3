//! Session-scoped wrapper around a due association and its quiz question.
use super::QuizQuestion;
use std::fmt;

/// Identifies an association: the owning story and its position in the story.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ItemId {
    pub story_id: String,
    pub association_index: usize,
}

impl ItemId {
    pub fn new(story_id: impl Into<String>, association_index: usize) -> Self {
        Self {
            story_id: story_id.into(),
            association_index,
        }
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}#{}", self.story_id, self.association_index)
    }
}

/// What the review screen shows around the question. Not interpreted by the session.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct DisplayContext {
    pub topic: String,
    pub image_data: Option<String>,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ReviewQueueItem {
    pub item_id: ItemId,
    pub context: DisplayContext,
    pub question: QuizQuestion,
    /// Correct answers still needed this session after a miss.
    pub relearn_count: u32,
    /// Answers given to this item during the session.
    pub attempts: u32,
}

impl ReviewQueueItem {
    pub fn new(item_id: ItemId, context: DisplayContext, question: QuizQuestion) -> Self {
        Self {
            item_id,
            context,
            question,
            relearn_count: 0,
            attempts: 0,
        }
    }

    pub fn is_relearning(&self) -> bool {
        self.relearn_count > 0
    }
}
