//! Review session management for Daily Review and plain quizzes.
//!
//! An interleaved (Daily Review) session works through a queue of due items.
//! A correct answer is rated Hard/Good/Easy; a wrong answer counts as quality 0
//! and sends the item to the back of the queue with two more correct answers
//! required before it is cleared. The session is complete once the queue is empty.
//!
//! A plain quiz walks a fixed list of questions once and never touches schedules.

use super::{ItemId, Quality, QuizQuestion, ReviewQueueItem, ReviewRating};
use crate::error::{Result, SessionError};
use std::collections::VecDeque;
use tracing::{debug, info, warn};

/// Correct answers required to clear an item after a miss.
pub const RELEARN_STREAK: u32 = 2;

/// The outside world as seen by a review session.
pub trait ReviewCollaborator {
    /// Records a rating for the item. Expected to run the SRS engine and store the result.
    fn update_schedule(&mut self, item_id: &ItemId, quality: Quality) -> Result<()>;

    /// Association to highlight in the illustration, `None` once nothing is presented.
    fn set_highlighted(&mut self, _association_index: Option<usize>) {}

    /// Called whenever a different Daily Review item comes to the front.
    fn on_current_item_change(&mut self, _item: &ReviewQueueItem) {}
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionMode {
    Interleaved,
    Quiz,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    Presenting,
    Answered { selected: usize, correct: bool },
    Complete,
}

/// Result of picking an option; the explanation is shown either way.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AnswerFeedback {
    pub correct: bool,
    pub correct_option_index: usize,
    pub explanation: String,
}

enum SessionItems {
    Interleaved(VecDeque<ReviewQueueItem>),
    Quiz {
        questions: Vec<QuizQuestion>,
        index: usize,
    },
}

pub struct ReviewSession<C: ReviewCollaborator> {
    items: SessionItems,
    state: SessionState,
    score: usize,
    answered: usize,
    collaborator: C,
    last_sync_error: Option<String>,
}

impl<C: ReviewCollaborator> ReviewSession<C> {
    /// Starts a Daily Review over the due items, presenting the first one.
    pub fn interleaved(items: Vec<ReviewQueueItem>, collaborator: C) -> Self {
        info!(items = items.len(), "starting daily review");
        Self::start(SessionItems::Interleaved(items.into()), collaborator)
    }

    /// Starts a plain quiz over a fixed list of questions.
    pub fn quiz(questions: Vec<QuizQuestion>, collaborator: C) -> Self {
        info!(questions = questions.len(), "starting quiz");
        Self::start(SessionItems::Quiz { questions, index: 0 }, collaborator)
    }

    fn start(items: SessionItems, collaborator: C) -> Self {
        let mut session = Self {
            items,
            state: SessionState::Presenting,
            score: 0,
            answered: 0,
            collaborator,
            last_sync_error: None,
        };
        session.present_current();
        session
    }

    pub fn mode(&self) -> SessionMode {
        match self.items {
            SessionItems::Interleaved(_) => SessionMode::Interleaved,
            SessionItems::Quiz { .. } => SessionMode::Quiz,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_complete(&self) -> bool {
        self.state == SessionState::Complete
    }

    /// First-pass correct answers; relearning passes never add to it.
    pub fn score(&self) -> usize {
        self.score
    }

    /// Answers given so far, including relearning passes.
    pub fn total_answered(&self) -> usize {
        self.answered
    }

    /// Daily Review item at the head of the queue.
    pub fn current_item(&self) -> Option<&ReviewQueueItem> {
        match &self.items {
            SessionItems::Interleaved(queue) if !self.is_complete() => queue.front(),
            _ => None,
        }
    }

    pub fn current_question(&self) -> Option<&QuizQuestion> {
        if self.is_complete() {
            return None;
        }
        match &self.items {
            SessionItems::Interleaved(queue) => queue.front().map(|item| &item.question),
            SessionItems::Quiz { questions, index } => questions.get(*index),
        }
    }

    /// Items still queued (Daily Review) or questions not yet reached (quiz).
    pub fn remaining(&self) -> usize {
        match &self.items {
            SessionItems::Interleaved(queue) => queue.len(),
            SessionItems::Quiz { questions, index } => questions.len().saturating_sub(*index),
        }
    }

    /// Message from the last failed schedule update, if any.
    pub fn last_sync_error(&self) -> Option<&str> {
        self.last_sync_error.as_deref()
    }

    pub fn clear_sync_error(&mut self) {
        self.last_sync_error = None;
    }

    pub fn collaborator(&self) -> &C {
        &self.collaborator
    }

    /// Ends the session early, discarding the queue.
    pub fn into_collaborator(self) -> C {
        self.collaborator
    }

    /// Answers the current question with the option at `option_index`.
    pub fn select_option(
        &mut self,
        option_index: usize,
    ) -> std::result::Result<AnswerFeedback, SessionError> {
        match self.state {
            SessionState::Complete => return Err(SessionError::SessionComplete),
            SessionState::Answered { .. } => return Err(SessionError::AlreadyAnswered),
            SessionState::Presenting => {}
        }

        let (question, first_pass) = match &mut self.items {
            SessionItems::Interleaved(queue) => {
                let item = queue.front_mut().ok_or(SessionError::SessionComplete)?;
                let first_pass = item.attempts == 0;
                if option_index < item.question.options.len() {
                    item.attempts += 1;
                }
                (&item.question, first_pass)
            }
            SessionItems::Quiz { questions, index } => {
                let question = questions.get(*index).ok_or(SessionError::SessionComplete)?;
                (question, true)
            }
        };

        if option_index >= question.options.len() {
            return Err(SessionError::OptionOutOfRange {
                index: option_index,
                len: question.options.len(),
            });
        }

        let correct = question.is_correct(option_index);
        let feedback = AnswerFeedback {
            correct,
            correct_option_index: question.correct_option_index,
            explanation: question.explanation.clone(),
        };

        if correct && first_pass {
            self.score += 1;
        }
        self.answered += 1;
        self.state = SessionState::Answered {
            selected: option_index,
            correct,
        };
        Ok(feedback)
    }

    /// Rates a correctly answered Daily Review item. Only Hard, Good and Easy are accepted.
    pub fn rate(&mut self, rating: ReviewRating) -> std::result::Result<(), SessionError> {
        let correct = self.answered_correctness()?;
        if self.mode() == SessionMode::Quiz {
            return Err(SessionError::RatingNotExpected);
        }
        if !correct || !rating.quality().is_success() {
            return Err(SessionError::RatingNotAllowed(rating.label()));
        }

        self.apply_rating(rating.quality());
        Ok(())
    }

    /// Moves past an answered question without a learner rating.
    ///
    /// In a quiz this goes to the next question. In Daily Review it is only
    /// valid after a wrong answer, which is recorded as quality 0.
    pub fn advance(&mut self) -> std::result::Result<(), SessionError> {
        let correct = self.answered_correctness()?;

        if self.mode() == SessionMode::Interleaved {
            if correct {
                return Err(SessionError::RatingRequired);
            }
            self.apply_rating(ReviewRating::Again.quality());
            return Ok(());
        }

        if let SessionItems::Quiz { index, .. } = &mut self.items {
            *index += 1;
        }
        // present_current marks the quiz complete once the index runs off the end
        self.state = SessionState::Presenting;
        self.present_current();
        Ok(())
    }

    fn answered_correctness(&self) -> std::result::Result<bool, SessionError> {
        match self.state {
            SessionState::Answered { correct, .. } => Ok(correct),
            SessionState::Presenting => Err(SessionError::NotAnswered),
            SessionState::Complete => Err(SessionError::SessionComplete),
        }
    }

    /// Reports the rating, then requeues or clears the head item.
    fn apply_rating(&mut self, quality: Quality) {
        let SessionItems::Interleaved(queue) = &mut self.items else {
            return;
        };
        let Some(mut item) = queue.pop_front() else {
            self.state = SessionState::Complete;
            return;
        };

        // the session never waits on storage; a failed update is only reported
        if let Err(err) = self.collaborator.update_schedule(&item.item_id, quality) {
            warn!(
                item = %item.item_id,
                quality = quality.value(),
                error = %err,
                "schedule update failed"
            );
            self.last_sync_error = Some(err.to_string());
        }

        if !quality.is_success() {
            item.relearn_count = RELEARN_STREAK;
            debug!(item = %item.item_id, "missed, requeued for relearning");
            queue.push_back(item);
        } else if item.relearn_count > 0 {
            item.relearn_count -= 1;
            if item.relearn_count > 0 {
                debug!(item = %item.item_id, left = item.relearn_count, "relearning, requeued");
                queue.push_back(item);
            } else {
                debug!(item = %item.item_id, "relearned, cleared");
            }
        } else {
            debug!(item = %item.item_id, "cleared");
        }

        if queue.is_empty() {
            info!(score = self.score, answered = self.answered, "daily review complete");
            self.state = SessionState::Complete;
        } else {
            self.state = SessionState::Presenting;
        }
        self.present_current();
    }

    fn present_current(&mut self) {
        let exhausted = match &self.items {
            SessionItems::Interleaved(queue) => queue.is_empty(),
            SessionItems::Quiz { questions, index } => *index >= questions.len(),
        };
        if exhausted {
            self.state = SessionState::Complete;
        }

        if self.is_complete() {
            self.collaborator.set_highlighted(None);
            return;
        }

        match &self.items {
            SessionItems::Interleaved(queue) => {
                if let Some(item) = queue.front() {
                    self.collaborator
                        .set_highlighted(Some(item.item_id.association_index));
                    self.collaborator.on_current_item_change(item);
                }
            }
            SessionItems::Quiz { questions, index } => {
                if let Some(question) = questions.get(*index) {
                    self.collaborator
                        .set_highlighted(Some(question.association_index));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::DisplayContext;

    #[derive(Default)]
    struct Recorder {
        updates: Vec<(ItemId, u8)>,
        highlights: Vec<Option<usize>>,
        presented: Vec<ItemId>,
        fail_updates: bool,
    }

    impl ReviewCollaborator for Recorder {
        fn update_schedule(&mut self, item_id: &ItemId, quality: Quality) -> Result<()> {
            self.updates.push((item_id.clone(), quality.value()));
            if self.fail_updates {
                return Err(AppError::LockPoisoned);
            }
            Ok(())
        }

        fn set_highlighted(&mut self, association_index: Option<usize>) {
            self.highlights.push(association_index);
        }

        fn on_current_item_change(&mut self, item: &ReviewQueueItem) {
            self.presented.push(item.item_id.clone());
        }
    }

    fn question(index: usize) -> QuizQuestion {
        QuizQuestion {
            association_index: index,
            question: format!("What does character {} stand for?", index),
            options: vec!["right".to_string(), "wrong".to_string(), "also wrong".to_string()],
            correct_option_index: 0,
            explanation: format!("Explanation {}", index),
        }
    }

    fn item(name: &str, index: usize) -> ReviewQueueItem {
        ReviewQueueItem::new(ItemId::new(name, index), DisplayContext::default(), question(index))
    }

    fn queue_names<C: ReviewCollaborator>(session: &ReviewSession<C>) -> Vec<String> {
        match &session.items {
            SessionItems::Interleaved(queue) => {
                queue.iter().map(|i| i.item_id.story_id.clone()).collect()
            }
            SessionItems::Quiz { .. } => Vec::new(),
        }
    }

    fn answer_right(session: &mut ReviewSession<Recorder>, rating: ReviewRating) {
        assert!(session.select_option(0).unwrap().correct);
        session.rate(rating).unwrap();
    }

    fn answer_wrong(session: &mut ReviewSession<Recorder>) {
        let feedback = session.select_option(1).unwrap();
        assert!(!feedback.correct);
        session.advance().unwrap();
    }

    #[test]
    fn test_success_clears_item() {
        let mut session = ReviewSession::interleaved(
            vec![item("q1", 0), item("q2", 1)],
            Recorder::default(),
        );

        answer_right(&mut session, ReviewRating::Good);

        assert_eq!(queue_names(&session), vec!["q2"]);
        assert_eq!(session.current_item().unwrap().item_id.story_id, "q2");
        assert_eq!(session.state(), SessionState::Presenting);
        assert_eq!(session.collaborator().updates, vec![(ItemId::new("q1", 0), 4)]);
    }

    #[test]
    fn test_miss_requeues_with_relearn_count() {
        let mut session = ReviewSession::interleaved(
            vec![item("q1", 0), item("q2", 1)],
            Recorder::default(),
        );

        answer_wrong(&mut session);

        assert_eq!(queue_names(&session), vec!["q2", "q1"]);
        let SessionItems::Interleaved(queue) = &session.items else {
            panic!("expected daily review");
        };
        assert_eq!(queue[1].relearn_count, 2);
        assert_eq!(session.collaborator().updates, vec![(ItemId::new("q1", 0), 0)]);
    }

    #[test]
    fn test_relearning_needs_two_correct_answers() {
        let mut session = ReviewSession::interleaved(
            vec![item("q1", 0), item("q2", 1)],
            Recorder::default(),
        );

        answer_wrong(&mut session); // [q2, q1(2)]
        answer_right(&mut session, ReviewRating::Good); // q2 cleared: [q1(2)]
        assert_eq!(queue_names(&session), vec!["q1"]);

        answer_right(&mut session, ReviewRating::Good); // q1 -> 1, requeued
        assert_eq!(queue_names(&session), vec!["q1"]);
        assert_eq!(session.current_item().unwrap().relearn_count, 1);

        answer_right(&mut session, ReviewRating::Good); // q1 -> 0, cleared
        assert!(session.is_complete());
        assert_eq!(session.remaining(), 0);
    }

    #[test]
    fn test_relearn_requeue_goes_behind_other_items() {
        let mut session = ReviewSession::interleaved(
            vec![item("q1", 0), item("q2", 1), item("q3", 2)],
            Recorder::default(),
        );

        answer_wrong(&mut session); // [q2, q3, q1]
        answer_wrong(&mut session); // [q3, q1, q2]
        answer_right(&mut session, ReviewRating::Hard); // [q1, q2]
        answer_right(&mut session, ReviewRating::Easy); // q1 -> 1: [q2, q1]

        assert_eq!(queue_names(&session), vec!["q2", "q1"]);
    }

    #[test]
    fn test_miss_while_relearning_resets_streak() {
        let mut session = ReviewSession::interleaved(vec![item("q1", 0)], Recorder::default());

        answer_wrong(&mut session);
        answer_right(&mut session, ReviewRating::Good);
        assert_eq!(session.current_item().unwrap().relearn_count, 1);

        answer_wrong(&mut session);
        assert_eq!(session.current_item().unwrap().relearn_count, 2);
    }

    #[test]
    fn test_single_item_completes_with_first_pass_score() {
        let mut session = ReviewSession::interleaved(vec![item("q1", 0)], Recorder::default());
        answer_wrong(&mut session);
        answer_right(&mut session, ReviewRating::Good);
        answer_right(&mut session, ReviewRating::Good);

        assert!(session.is_complete());
        assert_eq!(session.score(), 0);
        assert_eq!(session.total_answered(), 3);
        assert!(session.current_question().is_none());

        let mut session = ReviewSession::interleaved(vec![item("q1", 0)], Recorder::default());
        answer_right(&mut session, ReviewRating::Easy);
        assert!(session.is_complete());
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_empty_queue_is_complete() {
        let session = ReviewSession::interleaved(Vec::new(), Recorder::default());
        assert!(session.is_complete());
        assert_eq!(session.collaborator().highlights, vec![None]);
    }

    #[test]
    fn test_highlight_follows_presented_item() {
        let mut session = ReviewSession::interleaved(
            vec![item("q1", 3), item("q2", 5)],
            Recorder::default(),
        );
        answer_right(&mut session, ReviewRating::Good);
        answer_right(&mut session, ReviewRating::Good);

        let recorder = session.into_collaborator();
        assert_eq!(recorder.highlights, vec![Some(3), Some(5), None]);
        assert_eq!(recorder.presented, vec![ItemId::new("q1", 3), ItemId::new("q2", 5)]);
    }

    #[test]
    fn test_highlight_uses_item_id_not_question() {
        let mut mismatched = item("q1", 2);
        mismatched.question.association_index = 7;

        let session = ReviewSession::interleaved(vec![mismatched], Recorder::default());

        assert_eq!(session.collaborator().highlights, vec![Some(2)]);
    }

    #[test]
    fn test_rating_rules() {
        let mut session = ReviewSession::interleaved(
            vec![item("q1", 0), item("q2", 1)],
            Recorder::default(),
        );

        assert_eq!(session.rate(ReviewRating::Good), Err(SessionError::NotAnswered));
        assert_eq!(session.advance(), Err(SessionError::NotAnswered));

        session.select_option(0).unwrap();
        assert_eq!(session.select_option(0), Err(SessionError::AlreadyAnswered));
        assert_eq!(
            session.rate(ReviewRating::Again),
            Err(SessionError::RatingNotAllowed("Again"))
        );
        assert_eq!(session.advance(), Err(SessionError::RatingRequired));
        session.rate(ReviewRating::Good).unwrap();

        session.select_option(2).unwrap();
        assert_eq!(
            session.rate(ReviewRating::Easy),
            Err(SessionError::RatingNotAllowed("Easy"))
        );
        assert!(session.collaborator().updates.len() == 1);
    }

    #[test]
    fn test_option_out_of_range() {
        let mut session = ReviewSession::interleaved(vec![item("q1", 0)], Recorder::default());
        assert_eq!(
            session.select_option(7),
            Err(SessionError::OptionOutOfRange { index: 7, len: 3 })
        );
        assert_eq!(session.state(), SessionState::Presenting);

        // the rejected pick does not use up the first pass
        answer_right(&mut session, ReviewRating::Good);
        assert_eq!(session.score(), 1);
    }

    #[test]
    fn test_feedback_exposes_explanation() {
        let mut session = ReviewSession::interleaved(vec![item("q1", 4)], Recorder::default());
        let feedback = session.select_option(2).unwrap();
        assert_eq!(feedback.correct_option_index, 0);
        assert_eq!(feedback.explanation, "Explanation 4");
        assert_eq!(
            session.state(),
            SessionState::Answered { selected: 2, correct: false }
        );
    }

    #[test]
    fn test_sync_failure_does_not_stop_session() {
        let recorder = Recorder {
            fail_updates: true,
            ..Recorder::default()
        };
        let mut session = ReviewSession::interleaved(vec![item("q1", 0), item("q2", 1)], recorder);

        answer_right(&mut session, ReviewRating::Good);
        assert!(session.last_sync_error().is_some());
        assert_eq!(queue_names(&session), vec!["q2"]);

        session.clear_sync_error();
        assert!(session.last_sync_error().is_none());
    }

    #[test]
    fn test_quiz_walks_list_without_scheduling() {
        let mut session = ReviewSession::quiz(vec![question(0), question(1)], Recorder::default());
        assert_eq!(session.mode(), SessionMode::Quiz);
        assert!(session.current_item().is_none());

        session.select_option(0).unwrap();
        assert_eq!(session.rate(ReviewRating::Good), Err(SessionError::RatingNotExpected));
        session.advance().unwrap();
        assert_eq!(session.current_question().unwrap().association_index, 1);

        session.select_option(1).unwrap();
        session.advance().unwrap();

        assert!(session.is_complete());
        assert_eq!(session.score(), 1);
        assert_eq!(session.select_option(0), Err(SessionError::SessionComplete));
        let recorder = session.into_collaborator();
        assert!(recorder.updates.is_empty());
        assert_eq!(recorder.highlights, vec![Some(0), Some(1), None]);
    }

    #[test]
    fn test_empty_quiz_is_complete() {
        let session = ReviewSession::quiz(Vec::new(), Recorder::default());
        assert!(session.is_complete());
        assert_eq!(session.remaining(), 0);
    }
}
