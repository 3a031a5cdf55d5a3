//! Builds the Daily Review queue from every association that is currently due.
use super::{DisplayContext, ItemId, QuizQuestion, ReviewQueueItem, SavedStory, srs};
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use tracing::debug;

/// Supplies the quiz question that tests a given association.
pub trait QuestionSource {
    fn question_for(&self, story: &SavedStory, association_index: usize) -> Option<QuizQuestion>;
}

/// Quizzes keyed by story id.
impl QuestionSource for HashMap<String, Vec<QuizQuestion>> {
    fn question_for(&self, story: &SavedStory, association_index: usize) -> Option<QuizQuestion> {
        self.get(&story.id)?
            .iter()
            .find(|q| q.association_index == association_index)
            .cloned()
    }
}

/// One queue item per due association, in story order then association order.
/// Due associations without a question cannot be quizzed and are left out.
pub fn build_review_queue<Q>(
    stories: &[SavedStory],
    questions: &Q,
    now: DateTime<Utc>,
) -> Vec<ReviewQueueItem>
where
    Q: QuestionSource + ?Sized,
{
    let mut queue = Vec::new();

    for story in stories {
        for (index, association) in story.associations.iter().enumerate() {
            if !srs::is_due_at(association.srs.as_ref(), now) {
                continue;
            }

            let Some(question) = questions.question_for(story, index) else {
                debug!(story_id = %story.id, index, "due association has no quiz question");
                continue;
            };

            let context = DisplayContext {
                topic: story.topic.clone(),
                image_data: story.image_data.clone(),
            };
            queue.push(ReviewQueueItem::new(ItemId::new(&story.id, index), context, question));
        }
    }

    queue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{MnemonicAssociation, Quality};
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 6, 1, 7, 0, 0).unwrap()
    }

    fn question(index: usize) -> QuizQuestion {
        QuizQuestion {
            association_index: index,
            question: format!("Question {}", index),
            options: vec!["right".to_string(), "wrong".to_string()],
            correct_option_index: 0,
            explanation: String::new(),
        }
    }

    fn story(id: &str, count: usize) -> SavedStory {
        SavedStory {
            id: id.to_string(),
            topic: "Renal".to_string(),
            facts: Vec::new(),
            story: String::new(),
            associations: (0..count)
                .map(|i| MnemonicAssociation::new(&format!("term {}", i), "c", "e"))
                .collect(),
            visual_prompt: String::new(),
            created_at: 0,
            image_data: Some("img-ref".to_string()),
        }
    }

    #[test]
    fn test_includes_never_reviewed_and_overdue() {
        let mut s = story("s1", 3);
        // reviewed two days ago with a one-day interval: overdue
        let past = now() - Duration::days(2);
        s.associations[0].srs = Some(srs::compute_next_schedule_at(Quality::GOOD, None, past));
        // reviewed just now: due tomorrow
        s.associations[1].srs = Some(srs::compute_next_schedule_at(Quality::GOOD, None, now()));

        let quizzes = HashMap::from([(
            "s1".to_string(),
            vec![question(0), question(1), question(2)],
        )]);
        let queue = build_review_queue(&[s], &quizzes, now());

        let ids: Vec<usize> = queue.iter().map(|i| i.item_id.association_index).collect();
        assert_eq!(ids, vec![0, 2]);
        assert_eq!(queue[0].context.topic, "Renal");
        assert_eq!(queue[0].context.image_data.as_deref(), Some("img-ref"));
        assert!(queue.iter().all(|i| i.relearn_count == 0));
    }

    #[test]
    fn test_skips_items_without_question() {
        let quizzes = HashMap::from([("s1".to_string(), vec![question(1)])]);
        let queue = build_review_queue(&[story("s1", 2), story("s2", 1)], &quizzes, now());

        assert_eq!(queue.len(), 1);
        assert_eq!(queue[0].item_id, ItemId::new("s1", 1));
    }

    #[test]
    fn test_preserves_story_order() {
        let quizzes = HashMap::from([
            ("a".to_string(), vec![question(0)]),
            ("b".to_string(), vec![question(0)]),
        ]);
        let queue = build_review_queue(&[story("b", 1), story("a", 1)], &quizzes, now());
        let stories: Vec<&str> = queue.iter().map(|i| i.item_id.story_id.as_str()).collect();
        assert_eq!(stories, vec!["b", "a"]);
    }
}
