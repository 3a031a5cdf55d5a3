//! Container for all saved stories, with the due counts shown on the library screen.
use super::review_session::ReviewCollaborator;
use super::{ItemId, Quality, SavedStory, ScheduleState, srs};
use crate::error::{AppError, Result};
use chrono::{DateTime, Utc};

#[derive(Clone, Debug, Default)]
pub struct StoryLibrary {
    pub stories: Vec<SavedStory>,
}

impl StoryLibrary {
    pub fn new(stories: Vec<SavedStory>) -> Self {
        Self { stories }
    }

    pub fn find(&self, story_id: &str) -> Option<&SavedStory> {
        self.stories.iter().find(|s| s.id == story_id)
    }

    pub fn find_mut(&mut self, story_id: &str) -> Option<&mut SavedStory> {
        self.stories.iter_mut().find(|s| s.id == story_id)
    }

    pub fn remove(&mut self, story_id: &str) -> Option<SavedStory> {
        let pos = self.stories.iter().position(|s| s.id == story_id)?;
        Some(self.stories.remove(pos))
    }

    /// Number of associations due across every story.
    pub fn due_count(&self, now: DateTime<Utc>) -> usize {
        self.stories
            .iter()
            .map(|story| due_count_for_story(story, now))
            .sum()
    }

    /// Applies a rating to one association in memory and returns its new schedule.
    pub fn record_review_at(
        &mut self,
        item_id: &ItemId,
        quality: Quality,
        now: DateTime<Utc>,
    ) -> Result<ScheduleState> {
        let story = self
            .find_mut(&item_id.story_id)
            .ok_or_else(|| AppError::StoryNotFound(item_id.story_id.clone()))?;

        let association = story
            .associations
            .get_mut(item_id.association_index)
            .ok_or_else(|| AppError::AssociationOutOfRange {
                story_id: item_id.story_id.clone(),
                index: item_id.association_index,
            })?;

        let next = srs::compute_next_schedule_at(quality, association.srs.as_ref(), now);
        association.srs = Some(next.clone());
        Ok(next)
    }
}

pub fn due_count_for_story(story: &SavedStory, now: DateTime<Utc>) -> usize {
    story
        .associations
        .iter()
        .filter(|a| srs::is_due_at(a.srs.as_ref(), now))
        .count()
}

impl ReviewCollaborator for StoryLibrary {
    fn update_schedule(&mut self, item_id: &ItemId, quality: Quality) -> Result<()> {
        self.record_review_at(item_id, quality, Utc::now()).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::MnemonicAssociation;
    use chrono::{Duration, TimeZone};

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 5, 10, 8, 0, 0).unwrap()
    }

    fn story(id: &str, terms: &[&str]) -> SavedStory {
        SavedStory {
            id: id.to_string(),
            topic: format!("Topic {}", id),
            facts: Vec::new(),
            story: String::new(),
            associations: terms
                .iter()
                .map(|t| MnemonicAssociation::new(t, "character", "explanation"))
                .collect(),
            visual_prompt: String::new(),
            created_at: 0,
            image_data: None,
        }
    }

    #[test]
    fn test_due_count_skips_future_items() {
        let mut library = StoryLibrary::new(vec![story("a", &["x", "y"]), story("b", &["z"])]);
        assert_eq!(library.due_count(now()), 3);

        library
            .record_review_at(&ItemId::new("a", 1), Quality::GOOD, now())
            .unwrap();
        assert_eq!(library.due_count(now()), 2);
        assert_eq!(due_count_for_story(&library.stories[0], now()), 1);

        // one day later the first-interval item is due again
        assert_eq!(library.due_count(now() + Duration::days(1)), 3);
    }

    #[test]
    fn test_record_review_updates_association() {
        let mut library = StoryLibrary::new(vec![story("a", &["x"])]);
        let next = library
            .record_review_at(&ItemId::new("a", 0), Quality::EASY, now())
            .unwrap();

        assert_eq!(next.repetition_count, 1);
        assert_eq!(library.stories[0].associations[0].srs, Some(next));
    }

    #[test]
    fn test_record_review_errors() {
        let mut library = StoryLibrary::new(vec![story("a", &["x"])]);

        let missing = library.record_review_at(&ItemId::new("nope", 0), Quality::GOOD, now());
        assert!(matches!(missing, Err(AppError::StoryNotFound(_))));

        let out_of_range = library.record_review_at(&ItemId::new("a", 4), Quality::GOOD, now());
        assert!(matches!(
            out_of_range,
            Err(AppError::AssociationOutOfRange { index: 4, .. })
        ));
    }

    #[test]
    fn test_remove_story() {
        let mut library = StoryLibrary::new(vec![story("a", &["x"]), story("b", &[])]);
        assert!(library.remove("a").is_some());
        assert!(library.remove("a").is_none());
        assert_eq!(library.stories.len(), 1);
    }
}
