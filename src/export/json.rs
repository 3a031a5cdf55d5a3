//! JSON import/export of story bundles.
//! A bundle is one saved story together with its quiz questions, so a story
//! produced by the generator can be moved between libraries in one file.

use crate::error::Result;
use crate::models::{QuizQuestion, SavedStory};
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tracing::info;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct StoryBundle {
    pub story: SavedStory,
    #[serde(default)]
    pub quiz: Vec<QuizQuestion>,
}

/// Exports a bundle to a JSON file at the specified path.
pub fn export_story_to_path(bundle: &StoryBundle, path: &Path) -> Result<()> {
    let json_string = serde_json::to_string_pretty(bundle)?;
    let mut file = File::create(path)?;
    file.write_all(json_string.as_bytes())?;
    info!(story_id = %bundle.story.id, path = %path.display(), "story exported");
    Ok(())
}

/// Imports a bundle from a JSON file.
/// Fails if the file doesn't exist or doesn't hold a valid bundle.
pub fn import_story(path: &Path) -> Result<StoryBundle> {
    let mut file = File::open(path)?;
    let mut contents = String::new();
    file.read_to_string(&mut contents)?;

    let bundle: StoryBundle = serde_json::from_str(&contents)?;

    info!(story_id = %bundle.story.id, questions = bundle.quiz.len(), "story imported");
    Ok(bundle)
}
