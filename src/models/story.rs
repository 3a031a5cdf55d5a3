//! A saved mnemonic story: a narrative whose characters stand for medical terms.
use super::ScheduleState;
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Shape {
    Rect,
    Ellipse,
}

impl Shape {
    pub fn as_str(self) -> &'static str {
        match self {
            Shape::Rect => "rect",
            Shape::Ellipse => "ellipse",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "rect" => Some(Shape::Rect),
            "ellipse" => Some(Shape::Ellipse),
            _ => None,
        }
    }
}

/// One learnable item: a term, the character that represents it and its review state.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MnemonicAssociation {
    pub medical_term: String,
    pub character: String,
    pub explanation: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bounding_box: Option<[f64; 4]>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub shape: Option<Shape>,
    #[serde(default)]
    pub srs: Option<ScheduleState>,
}

impl MnemonicAssociation {
    pub fn new(medical_term: &str, character: &str, explanation: &str) -> Self {
        Self {
            medical_term: medical_term.to_string(),
            character: character.to_string(),
            explanation: explanation.to_string(),
            bounding_box: None,
            shape: None,
            srs: None,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedStory {
    pub id: String,
    pub topic: String,
    #[serde(default)]
    pub facts: Vec<String>,
    pub story: String,
    pub associations: Vec<MnemonicAssociation>,
    #[serde(default)]
    pub visual_prompt: String,
    /// Epoch milliseconds.
    pub created_at: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_data: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_association_without_schedule() {
        let assoc = MnemonicAssociation::new("Bradycardia", "The snail", "Slow heart");
        assert_eq!(assoc.medical_term, "Bradycardia");
        assert!(assoc.srs.is_none());
    }

    #[test]
    fn test_story_reads_web_client_format() {
        let json = r#"{
            "id": "s1",
            "topic": "Cardiology",
            "facts": ["Normal resting rate is 60-100 bpm"],
            "story": "A snail and a drummer meet at the lighthouse.",
            "associations": [
                {
                    "medicalTerm": "Bradycardia",
                    "character": "The snail",
                    "explanation": "Slow heart rate",
                    "boundingBox": [0.1, 0.2, 0.3, 0.4],
                    "shape": "ellipse",
                    "srs": {"n": 2, "ef": 2.6, "i": 6, "lastReview": 1700000000000, "nextReview": 1700518400000}
                }
            ],
            "visualPrompt": "watercolor lighthouse",
            "createdAt": 1700000000000
        }"#;

        let story: SavedStory = serde_json::from_str(json).unwrap();
        let assoc = &story.associations[0];
        assert_eq!(assoc.shape, Some(Shape::Ellipse));
        let srs = assoc.srs.as_ref().unwrap();
        assert_eq!(srs.repetition_count, 2);
        assert_eq!(srs.interval_days, 6);
        assert_eq!(srs.next_due_at.timestamp_millis(), 1_700_518_400_000);
        assert!(story.image_data.is_none());
    }

    #[test]
    fn test_shape_names() {
        assert_eq!(Shape::parse(Shape::Rect.as_str()), Some(Shape::Rect));
        assert_eq!(Shape::parse("circle"), None);
    }
}
