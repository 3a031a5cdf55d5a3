//! Recall quality on the SM-2 0-5 scale and the subset offered to the learner.
//!
//! - 0-2: failure (the item is relearned)
//! - 3: correct with serious difficulty
//! - 4: correct after hesitation
//! - 5: perfect recall
//!
//! The review screen only ever produces 0, 3, 4 or 5 (see [`ReviewRating`]).
use crate::error::InvalidQuality;
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Quality(u8);

impl Quality {
    pub const MAX: u8 = 5;
    pub const AGAIN: Quality = Quality(0);
    pub const HARD: Quality = Quality(3);
    pub const GOOD: Quality = Quality(4);
    pub const EASY: Quality = Quality(5);

    pub fn new(value: u8) -> Result<Self, InvalidQuality> {
        if value > Self::MAX {
            return Err(InvalidQuality(value));
        }
        Ok(Self(value))
    }

    pub fn value(self) -> u8 {
        self.0
    }

    pub fn is_success(self) -> bool {
        self.0 >= 3
    }
}

impl TryFrom<u8> for Quality {
    type Error = InvalidQuality;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Quality::new(value)
    }
}

impl From<Quality> for u8 {
    fn from(quality: Quality) -> Self {
        quality.0
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Ratings the learner can give on the review screen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ReviewRating {
    Again,
    Hard,
    Good,
    Easy,
}

impl ReviewRating {
    pub const ALL: [ReviewRating; 4] = [Self::Again, Self::Hard, Self::Good, Self::Easy];
    /// Choices offered after a correct answer.
    pub const SUCCESS: [ReviewRating; 3] = [Self::Hard, Self::Good, Self::Easy];

    pub fn quality(self) -> Quality {
        match self {
            Self::Again => Quality::AGAIN,
            Self::Hard => Quality::HARD,
            Self::Good => Quality::GOOD,
            Self::Easy => Quality::EASY,
        }
    }

    pub fn from_quality(quality: Quality) -> Option<Self> {
        Self::ALL.into_iter().find(|rating| rating.quality() == quality)
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Again => "Again",
            Self::Hard => "Hard",
            Self::Good => "Good",
            Self::Easy => "Easy",
        }
    }
}
