use super::srs::MIN_EASE_FACTOR;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Spaced-repetition state of a single association.
///
/// Field names on the wire are kept short (`n`, `ef`, `i`) so stories exported
/// by the web client load unchanged; timestamps are epoch milliseconds.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "StoredSchedule")]
pub struct ScheduleState {
    #[serde(rename = "n")]
    pub repetition_count: u32,
    #[serde(rename = "ef")]
    pub ease_factor: f64,
    #[serde(rename = "i")]
    pub interval_days: u32,
    #[serde(rename = "lastReview", with = "chrono::serde::ts_milliseconds")]
    pub last_reviewed_at: DateTime<Utc>,
    #[serde(rename = "nextReview", with = "chrono::serde::ts_milliseconds")]
    pub next_due_at: DateTime<Utc>,
}

/// Schedule as found in an imported file, before the ease factor is checked.
#[derive(Deserialize)]
struct StoredSchedule {
    n: u32,
    ef: f64,
    i: u32,
    #[serde(rename = "lastReview", with = "chrono::serde::ts_milliseconds")]
    last_review: DateTime<Utc>,
    #[serde(rename = "nextReview", with = "chrono::serde::ts_milliseconds")]
    next_review: DateTime<Utc>,
}

impl TryFrom<StoredSchedule> for ScheduleState {
    type Error = String;

    /// Ease factors below the SM-2 floor are raised to it; non-finite ones are rejected.
    fn try_from(raw: StoredSchedule) -> Result<Self, Self::Error> {
        if !raw.ef.is_finite() {
            return Err(format!("ease factor must be a finite number, got {}", raw.ef));
        }

        Ok(Self {
            repetition_count: raw.n,
            ease_factor: raw.ef.max(MIN_EASE_FACTOR),
            interval_days: raw.i,
            last_reviewed_at: raw.last_review,
            next_due_at: raw.next_review,
        })
    }
}
