//! SM-2 (SuperMemo 2) scheduling for mnemonic associations.
//!
//! - Quality 0-2: the repetition streak resets and the item comes back tomorrow
//! - Quality 3-5: the interval grows 1 day → 6 days → previous interval × EF
//! - EF is adjusted after every rating (success or failure) and never drops below 1.3
//!
//! Everything here is pure; persisting the result is up to the caller.

use super::{Quality, ReviewRating, ScheduleState};
use chrono::{DateTime, Duration, SubsecRound, Utc};

pub const DEFAULT_EASE_FACTOR: f64 = 2.5;
pub const MIN_EASE_FACTOR: f64 = 1.3;
pub const MS_PER_DAY: i64 = 86_400_000;

const FIRST_INTERVAL_DAYS: u32 = 1;
const SECOND_INTERVAL_DAYS: u32 = 6;
const RELEARN_INTERVAL_DAYS: u32 = 1;

/// Returns true when the item should be reviewed now. Never-reviewed items are always due.
pub fn is_due(schedule: Option<&ScheduleState>) -> bool {
    is_due_at(schedule, Utc::now())
}

pub fn is_due_at(schedule: Option<&ScheduleState>, now: DateTime<Utc>) -> bool {
    match schedule {
        None => true,
        Some(state) => now >= state.next_due_at,
    }
}

/// Computes the schedule that follows a rating, stamped with the current time.
pub fn compute_next_schedule(quality: Quality, prior: Option<&ScheduleState>) -> ScheduleState {
    compute_next_schedule_at(quality, prior, Utc::now())
}

/// Computes the schedule that follows a rating given at `now`.
/// A missing prior state behaves like `{n: 0, ef: 2.5, i: 0}`.
pub fn compute_next_schedule_at(
    quality: Quality,
    prior: Option<&ScheduleState>,
    now: DateTime<Utc>,
) -> ScheduleState {
    let (repetition_count, interval_days) = next_interval(quality, prior);
    let ease_factor = next_ease_factor(quality, prior_ease(prior));

    let last_reviewed_at = now.trunc_subsecs(3);
    let delta = Duration::milliseconds(i64::from(interval_days) * MS_PER_DAY);
    let next_due_at = last_reviewed_at
        .checked_add_signed(delta)
        .unwrap_or(DateTime::<Utc>::MAX_UTC);

    ScheduleState {
        repetition_count,
        ease_factor,
        interval_days,
        last_reviewed_at,
        next_due_at,
    }
}

/// Interval in days each rating would produce, for labelling rating buttons.
pub fn preview_intervals(prior: Option<&ScheduleState>) -> [(ReviewRating, u32); 4] {
    ReviewRating::ALL.map(|rating| (rating, next_interval(rating.quality(), prior).1))
}

/// Returns `(repetition_count, interval_days)` after the rating.
fn next_interval(quality: Quality, prior: Option<&ScheduleState>) -> (u32, u32) {
    if !quality.is_success() {
        return (0, RELEARN_INTERVAL_DAYS);
    }

    let (repetitions, interval) = prior
        .map(|s| (s.repetition_count, s.interval_days))
        .unwrap_or((0, 0));

    let new_interval = match repetitions {
        0 => FIRST_INTERVAL_DAYS,
        1 => SECOND_INTERVAL_DAYS,
        // float-to-int casts saturate, so runaway intervals stop at u32::MAX
        _ => ((f64::from(interval) * prior_ease(prior)).round() as u32).max(FIRST_INTERVAL_DAYS),
    };
    (repetitions.saturating_add(1), new_interval)
}

/// Prior ease factor, raised to the floor if stored state is below it.
fn prior_ease(prior: Option<&ScheduleState>) -> f64 {
    prior.map_or(DEFAULT_EASE_FACTOR, |s| s.ease_factor.max(MIN_EASE_FACTOR))
}

/// EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at 1.3
fn next_ease_factor(quality: Quality, ease: f64) -> f64 {
    let miss = f64::from(Quality::MAX - quality.value());
    let updated = ease + (0.1 - miss * (0.08 + miss * 0.02));
    updated.max(MIN_EASE_FACTOR)
}
