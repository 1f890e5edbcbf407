//! SM-2 Scheduler
//!
//! Wraps the pure formulas with quality-policy handling and next-review
//! timestamp derivation.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::{Deserialize, Serialize};

use super::algorithm::{
    compute_next_state, DEFAULT_EASINESS, DEFAULT_INTERVAL, MAX_QUALITY, MIN_QUALITY,
};
use super::quality::{QualityError, QualityPolicy};

/// Latest calendar year a next-review timestamp may land in.
/// RFC 3339 only allows four-digit years.
const MAX_SCHEDULE_YEAR: i32 = 9999;

// ============================================================================
// STATE
// ============================================================================

/// Per-item memory-strength state
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MemoryState {
    /// Retrieval-difficulty multiplier, never below 1.3
    pub easiness: f64,
    /// Days until the next review, at least 1
    pub interval: i32,
    /// Consecutive successful recalls
    pub repetitions: i32,
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
}

impl Default for MemoryState {
    fn default() -> Self {
        Self {
            easiness: DEFAULT_EASINESS,
            interval: DEFAULT_INTERVAL,
            repetitions: 0,
            last_reviewed: None,
            next_review: None,
        }
    }
}

impl MemoryState {
    /// Build a state from stored columns, filling defaults for missing values
    pub fn from_stored(
        easiness: Option<f64>,
        interval: Option<i32>,
        repetitions: Option<i32>,
    ) -> Self {
        Self {
            easiness: easiness.unwrap_or(DEFAULT_EASINESS),
            interval: interval.unwrap_or(DEFAULT_INTERVAL),
            repetitions: repetitions.unwrap_or(0),
            ..Default::default()
        }
    }

    /// Whether the item is due at `now`. Never-reviewed items are always due.
    pub fn is_due(&self, now: DateTime<Utc>) -> bool {
        self.next_review.is_none_or(|due| due <= now)
    }
}

// ============================================================================
// RESULTS
// ============================================================================

/// Scheduling failure
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ScheduleError {
    #[error(transparent)]
    Quality(#[from] QualityError),
    /// Next review would land outside the representable calendar
    #[error("interval of {0} days overflows the calendar")]
    IntervalOverflow(i32),
}

/// Outcome of a single review
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewResult {
    /// State to persist
    pub state: MemoryState,
    /// Quality actually fed to the formulas (after policy)
    pub effective_quality: i32,
    pub interval: i32,
    pub next_review: DateTime<Utc>,
}

/// Outcome of one hypothetical rating in a preview
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewOutcome {
    pub quality: i32,
    pub easiness: f64,
    pub interval: i32,
    pub repetitions: i32,
    pub next_review: DateTime<Utc>,
}

/// What every rating on the 0-5 scale would do to an item
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PreviewResults {
    pub outcomes: Vec<PreviewOutcome>,
}

impl PreviewResults {
    /// Outcome for a particular rating
    pub fn for_quality(&self, quality: i32) -> Option<&PreviewOutcome> {
        self.outcomes.iter().find(|o| o.quality == quality)
    }
}

// ============================================================================
// SCHEDULER
// ============================================================================

/// SM-2 scheduler with a configured quality policy
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Sm2Scheduler {
    policy: QualityPolicy,
}

impl Sm2Scheduler {
    pub fn new(policy: QualityPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> QualityPolicy {
        self.policy
    }

    /// Review an item at `now`
    pub fn review(
        &self,
        state: &MemoryState,
        quality: i32,
        now: DateTime<Utc>,
    ) -> Result<ReviewResult, ScheduleError> {
        let effective_quality = self.policy.apply(quality)?;
        let (easiness, interval, repetitions) = compute_next_state(
            state.easiness,
            state.interval,
            state.repetitions,
            effective_quality,
        );
        let next_review = next_review_after(now, interval)?;

        Ok(ReviewResult {
            state: MemoryState {
                easiness,
                interval,
                repetitions,
                last_reviewed: Some(now),
                next_review: Some(next_review),
            },
            effective_quality,
            interval,
            next_review,
        })
    }

    /// Preview every rating on the 0-5 scale without committing anything
    pub fn preview_reviews(
        &self,
        state: &MemoryState,
        now: DateTime<Utc>,
    ) -> Result<PreviewResults, ScheduleError> {
        let outcomes = (MIN_QUALITY..=MAX_QUALITY)
            .map(|quality| {
                let (easiness, interval, repetitions) =
                    compute_next_state(state.easiness, state.interval, state.repetitions, quality);
                Ok(PreviewOutcome {
                    quality,
                    easiness,
                    interval,
                    repetitions,
                    next_review: next_review_after(now, interval)?,
                })
            })
            .collect::<Result<Vec<_>, ScheduleError>>()?;

        Ok(PreviewResults { outcomes })
    }
}

/// `now + interval days`, bounded to four-digit years
pub fn next_review_after(now: DateTime<Utc>, interval: i32) -> Result<DateTime<Utc>, ScheduleError> {
    Duration::try_days(i64::from(interval))
        .and_then(|delta| now.checked_add_signed(delta))
        .filter(|due| due.year() <= MAX_SCHEDULE_YEAR)
        .ok_or(ScheduleError::IntervalOverflow(interval))
}

// ============================================================================
// TESTS
// ============================================================================
