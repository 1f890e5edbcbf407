//! Memory module - Core types and data structures
//!
//! Implements the review model with:
//! - Review items carrying SM-2 scheduling state
//! - Append-only study session log
//! - Aggregate review statistics

mod item;
mod session;

pub use item::{NewReviewItem, ReviewItem, ReviewStats};
pub use session::{StudySession, SESSION_TYPE_REVIEW};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sm2::MemoryState;

// ============================================================================
// REVIEW OUTCOME
// ============================================================================

/// Everything a single committed review produced
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewOutcome {
    /// Item as persisted after the review
    pub item: ReviewItem,
    /// Schedule before the review was applied
    pub previous: MemoryState,
    /// Log entry appended for this review
    pub session: StudySession,
    pub next_review: DateTime<Utc>,
}

impl ReviewOutcome {
    /// Whether this review reset the repetition streak
    pub fn was_lapse(&self) -> bool {
        self.item.repetitions == 0
    }

    /// Change in easiness caused by this review
    pub fn easiness_delta(&self) -> f64 {
        self.item.easiness_factor - self.previous.easiness
    }
}
