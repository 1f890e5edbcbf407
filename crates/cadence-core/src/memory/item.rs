//! Review Item - the unit being scheduled
//!
//! Each item carries:
//! - Optional lesson grouping and front-side content
//! - SM-2 scheduling state (easiness, interval, repetitions)
//! - Last/next review timestamps and the latest recall rating
//! - A version counter bumped on every applied review

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::sm2::{MemoryState, DEFAULT_EASINESS, DEFAULT_INTERVAL, MIN_EASINESS};

// ============================================================================
// REVIEW ITEM
// ============================================================================

/// A stored review item with its resolved schedule
///
/// Missing schedule columns are resolved to SM-2 defaults on read, so a
/// freshly seeded item looks like easiness 2.5, interval 1, repetitions 0.
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewItem {
    /// Unique identifier
    pub id: String,
    /// Lesson this item belongs to
    pub lesson_id: Option<String>,
    /// Prompt text, if the caller stored one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub content: Option<String>,

    // ========== SM-2 State ==========
    pub easiness_factor: f64,
    pub interval: i32,
    pub repetitions: i32,

    // ========== Scheduling ==========
    pub last_reviewed: Option<DateTime<Utc>>,
    pub next_review: Option<DateTime<Utc>>,
    /// Raw quality of the most recent review, as submitted
    pub recall_rating: Option<i32>,

    // ========== Bookkeeping ==========
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// Number of reviews applied to this row
    pub version: i64,
}

impl ReviewItem {
    /// Scheduling state for the SM-2 scheduler
    pub fn memory_state(&self) -> MemoryState {
        MemoryState {
            easiness: self.easiness_factor,
            interval: self.interval,
            repetitions: self.repetitions,
            last_reviewed: self.last_reviewed,
            next_review: self.next_review,
        }
    }

    /// Check if this item is due at `now`
    pub fn is_due_at(&self, now: DateTime<Utc>) -> bool {
        self.memory_state().is_due(now)
    }

    /// Check if this item is due for review
    pub fn is_due(&self) -> bool {
        self.is_due_at(Utc::now())
    }

    /// Whether the item has ever been reviewed
    pub fn is_new(&self) -> bool {
        self.last_reviewed.is_none()
    }
}

// ============================================================================
// INPUT TYPES
// ============================================================================

/// Input for seeding a review item
///
/// Uses `deny_unknown_fields` to catch misspelt schedule fields.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct NewReviewItem {
    /// Caller-chosen id; a UUID v4 is generated when absent
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub lesson_id: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
    /// Imported easiness; left unset, the default 2.5 applies on read
    #[serde(default)]
    pub easiness_factor: Option<f64>,
    #[serde(default)]
    pub interval: Option<i32>,
    #[serde(default)]
    pub repetitions: Option<i32>,
}

impl NewReviewItem {
    /// Item with only a lesson and prompt
    pub fn new(lesson_id: Option<String>, content: impl Into<String>) -> Self {
        Self {
            lesson_id,
            content: Some(content.into()),
            ..Default::default()
        }
    }

    /// Check imported schedule values against the SM-2 invariants
    pub fn validate(&self) -> Result<(), String> {
        if let Some(id) = &self.id {
            if id.trim().is_empty() {
                return Err("id must not be blank".to_string());
            }
        }
        if let Some(easiness) = self.easiness_factor {
            if !easiness.is_finite() || easiness < MIN_EASINESS {
                return Err(format!(
                    "easinessFactor must be a finite number >= {} (got {})",
                    MIN_EASINESS, easiness
                ));
            }
        }
        if let Some(interval) = self.interval {
            if interval < DEFAULT_INTERVAL {
                return Err(format!("interval must be >= 1 (got {})", interval));
            }
        }
        if let Some(repetitions) = self.repetitions {
            if repetitions < 0 {
                return Err(format!("repetitions must be >= 0 (got {})", repetitions));
            }
        }
        Ok(())
    }
}

// ============================================================================
// STATISTICS
// ============================================================================

/// Review statistics
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewStats {
    /// Total number of review items
    pub total_items: i64,
    /// Items due now (including never-reviewed items)
    pub items_due: i64,
    /// Items that have never been reviewed
    pub never_reviewed: i64,
    /// Session log entries
    pub total_sessions: i64,
    /// Mean easiness across items (defaults applied)
    pub average_easiness: f64,
    /// Most recent review across all items
    pub last_review: Option<DateTime<Utc>>,
}

impl Default for ReviewStats {
    fn default() -> Self {
        Self {
            total_items: 0,
            items_due: 0,
            never_reviewed: 0,
            total_sessions: 0,
            average_easiness: DEFAULT_EASINESS,
            last_review: None,
        }
    }
}
