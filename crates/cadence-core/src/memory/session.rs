//! Study session log
//!
//! Append-only record of review events. Rows are written once, in the same
//! transaction as the schedule update, and never modified afterwards.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Type tag written for every SM-2 review
pub const SESSION_TYPE_REVIEW: &str = "review";

/// One logged review event
#[non_exhaustive]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StudySession {
    pub id: String,
    /// Learner who performed the review
    pub user_id: String,
    /// Lesson copied from the item at review time
    pub lesson_id: Option<String>,
    /// Reviewed item
    pub review_id: String,
    /// Seconds spent; not tracked, always 0
    pub duration: i64,
    pub date: DateTime<Utc>,
    #[serde(rename = "type")]
    pub session_type: String,
    /// Raw rating as submitted
    pub recall_rating: i32,
}

impl StudySession {
    pub fn is_review(&self) -> bool {
        self.session_type == SESSION_TYPE_REVIEW
    }
}
