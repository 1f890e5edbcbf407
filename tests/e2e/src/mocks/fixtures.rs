//! Test Data Factory
//!
//! Provides utilities for generating realistic review data:
//! - Items with imported schedules
//! - Learner histories driven through a fixed rating sequence
//! - A fixed clock so intervals land on exact dates

use chrono::{DateTime, Duration, TimeZone, Utc};
use cadence_core::{NewReviewItem, ReviewOutcome, Storage};

/// Factory for creating test data
///
/// # Example
///
/// ```rust,ignore
/// let history = TestDataFactory::replay(&storage, "learner", &[5, 5, 4, 1]);
/// assert_eq!(history.last().item.interval, 1);
/// ```
pub struct TestDataFactory;

/// Outcomes of a replayed sequence of reviews for one item
#[derive(Debug, Clone)]
pub struct LearnerHistory {
    pub item_id: String,
    pub outcomes: Vec<ReviewOutcome>,
}

impl LearnerHistory {
    /// Outcome of the final review
    pub fn last(&self) -> &ReviewOutcome {
        self.outcomes.last().expect("history has no reviews")
    }

    /// Intervals in review order
    pub fn intervals(&self) -> Vec<i32> {
        self.outcomes.iter().map(|o| o.item.interval).collect()
    }
}

impl TestDataFactory {
    /// Fixed start instant for deterministic schedules
    pub fn epoch() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 1, 5, 9, 0, 0).unwrap()
    }

    /// Item input with a recognisable prompt
    pub fn vocabulary_card(word: &str) -> NewReviewItem {
        NewReviewItem::new(Some("vocabulary".to_string()), word)
    }

    /// Seed one item and review it with each rating in turn
    ///
    /// Every review happens exactly when the previous one scheduled it.
    pub fn replay(storage: &Storage, user_id: &str, ratings: &[i32]) -> LearnerHistory {
        let item = storage
            .create_item(Self::vocabulary_card("el perro"))
            .expect("Failed to seed item");

        let mut now = Self::epoch();
        let mut outcomes = Vec::with_capacity(ratings.len());
        for &rating in ratings {
            let outcome = storage
                .record_review_at(user_id, &item.id, rating, now)
                .expect("Review failed");
            now = outcome.next_review;
            outcomes.push(outcome);
        }

        LearnerHistory {
            item_id: item.id,
            outcomes,
        }
    }

    /// Seed items and review each once at staggered days
    pub fn staggered_deck(storage: &Storage, count: usize) -> Vec<String> {
        (0..count)
            .map(|i| {
                let item = storage
                    .create_item(Self::vocabulary_card(&format!("word-{}", i)))
                    .expect("Failed to seed item");
                let when = Self::epoch() + Duration::days(i as i64);
                storage
                    .record_review_at("deck-builder", &item.id, 4, when)
                    .expect("Review failed");
                item.id
            })
            .collect()
    }
}
