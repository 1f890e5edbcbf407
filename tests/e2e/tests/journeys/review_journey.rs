//! # Review Journey Tests
//!
//! A learner seeds cards, reviews them over weeks, lapses, recovers, and
//! the schedule plus session log stay consistent throughout.

use cadence_core::{QualityPolicy, StorageError};
use cadence_e2e_tests::{TestDataFactory, TestDatabaseManager};
use chrono::Duration;

fn approx_eq(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

// ============================================================================
// FULL LEARNING CYCLE
// ============================================================================

#[test]
fn test_learn_lapse_recover() {
    let db = TestDatabaseManager::new_temp();
    let history = TestDataFactory::replay(&db.storage, "learner", &[5, 5, 4, 1, 3]);

    assert_eq!(history.intervals(), vec![1, 6, 16, 1, 1]);

    let easiness: Vec<f64> = history.outcomes.iter().map(|o| o.item.easiness_factor).collect();
    assert!(approx_eq(easiness[0], 2.6));
    assert!(approx_eq(easiness[1], 2.7));
    assert!(approx_eq(easiness[2], 2.7));
    assert!(approx_eq(easiness[3], 2.16));
    assert!(approx_eq(easiness[4], 2.02));

    assert!(history.outcomes[3].was_lapse());
    assert_eq!(history.last().item.repetitions, 1);
    assert_eq!(history.last().item.version, 5);
}

#[test]
fn test_next_review_follows_interval() {
    let db = TestDatabaseManager::new_temp();
    let history = TestDataFactory::replay(&db.storage, "learner", &[4, 4, 4]);

    let start = TestDataFactory::epoch();
    assert_eq!(history.outcomes[0].next_review, start + Duration::days(1));
    assert_eq!(history.outcomes[1].next_review, start + Duration::days(7));
    // round(6 * 2.5) = 15
    assert_eq!(history.outcomes[2].next_review, start + Duration::days(22));
}

#[test]
fn test_session_log_matches_reviews() {
    let db = TestDatabaseManager::new_temp();
    let history = TestDataFactory::replay(&db.storage, "learner", &[5, 2, 4]);

    let sessions = db.storage.get_sessions_for_item(&history.item_id, 10).unwrap();
    assert_eq!(sessions.len(), 3);

    // Newest first
    let ratings: Vec<i32> = sessions.iter().map(|s| s.recall_rating).collect();
    assert_eq!(ratings, vec![4, 2, 5]);
    for (session, outcome) in sessions.iter().rev().zip(&history.outcomes) {
        assert_eq!(session.id, outcome.session.id);
        assert_eq!(session.date, outcome.item.last_reviewed.unwrap());
        assert_eq!(session.lesson_id.as_deref(), Some("vocabulary"));
        assert_eq!(session.duration, 0);
        assert!(session.is_review());
    }
}

// ============================================================================
// IMPORTED SCHEDULES
// ============================================================================

#[test]
fn test_imported_lapse_scenario() {
    let db = TestDatabaseManager::new_temp();
    let id = db.seed_imported(2.5, 6, 2);

    let outcome = db.storage.record_review("learner", &id, 1).unwrap();
    assert_eq!(outcome.item.interval, 1);
    assert_eq!(outcome.item.repetitions, 0);
    assert!(approx_eq(outcome.item.easiness_factor, 1.96));
}

#[test]
fn test_easiness_floor_scenario() {
    let db = TestDatabaseManager::new_temp();
    let id = db.seed_imported(1.3, 10, 3);

    let outcome = db.storage.record_review("learner", &id, 0).unwrap();
    assert_eq!(outcome.item.easiness_factor, 1.3);
    assert_eq!(outcome.item.interval, 1);
}

// ============================================================================
// QUEUE AND PERSISTENCE
// ============================================================================

#[test]
fn test_queue_drains_as_cards_are_reviewed() {
    let db = TestDatabaseManager::new_temp();
    let ids = db.seed_items(4);
    assert_eq!(db.storage.get_review_queue(10).unwrap().len(), 4);

    for id in &ids[..3] {
        db.storage.record_review("learner", id, 4).unwrap();
    }

    let queue = db.storage.get_review_queue(10).unwrap();
    assert_eq!(queue.len(), 1);
    assert_eq!(queue[0].id, ids[3]);
}

#[test]
fn test_staggered_deck_comes_due_in_order() {
    let db = TestDatabaseManager::new_temp();
    let ids = TestDataFactory::staggered_deck(&db.storage, 3);

    let at = TestDataFactory::epoch() + Duration::days(2);
    let queue = db.storage.get_review_queue_at(10, at).unwrap();
    let due: Vec<&str> = queue.iter().map(|i| i.id.as_str()).collect();
    assert_eq!(due, vec![ids[0].as_str(), ids[1].as_str()]);
}

#[test]
fn test_state_survives_reopen() {
    let db = TestDatabaseManager::new_temp();
    let history = TestDataFactory::replay(&db.storage, "learner", &[5, 5]);

    let db = db.reopen();
    let item = db.storage.get_item(&history.item_id).unwrap().unwrap();
    assert_eq!(item.interval, 6);
    assert_eq!(item.repetitions, 2);
    assert_eq!(item.version, 2);
    assert_eq!(db.session_count(), 2);
}

#[test]
fn test_backup_restores_history() {
    let db = TestDatabaseManager::new_temp();
    let history = TestDataFactory::replay(&db.storage, "learner", &[4, 3]);

    let backup_path = db.path().with_file_name("backup.db");
    db.storage.backup_to(&backup_path).unwrap();

    let restored = TestDatabaseManager::new_at_path(backup_path);
    assert_eq!(restored.item_count(), 1);
    assert_eq!(
        restored
            .storage
            .get_sessions_for_user("learner", 10)
            .unwrap()
            .len(),
        2
    );
    assert!(restored.storage.get_item(&history.item_id).unwrap().is_some());
}

// ============================================================================
// BOUNDARY BEHAVIOUR
// ============================================================================

#[test]
fn test_unknown_item_leaves_no_trace() {
    let db = TestDatabaseManager::new_temp();
    let err = db.storage.record_review("learner", "ghost", 4).unwrap_err();
    assert!(matches!(err, StorageError::NotFound(_)));
    assert!(db.is_empty());
    assert_eq!(db.session_count(), 0);
}

#[test]
fn test_policies_differ_on_out_of_range() {
    let strict = TestDatabaseManager::new_temp();
    let id = strict.seed_items(1).remove(0);
    assert!(matches!(
        strict.storage.record_review("learner", &id, -1),
        Err(StorageError::Quality(_))
    ));

    let clamping = TestDatabaseManager::new_temp_with_policy(QualityPolicy::Clamp);
    let id = clamping.seed_items(1).remove(0);
    let outcome = clamping.storage.record_review("learner", &id, -1).unwrap();
    // Clamped to 0: a lapse, raw rating still logged
    assert!(outcome.was_lapse());
    assert_eq!(outcome.session.recall_rating, -1);
    assert!(approx_eq(outcome.item.easiness_factor, 1.7));
}
