//! # Concurrency Tests
//!
//! Many threads reviewing through one shared `Storage` must never lose an
//! update or leave a schedule change without its session row.

use std::sync::Arc;
use std::thread;

use cadence_core::{NewReviewItem, Storage};
use cadence_e2e_tests::TestDatabaseManager;

#[test]
fn test_same_item_reviews_are_serialized() {
    let db = TestDatabaseManager::new_temp();
    let path = db.path().clone();
    let item_id = db.seed_items(1).remove(0);
    let storage = Arc::new(db.storage);

    const THREADS: usize = 12;
    let handles: Vec<_> = (0..THREADS)
        .map(|i| {
            let storage = Arc::clone(&storage);
            let item_id = item_id.clone();
            thread::spawn(move || {
                storage
                    .record_review(&format!("learner-{}", i), &item_id, 4)
                    .map(|o| o.item.version)
            })
        })
        .collect();

    let mut versions: Vec<i64> = handles
        .into_iter()
        .map(|h| h.join().unwrap().unwrap())
        .collect();
    versions.sort_unstable();
    // Each review observed a distinct predecessor
    assert_eq!(versions, (1..=THREADS as i64).collect::<Vec<_>>());

    let item = storage.get_item(&item_id).unwrap().unwrap();
    assert_eq!(item.repetitions, THREADS as i32);
    assert_eq!(item.version, THREADS as i64);
    assert_eq!(
        storage.get_sessions_for_item(&item_id, 100).unwrap().len(),
        THREADS
    );
    assert!(path.exists());
}

#[test]
fn test_two_handles_on_one_file() {
    let db = TestDatabaseManager::new_temp();
    let item_id = db.seed_items(1).remove(0);
    let second = Arc::new(Storage::new(Some(db.path().clone())).unwrap());
    let first = Arc::new(db.storage);

    let handles: Vec<_> = (0..10)
        .map(|i| {
            let storage = if i % 2 == 0 {
                Arc::clone(&first)
            } else {
                Arc::clone(&second)
            };
            let item_id = item_id.clone();
            thread::spawn(move || storage.record_review("learner", &item_id, 5))
        })
        .collect();

    for handle in handles {
        handle.join().unwrap().unwrap();
    }

    let item = first.get_item(&item_id).unwrap().unwrap();
    assert_eq!(item.repetitions, 10);
    assert_eq!(item.version, 10);
    assert_eq!(first.get_stats().unwrap().total_sessions, 10);
}

#[test]
fn test_independent_items_in_parallel() {
    let db = TestDatabaseManager::new_temp();
    let storage = Arc::new(db.storage);

    let handles: Vec<_> = (0..8)
        .map(|i| {
            let storage = Arc::clone(&storage);
            thread::spawn(move || {
                let item = storage
                    .create_item(NewReviewItem::new(None, format!("card {}", i)))
                    .unwrap();
                for _ in 0..3 {
                    storage.record_review("learner", &item.id, 4).unwrap();
                }
                item.id
            })
        })
        .collect();

    for handle in handles {
        let id = handle.join().unwrap();
        let item = storage.get_item(&id).unwrap().unwrap();
        assert_eq!(item.repetitions, 3);
        assert_eq!(item.interval, 15);
    }
    assert_eq!(storage.get_stats().unwrap().total_sessions, 24);
}
