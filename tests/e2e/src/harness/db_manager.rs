//! Test Database Manager
//!
//! Provides isolated database instances for testing:
//! - Temporary databases that are automatically cleaned up
//! - Pre-seeded databases with review items
//! - Reopening the same file to check persistence

use cadence_core::{NewReviewItem, QualityPolicy, Storage};
use std::path::PathBuf;
use tempfile::TempDir;

/// Manager for test databases
///
/// Creates isolated database instances for each test to prevent interference.
/// Automatically cleans up temporary databases when dropped.
///
/// # Example
///
/// ```rust,ignore
/// let db = TestDatabaseManager::new_temp();
/// let ids = db.seed_items(3);
/// db.storage.record_review("learner", &ids[0], 4)?;
/// // Database is automatically deleted when `db` goes out of scope
/// ```
pub struct TestDatabaseManager {
    /// The storage instance
    pub storage: Storage,
    /// Temporary directory (kept alive to prevent premature deletion)
    _temp_dir: Option<TempDir>,
    /// Path to the database file
    db_path: PathBuf,
}

impl TestDatabaseManager {
    /// Create a new test database in a temporary directory
    ///
    /// The database is automatically deleted when the manager is dropped.
    pub fn new_temp() -> Self {
        Self::new_temp_with_policy(QualityPolicy::default())
    }

    /// Temporary database with a specific quality policy
    pub fn new_temp_with_policy(policy: QualityPolicy) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp directory");
        let db_path = temp_dir.path().join("test_cadence.db");

        let storage = Storage::new(Some(db_path.clone()))
            .expect("Failed to create test storage")
            .with_quality_policy(policy);

        Self {
            storage,
            _temp_dir: Some(temp_dir),
            db_path,
        }
    }

    /// Create a test database at a specific path
    ///
    /// The database is NOT automatically deleted.
    pub fn new_at_path(path: PathBuf) -> Self {
        let storage = Storage::new(Some(path.clone())).expect("Failed to create test storage");

        Self {
            storage,
            _temp_dir: None,
            db_path: path,
        }
    }

    /// Get the database path
    pub fn path(&self) -> &PathBuf {
        &self.db_path
    }

    /// Close the storage and open the same file again
    pub fn reopen(self) -> Self {
        let Self {
            storage,
            _temp_dir,
            db_path,
        } = self;
        storage.close().expect("Failed to close storage");

        let storage = Storage::new(Some(db_path.clone())).expect("Failed to reopen storage");
        Self {
            storage,
            _temp_dir,
            db_path,
        }
    }

    /// Check if the database is empty
    pub fn is_empty(&self) -> bool {
        self.item_count() == 0
    }

    /// Get the number of review items in the database
    pub fn item_count(&self) -> i64 {
        self.storage
            .get_stats()
            .map(|s| s.total_items)
            .unwrap_or(0)
    }

    /// Get the number of logged sessions
    pub fn session_count(&self) -> i64 {
        self.storage
            .get_stats()
            .map(|s| s.total_sessions)
            .unwrap_or(0)
    }

    // ========================================================================
    // SEEDING METHODS
    // ========================================================================

    /// Seed the database with a specified number of fresh items
    pub fn seed_items(&self, count: usize) -> Vec<String> {
        (0..count)
            .filter_map(|i| {
                let input = NewReviewItem::new(
                    Some(format!("lesson-{}", i % 3)),
                    format!("Test card {}", i),
                );
                self.storage.create_item(input).ok().map(|item| item.id)
            })
            .collect()
    }

    /// Seed an item that is already mid-schedule
    pub fn seed_imported(&self, easiness: f64, interval: i32, repetitions: i32) -> String {
        let input = NewReviewItem {
            easiness_factor: Some(easiness),
            interval: Some(interval),
            repetitions: Some(repetitions),
            ..NewReviewItem::new(None, "Imported card")
        };
        self.storage
            .create_item(input)
            .expect("Failed to seed imported item")
            .id
    }
}
