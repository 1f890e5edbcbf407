//! SQLite Storage Implementation
//!
//! Review items, their SM-2 schedule, and the append-only session log.

use chrono::{DateTime, SecondsFormat, Utc};
use directories::ProjectDirs;
use rusqlite::{params, Connection, ErrorCode, OptionalExtension, TransactionBehavior};
use std::path::PathBuf;
use std::sync::Mutex;
use uuid::Uuid;

use crate::memory::{
    NewReviewItem, ReviewItem, ReviewOutcome, ReviewStats, StudySession, SESSION_TYPE_REVIEW,
};
use crate::sm2::{
    MemoryState, PreviewResults, QualityError, QualityPolicy, ScheduleError, Sm2Scheduler,
    DEFAULT_EASINESS,
};

// ============================================================================
// ERROR TYPES
// ============================================================================

/// Storage error type
#[non_exhaustive]
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    /// Review item not found
    #[error("Review item not found: {0}")]
    NotFound(String),
    /// An item with this id already exists
    #[error("Review item already exists: {0}")]
    AlreadyExists(String),
    /// Rejected input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
    /// Recall rating rejected by the quality policy
    #[error(transparent)]
    Quality(#[from] QualityError),
    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// Invalid timestamp
    #[error("Invalid timestamp: {0}")]
    InvalidTimestamp(String),
    /// Initialization error
    #[error("Initialization error: {0}")]
    Init(String),
}

impl From<ScheduleError> for StorageError {
    fn from(err: ScheduleError) -> Self {
        match err {
            ScheduleError::Quality(e) => StorageError::Quality(e),
            other => StorageError::InvalidTimestamp(other.to_string()),
        }
    }
}

/// Storage result type
pub type Result<T> = std::result::Result<T, StorageError>;

/// Fixed-width UTC timestamps so TEXT comparison orders chronologically
fn format_timestamp(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

// ============================================================================
// STORAGE
// ============================================================================

/// Persistence handle for review items and sessions
///
/// Uses separate reader/writer connections for interior mutability.
/// All methods take `&self`, making Storage `Send + Sync` so the HTTP layer
/// can share an `Arc<Storage>`.
///
/// Lifecycle: construct once with [`Storage::new`] (migrations are
/// idempotent), share it, and call [`Storage::close`] at shutdown to
/// checkpoint the WAL. Dropping without `close` is safe but leaves the
/// WAL file for the next open to fold in.
pub struct Storage {
    writer: Mutex<Connection>,
    reader: Mutex<Connection>,
    scheduler: Sm2Scheduler,
    path: PathBuf,
}

impl Storage {
    /// Apply PRAGMAs and optional encryption to a connection
    fn configure_connection(conn: &Connection) -> Result<()> {
        // Apply encryption key if SQLCipher is enabled and key is provided
        #[cfg(feature = "encryption")]
        {
            if let Ok(key) = std::env::var("CADENCE_ENCRYPTION_KEY") {
                if !key.is_empty() {
                    conn.pragma_update(None, "key", &key)?;
                }
            }
        }

        conn.execute_batch(
            "PRAGMA journal_mode = WAL;
             PRAGMA synchronous = NORMAL;
             PRAGMA foreign_keys = ON;
             PRAGMA busy_timeout = 5000;
             PRAGMA temp_store = MEMORY;",
        )?;

        Ok(())
    }

    /// Default database location in the platform data directory
    pub fn default_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "cadence", "cadence").ok_or_else(|| {
            StorageError::Init("Could not determine project directories".to_string())
        })?;
        Ok(proj_dirs.data_dir().join("cadence.db"))
    }

    /// Create new storage instance
    pub fn new(db_path: Option<PathBuf>) -> Result<Self> {
        let path = match db_path {
            Some(p) => p,
            None => Self::default_path()?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
            // Restrict directory permissions to owner-only on Unix
            #[cfg(unix)]
            {
                use std::os::unix::fs::PermissionsExt;
                let perms = std::fs::Permissions::from_mode(0o700);
                let _ = std::fs::set_permissions(parent, perms);
            }
        }

        let writer_conn = Connection::open(&path)?;

        // Restrict database file permissions to owner-only on Unix
        #[cfg(unix)]
        if path.exists() {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            let _ = std::fs::set_permissions(&path, perms);
        }

        Self::configure_connection(&writer_conn)?;

        // Apply migrations on writer only
        let applied = super::migrations::apply_migrations(&writer_conn)?;
        if applied > 0 {
            tracing::info!(applied, path = %path.display(), "Database schema up to date");
        }

        let reader_conn = Connection::open(&path)?;
        Self::configure_connection(&reader_conn)?;

        Ok(Self {
            writer: Mutex::new(writer_conn),
            reader: Mutex::new(reader_conn),
            scheduler: Sm2Scheduler::default(),
            path,
        })
    }

    /// Set how out-of-range recall ratings are handled
    pub fn with_quality_policy(mut self, policy: QualityPolicy) -> Self {
        self.scheduler = Sm2Scheduler::new(policy);
        self
    }

    pub fn quality_policy(&self) -> QualityPolicy {
        self.scheduler.policy()
    }

    /// Path of the database file
    pub fn path(&self) -> &std::path::Path {
        &self.path
    }

    // ========================================================================
    // ITEMS
    // ========================================================================

    /// Seed a new review item
    pub fn create_item(&self, input: NewReviewItem) -> Result<ReviewItem> {
        input.validate().map_err(StorageError::InvalidInput)?;

        let now = format_timestamp(&Utc::now());
        let id = input
            .id
            .clone()
            .unwrap_or_else(|| Uuid::new_v4().to_string());

        {
            let writer = self
                .writer
                .lock()
                .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
            let inserted = writer.execute(
                "INSERT INTO reviews (
                    id, lesson_id, content, easiness_factor, interval, repetitions,
                    created_at, updated_at, version
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, 0)",
                params![
                    id,
                    input.lesson_id,
                    input.content,
                    input.easiness_factor,
                    input.interval,
                    input.repetitions,
                    now,
                    now,
                ],
            );
            match inserted {
                Ok(_) => {}
                Err(rusqlite::Error::SqliteFailure(e, _))
                    if e.code == ErrorCode::ConstraintViolation =>
                {
                    return Err(StorageError::AlreadyExists(id));
                }
                Err(e) => return Err(e.into()),
            }
        }

        tracing::debug!(item_id = %id, "Review item created");

        self.get_item(&id)?
            .ok_or_else(|| StorageError::NotFound(id))
    }

    /// Get an item by ID
    pub fn get_item(&self, id: &str) -> Result<Option<ReviewItem>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare("SELECT * FROM reviews WHERE id = ?1")?;

        let item = stmt
            .query_row(params![id], |row| Self::row_to_item(row))
            .optional()?;
        Ok(item)
    }

    /// Parse RFC3339 timestamp
    fn parse_timestamp(value: &str, field_name: &str) -> rusqlite::Result<DateTime<Utc>> {
        DateTime::parse_from_rfc3339(value)
            .map(|dt| dt.with_timezone(&Utc))
            .map_err(|e| {
                rusqlite::Error::FromSqlConversionFailure(
                    0,
                    rusqlite::types::Type::Text,
                    Box::new(std::io::Error::new(
                        std::io::ErrorKind::InvalidData,
                        format!("Invalid {} timestamp '{}': {}", field_name, value, e),
                    )),
                )
            })
    }

    fn parse_optional_timestamp(
        value: Option<String>,
        field_name: &str,
    ) -> rusqlite::Result<Option<DateTime<Utc>>> {
        value
            .map(|s| Self::parse_timestamp(&s, field_name))
            .transpose()
    }

    /// Convert a row to ReviewItem, resolving SM-2 defaults
    fn row_to_item(row: &rusqlite::Row) -> rusqlite::Result<ReviewItem> {
        let created_at: String = row.get("created_at")?;
        let updated_at: String = row.get("updated_at")?;

        let state = MemoryState::from_stored(
            row.get("easiness_factor")?,
            row.get("interval")?,
            row.get("repetitions")?,
        );

        Ok(ReviewItem {
            id: row.get("id")?,
            lesson_id: row.get("lesson_id")?,
            content: row.get("content")?,
            easiness_factor: state.easiness,
            interval: state.interval,
            repetitions: state.repetitions,
            last_reviewed: Self::parse_optional_timestamp(row.get("last_reviewed")?, "last_reviewed")?,
            next_review: Self::parse_optional_timestamp(row.get("next_review")?, "next_review")?,
            recall_rating: row.get("recall_rating")?,
            created_at: Self::parse_timestamp(&created_at, "created_at")?,
            updated_at: Self::parse_timestamp(&updated_at, "updated_at")?,
            version: row.get("version")?,
        })
    }

    fn row_to_session(row: &rusqlite::Row) -> rusqlite::Result<StudySession> {
        let date: String = row.get("date")?;
        Ok(StudySession {
            id: row.get("id")?,
            user_id: row.get("user_id")?,
            lesson_id: row.get("lesson_id")?,
            review_id: row.get("review_id")?,
            duration: row.get("duration")?,
            date: Self::parse_timestamp(&date, "date")?,
            session_type: row.get("type")?,
            recall_rating: row.get("recall_rating")?,
        })
    }

    // ========================================================================
    // REVIEWS
    // ========================================================================

    /// Apply an SM-2 review to an item and log it
    pub fn record_review(&self, user_id: &str, item_id: &str, quality: i32) -> Result<ReviewOutcome> {
        self.record_review_at(user_id, item_id, quality, Utc::now())
    }

    /// Apply an SM-2 review at a given instant
    ///
    /// Fetch, compute, update and session append all run in one IMMEDIATE
    /// transaction on the writer connection. Concurrent reviews of the same
    /// item (from this process or another sharing the file) are applied one
    /// after another, and the schedule update and its log entry commit
    /// together or not at all.
    pub fn record_review_at(
        &self,
        user_id: &str,
        item_id: &str,
        quality: i32,
        now: DateTime<Utc>,
    ) -> Result<ReviewOutcome> {
        let mut writer = self
            .writer
            .lock()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        let tx = writer.transaction_with_behavior(TransactionBehavior::Immediate)?;

        let item = tx
            .query_row(
                "SELECT * FROM reviews WHERE id = ?1",
                params![item_id],
                |row| Self::row_to_item(row),
            )
            .optional()?
            .ok_or_else(|| StorageError::NotFound(item_id.to_string()))?;

        let previous = item.memory_state();
        let result = self.scheduler.review(&previous, quality, now)?;
        let now_str = format_timestamp(&now);

        tx.execute(
            "UPDATE reviews SET
                easiness_factor = ?1,
                interval = ?2,
                repetitions = ?3,
                last_reviewed = ?4,
                next_review = ?5,
                recall_rating = ?6,
                updated_at = ?7,
                version = version + 1
            WHERE id = ?8",
            params![
                result.state.easiness,
                result.state.interval,
                result.state.repetitions,
                now_str,
                format_timestamp(&result.next_review),
                quality,
                now_str,
                item_id,
            ],
        )?;

        let session_id = Uuid::new_v4().to_string();
        tx.execute(
            "INSERT INTO study_sessions (
                id, user_id, lesson_id, review_id, duration, date, type, recall_rating
            ) VALUES (?1, ?2, ?3, ?4, 0, ?5, ?6, ?7)",
            params![
                session_id,
                user_id,
                item.lesson_id,
                item_id,
                now_str,
                SESSION_TYPE_REVIEW,
                quality,
            ],
        )?;

        let updated = tx.query_row(
            "SELECT * FROM reviews WHERE id = ?1",
            params![item_id],
            |row| Self::row_to_item(row),
        )?;
        let session = tx.query_row(
            "SELECT * FROM study_sessions WHERE id = ?1",
            params![session_id],
            |row| Self::row_to_session(row),
        )?;

        tx.commit()?;
        drop(writer);

        tracing::info!(
            item_id,
            user_id,
            quality,
            easiness = updated.easiness_factor,
            interval = updated.interval,
            repetitions = updated.repetitions,
            "Review recorded"
        );

        let next_review = updated.next_review.unwrap_or(result.next_review);
        Ok(ReviewOutcome {
            item: updated,
            previous,
            session,
            next_review,
        })
    }

    /// Preview SM-2 outcomes for every rating on the 0-5 scale
    pub fn preview_review(&self, item_id: &str) -> Result<PreviewResults> {
        let item = self
            .get_item(item_id)?
            .ok_or_else(|| StorageError::NotFound(item_id.to_string()))?;

        Ok(self
            .scheduler
            .preview_reviews(&item.memory_state(), Utc::now())?)
    }

    /// Get items due for review, never-reviewed items first
    pub fn get_review_queue(&self, limit: i32) -> Result<Vec<ReviewItem>> {
        self.get_review_queue_at(limit, Utc::now())
    }

    /// Get items due at a given instant
    pub fn get_review_queue_at(&self, limit: i32, now: DateTime<Utc>) -> Result<Vec<ReviewItem>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(
            "SELECT * FROM reviews
             WHERE next_review IS NULL OR next_review <= ?1
             ORDER BY next_review ASC, created_at ASC
             LIMIT ?2",
        )?;

        let items = stmt.query_map(params![format_timestamp(&now), limit], |row| {
            Self::row_to_item(row)
        })?;

        let mut result = Vec::new();
        for item in items {
            result.push(item?);
        }
        Ok(result)
    }

    // ========================================================================
    // SESSIONS
    // ========================================================================

    /// Session log for an item, newest first
    pub fn get_sessions_for_item(&self, item_id: &str, limit: i32) -> Result<Vec<StudySession>> {
        self.query_sessions(
            "SELECT * FROM study_sessions WHERE review_id = ?1
             ORDER BY date DESC, rowid DESC LIMIT ?2",
            item_id,
            limit,
        )
    }

    /// Session log for a learner, newest first
    pub fn get_sessions_for_user(&self, user_id: &str, limit: i32) -> Result<Vec<StudySession>> {
        self.query_sessions(
            "SELECT * FROM study_sessions WHERE user_id = ?1
             ORDER BY date DESC, rowid DESC LIMIT ?2",
            user_id,
            limit,
        )
    }

    fn query_sessions(&self, sql: &str, key: &str, limit: i32) -> Result<Vec<StudySession>> {
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        let mut stmt = reader.prepare(sql)?;
        let rows = stmt.query_map(params![key, limit], |row| Self::row_to_session(row))?;

        let mut result = Vec::new();
        for row in rows {
            result.push(row?);
        }
        Ok(result)
    }

    // ========================================================================
    // MAINTENANCE
    // ========================================================================

    /// Get review statistics
    pub fn get_stats(&self) -> Result<ReviewStats> {
        let now = format_timestamp(&Utc::now());

        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;

        let (total_items, items_due, never_reviewed, average_easiness, last_review): (
            i64,
            i64,
            i64,
            f64,
            Option<String>,
        ) = reader.query_row(
            "SELECT
                COUNT(*),
                COALESCE(SUM(CASE WHEN next_review IS NULL OR next_review <= ?1 THEN 1 ELSE 0 END), 0),
                COALESCE(SUM(CASE WHEN last_reviewed IS NULL THEN 1 ELSE 0 END), 0),
                COALESCE(AVG(COALESCE(easiness_factor, ?2)), ?2),
                MAX(last_reviewed)
             FROM reviews",
            params![now, DEFAULT_EASINESS],
            |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?)),
        )?;

        let total_sessions: i64 =
            reader.query_row("SELECT COUNT(*) FROM study_sessions", [], |row| row.get(0))?;

        Ok(ReviewStats {
            total_items,
            items_due,
            never_reviewed,
            total_sessions,
            average_easiness,
            last_review: Self::parse_optional_timestamp(last_review, "last_reviewed")?,
        })
    }

    /// Create a consistent backup using VACUUM INTO
    pub fn backup_to(&self, path: &std::path::Path) -> Result<()> {
        let path_str = path
            .to_str()
            .ok_or_else(|| StorageError::Init("Invalid backup path encoding".to_string()))?;
        // Reject control characters (except tab)
        if path_str.bytes().any(|b| b < 0x20 && b != b'\t') {
            return Err(StorageError::Init(
                "Backup path contains invalid characters".to_string(),
            ));
        }
        let reader = self
            .reader
            .lock()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        // VACUUM INTO doesn't support parameterized queries; escape single quotes
        reader.execute_batch(&format!("VACUUM INTO '{}'", path_str.replace('\'', "''")))?;
        Ok(())
    }

    /// Checkpoint the WAL and close both connections
    pub fn close(self) -> Result<()> {
        let reader = self
            .reader
            .into_inner()
            .map_err(|_| StorageError::Init("Reader lock poisoned".into()))?;
        reader.close().map_err(|(_, e)| StorageError::Database(e))?;

        let writer = self
            .writer
            .into_inner()
            .map_err(|_| StorageError::Init("Writer lock poisoned".into()))?;
        writer.execute_batch("PRAGMA wal_checkpoint(TRUNCATE);")?;
        writer.close().map_err(|(_, e)| StorageError::Database(e))?;

        tracing::info!(path = %self.path.display(), "Storage closed");
        Ok(())
    }
}

// ============================================================================
// TESTS
// ============================================================================
