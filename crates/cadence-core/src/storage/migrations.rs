//! Database Migrations
//!
//! Schema migration definitions for the storage layer.

/// Migration definitions
pub const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        description: "Initial schema: review items and study sessions",
        up: MIGRATION_V1_UP,
    },
];

/// A database migration
#[derive(Debug, Clone)]
pub struct Migration {
    /// Version number
    pub version: u32,
    /// Description
    pub description: &'static str,
    /// SQL to apply
    pub up: &'static str,
}

/// V1: Initial schema
const MIGRATION_V1_UP: &str = r#"
CREATE TABLE IF NOT EXISTS reviews (
    id TEXT PRIMARY KEY,
    lesson_id TEXT,
    content TEXT,

    -- SM-2 state; NULL means "use the default"
    easiness_factor REAL,
    interval INTEGER,
    repetitions INTEGER,

    -- Scheduling
    last_reviewed TEXT,
    next_review TEXT,
    recall_rating INTEGER,

    created_at TEXT NOT NULL,
    updated_at TEXT NOT NULL,
    -- Number of reviews applied
    version INTEGER NOT NULL DEFAULT 0
);

CREATE INDEX IF NOT EXISTS idx_reviews_next_review ON reviews(next_review);
CREATE INDEX IF NOT EXISTS idx_reviews_lesson ON reviews(lesson_id);

-- Append-only review log
CREATE TABLE IF NOT EXISTS study_sessions (
    id TEXT PRIMARY KEY,
    user_id TEXT NOT NULL,
    lesson_id TEXT,
    review_id TEXT NOT NULL REFERENCES reviews(id),
    duration INTEGER NOT NULL DEFAULT 0,
    date TEXT NOT NULL,
    type TEXT NOT NULL DEFAULT 'review',
    recall_rating INTEGER NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_sessions_review ON study_sessions(review_id, date);
CREATE INDEX IF NOT EXISTS idx_sessions_user ON study_sessions(user_id, date);

-- Sessions are immutable
CREATE TRIGGER IF NOT EXISTS study_sessions_no_update
BEFORE UPDATE ON study_sessions
BEGIN
    SELECT RAISE(ABORT, 'study_sessions is append-only');
END;

CREATE TRIGGER IF NOT EXISTS study_sessions_no_delete
BEFORE DELETE ON study_sessions
BEGIN
    SELECT RAISE(ABORT, 'study_sessions is append-only');
END;

CREATE TABLE IF NOT EXISTS schema_version (
    version INTEGER PRIMARY KEY,
    applied_at TEXT NOT NULL
);

INSERT OR IGNORE INTO schema_version (version, applied_at) VALUES (1, datetime('now'));
"#;

/// Get current schema version from database
pub fn get_current_version(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    conn.query_row(
        "SELECT COALESCE(MAX(version), 0) FROM schema_version",
        [],
        |row| row.get(0),
    )
    .or(Ok(0))
}

/// Apply pending migrations
///
/// Idempotent: versions already recorded in `schema_version` are skipped.
pub fn apply_migrations(conn: &rusqlite::Connection) -> rusqlite::Result<u32> {
    let current_version = get_current_version(conn)?;
    let mut applied = 0;

    for migration in MIGRATIONS {
        if migration.version > current_version {
            tracing::info!(
                "Applying migration v{}: {}",
                migration.version,
                migration.description
            );

            // Use execute_batch to handle multi-statement SQL including triggers
            conn.execute_batch(migration.up)?;
            applied += 1;
        }
    }

    Ok(applied)
}
