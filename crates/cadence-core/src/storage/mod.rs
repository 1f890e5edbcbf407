//! Storage Module
//!
//! SQLite-based storage layer with:
//! - Reader/writer connection split over one WAL-mode database
//! - Transactional review application (schedule update + session append)
//! - Idempotent schema migrations

mod migrations;
mod sqlite;

pub use migrations::MIGRATIONS;
pub use sqlite::{Result, Storage, StorageError};
