//! # Cadence Core
//!
//! SM-2 spaced repetition scheduling with transactional review storage.
//!
//! - **SM-2**: the classic SuperMemo 2 easiness/interval/repetitions model
//! - **Quality policy**: reject, clamp, or accept ratings outside 0-5
//! - **Atomic reviews**: schedule update and session log entry commit together
//! - **Append-only sessions**: every review leaves an immutable log row
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use cadence_core::{NewReviewItem, Storage};
//!
//! # fn main() -> cadence_core::Result<()> {
//! // Create storage (uses default platform-specific location)
//! let storage = Storage::new(None)?;
//!
//! // Seed an item
//! let item = storage.create_item(NewReviewItem::new(
//!     Some("spanish-101".to_string()),
//!     "la manzana",
//! ))?;
//!
//! // Review it with a recall rating on the 0-5 scale
//! let outcome = storage.record_review("learner-1", &item.id, 4)?;
//! println!("next review at {}", outcome.next_review);
//!
//! storage.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Feature Flags
//!
//! - `bundled-sqlite` (default): statically linked SQLite
//! - `encryption`: SQLCipher; set `CADENCE_ENCRYPTION_KEY` to enable

#![cfg_attr(docsrs, feature(doc_cfg))]
#![warn(rustdoc::missing_crate_level_docs)]

// ============================================================================
// MODULES
// ============================================================================

pub mod memory;
pub mod sm2;
pub mod storage;

// ============================================================================
// PUBLIC API RE-EXPORTS
// ============================================================================

// Memory types
pub use memory::{
    NewReviewItem, ReviewItem, ReviewOutcome, ReviewStats, StudySession, SESSION_TYPE_REVIEW,
};

// SM-2 algorithm
pub use sm2::{
    compute_next_state,
    next_easiness,
    next_review_after,
    quality_label,
    MemoryState,
    PreviewOutcome,
    PreviewResults,
    QualityError,
    QualityPolicy,
    ReviewResult,
    ScheduleError,
    Sm2Scheduler,
};

// Storage layer
pub use storage::{Result, Storage, StorageError};

// ============================================================================
// VERSION INFO
// ============================================================================

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

// ============================================================================
// PRELUDE
// ============================================================================

/// Convenient imports for common usage
pub mod prelude {
    pub use crate::{
        MemoryState, NewReviewItem, QualityPolicy, Result, ReviewItem, ReviewOutcome, Sm2Scheduler,
        Storage, StorageError, StudySession,
    };
}
