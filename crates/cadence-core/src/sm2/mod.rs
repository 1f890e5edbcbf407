//! SM-2 (SuperMemo 2) Scheduling Module
//!
//! The classic spaced repetition algorithm. Each item carries an easiness
//! factor, an interval in days, and a streak of successful recalls.
//!
//! ## Core Formulas:
//! - Failed recall (q < 3): repetitions = 0, interval = 1
//! - Successful recall: interval = 1, then 6, then round(interval * EF)
//! - Easiness: EF' = EF + (0.1 - (5-q) * (0.08 + (5-q) * 0.02)), floored at 1.3
//!
//! Quality ratings (0-5):
//! - 0: Complete blackout
//! - 1: Incorrect, but recognised the answer on reveal
//! - 2: Incorrect, but the answer felt familiar
//! - 3: Correct with serious difficulty
//! - 4: Correct after hesitation
//! - 5: Perfect recall

mod algorithm;
mod quality;
mod scheduler;

pub use algorithm::{
    // Core functions
    compute_next_state,
    is_successful_recall,
    next_easiness,
    // Constants
    DEFAULT_EASINESS,
    DEFAULT_INTERVAL,
    MAX_QUALITY,
    MIN_EASINESS,
    MIN_QUALITY,
    PASSING_QUALITY,
    SECOND_INTERVAL,
};

pub use quality::{quality_label, QualityError, QualityPolicy};

pub use scheduler::{
    next_review_after, MemoryState, PreviewOutcome, PreviewResults, ReviewResult, ScheduleError,
    Sm2Scheduler,
};
