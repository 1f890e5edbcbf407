//! SM-2 core formulas
//!
//! Pure functions with no I/O and no shared state. Safe to call from any
//! number of threads.

// ============================================================================
// CONSTANTS
// ============================================================================

/// Easiness assigned to an item that has never been reviewed
pub const DEFAULT_EASINESS: f64 = 2.5;

/// Easiness never drops below this floor
pub const MIN_EASINESS: f64 = 1.3;

/// Interval (days) for a new item and after any failed recall
pub const DEFAULT_INTERVAL: i32 = 1;

/// Interval (days) after the second consecutive successful recall
pub const SECOND_INTERVAL: i32 = 6;

/// Lowest quality that counts as a successful recall
pub const PASSING_QUALITY: i32 = 3;

/// Lowest conventional quality rating (complete blackout)
pub const MIN_QUALITY: i32 = 0;

/// Highest conventional quality rating (perfect recall)
pub const MAX_QUALITY: i32 = 5;

// ============================================================================
// FORMULAS
// ============================================================================

/// Whether a quality rating counts as a successful recall
#[inline]
pub fn is_successful_recall(quality: i32) -> bool {
    quality >= PASSING_QUALITY
}

/// Easiness after a review of the given quality, floored at [`MIN_EASINESS`].
///
/// EF' = EF + (0.1 - (5 - q) * (0.08 + (5 - q) * 0.02))
pub fn next_easiness(easiness: f64, quality: i32) -> f64 {
    let deficit = f64::from(MAX_QUALITY) - f64::from(quality);
    let updated = easiness + (0.1 - deficit * (0.08 + deficit * 0.02));
    if updated < MIN_EASINESS {
        MIN_EASINESS
    } else {
        updated
    }
}

/// Interval growth for the third and later successful recalls.
///
/// Rounds half to even, so `1 * 2.5` gives 2 and `3 * 2.5` gives 8.
fn grow_interval(interval: i32, easiness: f64) -> i32 {
    let grown = (f64::from(interval) * easiness).round_ties_even();
    // `as` saturates at i32::MAX; the floor keeps corrupt stored intervals valid
    (grown as i32).max(DEFAULT_INTERVAL)
}

/// Compute the next SM-2 state.
///
/// Returns `(easiness, interval, repetitions)`. The quality rating is not
/// validated here; out-of-range values run through the same formulas.
/// Validation is a boundary concern, see [`QualityPolicy`](super::QualityPolicy).
///
/// # Examples
///
/// ```rust
/// use cadence_core::sm2::compute_next_state;
///
/// let (easiness, interval, repetitions) = compute_next_state(2.5, 1, 0, 5);
/// assert!((easiness - 2.6).abs() < 1e-9);
/// assert_eq!(interval, 1);
/// assert_eq!(repetitions, 1);
/// ```
pub fn compute_next_state(
    easiness: f64,
    interval: i32,
    repetitions: i32,
    quality: i32,
) -> (f64, i32, i32) {
    let (new_interval, new_repetitions) = if is_successful_recall(quality) {
        let next = match repetitions {
            0 => DEFAULT_INTERVAL,
            1 => SECOND_INTERVAL,
            _ => grow_interval(interval, easiness),
        };
        (next, repetitions.saturating_add(1))
    } else {
        (DEFAULT_INTERVAL, 0)
    };

    (next_easiness(easiness, quality), new_interval, new_repetitions)
}

// ============================================================================
// TESTS
// ============================================================================
