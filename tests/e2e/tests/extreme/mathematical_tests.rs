//! # Mathematical Property Tests
//!
//! Properties of the SM-2 formulas that must hold for every input, checked
//! with proptest across the whole state space.

use cadence_core::sm2::{
    compute_next_state, next_easiness, DEFAULT_INTERVAL, MIN_EASINESS, SECOND_INTERVAL,
};
use cadence_core::{MemoryState, Sm2Scheduler};
use chrono::{TimeZone, Utc};
use proptest::prelude::*;

fn easiness() -> impl Strategy<Value = f64> {
    1.3f64..4.0
}

fn interval() -> impl Strategy<Value = i32> {
    1i32..3650
}

proptest! {
    #[test]
    fn failed_recall_resets_schedule(
        ef in easiness(),
        iv in interval(),
        reps in 0i32..50,
        quality in 0i32..3,
    ) {
        let (_, new_interval, new_reps) = compute_next_state(ef, iv, reps, quality);
        prop_assert_eq!(new_interval, DEFAULT_INTERVAL);
        prop_assert_eq!(new_reps, 0);
    }

    #[test]
    fn first_and_second_recall_use_fixed_steps(
        ef in easiness(),
        iv in interval(),
        quality in 3i32..=5,
    ) {
        let (_, first, reps) = compute_next_state(ef, iv, 0, quality);
        prop_assert_eq!(first, DEFAULT_INTERVAL);
        prop_assert_eq!(reps, 1);

        let (_, second, reps) = compute_next_state(ef, iv, 1, quality);
        prop_assert_eq!(second, SECOND_INTERVAL);
        prop_assert_eq!(reps, 2);
    }

    #[test]
    fn later_recalls_multiply_by_easiness(
        ef in easiness(),
        iv in interval(),
        reps in 2i32..50,
        quality in 3i32..=5,
    ) {
        let (_, new_interval, new_reps) = compute_next_state(ef, iv, reps, quality);
        let expected = (f64::from(iv) * ef).round_ties_even() as i32;
        prop_assert_eq!(new_interval, expected);
        prop_assert_eq!(new_reps, reps + 1);
    }

    #[test]
    fn easiness_never_below_floor(
        ef in 0.5f64..4.0,
        quality in -10i32..=15,
    ) {
        prop_assert!(next_easiness(ef, quality) >= MIN_EASINESS);
    }

    #[test]
    fn easiness_monotone_in_quality(ef in easiness(), quality in 0i32..5) {
        prop_assert!(next_easiness(ef, quality + 1) >= next_easiness(ef, quality));
    }

    #[test]
    fn interval_always_at_least_one(
        ef in easiness(),
        iv in -100i32..3650,
        reps in 0i32..50,
        quality in 0i32..=5,
    ) {
        let (_, new_interval, _) = compute_next_state(ef, iv, reps, quality);
        prop_assert!(new_interval >= 1);
    }

    #[test]
    fn reviews_are_not_idempotent(ef in easiness(), iv in interval(), quality in 3i32..=5) {
        let once = compute_next_state(ef, iv, 2, quality);
        let twice = compute_next_state(once.0, once.1, once.2, quality);
        prop_assert_eq!(twice.2, once.2 + 1);
    }

    #[test]
    fn scheduler_next_review_is_interval_days_ahead(
        ef in easiness(),
        iv in interval(),
        reps in 0i32..10,
        quality in 0i32..=5,
    ) {
        let now = Utc.with_ymd_and_hms(2026, 6, 1, 12, 0, 0).unwrap();
        let state = MemoryState { easiness: ef, interval: iv, repetitions: reps, ..Default::default() };
        let result = Sm2Scheduler::default().review(&state, quality, now).unwrap();
        prop_assert_eq!((result.next_review - now).num_days(), i64::from(result.interval));
        prop_assert_eq!(result.state.last_reviewed, Some(now));
    }
}

#[test]
fn test_reference_scenarios() {
    let cases = [
        ((2.5, 1, 0, 5), (2.6, 1, 1)),
        ((2.6, 1, 1, 5), (2.7, 6, 2)),
        ((2.6, 6, 2, 4), (2.6, 16, 3)),
        ((2.5, 6, 2, 1), (1.96, 1, 0)),
        ((1.3, 10, 3, 0), (1.3, 1, 0)),
    ];

    for ((ef, iv, reps, q), (want_ef, want_iv, want_reps)) in cases {
        let (got_ef, got_iv, got_reps) = compute_next_state(ef, iv, reps, q);
        assert!(
            (got_ef - want_ef).abs() < 1e-9,
            "easiness for {:?}: got {}, want {}",
            (ef, iv, reps, q),
            got_ef,
            want_ef
        );
        assert_eq!(got_iv, want_iv);
        assert_eq!(got_reps, want_reps);
    }
}
