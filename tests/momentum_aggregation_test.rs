// ABOUTME: Property tests for the decayed momentum aggregation and its documented bounds
// ABOUTME: Monotonic decay, boost bound, range clamps, trend and peak-streak behavior

use chrono::{Days, NaiveDate};
use momentum_engine::momentum::aggregate;
use momentum_engine::{DcsEntry, DcsHistory, MomentumState, Trend};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 30).unwrap()
}

fn history_from(values: &[(u64, f64)]) -> DcsHistory {
    let mut history = DcsHistory::new();
    for (days_ago, dcs) in values {
        history.upsert(today() - Days::new(*days_ago), DcsEntry::computed(*dcs));
    }
    history
}

#[test]
fn a_recent_high_day_never_loses_to_a_distant_one() {
    // Identical histories except for where the single 0.9 day sits.
    for (near_ago, far_ago) in [(1u64, 5u64), (2, 10), (3, 20), (5, 29)] {
        let mut near: Vec<(u64, f64)> = (1..30).map(|i| (i, 0.2)).collect();
        let mut far = near.clone();
        near[(near_ago - 1) as usize] = (near_ago, 0.9);
        far[(far_ago - 1) as usize] = (far_ago, 0.9);

        let near_crs = aggregate(&history_from(&near), today(), 0.0, 1.0).crs;
        let far_crs = aggregate(&history_from(&far), today(), 0.0, 1.0).crs;
        assert!(
            near_crs >= far_crs,
            "high day {near_ago} days ago scored below {far_ago} days ago"
        );
    }
}

#[test]
fn crs_stays_inside_zero_to_ceiling_for_extreme_histories() {
    let histories = [
        history_from(&[]),
        history_from(&(1..30).map(|i| (i, 1.0)).collect::<Vec<_>>()),
        history_from(&(1..30).map(|i| (i, -0.3)).collect::<Vec<_>>()),
        history_from(&[(1, 1.0), (2, -1.0), (3, 1.0), (4, -1.0)]),
    ];
    for ceiling in [0.2, 0.65, 1.0] {
        for history in &histories {
            for today_dcs in [-1.0, 0.0, 1.0] {
                let outcome = aggregate(history, today(), today_dcs, ceiling);
                assert!(outcome.crs >= 0.0);
                assert!(outcome.crs <= ceiling + 1e-12);
                assert!(outcome.crs_base >= 0.0);
                assert!(outcome.crs_base <= ceiling + 1e-12);
            }
        }
    }
}

#[test]
fn boost_never_negative_and_never_above_cap() {
    let history = history_from(&(1..15).map(|i| (i, 0.5)).collect::<Vec<_>>());
    for today_dcs in [-1.0, -0.3, 0.0, 0.4, 1.0] {
        for ceiling in [0.3, 0.8, 1.0] {
            let outcome = aggregate(&history, today(), today_dcs, ceiling);
            let boost = outcome.crs - outcome.crs_base;
            assert!(boost >= -1e-12, "boost went negative: {boost}");
            assert!(boost <= 0.03 + 1e-12, "boost exceeded cap: {boost}");
        }
    }
}

#[test]
fn days_without_entries_do_not_drag_the_average_down() {
    // Three strong days and 26 untracked ones should average strong, because
    // missing days are skipped rather than treated as zero.
    let sparse = history_from(&[(1, 0.8), (2, 0.8), (3, 0.8)]);
    let outcome = aggregate(&sparse, today(), 0.0, 1.0);
    assert!((outcome.crs_base - 0.8).abs() < 1e-9);
}

#[test]
fn trend_and_peak_streak_through_a_breakdown() {
    // A strong week that collapsed three days ago.
    let history = history_from(&[
        (1, 0.1),
        (2, 0.1),
        (3, 0.1),
        (4, 0.8),
        (5, 0.8),
        (6, 0.8),
        (7, 0.8),
    ]);
    let outcome = aggregate(&history, today(), 0.05, 1.0);
    assert_eq!(outcome.trend, Trend::Down);
    assert_eq!(outcome.days_at_peak, 0);
}

#[test]
fn recovery_reads_upward() {
    let history = history_from(&[
        (1, 0.7),
        (2, 0.7),
        (3, 0.7),
        (4, 0.1),
        (5, 0.1),
        (6, 0.1),
        (7, 0.1),
    ]);
    let outcome = aggregate(&history, today(), 0.7, 1.0);
    assert_eq!(outcome.trend, Trend::Up);
    assert_eq!(outcome.days_at_peak, 4);
}

#[test]
fn state_classification_respects_the_ceiling_clamp() {
    // A strong history under a low ceiling cannot read Strong.
    let history = history_from(&(1..15).map(|i| (i, 0.9)).collect::<Vec<_>>());
    let outcome = aggregate(&history, today(), 0.9, 0.5);
    assert!((outcome.crs - 0.5).abs() < 1e-9);
    assert_eq!(MomentumState::classify(outcome.crs, 5), MomentumState::Growing);
}
