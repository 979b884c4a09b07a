// ABOUTME: History store behavior through the engine - persistence, retention, schema migration
// ABOUTME: Stale versions purge wholesale and are rebuilt by the estimator on the next computation

use chrono::{Days, NaiveDate};
use momentum_engine::{
    DayRecord, DcsEntry, DcsHistory, DcsSource, EngineConfig, FoodItem, Meal, MomentumEngine,
    UserProfile, CURRENT_SCHEMA_VERSION,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn meal(time: &str) -> Meal {
    Meal {
        time: Some(time.into()),
        items: vec![FoodItem {
            grams: Some(150.0),
            kcal_per_100g: Some(120.0),
            ..FoodItem::default()
        }],
    }
}

fn tracked_day(date: NaiveDate) -> DayRecord {
    DayRecord {
        date,
        meals: vec![meal("08:30"), meal("13:30"), meal("19:00")],
        sleep_start: Some("22:45".into()),
        sleep_hours: Some(7.8),
        steps: 7600,
        weight_morning: Some(71.2),
        ..DayRecord::default()
    }
}

fn ready_engine() -> MomentumEngine {
    let mut engine = MomentumEngine::new(EngineConfig::default());
    engine.mark_history_ready();
    engine
}

#[test]
fn history_round_trips_through_json() {
    let mut engine = ready_engine();
    engine
        .compute(&tracked_day(today()), &[], &UserProfile::default(), 1200)
        .unwrap();

    let json = engine.history_json().unwrap();
    let mut restored = MomentumEngine::new(EngineConfig::default());
    restored.load_history(&json).unwrap();

    assert_eq!(restored.history().len(), engine.history().len());
    assert_eq!(
        restored.history().dcs_on(today()),
        engine.history().dcs_on(today())
    );
}

#[test]
fn stale_schema_version_purges_and_warns_on_next_computation() {
    let mut stale = DcsHistory::new();
    stale.upsert(today() - Days::new(1), DcsEntry::computed(0.9));
    stale.upsert(today() - Days::new(2), DcsEntry::computed(0.9));
    stale.schema_version = 2;
    let json = stale.to_json().unwrap();

    let mut engine = ready_engine();
    engine.load_history(&json).unwrap();
    assert!(engine.history().is_empty());

    let prior: Vec<DayRecord> = (1..=5)
        .map(|i| tracked_day(today() - Days::new(i)))
        .collect();
    let snapshot = engine
        .compute(&tracked_day(today()), &prior, &UserProfile::default(), 1200)
        .unwrap();

    assert!(snapshot.warnings.iter().any(|w| w.contains("stale history")));
    // The purged window is rebuilt from estimates, not left empty.
    for i in 1..=5u64 {
        let entry = engine.history().entry_on(today() - Days::new(i)).unwrap();
        assert_eq!(entry.source, DcsSource::Estimated);
    }
}

#[test]
fn current_schema_version_is_kept_verbatim() {
    let mut history = DcsHistory::new();
    history.upsert(today() - Days::new(1), DcsEntry::computed(0.42));
    let json = history.to_json().unwrap();

    let mut engine = ready_engine();
    engine.load_history(&json).unwrap();
    assert_eq!(engine.history().schema_version, CURRENT_SCHEMA_VERSION);
    assert!(
        (engine.history().dcs_on(today() - Days::new(1)).unwrap() - 0.42).abs() < 1e-9
    );
}

#[test]
fn entries_past_retention_are_pruned_on_computation() {
    let mut history = DcsHistory::new();
    history.upsert(today() - Days::new(40), DcsEntry::computed(0.5));
    history.upsert(today() - Days::new(10), DcsEntry::computed(0.5));

    let mut engine = ready_engine();
    engine.set_history(history);
    engine
        .compute(&tracked_day(today()), &[], &UserProfile::default(), 1200)
        .unwrap();

    assert!(engine.history().dcs_on(today() - Days::new(40)).is_none());
    assert!(engine.history().dcs_on(today() - Days::new(10)).is_some());
}

#[test]
fn flagged_entries_are_corrected_by_the_next_backfill_pass() {
    let bad_date = today() - Days::new(3);
    let mut history = DcsHistory::new();
    history.upsert(
        bad_date,
        DcsEntry {
            dcs: -1.0,
            source: DcsSource::Computed,
            flagged: true,
        },
    );

    let mut engine = ready_engine();
    engine.set_history(history);
    let prior: Vec<DayRecord> = (1..=5)
        .map(|i| tracked_day(today() - Days::new(i)))
        .collect();
    engine
        .compute(&tracked_day(today()), &prior, &UserProfile::default(), 1200)
        .unwrap();

    let corrected = engine.history().entry_on(bad_date).unwrap();
    assert_eq!(corrected.source, DcsSource::Estimated);
    assert!(!corrected.flagged);
    assert!(corrected.dcs > -1.0);
}

#[test]
fn live_computation_upserts_today() {
    let mut engine = ready_engine();
    let snapshot = engine
        .compute(&tracked_day(today()), &[], &UserProfile::default(), 1200)
        .unwrap();

    let entry = engine.history().entry_on(today()).unwrap();
    assert_eq!(entry.source, DcsSource::Computed);
    assert!((entry.dcs - snapshot.daily_contribution.dcs).abs() < 1e-9);
    assert!((snapshot.dcs_history[&today()] - entry.dcs).abs() < 1e-9);
}
