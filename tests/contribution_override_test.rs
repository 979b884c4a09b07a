// ABOUTME: Full-pipeline tests of contribution overrides - critical violations and goal-aware tiers
// ABOUTME: Covers the worked scenarios: night-harm day, deficit tightened floor, bulk exemption

use chrono::NaiveDate;
use momentum_engine::{
    DayRecord, DcsOverride, EngineConfig, FoodItem, GoalMode, Meal, MomentumEngine,
    MomentumState, UserProfile,
};

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 3, 15).unwrap()
}

fn meal_kcal(time: &str, total_kcal: f64) -> Meal {
    Meal {
        time: Some(time.into()),
        items: vec![FoodItem {
            grams: Some(100.0),
            kcal_per_100g: Some(total_kcal),
            ..FoodItem::default()
        }],
    }
}

fn harmful(mut meal: Meal) -> Meal {
    meal.items[0].harm_score = Some(9.0);
    meal
}

fn profile_with(goal_mode: GoalMode) -> UserProfile {
    let mut profile = UserProfile::default();
    profile.targets.goal_mode = goal_mode;
    profile
}

fn ready_engine() -> MomentumEngine {
    let mut engine = MomentumEngine::new(EngineConfig::default());
    engine.mark_history_ready();
    engine
}

#[test]
fn harmful_night_eating_with_calorie_overrun_floors_at_minus_one() {
    let mut engine = ready_engine();
    // Positive events present, but the night violation plus 180% of target
    // outranks all of them.
    let day = DayRecord {
        date: today(),
        meals: vec![
            harmful(meal_kcal("01:30", 3300.0)),
            meal_kcal("13:00", 300.0),
        ],
        steps: 9000,
        weight_morning: Some(70.0),
        ..DayRecord::default()
    };

    let snapshot = engine
        .compute(&day, &[], &UserProfile::default(), 1200)
        .unwrap();
    assert!((snapshot.daily_contribution.dcs + 1.0).abs() < 1e-9);
    assert_eq!(
        snapshot.daily_contribution.override_applied,
        Some(DcsOverride::CriticalCombined)
    );
    // Zero contribution history: the day reads broken, not empty.
    assert_eq!(snapshot.state, MomentumState::Broken);
}

#[test]
fn harmful_night_eating_alone_scores_minus_point_eight() {
    let mut engine = ready_engine();
    let day = DayRecord {
        date: today(),
        meals: vec![harmful(meal_kcal("01:30", 400.0))],
        ..DayRecord::default()
    };

    let snapshot = engine
        .compute(&day, &[], &UserProfile::default(), 1200)
        .unwrap();
    assert!((snapshot.daily_contribution.dcs + 0.8).abs() < 1e-9);
    assert_eq!(
        snapshot.daily_contribution.override_applied,
        Some(DcsOverride::NightHarm)
    );
}

#[test]
fn calorie_overrun_alone_scores_minus_point_six() {
    let mut engine = ready_engine();
    let day = DayRecord {
        date: today(),
        meals: vec![meal_kcal("12:00", 1600.0), meal_kcal("18:00", 1600.0)],
        ..DayRecord::default()
    };

    let snapshot = engine
        .compute(&day, &[], &UserProfile::default(), 1200)
        .unwrap();
    assert!((snapshot.daily_contribution.dcs + 0.6).abs() < 1e-9);
    assert_eq!(
        snapshot.daily_contribution.override_applied,
        Some(DcsOverride::CalorieOverrun)
    );
}

#[test]
fn bulk_goal_waives_the_same_overrun() {
    let mut engine = ready_engine();
    let day = DayRecord {
        date: today(),
        meals: vec![meal_kcal("12:00", 1600.0), meal_kcal("18:00", 1600.0)],
        ..DayRecord::default()
    };

    let snapshot = engine
        .compute(&day, &[], &profile_with(GoalMode::Bulk), 1200)
        .unwrap();
    assert!(snapshot.daily_contribution.override_applied.is_none());
    assert!(snapshot.daily_contribution.dcs > -0.6);
    assert!(snapshot.daily_contribution.dcs >= -0.3);
}

#[test]
fn deficit_at_110_percent_hits_the_tightened_floor() {
    let mut deficit_engine = ready_engine();
    let day = DayRecord {
        date: today(),
        meals: vec![meal_kcal("12:00", 1100.0), meal_kcal("18:00", 1100.0)],
        ..DayRecord::default()
    };

    let deficit = deficit_engine
        .compute(&day, &[], &profile_with(GoalMode::Deficit), 1200)
        .unwrap();
    assert_eq!(
        deficit.daily_contribution.override_applied,
        Some(DcsOverride::DeficitTightenedFloor)
    );
    assert!(deficit.daily_contribution.dcs <= -0.4 + 1e-9);

    // The same day on a maintenance goal keeps the default -0.3 floor.
    let mut maintenance_engine = ready_engine();
    let maintenance = maintenance_engine
        .compute(&day, &[], &profile_with(GoalMode::Maintenance), 1200)
        .unwrap();
    assert!(maintenance.daily_contribution.dcs >= -0.3 - 1e-9);
    assert!(deficit.daily_contribution.dcs < maintenance.daily_contribution.dcs);
}

#[test]
fn training_day_tolerance_spares_a_mild_deficit_overrun() {
    let mut engine = ready_engine();
    let day = DayRecord {
        date: today(),
        meals: vec![meal_kcal("12:00", 1100.0), meal_kcal("18:00", 1100.0)],
        trainings: vec![momentum_engine::TrainingSession {
            time: Some("16:00".into()),
            duration_min: Some(50.0),
            ..momentum_engine::TrainingSession::default()
        }],
        ..DayRecord::default()
    };

    // 110% of target sits inside the 1.05 x 1.2 training-day allowance.
    let snapshot = engine
        .compute(&day, &[], &profile_with(GoalMode::Deficit), 1200)
        .unwrap();
    assert!(snapshot.daily_contribution.override_applied.is_none());
}

#[test]
fn deficit_severe_tier_engages_past_150_percent() {
    let mut engine = ready_engine();
    let day = DayRecord {
        date: today(),
        meals: vec![meal_kcal("12:00", 1600.0), meal_kcal("18:00", 1600.0)],
        ..DayRecord::default()
    };

    let snapshot = engine
        .compute(&day, &[], &profile_with(GoalMode::Deficit), 1200)
        .unwrap();
    assert!((snapshot.daily_contribution.dcs + 0.7).abs() < 1e-9);
    assert_eq!(
        snapshot.daily_contribution.override_applied,
        Some(DcsOverride::DeficitSevere)
    );
}
