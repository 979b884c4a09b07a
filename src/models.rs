// ABOUTME: Input data model - one day's raw health/behavior record plus user goal parameters
// ABOUTME: Owned by the surrounding application; the engine only reads these structures
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Minutes in a full day, used when normalizing after-midnight clock times.
pub const MINUTES_PER_DAY: u32 = 1440;

/// Parse a `"HH:MM"` clock string into minutes from midnight.
///
/// Tolerates `"H:MM"`; anything else yields `None` (malformed times are
/// "no signal", never an error).
#[must_use]
pub fn parse_clock_time(value: &str) -> Option<u32> {
    let (hours, minutes) = value.split_once(':')?;
    let hours: u32 = hours.trim().parse().ok()?;
    let minutes: u32 = minutes.trim().parse().ok()?;
    if hours > 23 || minutes > 59 {
        return None;
    }
    Some(hours * 60 + minutes)
}

/// Normalize a minutes-from-midnight value so that early-morning times sort
/// after the previous evening (03:00 becomes 27:00). Used for sleep onsets
/// and night-eating windows.
#[must_use]
pub const fn normalize_past_midnight(minutes: u32) -> u32 {
    if minutes < 360 {
        minutes + MINUTES_PER_DAY
    } else {
        minutes
    }
}

/// One food item inside a meal, priced by the external nutrition index.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FoodItem {
    /// Display name (unused by scoring, kept for labels).
    #[serde(default)]
    pub name: Option<String>,

    /// Portion in grams.
    #[serde(default)]
    pub grams: Option<f64>,

    /// Calories per 100 g from the product index.
    #[serde(default)]
    pub kcal_per_100g: Option<f64>,

    /// Harm score from the product index (0-10).
    #[serde(default)]
    pub harm_score: Option<f64>,
}

impl FoodItem {
    /// Calories contributed by this item.
    #[must_use]
    pub fn kcal(&self) -> f64 {
        let grams = self.grams.unwrap_or(100.0);
        self.kcal_per_100g.unwrap_or(0.0) * grams / 100.0
    }

    /// Whether the product index flags this item as harmful.
    #[must_use]
    pub fn is_harmful(&self) -> bool {
        self.harm_score.unwrap_or(0.0) >= crate::constants::meals::HARM_SCORE_THRESHOLD
    }
}

/// One meal: a time-of-day plus a list of food items.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Meal {
    /// `"HH:MM"` clock time, if recorded.
    #[serde(default)]
    pub time: Option<String>,

    /// Food items in this meal.
    #[serde(default)]
    pub items: Vec<FoodItem>,
}

impl Meal {
    /// Total calories across items.
    #[must_use]
    pub fn kcal(&self) -> f64 {
        self.items.iter().map(FoodItem::kcal).sum()
    }

    /// Whether any item is flagged harmful.
    #[must_use]
    pub fn has_harmful_item(&self) -> bool {
        self.items.iter().any(FoodItem::is_harmful)
    }

    /// Parsed clock time in minutes from midnight.
    #[must_use]
    pub fn time_min(&self) -> Option<u32> {
        self.time.as_deref().and_then(parse_clock_time)
    }
}

/// Training session kind; drives intensity multipliers and duration defaults.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrainingKind {
    /// Steady-state cardio.
    Cardio,
    /// Resistance training.
    Strength,
    /// High-intensity intervals.
    Hiit,
    /// Yoga session.
    Yoga,
    /// Stretching / mobility work.
    Stretching,
    /// Anything else.
    Other,
}

impl TrainingKind {
    /// Default duration in minutes when neither explicit duration nor zone
    /// minutes were recorded.
    #[must_use]
    pub const fn default_duration_min(self) -> f64 {
        match self {
            Self::Cardio => 40.0,
            Self::Strength => 50.0,
            Self::Hiit => 30.0,
            Self::Yoga => 60.0,
            Self::Stretching => 30.0,
            Self::Other => 40.0,
        }
    }

    /// Intensity multiplier applied to duration when computing session load.
    #[must_use]
    pub const fn intensity_multiplier(self) -> f64 {
        match self {
            Self::Cardio => 1.0,
            Self::Strength => 1.1,
            Self::Hiit => 1.5,
            Self::Yoga => 0.7,
            Self::Stretching => 0.6,
            Self::Other => 1.0,
        }
    }
}

/// One training session.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TrainingSession {
    /// `"HH:MM"` clock time, if recorded.
    #[serde(default)]
    pub time: Option<String>,

    /// Explicit duration in minutes.
    #[serde(default)]
    pub duration_min: Option<f64>,

    /// Minutes spent per intensity zone (z1..z5), when the session was
    /// recorded with a zone breakdown.
    #[serde(default)]
    pub zone_minutes: Option<Vec<f64>>,

    /// Session kind.
    #[serde(default)]
    pub kind: Option<TrainingKind>,
}

/// Per-zone load multipliers for z1..z5 breakdowns.
const ZONE_LOAD_MULTIPLIERS: [f64; 5] = [0.8, 1.0, 1.2, 1.5, 1.8];

impl TrainingSession {
    /// Duration resolution order: explicit duration, sum of zone minutes,
    /// kind default, then a flat 40 minutes.
    #[must_use]
    pub fn resolved_duration_min(&self) -> f64 {
        if let Some(duration) = self.duration_min {
            if duration > 0.0 {
                return duration;
            }
        }
        if let Some(zones) = &self.zone_minutes {
            let total: f64 = zones.iter().sum();
            if total > 0.0 {
                return total;
            }
        }
        self.kind
            .map_or(40.0, TrainingKind::default_duration_min)
    }

    /// Session load: zone-weighted minutes when a breakdown exists, otherwise
    /// duration times the kind's intensity multiplier.
    #[must_use]
    pub fn load(&self) -> f64 {
        if let Some(zones) = &self.zone_minutes {
            let weighted: f64 = zones
                .iter()
                .zip(ZONE_LOAD_MULTIPLIERS.iter())
                .map(|(minutes, multiplier)| minutes * multiplier)
                .sum();
            if weighted > 0.0 {
                return weighted;
            }
        }
        let multiplier = self
            .kind
            .map_or(1.0, TrainingKind::intensity_multiplier);
        self.resolved_duration_min() * multiplier
    }

    /// Parsed clock time in minutes from midnight.
    #[must_use]
    pub fn time_min(&self) -> Option<u32> {
        self.time.as_deref().and_then(parse_clock_time)
    }
}

/// Body measurements taken on a given day. All fields optional; a day counts
/// as "measured" when any field is positive.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Measurements {
    /// Chest circumference (cm).
    #[serde(default)]
    pub chest_cm: Option<f64>,
    /// Waist circumference (cm).
    #[serde(default)]
    pub waist_cm: Option<f64>,
    /// Hip circumference (cm).
    #[serde(default)]
    pub hips_cm: Option<f64>,
    /// Thigh circumference (cm).
    #[serde(default)]
    pub thigh_cm: Option<f64>,
    /// Upper-arm circumference (cm).
    #[serde(default)]
    pub biceps_cm: Option<f64>,
}

impl Measurements {
    const FIELD_COUNT: f64 = 5.0;

    fn fields(&self) -> [Option<f64>; 5] {
        [
            self.chest_cm,
            self.waist_cm,
            self.hips_cm,
            self.thigh_cm,
            self.biceps_cm,
        ]
    }

    /// Whether any measurement was taken.
    #[must_use]
    pub fn has_any(&self) -> bool {
        self.fields().iter().any(|f| f.unwrap_or(0.0) > 0.0)
    }

    /// Fraction of measurement slots filled, in [0, 1].
    #[must_use]
    pub fn completeness(&self) -> f64 {
        let filled = self
            .fields()
            .iter()
            .filter(|f| f.unwrap_or(0.0) > 0.0)
            .count();
        filled as f64 / Self::FIELD_COUNT
    }
}

/// One calendar day's raw record. Immutable per date from the engine's point
/// of view; every field treats its zero value as "no signal".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DayRecord {
    /// Calendar date of the record.
    pub date: NaiveDate,

    /// Meals eaten this day.
    #[serde(default)]
    pub meals: Vec<Meal>,

    /// Training sessions this day.
    #[serde(default)]
    pub trainings: Vec<TrainingSession>,

    /// Sleep onset `"HH:MM"` (evening of this day).
    #[serde(default)]
    pub sleep_start: Option<String>,

    /// Wake-up `"HH:MM"`.
    #[serde(default)]
    pub sleep_end: Option<String>,

    /// Sleep duration in hours, when tracked directly.
    #[serde(default)]
    pub sleep_hours: Option<f64>,

    /// Step count.
    #[serde(default)]
    pub steps: u32,

    /// Household-activity minutes.
    #[serde(default)]
    pub household_min: u32,

    /// Morning body-weight (kg); 0/None means no checkin.
    #[serde(default)]
    pub weight_morning: Option<f64>,

    /// Body measurements, if taken.
    #[serde(default)]
    pub measurements: Option<Measurements>,

    /// Number of supplements taken.
    #[serde(default)]
    pub supplements_taken: u32,

    /// Number of supplements planned for the day (overrides the profile plan).
    #[serde(default)]
    pub supplements_planned: Option<u32>,

    /// Water consumed (ml).
    #[serde(default)]
    pub water_ml: u32,
}

impl DayRecord {
    /// Sleep duration: the tracked value, else derived from onset/wake times.
    #[must_use]
    pub fn resolved_sleep_hours(&self) -> Option<f64> {
        if let Some(hours) = self.sleep_hours {
            if hours > 0.0 {
                return Some(hours);
            }
        }
        let start = self.sleep_start.as_deref().and_then(parse_clock_time)?;
        let end = self.sleep_end.as_deref().and_then(parse_clock_time)?;
        let end = if end < start { end + MINUTES_PER_DAY } else { end };
        Some(f64::from(end - start) / 60.0)
    }

    /// Sleep onset in normalized minutes (after-midnight onsets count past 24 h).
    #[must_use]
    pub fn sleep_onset_min(&self) -> Option<u32> {
        self.sleep_start
            .as_deref()
            .and_then(parse_clock_time)
            .map(normalize_past_midnight)
    }

    /// Whether a morning weight checkin happened.
    #[must_use]
    pub fn has_checkin(&self) -> bool {
        self.weight_morning.unwrap_or(0.0) > 0.0
    }

    /// Whether any measurement was taken.
    #[must_use]
    pub fn has_measurements(&self) -> bool {
        self.measurements.is_some_and(|m| m.has_any())
    }

    /// Total calories across all meals.
    #[must_use]
    pub fn total_kcal(&self) -> f64 {
        self.meals.iter().map(Meal::kcal).sum()
    }

    /// Whether the day carries no signal at all (yields the Empty state).
    #[must_use]
    pub fn is_empty_record(&self) -> bool {
        self.meals.is_empty()
            && self.trainings.is_empty()
            && self.sleep_start.is_none()
            && self.sleep_hours.unwrap_or(0.0) <= 0.0
            && self.steps == 0
            && self.household_min == 0
            && !self.has_checkin()
            && !self.has_measurements()
            && self.supplements_taken == 0
    }
}

/// Goal mode; changes calorie-penalty thresholds in the contribution
/// normalizer.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GoalMode {
    /// Caloric deficit (cutting).
    Deficit,
    /// Maintenance.
    #[default]
    Maintenance,
    /// Caloric surplus (bulking).
    Bulk,
}

/// Daily calorie targets and override ratios for the active goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DailyTargets {
    /// Active goal mode.
    pub goal_mode: GoalMode,

    /// Target calories for the day.
    pub target_kcal: f64,

    /// Ratio over which the deficit floor tightens (consumed/target).
    pub target_max_ratio: f64,

    /// Ratio over which the mid deficit override engages.
    pub critical_over_ratio: f64,
}

impl Default for DailyTargets {
    fn default() -> Self {
        Self {
            goal_mode: GoalMode::Maintenance,
            target_kcal: 2000.0,
            target_max_ratio: 1.05,
            critical_over_ratio: 1.25,
        }
    }
}

/// Per-user parameters consumed from the surrounding application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Daily step goal.
    pub steps_goal: u32,

    /// Daily water norm (ml).
    pub water_norm_ml: u32,

    /// Number of supplements planned per day.
    pub planned_supplements: u32,

    /// Calorie targets for the active goal.
    pub targets: DailyTargets,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            steps_goal: 8000,
            water_norm_ml: 2000,
            planned_supplements: 0,
            targets: DailyTargets::default(),
        }
    }
}
