// ABOUTME: Fixed behavioral constants for the momentum pipeline, grouped by domain
// ABOUTME: Tunable curve parameters live in config.rs; these values define the score's meaning
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

//! Structural constants of the momentum score.
//!
//! Changing any value here changes what a stored Daily Contribution Score
//! means, which is why the history store purges itself on schema-version
//! mismatch instead of migrating old entries.

/// Momentum normalization and aggregation.
pub mod momentum {
    /// Daily score at which the contribution saturates at 1.0.
    /// A strong day (3 quality meals, a training, good sleep, steps on goal)
    /// lands around 8-10 points.
    pub const MOMENTUM_TARGET: f64 = 10.0;

    /// Lower clamp of the Daily Contribution Score.
    pub const DCS_FLOOR: f64 = -0.3;

    /// Upper clamp of the Daily Contribution Score.
    pub const DCS_CEILING: f64 = 1.0;

    /// Per-day decay of historical contributions (yesterday weighs 1.0,
    /// each day further back multiplies by this).
    pub const DECAY_ALPHA: f64 = 0.95;

    /// Aggregation window in days (today plus 29 prior days).
    pub const WINDOW_DAYS: usize = 30;

    /// Cap of the same-day boost added on top of the decayed base.
    pub const TODAY_BOOST_FACTOR: f64 = 0.03;

    /// Trend threshold: |recent mean - prior mean| below this reads as flat.
    pub const TREND_THRESHOLD: f64 = 0.05;

    /// A day counts toward the peak streak when its DCS reaches this value.
    pub const PEAK_DCS_THRESHOLD: f64 = 0.5;
}

/// Momentum-state classification thresholds (applied to CRS).
pub mod states {
    /// CRS at or above this is a Strong pattern.
    pub const STRONG_CRS: f64 = 0.75;

    /// CRS at or above this is Growing.
    pub const GROWING_CRS: f64 = 0.45;

    /// CRS at or above this is Building.
    pub const BUILDING_CRS: f64 = 0.20;

    /// CRS strictly above this is Recovery; at or below is Broken.
    pub const RECOVERY_CRS: f64 = 0.05;
}

/// History retention and baseline windows.
pub mod windows {
    /// Persisted DCS entries older than this are pruned.
    pub const HISTORY_RETENTION_DAYS: i64 = 35;

    /// Days of history the retroactive estimator may fill.
    pub const BACKFILL_WINDOW_DAYS: usize = 30;

    /// Days of raw records consulted for personalized baselines.
    pub const BASELINE_WINDOW_DAYS: usize = 14;

    /// Minimum non-zero samples before a personalized baseline replaces the
    /// population default.
    pub const MIN_BASELINE_SAMPLES: usize = 3;

    /// Surrounding-day radius the estimator uses to reconstruct a chronotype
    /// baseline for a historical day.
    pub const ESTIMATOR_CONTEXT_RADIUS_DAYS: usize = 15;
}

/// Personalized-ceiling calibration.
pub mod ceiling {
    /// Base multiplier before consistency/diversity scaling.
    pub const BASE_FACTOR: f64 = 0.65;

    /// Maximum consistency bonus (multiplier becomes 1.0 + this).
    pub const CONSISTENCY_MAX_BONUS: f64 = 0.3;

    /// Minimum DCS samples before consistency is trusted.
    pub const MIN_CONSISTENCY_SAMPLES: usize = 5;

    /// Maximum diversity bonus across all factor categories.
    pub const DIVERSITY_MAX_BONUS: f64 = 0.15;

    /// Number of behavioral factor categories counted for diversity.
    pub const FACTOR_CATEGORIES: usize = 9;

    /// Days with data (out of the last 30) before a category counts as
    /// activated.
    pub const ACTIVATION_MIN_DAYS: usize = 3;

    /// Additive bonus per full week of any-data history.
    pub const DATA_DEPTH_STEP: f64 = 0.03;

    /// Weeks of history after which data depth saturates.
    pub const DATA_DEPTH_MAX_WEEKS: usize = 4;
}

/// Hard floors and windows for meal scoring.
pub mod meals {
    /// Product-index harm score at or above which an item is a violation.
    pub const HARM_SCORE_THRESHOLD: f64 = 7.0;

    /// Meals at or after this clock minute (23:00) are hard late violations.
    pub const LATE_MEAL_MIN: u32 = 1380;

    /// Night-eating window start, normalized minutes (00:00 -> 1440).
    pub const NIGHT_WINDOW_START_MIN: u32 = 1440;

    /// Night-eating window end, normalized minutes (06:00 -> 1800).
    pub const NIGHT_WINDOW_END_MIN: u32 = 1800;

    /// Weight forced on a hard meal violation regardless of quality.
    pub const VIOLATION_WEIGHT: f64 = -1.0;

    /// Quality score below which a meal breaks the chain even without a hard
    /// violation.
    pub const LOW_QUALITY_BREAK: f64 = 20.0;
}

/// Hard floors for sleep scoring.
pub mod sleep {
    /// Onsets at or past this normalized minute (02:00) hit the worst-case
    /// floor regardless of chronotype.
    pub const CATASTROPHIC_ONSET_MIN: u32 = 1560;

    /// Weight forced by a catastrophic onset.
    pub const ONSET_FLOOR_WEIGHT: f64 = -2.0;

    /// Sleep below this many hours hits the worst-case duration floor.
    pub const CATASTROPHIC_DURATION_H: f64 = 4.5;

    /// Weight forced by a catastrophic duration.
    pub const DURATION_FLOOR_WEIGHT: f64 = -1.5;

    /// Plausible chronotype band: earliest personalized bedtime (21:00).
    pub const CHRONOTYPE_EARLIEST_MIN: u32 = 1260;

    /// Plausible chronotype band: latest personalized bedtime (01:30,
    /// normalized).
    pub const CHRONOTYPE_LATEST_MIN: u32 = 1530;

    /// Population-default bedtime (23:00) when no history exists.
    pub const DEFAULT_BEDTIME_MIN: u32 = 1380;
}

/// Chain penalty tiers by event-weight severity.
pub mod chain {
    /// Weights at or above this erode the chain by one link.
    pub const LIGHT_SEVERITY_FLOOR: f64 = -0.5;

    /// Weights at or above this (and below the light floor) erode by two.
    pub const MEDIUM_SEVERITY_FLOOR: f64 = -1.5;
}
