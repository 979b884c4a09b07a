// ABOUTME: Configuration-driven tunables for the momentum pipeline replacing magic numbers
// ABOUTME: One EngineConfig of nested sections with documented defaults and range validation
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A tunable is outside its documented range.
    #[error("invalid threshold: {0}")]
    InvalidThreshold(String),
}

/// Adaptive-ratio and streak parameters for the simple factors.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SignalConfig {
    /// Population-default household baseline (minutes) before personalization.
    pub household_default_min: f64,

    /// Log-curve gain for household activity.
    pub household_log_gain: f64,

    /// Weight at exactly the personalized household baseline.
    pub household_midpoint: f64,

    /// Household weight clamp.
    pub household_range: (f64, f64),

    /// Steps tanh curve: weight = tanh((ratio - offset) * gain).
    pub steps_ratio_offset: f64,

    /// Steps tanh gain.
    pub steps_gain: f64,

    /// Steps weight clamp.
    pub steps_range: (f64, f64),

    /// Training sqrt curve gain: weight = sqrt(load / 30) * gain.
    pub training_gain: f64,

    /// Training per-session weight clamp.
    pub training_range: (f64, f64),

    /// Same-day repeat-session multipliers (2nd, 3rd and later).
    pub training_repeat_multipliers: (f64, f64),

    /// Missed-habit streak penalties: (per-day step, floor) for household.
    pub household_streak_penalty: (f64, f64),

    /// Missed-habit streak penalties: (per-day step, floor) for training.
    pub training_streak_penalty: (f64, f64),

    /// Days of absence tolerated before a streak penalty engages.
    pub streak_grace_days: u32,

    /// Checkin base weight plus streak and weight-stability bonuses.
    pub checkin_base: f64,
    /// Bonus when the checkin streak reaches `checkin_streak_days`.
    pub checkin_streak_bonus: f64,
    /// Consecutive prior checkin days required for the streak bonus.
    pub checkin_streak_days: u32,
    /// Bonus when 7-day weight stdev stays under `checkin_stability_stdev_kg`.
    pub checkin_stability_bonus: f64,
    /// Stdev threshold (kg) for the stability bonus.
    pub checkin_stability_stdev_kg: f64,

    /// Anti-double-count multiplier when measurements were also taken within
    /// the previous two days.
    pub measurements_recent_damp: f64,
    /// Penalty when the last measurement is older than 7 days.
    pub measurements_stale_penalty: f64,
    /// Penalty when the last measurement is older than 14 days.
    pub measurements_very_stale_penalty: f64,

    /// Supplement ratio weights: full plan, at least half, below half.
    pub supplements_weights: (f64, f64, f64),
    /// Bonus when full adherence held for `supplements_streak_days`.
    pub supplements_streak_bonus: f64,
    /// Consecutive full-adherence days required for the bonus.
    pub supplements_streak_days: u32,
}

impl Default for SignalConfig {
    fn default() -> Self {
        Self {
            household_default_min: 45.0,
            household_log_gain: 0.4,
            household_midpoint: 0.5,
            household_range: (-0.3, 1.0),
            steps_ratio_offset: 0.6,
            steps_gain: 2.0,
            steps_range: (-0.3, 1.0),
            training_gain: 1.2,
            training_range: (0.3, 2.5),
            training_repeat_multipliers: (0.5, 0.25),
            household_streak_penalty: (-0.1, -0.3),
            training_streak_penalty: (-0.15, -0.5),
            streak_grace_days: 2,
            checkin_base: 0.5,
            checkin_streak_bonus: 0.2,
            checkin_streak_days: 3,
            checkin_stability_bonus: 0.1,
            checkin_stability_stdev_kg: 0.3,
            measurements_recent_damp: 0.3,
            measurements_stale_penalty: -0.1,
            measurements_very_stale_penalty: -0.3,
            supplements_weights: (0.5, 0.2, -0.2),
            supplements_streak_bonus: 0.2,
            supplements_streak_days: 5,
        }
    }
}

/// Sleep-factor curve parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SleepConfig {
    /// Late-onset tanh penalty scale.
    pub onset_penalty_scale: f64,

    /// Early-onset tanh bonus scale.
    pub onset_bonus_scale: f64,

    /// Tanh steepness divisor in hours for onset deviation.
    pub onset_tanh_hours: f64,

    /// Gaussian sigma (hours) of the duration bell.
    pub duration_sigma_h: f64,

    /// Peak-to-trough span of the duration bell (weight = span * bell - 1).
    pub duration_span: f64,

    /// Under-sleep deviations are stretched by this factor before the bell.
    pub under_sleep_asymmetry: f64,

    /// Extra optimal-duration hours after a high-load training day.
    pub recovery_extension_h: f64,

    /// Prior-day training load considered "high" for the recovery extension.
    pub high_load_threshold: f64,
}

impl Default for SleepConfig {
    fn default() -> Self {
        Self {
            onset_penalty_scale: 1.8,
            onset_bonus_scale: 0.6,
            onset_tanh_hours: 1.5,
            duration_sigma_h: 1.4,
            duration_span: 2.0,
            under_sleep_asymmetry: 1.3,
            recovery_extension_h: 0.5,
            high_load_threshold: 60.0,
        }
    }
}

/// Meal scoring parameters: quality remap, circadian bands, calorie penalty.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MealConfig {
    /// Quality remap midpoint: weight = (quality - midpoint) / scale.
    pub quality_midpoint: f64,
    /// Quality remap scale.
    pub quality_scale: f64,
    /// Quality-derived weight clamp.
    pub weight_range: (f64, f64),

    /// Circadian multiplier for breakfast-band meals.
    pub breakfast_multiplier: f64,
    /// Breakfast band (clock minutes, inclusive start / exclusive end).
    pub breakfast_band_min: (u32, u32),
    /// Circadian multiplier for meals close to the chronotype bedtime.
    pub pre_bed_multiplier: f64,
    /// How close to bedtime (minutes) the damped multiplier applies.
    pub pre_bed_window_min: u32,

    /// Cumulative-calorie penalty threshold ratios by goal mode
    /// (deficit, maintenance, bulk).
    pub kcal_penalty_thresholds: (f64, f64, f64),
    /// Penalty strengths by goal mode (deficit, maintenance, bulk).
    pub kcal_penalty_strengths: (f64, f64, f64),
    /// Logistic steepness of the overshoot penalty.
    pub kcal_penalty_steepness: f64,

    /// Weight used when the external quality scorer is unavailable and the
    /// meal carries no hard violation.
    pub fallback_weight: f64,
}

impl Default for MealConfig {
    fn default() -> Self {
        Self {
            quality_midpoint: 40.0,
            quality_scale: 40.0,
            weight_range: (-1.0, 1.5),
            breakfast_multiplier: 1.2,
            breakfast_band_min: (360, 600),
            pre_bed_multiplier: 0.7,
            pre_bed_window_min: 120,
            kcal_penalty_thresholds: (1.0, 1.1, 1.3),
            kcal_penalty_strengths: (1.0, 0.7, 0.4),
            kcal_penalty_steepness: 6.0,
            fallback_weight: 0.5,
        }
    }
}

/// Inter-meal spacing (insulin-wave proxy) parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpacingConfig {
    /// Gaps shorter than this (minutes) accumulate overlap.
    pub overlap_gap_min: f64,

    /// Overlap logistic midpoint (total overlap minutes).
    pub overlap_midpoint_min: f64,

    /// Overlap logistic steepness divisor.
    pub overlap_steepness_min: f64,

    /// Maximum overlap penalty magnitude.
    pub overlap_penalty_scale: f64,

    /// Night-fast hours at which the fasting bonus is half-saturated.
    pub night_fast_midpoint_h: f64,

    /// Night-fast tanh steepness divisor (hours).
    pub night_fast_steepness_h: f64,

    /// Maximum night-fast bonus.
    pub night_fast_bonus_scale: f64,

    /// Bonus when a meal lands within the post-training window.
    pub post_training_bonus: f64,

    /// Post-training window length (minutes).
    pub post_training_window_min: u32,
}

impl Default for SpacingConfig {
    fn default() -> Self {
        Self {
            overlap_gap_min: 180.0,
            overlap_midpoint_min: 60.0,
            overlap_steepness_min: 25.0,
            overlap_penalty_scale: 0.8,
            night_fast_midpoint_h: 11.0,
            night_fast_steepness_h: 2.0,
            night_fast_bonus_scale: 0.5,
            post_training_bonus: 0.2,
            post_training_window_min: 120,
        }
    }
}

/// Cross-factor synergy bonuses.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SynergyConfig {
    /// Total synergy cap.
    pub total_cap: f64,

    /// Rest day + adequate sleep + no overeating.
    pub rest_day_recovery: f64,

    /// Two or more high-quality meals + positive spacing.
    pub quality_meals_spacing: f64,

    /// Checkin + activity before noon.
    pub checkin_early_activity: f64,

    /// Six or more distinct positive factor types.
    pub full_stack_day: f64,

    /// Meal weight that counts as "high quality" for the synergy check.
    pub quality_meal_weight: f64,

    /// Sleep-duration weight that counts as "adequate" for the rest-day combo.
    pub adequate_sleep_weight: f64,

    /// Positive factor types required for the full-stack bonus.
    pub full_stack_factors: usize,
}

impl Default for SynergyConfig {
    fn default() -> Self {
        Self {
            total_cap: 1.3,
            rest_day_recovery: 0.4,
            quality_meals_spacing: 0.4,
            checkin_early_activity: 0.25,
            full_stack_day: 0.5,
            quality_meal_weight: 0.8,
            adequate_sleep_weight: 0.5,
            full_stack_factors: 6,
        }
    }
}

/// Contribution-normalizer override values.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OverrideConfig {
    /// Harmful night eating combined with >150% calories.
    pub critical_combined: f64,

    /// Harmful night eating alone.
    pub night_harm: f64,

    /// Calorie overrun (>150%) alone.
    pub calorie_overrun: f64,

    /// Ratio over target that triggers the generic overrun overrides.
    pub overrun_ratio: f64,

    /// Deficit tier: ratio > 1.5 x tolerance.
    pub deficit_severe: f64,

    /// Deficit tier: ratio > critical_over x tolerance.
    pub deficit_high: f64,

    /// Tightened clamp floor when ratio > target_max x tolerance on deficit.
    pub deficit_tight_floor: f64,

    /// Extra allowance multiplier on training days before deficit tiers
    /// engage.
    pub training_day_tolerance: f64,

    /// Bulk goal: overruns up to this ratio waive the generic overrides.
    pub bulk_exemption_ratio: f64,
}

impl Default for OverrideConfig {
    fn default() -> Self {
        Self {
            critical_combined: -1.0,
            night_harm: -0.8,
            calorie_overrun: -0.6,
            overrun_ratio: 1.5,
            deficit_severe: -0.7,
            deficit_high: -0.5,
            deficit_tight_floor: -0.4,
            training_day_tolerance: 1.2,
            bulk_exemption_ratio: 1.8,
        }
    }
}

/// Readiness-guard parameters.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GuardConfig {
    /// Milliseconds after the first computation attempt before the guard
    /// falls through to best-effort output.
    pub ready_timeout_ms: u64,
}

impl Default for GuardConfig {
    fn default() -> Self {
        Self {
            ready_timeout_ms: 5000,
        }
    }
}

/// Retroactive-estimator calibration. Hand-tuned approximations of the full
/// pipeline; treat as defaults to validate empirically.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BackfillConfig {
    /// Time-band meal scores standing in for the full quality lookup:
    /// breakfast, day, evening, late, night bands.
    pub meal_band_weights: (f64, f64, f64, f64, f64),

    /// Synergy proxy: bonus per positive factor counted.
    pub synergy_per_factor: f64,

    /// Synergy proxy cap.
    pub synergy_cap: f64,

    /// Proportional household weight per hour of activity, capped at 1.0.
    pub household_per_hour: f64,

    /// Flat checkin weight.
    pub checkin_weight: f64,

    /// Supplements full-adherence weight (scaled by the taken/planned ratio).
    pub supplements_weight: f64,
}

impl Default for BackfillConfig {
    fn default() -> Self {
        Self {
            meal_band_weights: (1.0, 0.8, 0.5, -0.5, -1.0),
            synergy_per_factor: 0.15,
            synergy_cap: 0.6,
            household_per_hour: 0.5,
            checkin_weight: 0.5,
            supplements_weight: 0.5,
        }
    }
}

/// Complete engine configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    /// Simple-factor tunables.
    pub signals: SignalConfig,
    /// Sleep curve tunables.
    pub sleep: SleepConfig,
    /// Meal scoring tunables.
    pub meals: MealConfig,
    /// Inter-meal spacing tunables.
    pub spacing: SpacingConfig,
    /// Synergy bonuses.
    pub synergy: SynergyConfig,
    /// Contribution overrides.
    pub overrides: OverrideConfig,
    /// Readiness guard.
    pub guard: GuardConfig,
    /// Retroactive estimator calibration.
    pub backfill: BackfillConfig,
}

impl EngineConfig {
    /// Validate cross-field invariants the type system cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.synergy.total_cap < 0.0 {
            return Err(ConfigError::InvalidThreshold(
                "synergy total_cap must be non-negative".into(),
            ));
        }
        if self.meals.quality_scale <= 0.0 {
            return Err(ConfigError::InvalidThreshold(
                "meal quality_scale must be positive".into(),
            ));
        }
        if self.sleep.duration_sigma_h <= 0.0 {
            return Err(ConfigError::InvalidThreshold(
                "sleep duration_sigma_h must be positive".into(),
            ));
        }
        if self.overrides.training_day_tolerance < 1.0 {
            return Err(ConfigError::InvalidThreshold(
                "training_day_tolerance below 1.0 would penalize training days".into(),
            ));
        }
        Ok(())
    }
}
