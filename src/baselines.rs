// ABOUTME: Personalized baselines derived from the prior 14 days of raw records
// ABOUTME: Medians with population-default fallbacks, chronotype band, per-factor confidence
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use serde::{Deserialize, Serialize};

use crate::config::{SignalConfig, SleepConfig};
use crate::constants::{sleep as sleep_consts, windows};
use crate::models::{DayRecord, UserProfile};

/// Behavioral factor categories. Used for per-factor confidence damping and
/// for the ceiling's diversity count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FactorKind {
    /// Household-activity minutes.
    Household,
    /// Step count.
    Steps,
    /// Training sessions.
    Training,
    /// Sleep onset time.
    SleepOnset,
    /// Sleep duration.
    SleepDuration,
    /// Meals.
    Meals,
    /// Morning weight checkin.
    Checkin,
    /// Body measurements.
    Measurements,
    /// Supplements.
    Supplements,
    /// Inter-meal spacing (requires two or more meals).
    MealSpacing,
}

impl FactorKind {
    /// Whether a raw day carries data for this factor.
    #[must_use]
    pub fn present_in(self, day: &DayRecord) -> bool {
        match self {
            Self::Household => day.household_min > 0,
            Self::Steps => day.steps > 0,
            Self::Training => !day.trainings.is_empty(),
            Self::SleepOnset => day.sleep_onset_min().is_some(),
            Self::SleepDuration => day.resolved_sleep_hours().unwrap_or(0.0) > 0.0,
            Self::Meals => !day.meals.is_empty(),
            Self::Checkin => day.has_checkin(),
            Self::Measurements => day.has_measurements(),
            Self::Supplements => day.supplements_taken > 0,
            Self::MealSpacing => day.meals.len() >= 2,
        }
    }
}

/// Median of a slice; averages the middle pair for even lengths.
fn median(values: &mut Vec<f64>) -> Option<f64> {
    if values.is_empty() {
        return None;
    }
    values.sort_by(|a, b| a.partial_cmp(b).unwrap_or(std::cmp::Ordering::Equal));
    let mid = values.len() / 2;
    if values.len() % 2 == 0 {
        Some((values[mid - 1] + values[mid]) / 2.0)
    } else {
        Some(values[mid])
    }
}

/// Sample standard deviation (population formula; the windows are tiny).
fn stdev(values: &[f64]) -> f64 {
    if values.len() < 2 {
        return 0.0;
    }
    let mean = values.iter().sum::<f64>() / values.len() as f64;
    let variance =
        values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    variance.sqrt()
}

/// Personalized baselines for one computation. Rebuilt every call from the
/// prior-day window; nothing here is persisted.
#[derive(Debug, Clone)]
pub struct PersonalBaselines {
    /// Median non-zero household minutes, else the population default.
    pub household_baseline_min: f64,

    /// Median non-zero steps, else the profile goal.
    pub steps_baseline: f64,

    /// Chronotype-adjusted optimal bedtime in normalized minutes, clamped to
    /// the plausible band.
    pub chronotype_bedtime_min: f64,

    /// Personalized optimal sleep duration (hours), including the recovery
    /// extension after a high-load training day.
    pub optimal_sleep_hours: f64,

    /// Days (of the baseline window) with data, per factor.
    coverage: Vec<(FactorKind, usize)>,

    /// Consecutive prior days without household activity.
    pub household_missing_streak: u32,

    /// Consecutive prior days without training.
    pub training_missing_streak: u32,

    /// Consecutive prior days with a weight checkin.
    pub checkin_streak: u32,

    /// Consecutive prior days with full supplement adherence.
    pub supplements_full_streak: u32,

    /// Stdev of morning weight over the last 7 recorded checkins.
    pub weight_stdev_kg: f64,

    /// Days since the last measurement, if any prior day has one.
    pub last_measurement_age_days: Option<u32>,
}

const CONFIDENCE_FULL_DAYS: f64 = 7.0;
const CONFIDENCE_FLOOR: f64 = 0.1;

impl PersonalBaselines {
    /// Build baselines from prior days (`prior[0]` = yesterday) plus profile
    /// defaults. Only the first 14 entries participate in medians and
    /// confidence; streak helpers scan from yesterday backward.
    #[must_use]
    pub fn from_history(
        prior: &[DayRecord],
        profile: &UserProfile,
        signals: &SignalConfig,
        sleep: &SleepConfig,
    ) -> Self {
        let window: Vec<&DayRecord> =
            prior.iter().take(windows::BASELINE_WINDOW_DAYS).collect();

        let mut household: Vec<f64> = window
            .iter()
            .filter(|d| d.household_min > 0)
            .map(|d| f64::from(d.household_min))
            .collect();
        let household_baseline_min = if household.len() >= windows::MIN_BASELINE_SAMPLES {
            median(&mut household).unwrap_or(signals.household_default_min)
        } else {
            signals.household_default_min
        };

        let mut steps: Vec<f64> = window
            .iter()
            .filter(|d| d.steps > 0)
            .map(|d| f64::from(d.steps))
            .collect();
        let steps_baseline = if steps.len() >= windows::MIN_BASELINE_SAMPLES {
            median(&mut steps).unwrap_or(f64::from(profile.steps_goal))
        } else {
            f64::from(profile.steps_goal)
        };

        let chronotype_bedtime_min = Self::chronotype_bedtime(&window);
        let optimal_sleep_hours = Self::optimal_sleep(&window, prior, sleep);

        let coverage = [
            FactorKind::Household,
            FactorKind::Steps,
            FactorKind::Training,
            FactorKind::SleepOnset,
            FactorKind::SleepDuration,
            FactorKind::Meals,
            FactorKind::Checkin,
            FactorKind::Measurements,
            FactorKind::Supplements,
            FactorKind::MealSpacing,
        ]
        .into_iter()
        .map(|factor| {
            let days = window.iter().filter(|d| factor.present_in(d)).count();
            (factor, days)
        })
        .collect();

        let household_missing_streak =
            Self::leading_streak(prior, |d| d.household_min == 0);
        let training_missing_streak =
            Self::leading_streak(prior, |d| d.trainings.is_empty());
        let checkin_streak = Self::leading_streak(prior, DayRecord::has_checkin);
        let supplements_full_streak = Self::leading_streak(prior, |d| {
            let planned = d
                .supplements_planned
                .unwrap_or(profile.planned_supplements);
            planned > 0 && d.supplements_taken >= planned
        });

        let weights: Vec<f64> = prior
            .iter()
            .filter_map(|d| d.weight_morning)
            .filter(|w| *w > 0.0)
            .take(7)
            .collect();
        let weight_stdev_kg = stdev(&weights);

        let last_measurement_age_days = prior
            .iter()
            .position(DayRecord::has_measurements)
            .map(|idx| idx as u32 + 1);

        Self {
            household_baseline_min,
            steps_baseline,
            chronotype_bedtime_min,
            optimal_sleep_hours,
            coverage,
            household_missing_streak,
            training_missing_streak,
            checkin_streak,
            supplements_full_streak,
            weight_stdev_kg,
            last_measurement_age_days,
        }
    }

    /// Median prior sleep onset clamped to the plausible chronotype band.
    fn chronotype_bedtime(window: &[&DayRecord]) -> f64 {
        let mut onsets: Vec<f64> = window
            .iter()
            .filter_map(|d| d.sleep_onset_min())
            .map(f64::from)
            .collect();
        let raw = if onsets.len() >= windows::MIN_BASELINE_SAMPLES {
            median(&mut onsets).unwrap_or(f64::from(sleep_consts::DEFAULT_BEDTIME_MIN))
        } else {
            f64::from(sleep_consts::DEFAULT_BEDTIME_MIN)
        };
        raw.clamp(
            f64::from(sleep_consts::CHRONOTYPE_EARLIEST_MIN),
            f64::from(sleep_consts::CHRONOTYPE_LATEST_MIN),
        )
    }

    /// Median prior duration clamped to [7, 9] hours, extended when yesterday
    /// carried a high training load (recovery need).
    fn optimal_sleep(window: &[&DayRecord], prior: &[DayRecord], sleep: &SleepConfig) -> f64 {
        let mut durations: Vec<f64> = window
            .iter()
            .filter_map(|d| d.resolved_sleep_hours())
            .filter(|h| *h > 0.0)
            .collect();
        let base = if durations.len() >= windows::MIN_BASELINE_SAMPLES {
            median(&mut durations).unwrap_or(8.0)
        } else {
            8.0
        };
        let mut optimal = base.clamp(7.0, 9.0);

        let yesterday_load: f64 = prior
            .first()
            .map(|d| d.trainings.iter().map(super::models::TrainingSession::load).sum())
            .unwrap_or(0.0);
        if yesterday_load >= sleep.high_load_threshold {
            optimal += sleep.recovery_extension_h;
        }
        optimal
    }

    fn leading_streak(prior: &[DayRecord], predicate: impl Fn(&DayRecord) -> bool) -> u32 {
        prior.iter().take_while(|d| predicate(d)).count() as u32
    }

    /// Confidence multiplier for a factor: data on >= 7 of the last 14 days
    /// earns full trust, thinning linearly to a 0.1 floor with no history.
    #[must_use]
    pub fn confidence(&self, factor: FactorKind) -> f64 {
        let days = self
            .coverage
            .iter()
            .find(|(f, _)| *f == factor)
            .map_or(0, |(_, days)| *days);
        (days as f64 / CONFIDENCE_FULL_DAYS).clamp(CONFIDENCE_FLOOR, 1.0)
    }
}
