// ABOUTME: Ceiling calibrator - personalized maximum attainable momentum
// ABOUTME: Consistency of recent contributions, behavioral diversity, and data depth
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use chrono::{Days, NaiveDate};

use crate::baselines::FactorKind;
use crate::constants::ceiling as ceiling_consts;
use crate::history::DcsHistory;
use crate::models::DayRecord;

/// The nine factor categories counted for behavioral diversity. Meals are
/// deliberately absent: everybody eats, so meals alone say nothing about how
/// broadly the user tracks.
const DIVERSITY_CATEGORIES: [FactorKind; 9] = [
    FactorKind::Household,
    FactorKind::SleepOnset,
    FactorKind::SleepDuration,
    FactorKind::Steps,
    FactorKind::Checkin,
    FactorKind::Measurements,
    FactorKind::Supplements,
    FactorKind::MealSpacing,
    FactorKind::Training,
];

/// Compute the personalized ceiling from the last 30 days of contributions
/// plus the last 30 raw records. Cheap enough to recompute every call;
/// nothing here is persisted.
///
/// Always in `(0, 1]`: the base factor alone guarantees a positive floor.
#[must_use]
pub fn calibrate(history: &DcsHistory, raw_days: &[DayRecord], today: NaiveDate) -> f64 {
    let window_start = today
        .checked_sub_days(Days::new(30))
        .unwrap_or(NaiveDate::MIN);

    let recent: Vec<f64> = history
        .entries
        .iter()
        .filter(|(date, _)| **date > window_start && **date <= today)
        .map(|(_, entry)| entry.dcs)
        .collect();
    let consistency = consistency_multiplier(&recent);

    let in_window: Vec<&DayRecord> = raw_days
        .iter()
        .filter(|d| d.date > window_start && d.date <= today)
        .collect();

    let activated = DIVERSITY_CATEGORIES
        .iter()
        .filter(|category| {
            in_window
                .iter()
                .filter(|day| category.present_in(day))
                .count()
                >= ceiling_consts::ACTIVATION_MIN_DAYS
        })
        .count();
    let diversity = 1.0
        + (activated as f64 / ceiling_consts::FACTOR_CATEGORIES as f64)
            * ceiling_consts::DIVERSITY_MAX_BONUS;

    let days_with_data = in_window.iter().filter(|d| !d.is_empty_record()).count();
    let depth = ceiling_consts::DATA_DEPTH_STEP
        * ceiling_consts::DATA_DEPTH_MAX_WEEKS.min(days_with_data / 7) as f64;

    (ceiling_consts::BASE_FACTOR * consistency * diversity + depth).min(1.0)
}

/// Consistency bonus: a low coefficient of variation across recent
/// contributions raises the ceiling. Requires enough samples and a positive
/// mean to be meaningful; otherwise neutral.
fn consistency_multiplier(recent: &[f64]) -> f64 {
    if recent.len() < ceiling_consts::MIN_CONSISTENCY_SAMPLES {
        return 1.0;
    }
    let mean = recent.iter().sum::<f64>() / recent.len() as f64;
    if mean <= f64::EPSILON {
        return 1.0;
    }
    let variance =
        recent.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / recent.len() as f64;
    let stdev = variance.sqrt();
    1.0 + ((1.0 - stdev / mean) * ceiling_consts::CONSISTENCY_MAX_BONUS)
        .clamp(0.0, ceiling_consts::CONSISTENCY_MAX_BONUS)
}
