// ABOUTME: Optional-capability seam for the external meal-quality collaborator
// ABOUTME: Default time-band scorer makes the fallback path a visible, testable branch
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use crate::models::{parse_clock_time, Meal};

/// Prices a meal on a 0-100 quality scale.
///
/// The production implementation lives outside this crate (it consults the
/// nutrition database and product index). The engine only needs the score;
/// `None` means the collaborator could not price this meal, and scoring falls
/// back to [`crate::config::MealConfig::fallback_weight`].
pub trait MealQualityScorer {
    /// Score a meal against the day's calorie target. Returns 0-100.
    fn score_meal(&self, meal: &Meal, target_kcal: f64) -> Option<f64>;
}

/// Built-in fallback scorer using clock-time bands and crude composition
/// checks. Deliberately simpler than the external collaborator - it exists so
/// the engine (and the retroactive estimator) behave sensibly without one.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeBandQualityScorer;

impl TimeBandQualityScorer {
    /// Band score by clock time: morning meals price best, night meals worst.
    fn band_score(time_min: Option<u32>) -> f64 {
        match time_min {
            // Night eating (00:00-06:00).
            Some(t) if t < 360 => 25.0,
            // Breakfast band.
            Some(t) if t < 600 => 72.0,
            // Midday.
            Some(t) if t < 900 => 66.0,
            // Afternoon / early evening.
            Some(t) if t < 1140 => 60.0,
            // Evening.
            Some(t) if t < 1380 => 52.0,
            // Late (23:00+).
            Some(_) => 35.0,
            // Untimed meals price neutral.
            None => 55.0,
        }
    }
}

impl MealQualityScorer for TimeBandQualityScorer {
    fn score_meal(&self, meal: &Meal, target_kcal: f64) -> Option<f64> {
        let time_min = meal.time.as_deref().and_then(parse_clock_time);
        let mut score = Self::band_score(time_min);

        if meal.has_harmful_item() {
            score = score.min(20.0);
        }

        // Oversized single meals (above ~40% of the daily target) price down.
        if target_kcal > 0.0 && meal.kcal() > target_kcal * 0.4 {
            score -= 12.0;
        }

        Some(score.clamp(0.0, 100.0))
    }
}

/// A scorer that always declines, exercising the engine's fallback branch.
/// Used by tests; production callers simply omit the collaborator instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoQualityScorer;

impl MealQualityScorer for NoQualityScorer {
    fn score_meal(&self, _meal: &Meal, _target_kcal: f64) -> Option<f64> {
        None
    }
}
