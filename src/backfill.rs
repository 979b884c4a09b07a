// ABOUTME: Retroactive estimator - degraded approximation of the scoring pipeline for history gaps
// ABOUTME: Time-banded meal proxies, the same training/sleep/steps curves, a locally reconstructed chronotype
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use chrono::{Days, NaiveDate};
use tracing::debug;

use crate::config::EngineConfig;
use crate::constants::{meals as meal_consts, momentum, sleep as sleep_consts, windows};
use crate::history::{DcsEntry, DcsHistory};
use crate::models::{DayRecord, MINUTES_PER_DAY};

/// Approximates the full pipeline's Daily Contribution Score for historical
/// days lacking a clean computed record.
///
/// Deliberately degraded: meal quality comes from clock-time bands instead of
/// the external scorer, confidence damping is dropped, and synergy collapses
/// to a positive-factor count. Directional consistency with the live pipeline
/// is the requirement, not exactness.
pub struct RetroactiveEstimator<'a> {
    config: &'a EngineConfig,
}

/// Baselines reconstructed from the days surrounding a historical date.
struct WindowBaselines {
    chronotype_bedtime_min: f64,
    optimal_sleep_hours: f64,
    steps_baseline: f64,
}

fn median_of(mut values: Vec<f64>) -> Option<f64> {
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

impl<'a> RetroactiveEstimator<'a> {
    /// Build an estimator over the engine configuration.
    #[must_use]
    pub const fn new(config: &'a EngineConfig) -> Self {
        Self { config }
    }

    /// Fill missing or flagged entries for completed days inside the backfill
    /// window. Days whose raw record carries no signal at all are skipped -
    /// an absent day must stay absent, not become a fabricated zero.
    pub fn backfill(&self, history: &mut DcsHistory, raw_days: &[DayRecord], today: NaiveDate) {
        let Some(window_start) =
            today.checked_sub_days(Days::new(windows::BACKFILL_WINDOW_DAYS as u64))
        else {
            return;
        };

        let mut filled = 0usize;
        for day in raw_days {
            if day.date < window_start || day.date >= today || day.is_empty_record() {
                continue;
            }
            let needs_estimate = match history.entry_on(day.date) {
                None => true,
                Some(entry) => entry.flagged,
            };
            if !needs_estimate {
                continue;
            }
            let dcs = self.estimate(day, raw_days);
            history.upsert(day.date, DcsEntry::estimated(dcs));
            filled += 1;
        }
        if filled > 0 {
            debug!(filled, "backfilled history entries");
        }
    }

    /// Estimate one day's DCS from its raw record plus the surrounding days.
    ///
    /// Deterministic: the same record and window always produce the same
    /// value.
    #[must_use]
    pub fn estimate(&self, day: &DayRecord, surrounding: &[DayRecord]) -> f64 {
        let baselines = self.window_baselines(day.date, surrounding);
        let mut score = 0.0;
        let mut positive_factors = 0usize;

        let meals = self.meal_proxy(day);
        score += meals;
        if meals > 0.0 {
            positive_factors += 1;
        }

        let training = self.training_term(day);
        score += training;
        if training > 0.0 {
            positive_factors += 1;
        }

        let onset = self.sleep_onset_term(day, &baselines);
        score += onset;
        if onset > 0.0 {
            positive_factors += 1;
        }

        let duration = self.sleep_duration_term(day, &baselines);
        score += duration;
        if duration > 0.0 {
            positive_factors += 1;
        }

        let steps = self.steps_term(day, &baselines);
        score += steps;
        if steps > 0.0 {
            positive_factors += 1;
        }

        let cfg = &self.config.backfill;
        if day.household_min > 0 {
            let term = (f64::from(day.household_min) / 60.0 * cfg.household_per_hour).min(1.0);
            score += term;
            positive_factors += 1;
        }
        if day.has_checkin() {
            score += cfg.checkin_weight;
            positive_factors += 1;
        }
        if let Some(planned) = day.supplements_planned {
            if planned > 0 {
                let ratio = (f64::from(day.supplements_taken) / f64::from(planned)).min(1.0);
                score += ratio * cfg.supplements_weight;
                if ratio > 0.0 {
                    positive_factors += 1;
                }
            }
        }

        let spacing = Self::spacing_proxy(day);
        score += spacing;
        if spacing > 0.0 {
            positive_factors += 1;
        }

        score += (positive_factors as f64 * cfg.synergy_per_factor).min(cfg.synergy_cap);

        (score / momentum::MOMENTUM_TARGET).clamp(momentum::DCS_FLOOR, momentum::DCS_CEILING)
    }

    /// Chronotype, sleep optimum and steps baseline reconstructed from the
    /// surrounding window instead of the live 14-day baseline.
    fn window_baselines(&self, date: NaiveDate, surrounding: &[DayRecord]) -> WindowBaselines {
        let radius = windows::ESTIMATOR_CONTEXT_RADIUS_DAYS as i64;
        let in_window: Vec<&DayRecord> = surrounding
            .iter()
            .filter(|d| {
                let delta = (d.date - date).num_days();
                delta.abs() <= radius && d.date != date
            })
            .collect();

        let onsets: Vec<f64> = in_window
            .iter()
            .filter_map(|d| d.sleep_onset_min())
            .map(f64::from)
            .collect();
        let chronotype_bedtime_min = if onsets.len() >= windows::MIN_BASELINE_SAMPLES {
            median_of(onsets).unwrap_or(f64::from(sleep_consts::DEFAULT_BEDTIME_MIN))
        } else {
            f64::from(sleep_consts::DEFAULT_BEDTIME_MIN)
        }
        .clamp(
            f64::from(sleep_consts::CHRONOTYPE_EARLIEST_MIN),
            f64::from(sleep_consts::CHRONOTYPE_LATEST_MIN),
        );

        let durations: Vec<f64> = in_window
            .iter()
            .filter_map(|d| d.resolved_sleep_hours())
            .filter(|h| *h > 0.0)
            .collect();
        let optimal_sleep_hours = if durations.len() >= windows::MIN_BASELINE_SAMPLES {
            median_of(durations).unwrap_or(8.0)
        } else {
            8.0
        }
        .clamp(7.0, 9.0);

        let steps: Vec<f64> = in_window
            .iter()
            .filter(|d| d.steps > 0)
            .map(|d| f64::from(d.steps))
            .collect();
        let steps_baseline = if steps.len() >= windows::MIN_BASELINE_SAMPLES {
            median_of(steps).unwrap_or(8000.0)
        } else {
            8000.0
        };

        WindowBaselines {
            chronotype_bedtime_min,
            optimal_sleep_hours,
            steps_baseline,
        }
    }

    /// Time-banded meal scoring standing in for the full quality lookup.
    fn meal_proxy(&self, day: &DayRecord) -> f64 {
        let (breakfast, daytime, evening, late, night) = self.config.backfill.meal_band_weights;
        day.meals
            .iter()
            .map(|meal| {
                if meal.has_harmful_item() {
                    return meal_consts::VIOLATION_WEIGHT;
                }
                match meal.time_min() {
                    Some(t) if t < 360 => night,
                    Some(t) if t < 600 => breakfast,
                    Some(t) if t < 1080 => daytime,
                    Some(t) if t < meal_consts::LATE_MEAL_MIN => evening,
                    Some(_) => late,
                    None => evening,
                }
            })
            .sum()
    }

    /// The live pipeline's sqrt training curve, repeat discounts included.
    fn training_term(&self, day: &DayRecord) -> f64 {
        let cfg = &self.config.signals;
        day.trainings
            .iter()
            .enumerate()
            .map(|(index, session)| {
                let repeat = match index {
                    0 => 1.0,
                    1 => cfg.training_repeat_multipliers.0,
                    _ => cfg.training_repeat_multipliers.1,
                };
                ((session.load() / 30.0).sqrt() * cfg.training_gain)
                    .clamp(cfg.training_range.0, cfg.training_range.1)
                    * repeat
            })
            .sum()
    }

    /// The live tanh onset curve against the reconstructed chronotype.
    fn sleep_onset_term(&self, day: &DayRecord, baselines: &WindowBaselines) -> f64 {
        let Some(onset) = day.sleep_onset_min() else {
            return 0.0;
        };
        if onset >= sleep_consts::CATASTROPHIC_ONSET_MIN {
            return sleep_consts::ONSET_FLOOR_WEIGHT;
        }
        let cfg = &self.config.sleep;
        let delta_h = (f64::from(onset) - baselines.chronotype_bedtime_min) / 60.0;
        if delta_h > 0.0 {
            -cfg.onset_penalty_scale * (delta_h / cfg.onset_tanh_hours).tanh()
        } else {
            cfg.onset_bonus_scale * (-delta_h / cfg.onset_tanh_hours).tanh()
        }
    }

    /// The live Gaussian duration bell against the reconstructed optimum.
    fn sleep_duration_term(&self, day: &DayRecord, baselines: &WindowBaselines) -> f64 {
        let Some(hours) = day.resolved_sleep_hours() else {
            return 0.0;
        };
        if hours <= 0.0 {
            return 0.0;
        }
        if hours < sleep_consts::CATASTROPHIC_DURATION_H {
            return sleep_consts::DURATION_FLOOR_WEIGHT;
        }
        let cfg = &self.config.sleep;
        let delta = hours - baselines.optimal_sleep_hours;
        let effective = if delta < 0.0 {
            delta * cfg.under_sleep_asymmetry
        } else {
            delta
        };
        let bell = (-(effective * effective) / (2.0 * cfg.duration_sigma_h.powi(2))).exp();
        cfg.duration_span.mul_add(bell, -1.0)
    }

    fn steps_term(&self, day: &DayRecord, baselines: &WindowBaselines) -> f64 {
        if day.steps == 0 {
            return 0.0;
        }
        let cfg = &self.config.signals;
        let ratio = f64::from(day.steps) / baselines.steps_baseline;
        ((ratio - cfg.steps_ratio_offset) * cfg.steps_gain)
            .tanh()
            .clamp(cfg.steps_range.0, cfg.steps_range.1)
    }

    /// Meal-gap insulin proxy: crowded meals penalize, a long night fast
    /// rewards. Threshold form instead of the live logistic curves.
    fn spacing_proxy(day: &DayRecord) -> f64 {
        let mut times: Vec<u32> = day.meals.iter().filter_map(crate::models::Meal::time_min).collect();
        if times.len() < 2 {
            return 0.0;
        }
        times.sort_unstable();

        let mut term = 0.0;
        let min_gap = times
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .min()
            .unwrap_or(u32::MAX);
        if min_gap < 120 {
            term -= 0.3;
        }

        let fast_hours = f64::from(times[0] + MINUTES_PER_DAY - times[times.len() - 1]) / 60.0;
        if fast_hours >= 11.0 {
            term += 0.3;
        }
        term
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{FoodItem, Meal, TrainingSession};

    fn date(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 3, day).unwrap()
    }

    fn meal(time: &str) -> Meal {
        Meal {
            time: Some(time.into()),
            items: vec![FoodItem {
                grams: Some(150.0),
                kcal_per_100g: Some(130.0),
                ..FoodItem::default()
            }],
        }
    }

    fn good_day(d: NaiveDate) -> DayRecord {
        DayRecord {
            date: d,
            meals: vec![meal("08:00"), meal("13:00"), meal("19:00")],
            trainings: vec![TrainingSession {
                duration_min: Some(45.0),
                ..TrainingSession::default()
            }],
            sleep_start: Some("22:45".into()),
            sleep_hours: Some(8.0),
            steps: 9000,
            weight_morning: Some(71.0),
            ..DayRecord::default()
        }
    }

    #[test]
    fn estimate_is_deterministic() {
        let config = EngineConfig::default();
        let estimator = RetroactiveEstimator::new(&config);
        let day = good_day(date(10));
        let window: Vec<DayRecord> = (5..15).map(|d| good_day(date(d))).collect();
        let first = estimator.estimate(&day, &window);
        let second = estimator.estimate(&day, &window);
        assert!((first - second).abs() < f64::EPSILON);
    }

    #[test]
    fn estimate_stays_in_dcs_range() {
        let config = EngineConfig::default();
        let estimator = RetroactiveEstimator::new(&config);
        let mut awful = DayRecord {
            date: date(10),
            sleep_start: Some("03:30".into()),
            sleep_hours: Some(3.0),
            ..DayRecord::default()
        };
        awful.meals = (0..6).map(|_| {
            let mut m = meal("01:00");
            m.items[0].harm_score = Some(9.0);
            m
        }).collect();
        let dcs = estimator.estimate(&awful, &[]);
        assert!(dcs >= momentum::DCS_FLOOR);
        assert!(dcs <= momentum::DCS_CEILING);
        assert!((dcs - momentum::DCS_FLOOR).abs() < 1e-9);
    }

    #[test]
    fn good_day_estimates_above_bad_day() {
        let config = EngineConfig::default();
        let estimator = RetroactiveEstimator::new(&config);
        let window: Vec<DayRecord> = (1..9).map(|d| good_day(date(d))).collect();

        let good = estimator.estimate(&good_day(date(10)), &window);
        let bad = DayRecord {
            date: date(10),
            meals: vec![meal("23:30")],
            sleep_start: Some("02:30".into()),
            sleep_hours: Some(4.0),
            ..DayRecord::default()
        };
        let bad_dcs = estimator.estimate(&bad, &window);
        assert!(good > bad_dcs);
        assert!(good > 0.0);
        assert!(bad_dcs < 0.0);
    }

    #[test]
    fn backfill_fills_missing_and_flagged_only() {
        let config = EngineConfig::default();
        let estimator = RetroactiveEstimator::new(&config);
        let today = date(20);
        let raw: Vec<DayRecord> = (15..20).map(|d| good_day(date(d))).collect();

        let mut history = DcsHistory::new();
        history.upsert(date(16), DcsEntry::computed(0.42));
        history.upsert(
            date(17),
            DcsEntry {
                dcs: -0.9,
                source: crate::history::DcsSource::Computed,
                flagged: true,
            },
        );

        estimator.backfill(&mut history, &raw, today);

        // Untouched computed entry.
        assert!((history.dcs_on(date(16)).unwrap() - 0.42).abs() < 1e-9);
        // Flagged entry corrected.
        let corrected = history.entry_on(date(17)).unwrap();
        assert_eq!(corrected.source, crate::history::DcsSource::Estimated);
        assert!(!corrected.flagged);
        assert!(corrected.dcs > -0.9);
        // Missing days filled.
        assert!(history.dcs_on(date(15)).is_some());
        assert!(history.dcs_on(date(18)).is_some());
        assert!(history.dcs_on(date(19)).is_some());
    }

    #[test]
    fn backfill_skips_empty_records_and_today() {
        let config = EngineConfig::default();
        let estimator = RetroactiveEstimator::new(&config);
        let today = date(20);
        let raw = vec![
            DayRecord {
                date: date(18),
                ..DayRecord::default()
            },
            good_day(date(20)),
        ];
        let mut history = DcsHistory::new();
        estimator.backfill(&mut history, &raw, today);
        assert!(history.is_empty());
    }
}
