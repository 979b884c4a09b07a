// ABOUTME: Signal extractor - converts one day's raw record into scored behavioral events
// ABOUTME: Continuous per-factor curves, confidence damping, hard floors, cross-factor synergy
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::baselines::{FactorKind, PersonalBaselines};
use crate::config::EngineConfig;
use crate::constants::{meals as meal_consts, sleep as sleep_consts};
use crate::models::{normalize_past_midnight, DayRecord, GoalMode, UserProfile};
use crate::quality::MealQualityScorer;

/// Why a negative event broke (or eroded) the chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BreakReason {
    /// A flagged-harmful product was eaten.
    HarmfulProduct,
    /// Meal at or past the hard late-night threshold.
    LateMeal,
    /// Running calories pushed the meal negative.
    CalorieOverrun,
    /// Meal quality below the break threshold.
    LowQuality,
    /// Sleep onset past the catastrophic threshold.
    LateSleepOnset,
    /// Sleep below the catastrophic minimum.
    ShortSleep,
}

/// One scored behavioral event. Derived, never persisted; rebuilt on every
/// computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    /// Factor that produced the event.
    pub kind: FactorKind,

    /// Clock time in minutes from midnight, when the factor has one.
    pub time_min: Option<u32>,

    /// Whether the event extends the chain. Follows the weight sign except
    /// where a hard floor forces negativity.
    pub positive: bool,

    /// Signed contribution to the daily score.
    pub weight: f64,

    /// Human-readable label for the timeline collaborator.
    pub label: String,

    /// Timeline ordering key.
    pub sort_key: u32,

    /// Break reason for negative events, when one is known.
    pub break_reason: Option<BreakReason>,
}

/// Everything the extractor learned about one day.
#[derive(Debug, Clone, Default)]
pub struct DaySignals {
    /// Scored events in timeline order.
    pub events: Vec<Event>,

    /// Sum of event weights plus absent-factor streak penalties.
    pub score: f64,

    /// Cross-factor synergy bonus (capped).
    pub synergy_bonus: f64,

    /// Total calories consumed.
    pub cumulative_kcal: f64,

    /// A harmful product was eaten inside the night window (00:00-06:00).
    pub harmful_night_meal: bool,

    /// Non-fatal degradations (collaborator fallbacks, malformed fields).
    pub warnings: Vec<String>,
}

impl DaySignals {
    /// Daily score: event weights, streak penalties and synergy combined.
    #[must_use]
    pub fn daily_score(&self) -> f64 {
        self.score + self.synergy_bonus
    }

    /// Consumed-to-target ratio for the contribution normalizer.
    #[must_use]
    pub fn kcal_ratio(&self, target_kcal: f64) -> f64 {
        if target_kcal > 0.0 {
            self.cumulative_kcal / target_kcal
        } else {
            0.0
        }
    }
}

// Timeline anchors for factors without a clock time, matching the layout the
// timeline collaborator expects (morning block, daytime, evening block).
const SORT_CHECKIN: u32 = 540;
const SORT_MEASUREMENTS: u32 = 545;
const SORT_SUPPLEMENTS: u32 = 550;
const SORT_HOUSEHOLD: u32 = 599;
const SORT_UNTIMED_MEAL_BASE: u32 = 500;
const SORT_UNTIMED_TRAINING: u32 = 700;
const SORT_STEPS: u32 = 1100;
const SORT_SPACING: u32 = 1200;
const SORT_SLEEP_ONSET: u32 = 1300;
const SORT_SLEEP_DURATION: u32 = 1310;

fn logistic(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Per-factor scoring over one day's record.
pub struct SignalExtractor<'a> {
    config: &'a EngineConfig,
    profile: &'a UserProfile,
    baselines: &'a PersonalBaselines,
    scorer: &'a dyn MealQualityScorer,
}

impl<'a> SignalExtractor<'a> {
    /// Build an extractor borrowing the computation's collaborators.
    #[must_use]
    pub fn new(
        config: &'a EngineConfig,
        profile: &'a UserProfile,
        baselines: &'a PersonalBaselines,
        scorer: &'a dyn MealQualityScorer,
    ) -> Self {
        Self {
            config,
            profile,
            baselines,
            scorer,
        }
    }

    /// Run every factor over the day and collect events, score and synergy.
    #[must_use]
    pub fn extract(&self, day: &DayRecord) -> DaySignals {
        let mut out = DaySignals::default();

        self.household_signal(day, &mut out);
        self.meal_signals(day, &mut out);
        self.training_signals(day, &mut out);
        self.sleep_onset_signal(day, &mut out);
        self.sleep_duration_signal(day, &mut out);
        self.steps_signal(day, &mut out);
        self.checkin_signal(day, &mut out);
        self.measurements_signal(day, &mut out);
        self.supplements_signal(day, &mut out);
        self.spacing_signal(day, &mut out);

        out.events.sort_by_key(|e| e.sort_key);
        out.synergy_bonus = self.synergy_bonus(day, &out);

        debug!(
            events = out.events.len(),
            score = out.score,
            synergy = out.synergy_bonus,
            "signals extracted"
        );
        out
    }

    fn push_event(out: &mut DaySignals, event: Event) {
        out.score += event.weight;
        out.events.push(event);
    }

    fn household_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        let cfg = &self.config.signals;
        if day.household_min > 0 {
            let ratio = f64::from(day.household_min) / self.baselines.household_baseline_min;
            let raw = cfg
                .household_log_gain
                .mul_add(ratio.log2(), cfg.household_midpoint)
                .clamp(cfg.household_range.0, cfg.household_range.1);
            let weight = raw * self.baselines.confidence(FactorKind::Household);
            Self::push_event(
                out,
                Event {
                    kind: FactorKind::Household,
                    time_min: None,
                    positive: weight >= 0.0,
                    weight,
                    label: format!("Household activity {} min", day.household_min),
                    sort_key: SORT_HOUSEHOLD,
                    break_reason: None,
                },
            );
        } else {
            let streak = self.baselines.household_missing_streak;
            if streak > cfg.streak_grace_days {
                let (step, floor) = cfg.household_streak_penalty;
                let penalty = (step * f64::from(streak - cfg.streak_grace_days)).max(floor);
                out.score += penalty;
            }
        }
    }

    fn meal_signals(&self, day: &DayRecord, out: &mut DaySignals) {
        let cfg = &self.config.meals;
        let target = self.profile.targets.target_kcal;
        let goal = self.profile.targets.goal_mode;
        let confidence = self.baselines.confidence(FactorKind::Meals);
        let mut scorer_warned = false;

        let (threshold, strength) = match goal {
            GoalMode::Deficit => (cfg.kcal_penalty_thresholds.0, cfg.kcal_penalty_strengths.0),
            GoalMode::Maintenance => {
                (cfg.kcal_penalty_thresholds.1, cfg.kcal_penalty_strengths.1)
            }
            GoalMode::Bulk => (cfg.kcal_penalty_thresholds.2, cfg.kcal_penalty_strengths.2),
        };

        for (index, meal) in day.meals.iter().enumerate() {
            out.cumulative_kcal += meal.kcal();
            let time_min = meal.time_min();
            if meal.time.is_some() && time_min.is_none() {
                out.warnings
                    .push(format!("meal {} has an unparseable time", index + 1));
            }

            let harmful = meal.has_harmful_item();
            let late = time_min.is_some_and(|t| t >= meal_consts::LATE_MEAL_MIN);
            if harmful {
                let normalized = time_min.map(normalize_past_midnight);
                if normalized.is_some_and(|t| {
                    (meal_consts::NIGHT_WINDOW_START_MIN..meal_consts::NIGHT_WINDOW_END_MIN)
                        .contains(&t)
                }) {
                    out.harmful_night_meal = true;
                }
            }

            let quality = self.scorer.score_meal(meal, target);
            if quality.is_none() && !scorer_warned {
                out.warnings
                    .push("meal quality scorer unavailable, using fallback weight".into());
                scorer_warned = true;
            }

            let mut positive = true;
            let mut break_reason = None;
            let mut weight;

            if harmful || late {
                // Hard violations override quality entirely.
                weight = meal_consts::VIOLATION_WEIGHT;
                positive = false;
                break_reason = Some(if harmful {
                    BreakReason::HarmfulProduct
                } else {
                    BreakReason::LateMeal
                });
            } else if let Some(q) = quality {
                let base = ((q - cfg.quality_midpoint) / cfg.quality_scale)
                    .clamp(cfg.weight_range.0, cfg.weight_range.1);
                let circadian = self.circadian_multiplier(time_min);
                weight = base * circadian * confidence;

                if q < meal_consts::LOW_QUALITY_BREAK {
                    positive = false;
                    break_reason = Some(BreakReason::LowQuality);
                }

                let ratio = out.kcal_ratio(target);
                if ratio > threshold {
                    let overshoot = ratio - threshold;
                    let penalty = strength
                        * 2.0
                        * (logistic(overshoot * cfg.kcal_penalty_steepness) - 0.5);
                    weight -= penalty;
                    if weight < 0.0 && positive {
                        positive = false;
                        break_reason = Some(BreakReason::CalorieOverrun);
                    }
                }
            } else {
                weight = cfg.fallback_weight * confidence;
            }

            if positive {
                positive = weight >= 0.0;
            }

            Self::push_event(
                out,
                Event {
                    kind: FactorKind::Meals,
                    time_min,
                    positive,
                    weight,
                    label: meal.time.as_deref().map_or_else(
                        || format!("Meal {}", index + 1),
                        |t| format!("Meal {t}"),
                    ),
                    sort_key: time_min
                        .unwrap_or(SORT_UNTIMED_MEAL_BASE + index as u32 * 120),
                    break_reason,
                },
            );
        }
    }

    /// Circadian multiplier: breakfast-band meals amplified, meals close to
    /// the chronotype-adjusted bedtime damped.
    fn circadian_multiplier(&self, time_min: Option<u32>) -> f64 {
        let cfg = &self.config.meals;
        let Some(t) = time_min else { return 1.0 };
        let (band_start, band_end) = cfg.breakfast_band_min;
        if (band_start..band_end).contains(&t) {
            return cfg.breakfast_multiplier;
        }
        let normalized = f64::from(normalize_past_midnight(t));
        let bedtime = self.baselines.chronotype_bedtime_min;
        if normalized >= bedtime - f64::from(cfg.pre_bed_window_min) && normalized <= bedtime {
            return cfg.pre_bed_multiplier;
        }
        1.0
    }

    fn training_signals(&self, day: &DayRecord, out: &mut DaySignals) {
        let cfg = &self.config.signals;
        if day.trainings.is_empty() {
            let streak = self.baselines.training_missing_streak;
            if streak > cfg.streak_grace_days {
                let (step, floor) = cfg.training_streak_penalty;
                let penalty = (step * f64::from(streak - cfg.streak_grace_days)).max(floor);
                out.score += penalty;
            }
            return;
        }

        let confidence = self.baselines.confidence(FactorKind::Training);
        for (index, session) in day.trainings.iter().enumerate() {
            // Recovery economics: a 2nd same-day session counts half, 3rd+
            // a quarter.
            let repeat = match index {
                0 => 1.0,
                1 => cfg.training_repeat_multipliers.0,
                _ => cfg.training_repeat_multipliers.1,
            };
            let base = ((session.load() / 30.0).sqrt() * cfg.training_gain)
                .clamp(cfg.training_range.0, cfg.training_range.1);
            let weight = base * repeat * confidence;
            let time_min = session.time_min();
            Self::push_event(
                out,
                Event {
                    kind: FactorKind::Training,
                    time_min,
                    positive: true,
                    weight,
                    label: format!("Training {} min", session.resolved_duration_min().round()),
                    sort_key: time_min.unwrap_or(SORT_UNTIMED_TRAINING),
                    break_reason: None,
                },
            );
        }
    }

    fn sleep_onset_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        if day.sleep_start.is_some() && day.sleep_onset_min().is_none() {
            out.warnings.push("sleep onset time is unparseable".into());
            return;
        }
        let Some(onset) = day.sleep_onset_min() else { return };
        let cfg = &self.config.sleep;

        let (weight, positive, reason) = if onset >= sleep_consts::CATASTROPHIC_ONSET_MIN {
            // Hard floor: past 02:00 the chronotype no longer matters.
            (
                sleep_consts::ONSET_FLOOR_WEIGHT,
                false,
                Some(BreakReason::LateSleepOnset),
            )
        } else {
            let delta_h = (f64::from(onset) - self.baselines.chronotype_bedtime_min) / 60.0;
            let raw = if delta_h > 0.0 {
                -cfg.onset_penalty_scale * (delta_h / cfg.onset_tanh_hours).tanh()
            } else {
                cfg.onset_bonus_scale * (-delta_h / cfg.onset_tanh_hours).tanh()
            };
            let weight = raw * self.baselines.confidence(FactorKind::SleepOnset);
            (weight, weight >= 0.0, None)
        };

        Self::push_event(
            out,
            Event {
                kind: FactorKind::SleepOnset,
                time_min: Some(onset % crate::models::MINUTES_PER_DAY),
                positive,
                weight,
                label: day
                    .sleep_start
                    .as_deref()
                    .map_or_else(|| "Sleep onset".into(), |t| format!("Sleep onset {t}")),
                sort_key: SORT_SLEEP_ONSET,
                break_reason: reason,
            },
        );
    }

    fn sleep_duration_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        let Some(hours) = day.resolved_sleep_hours() else { return };
        if hours <= 0.0 {
            return;
        }
        let cfg = &self.config.sleep;

        let (weight, positive, reason) = if hours < sleep_consts::CATASTROPHIC_DURATION_H {
            (
                sleep_consts::DURATION_FLOOR_WEIGHT,
                false,
                Some(BreakReason::ShortSleep),
            )
        } else {
            let delta = hours - self.baselines.optimal_sleep_hours;
            // Under-sleep hurts harder than over-sleep.
            let effective = if delta < 0.0 {
                delta * cfg.under_sleep_asymmetry
            } else {
                delta
            };
            let bell =
                (-(effective * effective) / (2.0 * cfg.duration_sigma_h.powi(2))).exp();
            let raw = cfg.duration_span.mul_add(bell, -1.0);
            let weight = raw * self.baselines.confidence(FactorKind::SleepDuration);
            (weight, weight >= 0.0, None)
        };

        Self::push_event(
            out,
            Event {
                kind: FactorKind::SleepDuration,
                time_min: None,
                positive,
                weight,
                label: format!("Sleep {hours:.1} h"),
                sort_key: SORT_SLEEP_DURATION,
                break_reason: reason,
            },
        );
    }

    fn steps_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        if day.steps == 0 {
            return;
        }
        let cfg = &self.config.signals;
        let ratio = f64::from(day.steps) / self.baselines.steps_baseline;
        let raw = ((ratio - cfg.steps_ratio_offset) * cfg.steps_gain)
            .tanh()
            .clamp(cfg.steps_range.0, cfg.steps_range.1);
        let weight = raw * self.baselines.confidence(FactorKind::Steps);
        Self::push_event(
            out,
            Event {
                kind: FactorKind::Steps,
                time_min: None,
                positive: weight >= 0.0,
                weight,
                label: format!("Steps {:.1}k", f64::from(day.steps) / 1000.0),
                sort_key: SORT_STEPS,
                break_reason: None,
            },
        );
    }

    fn checkin_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        if !day.has_checkin() {
            return;
        }
        let cfg = &self.config.signals;
        let mut raw = cfg.checkin_base;
        if self.baselines.checkin_streak >= cfg.checkin_streak_days {
            raw += cfg.checkin_streak_bonus;
            if self.baselines.weight_stdev_kg < cfg.checkin_stability_stdev_kg {
                raw += cfg.checkin_stability_bonus;
            }
        }
        let weight = raw * self.baselines.confidence(FactorKind::Checkin);
        let label = day
            .weight_morning
            .map_or_else(|| "Weight checkin".into(), |w| format!("Weight checkin {w:.1} kg"));
        Self::push_event(
            out,
            Event {
                kind: FactorKind::Checkin,
                time_min: None,
                positive: true,
                weight,
                label,
                sort_key: SORT_CHECKIN,
                break_reason: None,
            },
        );
    }

    fn measurements_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        let cfg = &self.config.signals;
        if day.has_measurements() {
            let completeness = day
                .measurements
                .map_or(0.0, |m| m.completeness());
            let mut raw = completeness;
            // Measured again within two days: informative only for trends,
            // damp to avoid double counting.
            if self
                .baselines
                .last_measurement_age_days
                .is_some_and(|age| age <= 2)
            {
                raw *= cfg.measurements_recent_damp;
            }
            let weight = raw * self.baselines.confidence(FactorKind::Measurements);
            Self::push_event(
                out,
                Event {
                    kind: FactorKind::Measurements,
                    time_min: None,
                    positive: true,
                    weight,
                    label: "Body measurements".into(),
                    sort_key: SORT_MEASUREMENTS,
                    break_reason: None,
                },
            );
        } else if let Some(age) = self.baselines.last_measurement_age_days {
            if age > 14 {
                out.score += cfg.measurements_very_stale_penalty;
            } else if age > 7 {
                out.score += cfg.measurements_stale_penalty;
            }
        }
    }

    fn supplements_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        let cfg = &self.config.signals;
        let planned = day
            .supplements_planned
            .unwrap_or(self.profile.planned_supplements);
        if planned == 0 {
            return;
        }
        let ratio = f64::from(day.supplements_taken) / f64::from(planned);
        let (full, half, poor) = cfg.supplements_weights;
        let mut raw = if ratio >= 1.0 {
            full
        } else if ratio >= 0.5 {
            half
        } else {
            poor
        };
        if ratio >= 1.0 && self.baselines.supplements_full_streak >= cfg.supplements_streak_days
        {
            raw += cfg.supplements_streak_bonus;
        }
        let weight = raw * self.baselines.confidence(FactorKind::Supplements);
        Self::push_event(
            out,
            Event {
                kind: FactorKind::Supplements,
                time_min: None,
                positive: weight >= 0.0,
                weight,
                label: format!("Supplements {}/{planned}", day.supplements_taken),
                sort_key: SORT_SUPPLEMENTS,
                break_reason: None,
            },
        );
    }

    fn spacing_signal(&self, day: &DayRecord, out: &mut DaySignals) {
        if day.meals.len() < 2 {
            return;
        }
        let cfg = &self.config.spacing;
        let mut times: Vec<u32> = day.meals.iter().filter_map(super::models::Meal::time_min).collect();
        if times.len() < 2 {
            return;
        }
        times.sort_unstable();

        // Insulin-wave proxy: short inter-meal gaps accumulate overlap.
        let overlap: f64 = times
            .windows(2)
            .map(|pair| (cfg.overlap_gap_min - f64::from(pair[1] - pair[0])).max(0.0))
            .sum();
        let overlap_penalty = -cfg.overlap_penalty_scale
            * logistic((overlap - cfg.overlap_midpoint_min) / cfg.overlap_steepness_min);

        // Night fasting: the gap from last meal to first meal next morning.
        let fast_hours =
            f64::from(times[0] + crate::models::MINUTES_PER_DAY - times[times.len() - 1]) / 60.0;
        let fast_bonus = (cfg.night_fast_bonus_scale
            * ((fast_hours - cfg.night_fast_midpoint_h) / cfg.night_fast_steepness_h).tanh())
        .max(0.0);

        // Eating inside the post-training window is the one time a quick meal
        // is rewarded.
        let post_training = day.trainings.iter().filter_map(super::models::TrainingSession::time_min).any(|t| {
            times
                .iter()
                .any(|m| *m >= t && *m <= t + cfg.post_training_window_min)
        });
        let pt_bonus = if post_training {
            cfg.post_training_bonus
        } else {
            0.0
        };

        let weight = (overlap_penalty + fast_bonus + pt_bonus)
            * self.baselines.confidence(FactorKind::MealSpacing);
        Self::push_event(
            out,
            Event {
                kind: FactorKind::MealSpacing,
                time_min: None,
                positive: weight >= 0.0,
                weight,
                label: "Meal spacing".into(),
                sort_key: SORT_SPACING,
                break_reason: None,
            },
        );
    }

    /// Fixed additive bonuses when specific factor combinations co-occur.
    fn synergy_bonus(&self, day: &DayRecord, signals: &DaySignals) -> f64 {
        let cfg = &self.config.synergy;
        let mut bonus = 0.0;

        let sleep_duration_weight = signals
            .events
            .iter()
            .find(|e| e.kind == FactorKind::SleepDuration)
            .map_or(0.0, |e| e.weight);
        let no_overeating = signals.cumulative_kcal <= self.profile.targets.target_kcal;
        if day.trainings.is_empty()
            && sleep_duration_weight >= cfg.adequate_sleep_weight
            && no_overeating
            && !day.meals.is_empty()
        {
            bonus += cfg.rest_day_recovery;
        }

        let quality_meals = signals
            .events
            .iter()
            .filter(|e| e.kind == FactorKind::Meals && e.weight >= cfg.quality_meal_weight)
            .count();
        let spacing_positive = signals
            .events
            .iter()
            .any(|e| e.kind == FactorKind::MealSpacing && e.weight > 0.0);
        if quality_meals >= 2 && spacing_positive {
            bonus += cfg.quality_meals_spacing;
        }

        let has_checkin = signals
            .events
            .iter()
            .any(|e| e.kind == FactorKind::Checkin);
        let early_activity = signals.events.iter().any(|e| {
            (e.kind == FactorKind::Training && e.time_min.is_some_and(|t| t < 720))
                || e.kind == FactorKind::Household
        });
        if has_checkin && early_activity {
            bonus += cfg.checkin_early_activity;
        }

        let mut positive_kinds: Vec<FactorKind> = signals
            .events
            .iter()
            .filter(|e| e.positive && e.weight > 0.0)
            .map(|e| e.kind)
            .collect();
        positive_kinds.sort_by_key(|k| *k as u8);
        positive_kinds.dedup();
        if positive_kinds.len() >= cfg.full_stack_factors {
            bonus += cfg.full_stack_day;
        }

        bonus.min(cfg.total_cap)
    }
}
