// ABOUTME: Engine orchestration - full pipeline, input-signature memoization, readiness guard
// ABOUTME: Explicit session context and invalidation replace ambient global flags and event listeners
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};
use std::time::{Duration, Instant};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::baselines::PersonalBaselines;
use crate::ceiling;
use crate::chain::{self, BreakRecord};
use crate::config::EngineConfig;
use crate::contribution::{self, ContributionInputs, DailyContribution};
use crate::errors::{EngineError, EngineResult};
use crate::history::{DcsEntry, DcsHistory};
use crate::models::{DayRecord, TrainingSession, UserProfile};
use crate::momentum::{self, MomentumState, Trend};
use crate::quality::{MealQualityScorer, TimeBandQualityScorer};
use crate::signals::{Event, SignalExtractor};
use crate::backfill::RetroactiveEstimator;

/// Why the caller is busting the cache. Replaces the ambient event listeners
/// of earlier revisions with an explicit, testable entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvalidationReason {
    /// A batch sync wrote multiple historical days.
    BatchSync,
    /// Nutrient values were recomputed for existing meals.
    NutrientRecompute,
    /// The active user context changed.
    ClientSwitch,
    /// Today's record was edited in place.
    DayEdited,
}

/// The smallest missing behavior worth doing next, time-of-day aware.
/// Expressed as data, not UI copy; rendering belongs to the collaborators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NextStepHint {
    /// Morning and no weight checkin yet.
    Checkin,
    /// Nothing eaten yet.
    FirstMeal,
    /// No training yet and the day still has room for one.
    Training,
    /// Measurements are stale.
    Measurements,
    /// Evening and no sleep logged.
    LogSleep,
}

/// The full Result record published per computation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MomentumSnapshot {
    /// Date the snapshot was computed for.
    pub date: NaiveDate,

    /// Scored events in timeline order.
    pub events: Vec<Event>,

    /// Final chain length for the day.
    pub chain_length: u32,

    /// Peak chain length reached during the day.
    pub max_chain_today: u32,

    /// Every chain erosion, in order, for the timeline collaborator.
    pub breaks: Vec<BreakRecord>,

    /// Combined daily score (events, penalties, synergy).
    pub score: f64,

    /// Discrete momentum state.
    pub state: MomentumState,

    /// Headline momentum value in `[0, ceiling]`.
    pub crs: f64,

    /// Decayed base over completed days.
    pub crs_base: f64,

    /// Same-day boost granted on top of the base.
    pub today_boost: f64,

    /// Personalized maximum attainable momentum.
    pub ceiling: f64,

    /// Today's bounded contribution and the override that produced it.
    pub daily_contribution: DailyContribution,

    /// Recent contribution trend.
    pub crs_trend: Trend,

    /// Consecutive days at or above the peak threshold.
    pub days_at_peak: u32,

    /// Date-keyed contribution history after this computation.
    pub dcs_history: BTreeMap<NaiveDate, f64>,

    /// Non-fatal degradations encountered along the way.
    pub warnings: Vec<String>,

    /// Whether now falls inside the post-training refuel window.
    pub post_training_window: bool,

    /// Smallest missing behavior worth doing next, if any.
    pub next_step_hint: Option<NextStepHint>,
}

/// Session-scoped computation context: memoization signature, readiness
/// guard, and the externally bumped day-update version. Holding these on the
/// engine instead of module-level flags keeps the guard testable in
/// isolation.
#[derive(Debug, Clone, Default)]
pub struct EngineContext {
    /// Signature of the inputs behind `cached_result`.
    pub cache_signature: Option<u64>,

    /// Memoized result of the last computation.
    pub cached_result: Option<MomentumSnapshot>,

    /// History is known to be loaded; until then output is suppressed.
    pub history_ready: bool,

    /// When the guard first suppressed a computation; drives the bounded
    /// timeout fallback.
    pub guard_started: Option<Instant>,

    /// Monotonic counter bumped by external writers; part of the signature.
    pub day_update_version: u64,
}

type SnapshotListener = Box<dyn Fn(&MomentumSnapshot)>;

/// The momentum scoring engine.
///
/// One instance per active user context. The whole pipeline runs as a single
/// synchronous call per trigger; the engine never polls.
pub struct MomentumEngine {
    config: EngineConfig,
    scorer: Box<dyn MealQualityScorer>,
    history: DcsHistory,
    context: EngineContext,
    listeners: Vec<SnapshotListener>,
}

impl MomentumEngine {
    /// Engine with the built-in time-band quality scorer.
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self::with_scorer(config, Box::new(TimeBandQualityScorer))
    }

    /// Engine with an external meal-quality collaborator.
    #[must_use]
    pub fn with_scorer(config: EngineConfig, scorer: Box<dyn MealQualityScorer>) -> Self {
        Self {
            config,
            scorer,
            history: DcsHistory::new(),
            context: EngineContext::default(),
            listeners: Vec::new(),
        }
    }

    /// The session context, for inspection.
    #[must_use]
    pub const fn context(&self) -> &EngineContext {
        &self.context
    }

    /// The current history store.
    #[must_use]
    pub const fn history(&self) -> &DcsHistory {
        &self.history
    }

    /// Replace the history store with a freshly loaded one.
    pub fn set_history(&mut self, history: DcsHistory) {
        self.history = history;
        self.context.cache_signature = None;
        self.context.cached_result = None;
    }

    /// Load persisted history, applying the schema migration table.
    pub fn load_history(&mut self, json: &str) -> EngineResult<()> {
        self.set_history(DcsHistory::from_json(json)?);
        Ok(())
    }

    /// Serialize the history store for the caller's persistence layer.
    pub fn history_json(&self) -> EngineResult<String> {
        self.history.to_json()
    }

    /// The external "batch sync done" signal; lifts the readiness guard.
    pub fn mark_history_ready(&mut self) {
        self.context.history_ready = true;
        self.context.guard_started = None;
    }

    /// Explicit cache bust. Batch syncs and client switches also bump the
    /// day-update version so a structurally identical record still recomputes;
    /// a client switch additionally resets readiness and drops the old user's
    /// history.
    pub fn invalidate(&mut self, reason: InvalidationReason) {
        debug!(?reason, "cache invalidated");
        self.context.cache_signature = None;
        self.context.cached_result = None;
        match reason {
            InvalidationReason::BatchSync => {
                self.context.day_update_version += 1;
            }
            InvalidationReason::ClientSwitch => {
                self.context.day_update_version += 1;
                self.context.history_ready = false;
                self.context.guard_started = None;
                self.history = DcsHistory::new();
            }
            InvalidationReason::NutrientRecompute | InvalidationReason::DayEdited => {}
        }
    }

    /// Register a live-update consumer. Each freshly computed snapshot is
    /// broadcast to every listener; memoized returns are not re-broadcast.
    pub fn subscribe(&mut self, listener: impl Fn(&MomentumSnapshot) + 'static) {
        self.listeners.push(Box::new(listener));
    }

    /// Run the full pipeline for one day.
    ///
    /// `prior_days[0]` is yesterday, further entries walk backward. `now_min`
    /// is the current clock time in minutes from midnight, used only for the
    /// post-training window and the next-step hint.
    ///
    /// Returns [`EngineError::HistoryNotReady`] while the readiness guard is
    /// active; after [`Self::mark_history_ready`] or the bounded timeout the
    /// computation proceeds (best-effort in the timeout case, with a
    /// warning on the snapshot).
    pub fn compute(
        &mut self,
        day: &DayRecord,
        prior_days: &[DayRecord],
        profile: &UserProfile,
        now_min: u32,
    ) -> EngineResult<MomentumSnapshot> {
        let mut warnings = Vec::new();

        if !self.context.history_ready {
            let deadline = Duration::from_millis(self.config.guard.ready_timeout_ms);
            let started = *self.context.guard_started.get_or_insert_with(Instant::now);
            if started.elapsed() < deadline {
                debug!("history not ready, output suppressed");
                return Err(EngineError::HistoryNotReady);
            }
            warn!("readiness guard timed out, continuing best-effort");
            warnings.push("history readiness timed out; results may be incomplete".into());
            self.context.history_ready = true;
        }

        let signature = input_signature(day, profile, self.context.day_update_version);
        if self.context.cache_signature == Some(signature) {
            if let Some(cached) = &self.context.cached_result {
                debug!(signature, "input signature unchanged, returning memoized result");
                return Ok(cached.clone());
            }
        }

        let baselines = PersonalBaselines::from_history(
            prior_days,
            profile,
            &self.config.signals,
            &self.config.sleep,
        );
        let signals =
            SignalExtractor::new(&self.config, profile, &baselines, self.scorer.as_ref())
                .extract(day);
        warnings.extend(signals.warnings.iter().cloned());

        let chain_outcome = chain::walk(&signals.events);

        let daily_contribution = contribution::normalize(
            &ContributionInputs {
                daily_score: signals.daily_score(),
                kcal_ratio: signals.kcal_ratio(profile.targets.target_kcal),
                goal_mode: profile.targets.goal_mode,
                target_max_ratio: profile.targets.target_max_ratio,
                critical_over_ratio: profile.targets.critical_over_ratio,
                training_day: !day.trainings.is_empty(),
                harmful_night_meal: signals.harmful_night_meal,
            },
            &self.config.overrides,
        );

        if self.history.take_purged_on_load() {
            warnings.push("stale history schema discarded; rebuilding from estimates".into());
        }
        self.history
            .upsert(day.date, DcsEntry::computed(daily_contribution.dcs));
        self.history.prune(day.date);
        RetroactiveEstimator::new(&self.config).backfill(
            &mut self.history,
            prior_days,
            day.date,
        );

        let mut raw_days: Vec<DayRecord> = prior_days.to_vec();
        raw_days.push(day.clone());
        let ceiling = ceiling::calibrate(&self.history, &raw_days, day.date);

        let momentum_outcome =
            momentum::aggregate(&self.history, day.date, daily_contribution.dcs, ceiling);
        let state = MomentumState::classify(momentum_outcome.crs, signals.events.len());

        let post_training_window = day
            .trainings
            .iter()
            .filter_map(TrainingSession::time_min)
            .any(|t| now_min >= t && now_min <= t + self.config.spacing.post_training_window_min);

        let snapshot = MomentumSnapshot {
            date: day.date,
            events: signals.events.clone(),
            chain_length: chain_outcome.chain_length,
            max_chain_today: chain_outcome.max_chain_today,
            breaks: chain_outcome.breaks,
            score: signals.daily_score(),
            state,
            crs: momentum_outcome.crs,
            crs_base: momentum_outcome.crs_base,
            today_boost: momentum_outcome.today_boost,
            ceiling,
            daily_contribution,
            crs_trend: momentum_outcome.trend,
            days_at_peak: momentum_outcome.days_at_peak,
            dcs_history: self.history.values_by_date(),
            warnings,
            post_training_window,
            next_step_hint: next_step_hint(day, &baselines, now_min),
        };

        self.context.cache_signature = Some(signature);
        self.context.cached_result = Some(snapshot.clone());
        for listener in &self.listeners {
            listener(&snapshot);
        }
        debug!(
            crs = snapshot.crs,
            state = ?snapshot.state,
            events = snapshot.events.len(),
            "momentum computed"
        );
        Ok(snapshot)
    }
}

/// Structural signature over everything that feeds the score. Clock time is
/// deliberately excluded: the memoized result stays valid until data or goal
/// parameters actually change, or an external writer bumps the version.
fn input_signature(day: &DayRecord, profile: &UserProfile, day_update_version: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    day.date.hash(&mut hasher);
    day_update_version.hash(&mut hasher);

    day.meals.len().hash(&mut hasher);
    for meal in &day.meals {
        meal.time.hash(&mut hasher);
        meal.items.len().hash(&mut hasher);
        let grams: f64 = meal.items.iter().map(|i| i.grams.unwrap_or(0.0)).sum();
        let kcal100: f64 = meal
            .items
            .iter()
            .map(|i| i.kcal_per_100g.unwrap_or(0.0))
            .sum();
        let harmful = meal.items.iter().filter(|i| i.is_harmful()).count();
        ((grams * 10.0).round() as i64).hash(&mut hasher);
        ((kcal100 * 10.0).round() as i64).hash(&mut hasher);
        harmful.hash(&mut hasher);
    }

    day.trainings.len().hash(&mut hasher);
    for session in &day.trainings {
        session.time.hash(&mut hasher);
        ((session.resolved_duration_min() * 10.0).round() as i64).hash(&mut hasher);
        session.kind.map(|k| k as u8).hash(&mut hasher);
    }

    day.steps.hash(&mut hasher);
    day.household_min.hash(&mut hasher);
    day.water_ml.hash(&mut hasher);
    day.sleep_start.hash(&mut hasher);
    day.sleep_end.hash(&mut hasher);
    ((day.sleep_hours.unwrap_or(0.0) * 100.0).round() as i64).hash(&mut hasher);
    ((day.weight_morning.unwrap_or(0.0) * 100.0).round() as i64).hash(&mut hasher);
    ((day
        .measurements
        .map_or(0.0, |m| m.completeness())
        * 100.0)
        .round() as i64)
        .hash(&mut hasher);
    day.supplements_taken.hash(&mut hasher);
    day.supplements_planned.hash(&mut hasher);

    profile.steps_goal.hash(&mut hasher);
    profile.water_norm_ml.hash(&mut hasher);
    profile.planned_supplements.hash(&mut hasher);
    (profile.targets.goal_mode as u8).hash(&mut hasher);
    ((profile.targets.target_kcal * 10.0).round() as i64).hash(&mut hasher);
    ((profile.targets.target_max_ratio * 1000.0).round() as i64).hash(&mut hasher);
    ((profile.targets.critical_over_ratio * 1000.0).round() as i64).hash(&mut hasher);

    hasher.finish()
}

/// Time-of-day-aware suggestion for the smallest missing behavior.
fn next_step_hint(
    day: &DayRecord,
    baselines: &PersonalBaselines,
    now_min: u32,
) -> Option<NextStepHint> {
    const NOON_MIN: u32 = 720;
    const EVENING_MIN: u32 = 1260;

    if now_min < NOON_MIN && !day.has_checkin() {
        return Some(NextStepHint::Checkin);
    }
    if day.meals.is_empty() {
        return Some(NextStepHint::FirstMeal);
    }
    if day.trainings.is_empty() && now_min < EVENING_MIN {
        return Some(NextStepHint::Training);
    }
    if !day.has_measurements()
        && baselines
            .last_measurement_age_days
            .map_or(true, |age| age > 7)
    {
        return Some(NextStepHint::Measurements);
    }
    if now_min >= EVENING_MIN
        && day.sleep_onset_min().is_none()
        && day.resolved_sleep_hours().is_none()
    {
        return Some(NextStepHint::LogSleep);
    }
    None
}
