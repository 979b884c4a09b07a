// ABOUTME: Library entry point for the momentum scoring engine
// ABOUTME: Turns one day's health record plus history into a bounded momentum score and state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

#![deny(unsafe_code)]

//! # Momentum Engine
//!
//! Scores a user's daily health/behavior record (meals, training, sleep,
//! steps, checkins, measurements, supplements) into a single, slowly-moving,
//! bounded momentum value plus a discrete state label, giving continuous and
//! stable feedback about whether the recent behavior pattern is
//! strengthening, stable, or breaking down.
//!
//! ## Pipeline
//!
//! - **Signal extraction**: each behavioral factor becomes a continuously
//!   scored event (personalized baselines, confidence damping, hard floors).
//! - **Chain aggregation**: a consecutive-success counter that erodes softly
//!   under negative events instead of resetting.
//! - **Contribution normalization**: the day's score maps into a bounded
//!   Daily Contribution Score with goal-aware overrides.
//! - **History**: contributions persist per date, versioned and pruned; gaps
//!   are reconstructed by a retroactive estimator.
//! - **Momentum aggregation**: a decayed 30-day average plus a same-day
//!   boost, clamped to a personalized ceiling, classified into a state.
//!
//! The whole pipeline runs as one synchronous call per trigger. Memoization
//! keyed on a structural input signature makes repeat calls cheap, and a
//! readiness guard keeps a zero-history computation from being observed as a
//! real state.
//!
//! ## Example
//!
//! ```
//! use chrono::NaiveDate;
//! use momentum_engine::{DayRecord, EngineConfig, MomentumEngine, UserProfile};
//!
//! let mut engine = MomentumEngine::new(EngineConfig::default());
//! engine.mark_history_ready();
//!
//! let day = DayRecord {
//!     date: NaiveDate::from_ymd_opt(2026, 3, 10).unwrap(),
//!     steps: 8500,
//!     ..DayRecord::default()
//! };
//! let snapshot = engine.compute(&day, &[], &UserProfile::default(), 600)?;
//! assert!(snapshot.crs >= 0.0);
//! assert!(snapshot.crs <= snapshot.ceiling);
//! # Ok::<(), momentum_engine::EngineError>(())
//! ```

pub mod backfill;
pub mod baselines;
pub mod ceiling;
pub mod chain;
pub mod config;
pub mod constants;
pub mod contribution;
pub mod engine;
pub mod errors;
pub mod history;
pub mod models;
pub mod momentum;
pub mod quality;
pub mod signals;

pub use backfill::RetroactiveEstimator;
pub use baselines::{FactorKind, PersonalBaselines};
pub use chain::{BreakRecord, ChainOutcome};
pub use config::{ConfigError, EngineConfig};
pub use contribution::{DailyContribution, DcsOverride};
pub use engine::{
    EngineContext, InvalidationReason, MomentumEngine, MomentumSnapshot, NextStepHint,
};
pub use errors::{EngineError, EngineResult};
pub use history::{DcsEntry, DcsHistory, DcsSource, CURRENT_SCHEMA_VERSION};
pub use models::{
    DailyTargets, DayRecord, FoodItem, GoalMode, Meal, Measurements, TrainingKind,
    TrainingSession, UserProfile,
};
pub use momentum::{MomentumOutcome, MomentumState, Trend};
pub use quality::{MealQualityScorer, NoQualityScorer, TimeBandQualityScorer};
pub use signals::{BreakReason, DaySignals, Event, SignalExtractor};
