// ABOUTME: Momentum aggregator - decayed 30-day average of contributions plus a same-day boost
// ABOUTME: Derives trend, peak streak, and the discrete momentum state
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::constants::{momentum as momentum_consts, states};
use crate::history::DcsHistory;

/// Discrete momentum state derived from CRS and event count. Never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MomentumState {
    /// No data at all for the day; overrides CRS.
    Empty,
    /// Momentum is forming.
    Building,
    /// Momentum is climbing.
    Growing,
    /// A strong, stable pattern.
    Strong,
    /// The pattern has broken down.
    Broken,
    /// Climbing back out of a breakdown.
    Recovery,
}

impl MomentumState {
    /// Classify a momentum value. A day with zero events is Empty regardless
    /// of what history says.
    #[must_use]
    pub fn classify(crs: f64, event_count: usize) -> Self {
        if event_count == 0 {
            return Self::Empty;
        }
        if crs >= states::STRONG_CRS {
            Self::Strong
        } else if crs >= states::GROWING_CRS {
            Self::Growing
        } else if crs >= states::BUILDING_CRS {
            Self::Building
        } else if crs > states::RECOVERY_CRS {
            Self::Recovery
        } else {
            Self::Broken
        }
    }
}

/// Direction of the recent contribution trend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    /// Recent days outscore the prior window.
    Up,
    /// Recent days underscore the prior window.
    Down,
    /// No meaningful difference, or not enough data to compare.
    Flat,
}

/// The aggregated momentum for one computation.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct MomentumOutcome {
    /// Headline momentum value, clamped to `[0, ceiling]`.
    pub crs: f64,

    /// Decayed base over completed days, clamped to the same range so the
    /// boost bound (`crs - crs_base` in `[0, 0.03]`) holds under the ceiling.
    pub crs_base: f64,

    /// Same-day boost actually granted.
    pub today_boost: f64,

    /// Recent-vs-prior contribution trend.
    pub trend: Trend,

    /// Consecutive days (today backward) at or above the peak threshold.
    pub days_at_peak: u32,
}

/// Aggregate completed-day contributions into the momentum value.
///
/// Days without a history entry are skipped entirely, not treated as zero -
/// absence of data is not evidence of breakdown.
#[must_use]
pub fn aggregate(
    history: &DcsHistory,
    today: NaiveDate,
    today_dcs: f64,
    ceiling: f64,
) -> MomentumOutcome {
    let mut weighted_sum = 0.0;
    let mut weight_sum = 0.0;
    for i in 1..momentum_consts::WINDOW_DAYS {
        let Some(date) = today.checked_sub_days(Days::new(i as u64)) else {
            break;
        };
        let Some(dcs) = history.dcs_on(date) else {
            continue;
        };
        let weight = momentum_consts::DECAY_ALPHA.powi(i as i32 - 1);
        weighted_sum += dcs * weight;
        weight_sum += weight;
    }
    let raw_base = if weight_sum > 0.0 {
        weighted_sum / weight_sum
    } else {
        0.0
    };

    let today_boost = today_dcs.max(0.0) * momentum_consts::TODAY_BOOST_FACTOR;
    let crs = (raw_base + today_boost).clamp(0.0, ceiling);
    let crs_base = raw_base.clamp(0.0, ceiling);

    MomentumOutcome {
        crs,
        crs_base,
        today_boost,
        trend: trend(history, today),
        days_at_peak: peak_streak(history, today, today_dcs),
    }
}

/// Mean contribution of the last 3 completed days versus days 4-7 back.
/// Either window lacking data reads as Flat rather than a fabricated
/// direction.
fn trend(history: &DcsHistory, today: NaiveDate) -> Trend {
    let window_mean = |from: u64, to: u64| -> Option<f64> {
        let mut sum = 0.0;
        let mut count = 0usize;
        for i in from..=to {
            let date = today.checked_sub_days(Days::new(i))?;
            if let Some(dcs) = history.dcs_on(date) {
                sum += dcs;
                count += 1;
            }
        }
        (count > 0).then(|| sum / count as f64)
    };

    let (Some(recent), Some(prior)) = (window_mean(1, 3), window_mean(4, 7)) else {
        return Trend::Flat;
    };
    let diff = recent - prior;
    if diff > momentum_consts::TREND_THRESHOLD {
        Trend::Up
    } else if diff < -momentum_consts::TREND_THRESHOLD {
        Trend::Down
    } else {
        Trend::Flat
    }
}

/// Consecutive days from today backward holding the peak threshold. Today
/// itself failing the threshold zeroes the streak no matter how long the
/// prior run was.
fn peak_streak(history: &DcsHistory, today: NaiveDate, today_dcs: f64) -> u32 {
    if today_dcs < momentum_consts::PEAK_DCS_THRESHOLD {
        return 0;
    }
    let mut streak = 1;
    for i in 1..momentum_consts::WINDOW_DAYS {
        let Some(date) = today.checked_sub_days(Days::new(i as u64)) else {
            break;
        };
        match history.dcs_on(date) {
            Some(dcs) if dcs >= momentum_consts::PEAK_DCS_THRESHOLD => streak += 1,
            _ => break,
        }
    }
    streak
}
