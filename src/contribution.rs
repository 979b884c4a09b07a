// ABOUTME: Contribution normalizer - maps a daily score into the bounded, override-aware DCS
// ABOUTME: Critical violations, goal-aware deficit tiers, and the bulk exemption in precedence order
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use serde::{Deserialize, Serialize};

use crate::config::OverrideConfig;
use crate::constants::momentum;
use crate::models::GoalMode;

/// Which override (if any) replaced the derived contribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DcsOverride {
    /// Harmful night eating combined with a >150% calorie overrun.
    CriticalCombined,
    /// Harmful night eating alone.
    NightHarm,
    /// Generic >150% calorie overrun.
    CalorieOverrun,
    /// Deficit goal, ratio past 1.5 x tolerance.
    DeficitSevere,
    /// Deficit goal, ratio past the critical-over threshold.
    DeficitHigh,
    /// Deficit goal, ratio past target-max: clamp floor tightened.
    DeficitTightenedFloor,
}

/// The bounded per-day contribution plus the override that produced it.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DailyContribution {
    /// Daily Contribution Score in [-1.0, 1.0] (overrides may go below the
    /// derived floor).
    pub dcs: f64,

    /// Override applied, if any.
    pub override_applied: Option<DcsOverride>,
}

/// Inputs the normalizer needs beyond the raw score.
#[derive(Debug, Clone, Copy)]
pub struct ContributionInputs {
    /// Combined daily score (events + penalties + synergy).
    pub daily_score: f64,

    /// Consumed-to-target calorie ratio (0 when no target is set).
    pub kcal_ratio: f64,

    /// Active goal mode.
    pub goal_mode: GoalMode,

    /// Ratio over which the deficit floor tightens.
    pub target_max_ratio: f64,

    /// Ratio over which the mid deficit tier engages.
    pub critical_over_ratio: f64,

    /// Whether the day had at least one training session (earns extra
    /// allowance before deficit tiers engage).
    pub training_day: bool,

    /// A harmful product was eaten in the night window.
    pub harmful_night_meal: bool,
}

/// Normalize a daily score into the DCS, applying at most one override class.
#[must_use]
pub fn normalize(inputs: &ContributionInputs, config: &OverrideConfig) -> DailyContribution {
    let base = (inputs.daily_score / momentum::MOMENTUM_TARGET)
        .clamp(momentum::DCS_FLOOR, momentum::DCS_CEILING);
    let ratio = inputs.kcal_ratio;

    // Critical violations outrank everything.
    if inputs.harmful_night_meal && ratio > config.overrun_ratio {
        return DailyContribution {
            dcs: config.critical_combined,
            override_applied: Some(DcsOverride::CriticalCombined),
        };
    }
    if inputs.harmful_night_meal {
        return DailyContribution {
            dcs: config.night_harm,
            override_applied: Some(DcsOverride::NightHarm),
        };
    }
    if inputs.goal_mode == GoalMode::Deficit {
        // Deficit goals replace the generic overrun with their own, stricter
        // tiers; the severe tier covers the generic range.
        let tolerance = if inputs.training_day {
            config.training_day_tolerance
        } else {
            1.0
        };
        if ratio > config.overrun_ratio * tolerance {
            return DailyContribution {
                dcs: config.deficit_severe,
                override_applied: Some(DcsOverride::DeficitSevere),
            };
        }
        if ratio > inputs.critical_over_ratio * tolerance {
            return DailyContribution {
                dcs: config.deficit_high,
                override_applied: Some(DcsOverride::DeficitHigh),
            };
        }
        if ratio > inputs.target_max_ratio * tolerance {
            // Tightened clamp: the day cannot score better than the deficit
            // floor, which sits below the default -0.3.
            return DailyContribution {
                dcs: base.min(config.deficit_tight_floor),
                override_applied: Some(DcsOverride::DeficitTightenedFloor),
            };
        }
    } else if ratio > config.overrun_ratio {
        // Bulk goals tolerate an overrun up to the exemption ratio.
        let exempt =
            inputs.goal_mode == GoalMode::Bulk && ratio <= config.bulk_exemption_ratio;
        if !exempt {
            return DailyContribution {
                dcs: config.calorie_overrun,
                override_applied: Some(DcsOverride::CalorieOverrun),
            };
        }
    }

    DailyContribution {
        dcs: base,
        override_applied: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn inputs(score: f64, ratio: f64, goal: GoalMode) -> ContributionInputs {
        ContributionInputs {
            daily_score: score,
            kcal_ratio: ratio,
            goal_mode: goal,
            target_max_ratio: 1.05,
            critical_over_ratio: 1.25,
            training_day: false,
            harmful_night_meal: false,
        }
    }

    #[test]
    fn derives_dcs_from_momentum_target() {
        let config = OverrideConfig::default();
        let result = normalize(&inputs(8.0, 0.9, GoalMode::Maintenance), &config);
        assert!((result.dcs - 0.8).abs() < 1e-9);
        assert!(result.override_applied.is_none());
    }

    #[test]
    fn derived_dcs_clamped_to_documented_range() {
        let config = OverrideConfig::default();
        let high = normalize(&inputs(25.0, 0.9, GoalMode::Maintenance), &config);
        assert!((high.dcs - 1.0).abs() < 1e-9);
        let low = normalize(&inputs(-9.0, 0.9, GoalMode::Maintenance), &config);
        assert!((low.dcs + 0.3).abs() < 1e-9);
    }

    #[test]
    fn critical_combined_outranks_positive_score() {
        let config = OverrideConfig::default();
        let mut i = inputs(9.5, 1.6, GoalMode::Maintenance);
        i.harmful_night_meal = true;
        let result = normalize(&i, &config);
        assert!((result.dcs + 1.0).abs() < 1e-9);
        assert_eq!(result.override_applied, Some(DcsOverride::CriticalCombined));
    }

    #[test]
    fn night_harm_alone_scores_minus_point_eight() {
        let config = OverrideConfig::default();
        let mut i = inputs(5.0, 1.1, GoalMode::Maintenance);
        i.harmful_night_meal = true;
        let result = normalize(&i, &config);
        assert!((result.dcs + 0.8).abs() < 1e-9);
        assert_eq!(result.override_applied, Some(DcsOverride::NightHarm));
    }

    #[test]
    fn bulk_goal_waives_generic_overrun_up_to_exemption() {
        let config = OverrideConfig::default();
        let waived = normalize(&inputs(6.0, 1.7, GoalMode::Bulk), &config);
        assert!(waived.override_applied.is_none());
        assert!(waived.dcs > 0.0);

        let beyond = normalize(&inputs(6.0, 1.9, GoalMode::Bulk), &config);
        assert_eq!(beyond.override_applied, Some(DcsOverride::CalorieOverrun));
    }

    #[test]
    fn deficit_tiers_engage_in_order() {
        let config = OverrideConfig::default();
        let severe = normalize(&inputs(4.0, 1.6, GoalMode::Deficit), &config);
        assert_eq!(severe.override_applied, Some(DcsOverride::DeficitSevere));
        assert!((severe.dcs + 0.7).abs() < 1e-9);

        let high = normalize(&inputs(4.0, 1.3, GoalMode::Deficit), &config);
        assert_eq!(high.override_applied, Some(DcsOverride::DeficitHigh));
        assert!((high.dcs + 0.5).abs() < 1e-9);

        let tightened = normalize(&inputs(4.0, 1.1, GoalMode::Deficit), &config);
        assert_eq!(
            tightened.override_applied,
            Some(DcsOverride::DeficitTightenedFloor)
        );
        assert!((tightened.dcs + 0.4).abs() < 1e-9);
    }

    #[test]
    fn training_day_tolerance_shifts_deficit_tiers() {
        let config = OverrideConfig::default();
        let mut i = inputs(4.0, 1.1, GoalMode::Deficit);
        i.training_day = true;
        // 1.1 <= 1.05 * 1.2, so no tier engages on a training day.
        let result = normalize(&i, &config);
        assert!(result.override_applied.is_none());
    }

    #[test]
    fn deficit_at_110_percent_is_strictly_worse_than_maintenance() {
        let config = OverrideConfig::default();
        let deficit = normalize(&inputs(4.0, 1.1, GoalMode::Deficit), &config);
        let maintenance = normalize(&inputs(4.0, 1.1, GoalMode::Maintenance), &config);
        assert!(deficit.dcs <= -0.4);
        assert!(deficit.dcs < maintenance.dcs);
        assert!(maintenance.dcs >= momentum::DCS_FLOOR);
    }
}
