// ABOUTME: Chain aggregator - consecutive-success counter with soft degradation
// ABOUTME: Negative events erode the chain by a severity-tiered penalty instead of resetting it
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use serde::{Deserialize, Serialize};

use crate::constants::chain as chain_consts;
use crate::signals::{BreakReason, Event};

/// A recorded chain break: when, why, and how long the chain was.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BreakRecord {
    /// Clock time of the breaking event, when known.
    pub time_min: Option<u32>,

    /// Why the event was negative, when known.
    pub reason: Option<BreakReason>,

    /// Chain length just before the break.
    pub chain_before: u32,
}

/// Result of walking a day's events in timeline order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChainOutcome {
    /// Final chain length at the end of the day.
    pub chain_length: u32,

    /// Peak chain length reached during the day.
    pub max_chain_today: u32,

    /// Every erosion event, in order.
    pub breaks: Vec<BreakRecord>,
}

/// Penalty tier for a negative event's weight: light deviations erode one
/// link, serious ones two, catastrophic ones three.
#[must_use]
pub fn penalty_for(weight: f64) -> u32 {
    if weight >= chain_consts::LIGHT_SEVERITY_FLOOR {
        1
    } else if weight >= chain_consts::MEDIUM_SEVERITY_FLOOR {
        2
    } else {
        3
    }
}

/// Walk events (already in timeline order) and maintain the chain.
///
/// One bad event never zeroes a long streak - it erodes it in proportion to
/// severity.
#[must_use]
pub fn walk(events: &[Event]) -> ChainOutcome {
    let mut outcome = ChainOutcome::default();
    let mut chain: u32 = 0;

    for event in events {
        if event.positive {
            chain += 1;
            outcome.max_chain_today = outcome.max_chain_today.max(chain);
        } else {
            if chain > 0 {
                outcome.breaks.push(BreakRecord {
                    time_min: event.time_min,
                    reason: event.break_reason,
                    chain_before: chain,
                });
            }
            chain = chain.saturating_sub(penalty_for(event.weight));
        }
    }

    outcome.chain_length = chain;
    outcome
}
