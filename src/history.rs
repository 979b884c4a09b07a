// ABOUTME: Versioned date-keyed store of Daily Contribution Scores with retention pruning
// ABOUTME: Schema mismatches purge the whole map via an explicit migration table
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use std::collections::BTreeMap;

use chrono::{Days, NaiveDate};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::constants::windows;
use crate::errors::EngineResult;

/// Current schema version of the persisted history map.
///
/// Bump this whenever a scoring-formula change alters what a stored DCS
/// means. Old entries are then discarded wholesale and regenerated by the
/// retroactive estimator; scoring changes invalidate stored values
/// non-linearly, so incremental migration is not attempted.
pub const CURRENT_SCHEMA_VERSION: u32 = 3;

/// How to treat a persisted map carrying the given schema version.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrationStrategy {
    /// Entries are still meaningful; keep them.
    Keep,
    /// Entries were produced by stale formulas; discard the whole map and
    /// force a full backfill.
    Discard,
}

/// Migration table from persisted schema versions to a strategy.
///
/// Every known-stale version (and any unknown tag) maps to [`MigrationStrategy::Discard`].
/// A future formula revision that happens to preserve DCS semantics can map
/// its predecessor to `Keep` instead.
#[must_use]
pub const fn migration_for(version: u32) -> MigrationStrategy {
    match version {
        CURRENT_SCHEMA_VERSION => MigrationStrategy::Keep,
        _ => MigrationStrategy::Discard,
    }
}

/// How a history entry was produced.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DcsSource {
    /// Live pipeline over a complete day record.
    #[default]
    Computed,
    /// Retroactive estimator approximation.
    Estimated,
}

/// One persisted Daily Contribution Score.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct DcsEntry {
    /// The contribution value.
    pub dcs: f64,

    /// Live computation or retroactive estimate.
    #[serde(default)]
    pub source: DcsSource,

    /// Entry is known to come from an incorrect override path and should be
    /// re-estimated on the next backfill pass.
    #[serde(default)]
    pub flagged: bool,
}

impl DcsEntry {
    /// A live-computed, unflagged entry.
    #[must_use]
    pub const fn computed(dcs: f64) -> Self {
        Self {
            dcs,
            source: DcsSource::Computed,
            flagged: false,
        }
    }

    /// An estimator-produced entry.
    #[must_use]
    pub const fn estimated(dcs: f64) -> Self {
        Self {
            dcs,
            source: DcsSource::Estimated,
            flagged: false,
        }
    }
}

/// Date-keyed DCS map, versioned by a schema tag.
///
/// Mutated by three paths only: today's live computation (upsert), the
/// retroactive backfill (insert-if-missing or correct-if-flagged), and
/// retention pruning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DcsHistory {
    /// Schema tag of the scoring formulas that produced these entries.
    pub schema_version: u32,

    /// Contribution per calendar date.
    pub entries: BTreeMap<NaiveDate, DcsEntry>,

    /// Set when loading discarded a stale-schema map; consumed by the engine
    /// as a snapshot warning. Never persisted.
    #[serde(skip)]
    purged_on_load: bool,
}

impl Default for DcsHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl DcsHistory {
    /// An empty map at the current schema version.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            schema_version: CURRENT_SCHEMA_VERSION,
            entries: BTreeMap::new(),
            purged_on_load: false,
        }
    }

    /// Parse a persisted map, applying the migration table.
    ///
    /// A stale or unknown schema version discards every entry and starts
    /// fresh; the estimator rebuilds the window on the next computation.
    pub fn from_json(json: &str) -> EngineResult<Self> {
        let mut parsed: Self = serde_json::from_str(json)?;
        match migration_for(parsed.schema_version) {
            MigrationStrategy::Keep => {
                parsed.purged_on_load = false;
                Ok(parsed)
            }
            MigrationStrategy::Discard => {
                warn!(
                    stale_version = parsed.schema_version,
                    current_version = CURRENT_SCHEMA_VERSION,
                    discarded = parsed.entries.len(),
                    "stale history schema, purging for full backfill"
                );
                let mut fresh = Self::new();
                fresh.purged_on_load = true;
                Ok(fresh)
            }
        }
    }

    /// Serialize for the caller's persistence layer.
    pub fn to_json(&self) -> EngineResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Insert or replace the entry for a date.
    pub fn upsert(&mut self, date: NaiveDate, entry: DcsEntry) {
        self.entries.insert(date, entry);
    }

    /// The contribution stored for a date, if any.
    #[must_use]
    pub fn dcs_on(&self, date: NaiveDate) -> Option<f64> {
        self.entries.get(&date).map(|e| e.dcs)
    }

    /// The full entry stored for a date, if any.
    #[must_use]
    pub fn entry_on(&self, date: NaiveDate) -> Option<&DcsEntry> {
        self.entries.get(&date)
    }

    /// Drop entries older than the retention window.
    pub fn prune(&mut self, today: NaiveDate) {
        let Some(cutoff) =
            today.checked_sub_days(Days::new(windows::HISTORY_RETENTION_DAYS as u64))
        else {
            return;
        };
        let before = self.entries.len();
        self.entries.retain(|date, _| *date >= cutoff);
        let dropped = before - self.entries.len();
        if dropped > 0 {
            debug!(dropped, "pruned history entries past retention");
        }
    }

    /// Whether loading purged a stale-schema map. Clears the flag.
    pub fn take_purged_on_load(&mut self) -> bool {
        std::mem::take(&mut self.purged_on_load)
    }

    /// Number of stored entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Whether no entries are stored.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Date-to-value view for snapshot export.
    #[must_use]
    pub fn values_by_date(&self) -> BTreeMap<NaiveDate, f64> {
        self.entries.iter().map(|(d, e)| (*d, e.dcs)).collect()
    }
}
