// ABOUTME: Central error type for the momentum engine with constructor helpers
// ABOUTME: Scoring itself is total; errors cover input validation, guard suppression, and serialization
//
// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2026 Momentum Engine Contributors

use thiserror::Error;

/// Errors surfaced by engine entry points.
///
/// The scoring pipeline never fails on partial or malformed day data - missing
/// fields degrade to "no signal" and collaborator fallbacks produce warnings on
/// the snapshot instead. What remains is input validation, the readiness guard
/// and history (de)serialization.
#[derive(Debug, Error)]
pub enum EngineError {
    /// A caller-supplied value is structurally invalid (not merely absent).
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// History is not yet known-ready; the computed result is suppressed.
    ///
    /// Cleared by [`crate::engine::MomentumEngine::mark_history_ready`] or by
    /// the bounded guard deadline, after which computation falls through
    /// best-effort.
    #[error("history not ready, output suppressed")]
    HistoryNotReady,

    /// Persisted history could not be parsed.
    #[error("history serialization failed: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl EngineError {
    /// Invalid-input helper matching the call-site style used across the crate.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Convenience alias used by all fallible engine operations.
pub type EngineResult<T> = Result<T, EngineError>;
