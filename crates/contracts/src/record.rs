//! Per-shot derived state shared between the engine and its consumers.

use serde::{Deserialize, Serialize};

/// Running inter-arrival period estimate for one stream.
///
/// `defined = false` (value 0) below two timestamped arrivals. Always
/// recomputed from the whole history: `|last - first| / (count - 1)`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PeriodEstimate {
    /// Estimated period in seconds (0 when undefined)
    pub value: f64,

    /// Whether enough arrivals exist for the estimate to mean anything
    pub defined: bool,
}

impl PeriodEstimate {
    /// Undefined sentinel (fewer than 2 arrivals).
    pub const UNDEFINED: PeriodEstimate = PeriodEstimate {
        value: 0.0,
        defined: false,
    };

    /// A defined estimate.
    pub fn defined(value: f64) -> Self {
        Self {
            value,
            defined: true,
        }
    }
}

/// Match state for one secondary shot index.
///
/// `locked` is monotone: once set it survives every later recomputation.
/// Replaces the legacy parallel-array idiom (`mask_valid` / `matchlist` /
/// `color_array`) with a single structured record per index.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchRecord {
    /// Reference shot index this shot was matched to, if any
    pub matched_reference_index: Option<u64>,

    /// Whether the shot is currently accepted
    pub accepted: bool,

    /// Sticky acceptance lock; never reset once true
    pub locked: bool,
}

impl MatchRecord {
    /// An accepted, locked match to `reference_index`.
    pub fn accepted_at(reference_index: u64) -> Self {
        Self {
            matched_reference_index: Some(reference_index),
            accepted: true,
            locked: true,
        }
    }

    /// The rejected state (normal outcome, not an error).
    pub fn rejected() -> Self {
        Self::default()
    }
}

/// Immutable snapshot of reference-stream state handed to secondary matchers.
///
/// Secondary streams never see the live reference structures; the orchestrator
/// clones this snapshot once per cycle so a half-updated reference state can
/// never leak into a matching pass.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ReferenceSnapshot {
    /// Arrival timestamps by reference shot index
    pub timestamps: Vec<f64>,

    /// Spacing flags by reference shot index
    pub space_correct: Vec<bool>,

    /// Whole-span period estimate
    pub period: PeriodEstimate,
}

impl ReferenceSnapshot {
    /// Number of reference shots seen so far.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True before the first reference arrival.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }
}
