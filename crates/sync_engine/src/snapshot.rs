//! Versioned immutable view of engine state for concurrent readers.

use std::collections::BTreeMap;

use contracts::{MatchRecord, ProducerKind, ReferenceSnapshot};
use serde::{Deserialize, Serialize};

/// Copy-on-publish snapshot of the whole engine.
///
/// The engine actor publishes a fresh snapshot after every arrival; readers
/// (rendering, downstream analysis) only ever see fully-updated state, never
/// a mid-recomputation view. `version` increments once per arrival.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineSnapshot {
    /// Monotone arrival counter
    pub version: u64,

    /// Reference stream state
    pub reference: ReferenceSnapshot,

    /// Reference-stream cumulative series
    pub reference_cumulative: Vec<u64>,

    /// Secondary stream state by producer
    pub streams: BTreeMap<ProducerKind, StreamSnapshot>,
}

/// Snapshot of one secondary stream.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StreamSnapshot {
    /// Match records by shot index
    pub records: Vec<MatchRecord>,

    /// Cumulative series by shot index
    pub cumulative: Vec<u64>,

    /// Record-high watermark
    pub record_high: u64,
}

impl EngineSnapshot {
    /// Whether shot `index` of `producer` is accepted.
    pub fn is_accepted(&self, producer: ProducerKind, index: u64) -> bool {
        if producer.is_reference() {
            return self.reference_space_correct(index);
        }
        self.streams
            .get(&producer)
            .and_then(|s| s.records.get(index as usize))
            .map(|r| r.accepted)
            .unwrap_or(false)
    }

    /// Matched reference index for a secondary shot, if accepted.
    pub fn matched_reference_index(&self, producer: ProducerKind, index: u64) -> Option<u64> {
        self.streams
            .get(&producer)
            .and_then(|s| s.records.get(index as usize))
            .and_then(|r| r.matched_reference_index)
    }

    /// Cumulative chart value for shot `index` of `producer`.
    pub fn cumulative_value(&self, producer: ProducerKind, index: u64) -> u64 {
        let series = if producer.is_reference() {
            &self.reference_cumulative
        } else {
            match self.streams.get(&producer) {
                Some(s) => &s.cumulative,
                None => return 0,
            }
        };
        series.get(index as usize).copied().unwrap_or(0)
    }

    /// Spacing flag of reference shot `index` (false if not seen).
    pub fn reference_space_correct(&self, index: u64) -> bool {
        self.reference
            .space_correct
            .get(index as usize)
            .copied()
            .unwrap_or(false)
    }
}
