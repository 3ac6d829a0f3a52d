//! ShotReport - Sync Engine output
//!
//! Per-shot acceptance result emitted on every arrival, consumed by the
//! dispatcher (table rendering, downstream demodulation analysis).

use serde::{Deserialize, Serialize};

use crate::{PayloadHandle, PeriodEstimate, ProducerKind};

/// Acceptance result for the shot that just arrived.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotReport {
    /// Stream the shot belongs to
    pub producer: ProducerKind,

    /// Local shot index within that stream (arrival order)
    pub shot_index: u64,

    /// Arrival timestamp, if one was extractable
    pub timestamp: Option<f64>,

    /// Whether the shot is accepted (locked once true)
    pub accepted: bool,

    /// Reference shot index the shot was matched to (secondary streams only)
    pub matched_reference_index: Option<u64>,

    /// Ratcheting run-length value at this index (0 when rejected)
    pub cumulative_value: u64,

    /// Spacing flag of the same-index reference shot, None if the reference
    /// stream has no data at this index yet
    pub reference_space_correct: Option<bool>,

    /// Handle to the artifact this shot came from
    pub payload: PayloadHandle,

    /// Summary statistics
    pub meta: ReportMeta,
}

/// Summary statistics attached to every report.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ReportMeta {
    /// Period estimate of the reporting stream
    pub stream_period: PeriodEstimate,

    /// Period estimate of the reference stream
    pub reference_period: PeriodEstimate,

    /// Locked (permanently accepted) shots in the reporting stream
    pub locked_count: u64,

    /// Record-high watermark of the cumulative series
    pub record_high: u64,
}
