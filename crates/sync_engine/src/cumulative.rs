//! Ratcheting run-length series for live monitoring charts.

use serde::{Deserialize, Serialize};

/// The characteristic sawtooth-with-ratchet series derived from an accepted
/// mask: rejected shots read 0, an accepted run counts up, and a run that
/// starts after a gap resumes from `record_high + 1` instead of 1.
///
/// Downstream dashboards diff against this series, so the shape must be
/// reproduced exactly.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CumulativeSeries {
    values: Vec<u64>,
    record_high: u64,
}

impl CumulativeSeries {
    /// Rebuild the whole series from an accepted mask.
    ///
    /// The watermark is re-derived from scratch; because the mask only ever
    /// gains accepts across reruns, the derived watermark never decreases.
    pub fn rebuild(mask: &[bool]) -> Self {
        let mut values = Vec::with_capacity(mask.len());
        let mut current = 0u64;
        let mut record_high = 0u64;

        for &accepted in mask {
            if accepted {
                if values.last().copied().unwrap_or(0) == 0 {
                    current = record_high + 1;
                } else {
                    current += 1;
                }
                record_high = record_high.max(current);
                values.push(current);
            } else {
                values.push(0);
            }
        }

        Self {
            values,
            record_high,
        }
    }

    /// Series value at `index` (0 when rejected or out of range).
    pub fn value(&self, index: u64) -> u64 {
        self.values.get(index as usize).copied().unwrap_or(0)
    }

    /// The full series in shot order.
    pub fn values(&self) -> &[u64] {
        &self.values
    }

    /// The record-high watermark.
    pub fn record_high(&self) -> u64 {
        self.record_high
    }
}
