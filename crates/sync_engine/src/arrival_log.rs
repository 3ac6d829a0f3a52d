//! Per-producer append-only arrival log.

use contracts::{PayloadHandle, PeriodEstimate};

/// Append-only list of artifact arrivals for one stream, indexed by local
/// shot index (arrival order == index order).
///
/// Entries are never mutated or removed. A `None` timestamp marks an artifact
/// whose creation time could not be extracted.
#[derive(Debug, Default, Clone)]
pub struct ArrivalLog {
    timestamps: Vec<Option<f64>>,
    payloads: Vec<PayloadHandle>,
}

impl ArrivalLog {
    /// Create an empty log.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an arrival; returns its local shot index.
    ///
    /// No ordering constraint is enforced: out-of-order timestamps are stored
    /// as-is.
    pub fn record_arrival(&mut self, timestamp: Option<f64>, payload: PayloadHandle) -> u64 {
        let index = self.timestamps.len() as u64;
        self.timestamps.push(timestamp);
        self.payloads.push(payload);
        index
    }

    /// Number of arrivals seen so far.
    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    /// True before the first arrival.
    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// Timestamp at `index`, if the shot exists and had one.
    pub fn timestamp(&self, index: u64) -> Option<f64> {
        self.timestamps.get(index as usize).copied().flatten()
    }

    /// Payload handle at `index`.
    pub fn payload(&self, index: u64) -> Option<&PayloadHandle> {
        self.payloads.get(index as usize)
    }

    /// All timestamps in arrival order (None for unreadable artifacts).
    pub fn timestamps(&self) -> &[Option<f64>] {
        &self.timestamps
    }

    /// Timestamped entries only, in arrival order.
    pub fn defined_timestamps(&self) -> impl Iterator<Item = f64> + '_ {
        self.timestamps.iter().copied().flatten()
    }

    /// Whole-history period estimate: `|last - first| / (count - 1)` over the
    /// timestamped entries, recomputed from scratch on every call.
    ///
    /// Pure function of the log; intentionally sensitive to outliers, since
    /// that is what the acceptance semantics are defined against.
    pub fn estimate_period(&self) -> PeriodEstimate {
        let mut defined = self.defined_timestamps();
        let first = match defined.next() {
            Some(t) => t,
            None => return PeriodEstimate::UNDEFINED,
        };

        let mut count = 1u64;
        let mut last = first;
        for t in defined {
            count += 1;
            last = t;
        }

        if count < 2 {
            return PeriodEstimate::UNDEFINED;
        }

        PeriodEstimate::defined((last - first).abs() / (count - 1) as f64)
    }
}
