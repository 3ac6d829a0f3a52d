//! ProducerKind - 采集子系统类别
//!
//! 每个实验周期 ("shot") 中，每个 producer 至多产生一个 artifact。

use serde::{Deserialize, Serialize};
use std::fmt;

/// Acquisition subsystem category.
///
/// `Reference` is the primary camera whose arrivals define the canonical shot
/// timeline; the other three are secondary streams matched against it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProducerKind {
    /// Primary camera (reference clock)
    Reference,
    /// Counter / FPGA log
    Counter,
    /// Digitizer capture device
    Digitizer,
    /// Lock-controller log
    LockLog,
}

impl ProducerKind {
    /// All known producer kinds, reference first.
    pub const ALL: [ProducerKind; 4] = [
        ProducerKind::Reference,
        ProducerKind::Counter,
        ProducerKind::Digitizer,
        ProducerKind::LockLog,
    ];

    /// Whether this is the reference (primary) stream.
    #[inline]
    pub fn is_reference(self) -> bool {
        matches!(self, ProducerKind::Reference)
    }

    /// Stable lowercase label (used for metrics labels and sink paths).
    pub fn label(self) -> &'static str {
        match self {
            ProducerKind::Reference => "reference",
            ProducerKind::Counter => "counter",
            ProducerKind::Digitizer => "digitizer",
            ProducerKind::LockLog => "lock_log",
        }
    }
}

impl fmt::Display for ProducerKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn labels_are_stable() {
        assert_eq!(ProducerKind::Reference.label(), "reference");
        assert_eq!(ProducerKind::LockLog.label(), "lock_log");
    }

    #[test]
    fn serde_snake_case() {
        let json = serde_json::to_string(&ProducerKind::LockLog).unwrap();
        assert_eq!(json, "\"lock_log\"");
        let back: ProducerKind = serde_json::from_str(&json).unwrap();
        assert_eq!(back, ProducerKind::LockLog);
    }
}
