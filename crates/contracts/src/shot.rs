//! ShotArrival - Ingestion 输出
//!
//! 一次 artifact 到达的原始记录。

use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::ProducerKind;

/// One artifact arrival reported by the ingestion layer.
///
/// The engine never reads artifact content; it only consumes the arrival
/// timestamp and carries the payload handle through to the emitted report.
/// `timestamp = None` marks an artifact whose timestamp could not be
/// extracted - such shots are recorded and permanently rejected.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShotArrival {
    /// Producing subsystem
    pub producer: ProducerKind,

    /// Arrival / creation time (seconds, wall clock); None if unreadable
    pub timestamp: Option<f64>,

    /// Opaque handle to the artifact content
    pub payload: PayloadHandle,
}

impl ShotArrival {
    /// Arrival with a valid timestamp.
    pub fn new(producer: ProducerKind, timestamp: f64, payload: PayloadHandle) -> Self {
        Self {
            producer,
            timestamp: Some(timestamp),
            payload,
        }
    }

    /// Arrival whose timestamp could not be extracted.
    pub fn without_timestamp(producer: ProducerKind, payload: PayloadHandle) -> Self {
        Self {
            producer,
            timestamp: None,
            payload,
        }
    }
}

/// Opaque artifact handle passed through the engine untouched.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PayloadHandle {
    /// Artifact lives on disk
    Path(PathBuf),

    /// Artifact content carried inline (zero-copy)
    Inline(Bytes),

    /// Nothing extractable (empty / corrupt artifact)
    Empty,
}

impl PayloadHandle {
    /// Handle referring to a file path.
    pub fn path(p: impl Into<PathBuf>) -> Self {
        PayloadHandle::Path(p.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_timestamp_constructor() {
        let arrival = ShotArrival::without_timestamp(ProducerKind::LockLog, PayloadHandle::Empty);
        assert!(arrival.timestamp.is_none());
        assert_eq!(arrival.producer, ProducerKind::LockLog);
    }

    #[test]
    fn round_trips_through_json() {
        let arrival = ShotArrival::new(
            ProducerKind::Digitizer,
            12.5,
            PayloadHandle::path("/data/gage_0001.h5"),
        );
        let json = serde_json::to_string(&arrival).unwrap();
        let back: ShotArrival = serde_json::from_str(&json).unwrap();
        assert_eq!(back.timestamp, Some(12.5));
    }
}
