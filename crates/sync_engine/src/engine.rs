//! Orchestrator: wires one reference stream to N secondary streams.

use std::collections::BTreeMap;

use contracts::{
    ProducerKind, ReferenceSnapshot, ReportMeta, ShotArrival, ShotReport, SyncConfig,
};
use tracing::instrument;

use crate::snapshot::{EngineSnapshot, StreamSnapshot};
use crate::stream::{ReferenceStream, SecondaryStream};

/// Multi-stream shot synchronization engine.
///
/// Single-threaded: one arrival is processed to completion before the next.
/// Every arrival triggers a full-history re-evaluation of all unlocked
/// secondary indices, O(N²) over the run - fine at a few shots per second,
/// which is what the experiments produce.
#[derive(Debug)]
pub struct ShotSyncEngine {
    config: SyncConfig,
    reference: ReferenceStream,
    secondaries: BTreeMap<ProducerKind, SecondaryStream>,
    version: u64,
}

impl ShotSyncEngine {
    /// Create a new engine with the given configuration.
    pub fn new(config: SyncConfig) -> Self {
        let mut secondaries = BTreeMap::new();
        for &producer in &config.secondaries {
            if producer != config.reference {
                secondaries.insert(producer, SecondaryStream::new(producer));
            }
        }

        Self {
            reference: ReferenceStream::new(config.tolerance_spacing),
            secondaries,
            config,
            version: 0,
        }
    }

    /// Process one artifact arrival and return the report for its shot.
    ///
    /// Reference arrivals refresh the period estimate and spacing flags, then
    /// every secondary stream re-evaluates its unlocked indices against a
    /// fresh reference snapshot. Secondary arrivals append and trigger the
    /// same re-evaluation pass.
    #[instrument(
        level = "debug",
        name = "engine_notify_arrival",
        skip(self, arrival),
        fields(producer = %arrival.producer, timestamp = arrival.timestamp)
    )]
    pub fn notify_arrival(&mut self, arrival: ShotArrival) -> ShotReport {
        self.version += 1;
        metrics::counter!(
            "shot_syncer_arrivals_total",
            "producer" => arrival.producer.label()
        )
        .increment(1);

        let report = if arrival.producer == self.config.reference {
            self.push_reference(arrival)
        } else {
            self.push_secondary(arrival)
        };

        metrics::gauge!("shot_syncer_reference_period_seconds")
            .set(self.reference.log.estimate_period().value);

        report
    }

    fn push_reference(&mut self, arrival: ShotArrival) -> ShotReport {
        let payload = arrival.payload.clone();
        let (index, space_correct) = self.reference.push(arrival.timestamp, arrival.payload);
        self.rerun_secondaries();

        let period = self.reference.log.estimate_period();
        ShotReport {
            producer: self.config.reference,
            shot_index: index,
            timestamp: arrival.timestamp,
            accepted: space_correct,
            matched_reference_index: None,
            cumulative_value: self.reference.series().value(index),
            reference_space_correct: Some(space_correct),
            payload,
            meta: ReportMeta {
                stream_period: period,
                reference_period: period,
                locked_count: self.reference.accepted_count(),
                record_high: self.reference.series().record_high(),
            },
        }
    }

    fn push_secondary(&mut self, arrival: ShotArrival) -> ShotReport {
        let producer = arrival.producer;
        let payload = arrival.payload.clone();
        let index = self
            .secondaries
            .entry(producer)
            .or_insert_with(|| SecondaryStream::new(producer))
            .push(arrival.timestamp, arrival.payload);

        self.rerun_secondaries();

        let stream = &self.secondaries[&producer];
        let record = stream.record(index).copied().unwrap_or_default();
        ShotReport {
            producer,
            shot_index: index,
            timestamp: arrival.timestamp,
            accepted: record.accepted,
            matched_reference_index: record.matched_reference_index,
            cumulative_value: stream.series().value(index),
            reference_space_correct: self.reference.space_correct_opt(index),
            payload,
            meta: ReportMeta {
                stream_period: stream.log.estimate_period(),
                reference_period: self.reference.log.estimate_period(),
                locked_count: stream.ledger.locked_count(),
                record_high: stream.series().record_high(),
            },
        }
    }

    /// One orchestrator cycle: every secondary re-evaluates its unlocked
    /// indices against the same immutable reference snapshot.
    fn rerun_secondaries(&mut self) {
        let snapshot = self.reference.snapshot();
        for stream in self.secondaries.values_mut() {
            stream.rerun(&snapshot, self.config.tolerance_match);
        }
    }

    // ===== Queries =====

    /// Whether shot `index` of `producer` is accepted.
    pub fn is_accepted(&self, producer: ProducerKind, index: u64) -> bool {
        if producer == self.config.reference {
            return self.reference.space_correct(index);
        }
        self.secondaries
            .get(&producer)
            .map(|s| s.ledger.get(index))
            .unwrap_or(false)
    }

    /// Matched reference index for a secondary shot, if any.
    pub fn matched_reference_index(&self, producer: ProducerKind, index: u64) -> Option<u64> {
        self.secondaries
            .get(&producer)
            .and_then(|s| s.record(index))
            .and_then(|r| r.matched_reference_index)
    }

    /// Cumulative chart value at `index` for `producer`.
    pub fn cumulative_value(&self, producer: ProducerKind, index: u64) -> u64 {
        if producer == self.config.reference {
            return self.reference.series().value(index);
        }
        self.secondaries
            .get(&producer)
            .map(|s| s.series().value(index))
            .unwrap_or(0)
    }

    /// Spacing flag of reference shot `index`.
    pub fn reference_space_correct(&self, index: u64) -> bool {
        self.reference.space_correct(index)
    }

    /// Immutable reference-stream snapshot.
    pub fn reference_snapshot(&self) -> ReferenceSnapshot {
        self.reference.snapshot()
    }

    /// Number of arrivals processed so far.
    pub fn version(&self) -> u64 {
        self.version
    }

    /// The engine configuration.
    pub fn config(&self) -> &SyncConfig {
        &self.config
    }

    /// Copy-on-publish snapshot of the whole engine state.
    pub fn snapshot(&self) -> EngineSnapshot {
        let streams = self
            .secondaries
            .iter()
            .map(|(&producer, stream)| {
                (
                    producer,
                    StreamSnapshot {
                        records: stream.records().to_vec(),
                        cumulative: stream.series().values().to_vec(),
                        record_high: stream.series().record_high(),
                    },
                )
            })
            .collect();

        EngineSnapshot {
            version: self.version,
            reference: self.reference.snapshot(),
            reference_cumulative: self.reference.series().values().to_vec(),
            streams,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::PayloadHandle;

    fn engine() -> ShotSyncEngine {
        ShotSyncEngine::new(SyncConfig::default())
    }

    fn reference(engine: &mut ShotSyncEngine, t: f64) -> ShotReport {
        engine.notify_arrival(ShotArrival::new(
            ProducerKind::Reference,
            t,
            PayloadHandle::Empty,
        ))
    }

    fn secondary(engine: &mut ShotSyncEngine, producer: ProducerKind, t: f64) -> ShotReport {
        engine.notify_arrival(ShotArrival::new(producer, t, PayloadHandle::Empty))
    }

    #[test]
    fn happy_path_scenario() {
        let mut engine = engine();
        for t in [0.0, 1.0, 2.0, 3.0] {
            let report = reference(&mut engine, t);
            assert!(report.accepted);
        }

        for (i, t) in [0.05, 1.02, 2.10].into_iter().enumerate() {
            let report = secondary(&mut engine, ProducerKind::Digitizer, t);
            assert!(report.accepted, "shot {i} should match");
            assert_eq!(report.matched_reference_index, Some(i as u64));
            assert_eq!(report.cumulative_value, i as u64 + 1);
        }
    }

    #[test]
    fn spacing_violation_blocks_matching() {
        let mut engine = engine();
        reference(&mut engine, 0.0);
        reference(&mut engine, 1.0);
        reference(&mut engine, 5.0);
        assert!(!engine.reference_space_correct(2));

        // numerically close to t=5.0, still rejected
        let report = secondary(&mut engine, ProducerKind::Counter, 5.02);
        assert!(!report.accepted);
        assert_eq!(report.cumulative_value, 0);
    }

    #[test]
    fn lock_survives_period_regression() {
        let mut engine = engine();
        reference(&mut engine, 10.0);

        // accepted under the index-identity fallback while the period is
        // still undefined
        let report = secondary(&mut engine, ProducerKind::Digitizer, 55.5);
        assert!(report.accepted);

        // period becomes defined (1.0); a fresh evaluation of index 0 would
        // now fail the tolerance check by a wide margin
        reference(&mut engine, 11.0);
        reference(&mut engine, 12.0);
        assert!(engine.is_accepted(ProducerKind::Digitizer, 0));
        assert_eq!(engine.matched_reference_index(ProducerKind::Digitizer, 0), Some(0));
    }

    #[test]
    fn lock_survives_window_shrink() {
        let mut engine = engine();
        reference(&mut engine, 0.0);
        reference(&mut engine, 1.0);

        // distance 0.25 fits the 0.3 window at period 1.0
        let report = secondary(&mut engine, ProducerKind::Counter, 0.25);
        assert!(report.accepted);

        // a denser reference arrival shrinks the period to 0.75 and the
        // window to 0.225; the locked shot is never re-evaluated
        reference(&mut engine, 1.5);
        assert!(engine.is_accepted(ProducerKind::Counter, 0));
    }

    #[test]
    fn secondary_ahead_of_reference_resolves_later() {
        let mut engine = engine();
        reference(&mut engine, 0.0);
        reference(&mut engine, 1.0);

        // no reference shot near t=2 yet
        let report = secondary(&mut engine, ProducerKind::LockLog, 2.04);
        assert!(!report.accepted);

        // reference catches up; the unlocked index re-evaluates
        reference(&mut engine, 2.0);
        assert!(engine.is_accepted(ProducerKind::LockLog, 0));
        assert_eq!(engine.matched_reference_index(ProducerKind::LockLog, 0), Some(2));
    }

    #[test]
    fn missing_timestamp_shot_is_terminal_and_isolated() {
        let mut engine = engine();
        for t in [0.0, 1.0, 2.0] {
            reference(&mut engine, t);
        }

        let report = engine.notify_arrival(ShotArrival::without_timestamp(
            ProducerKind::LockLog,
            PayloadHandle::Empty,
        ));
        assert!(!report.accepted);
        assert_eq!(report.cumulative_value, 0);

        // the broken shot does not disturb its neighbors
        let report = secondary(&mut engine, ProducerKind::LockLog, 1.03);
        assert!(report.accepted);
        assert_eq!(report.matched_reference_index, Some(1));
        assert_eq!(engine.cumulative_value(ProducerKind::LockLog, 0), 0);
    }

    #[test]
    fn timestampless_first_reference_rejects_index_fallback() {
        let mut engine = engine();
        let report = engine.notify_arrival(ShotArrival::without_timestamp(
            ProducerKind::Reference,
            PayloadHandle::Empty,
        ));
        assert!(!report.accepted);
        assert!(!engine.reference_space_correct(0));

        // period is still undefined, but the index-identity fallback must not
        // pair a secondary shot with a reference shot that has no timestamp
        let report = secondary(&mut engine, ProducerKind::Counter, 123.0);
        assert!(!report.accepted);
        assert_eq!(report.matched_reference_index, None);
    }

    #[test]
    fn undefined_period_matches_by_index_identity() {
        let mut engine = engine();
        reference(&mut engine, 10.0);

        // one reference arrival: period undefined, index-0 fallback applies
        let report = secondary(&mut engine, ProducerKind::Counter, 55.5);
        assert!(report.accepted);
        assert_eq!(report.matched_reference_index, Some(0));
    }

    #[test]
    fn replay_determinism() {
        let arrivals: Vec<ShotArrival> = vec![
            ShotArrival::new(ProducerKind::Reference, 0.0, PayloadHandle::Empty),
            ShotArrival::new(ProducerKind::Digitizer, 0.02, PayloadHandle::Empty),
            ShotArrival::new(ProducerKind::Reference, 1.0, PayloadHandle::Empty),
            ShotArrival::new(ProducerKind::Counter, 1.01, PayloadHandle::Empty),
            ShotArrival::new(ProducerKind::Reference, 2.5, PayloadHandle::Empty),
            ShotArrival::new(ProducerKind::Digitizer, 2.45, PayloadHandle::Empty),
        ];

        let mut first = engine();
        let mut second = engine();
        for arrival in &arrivals {
            first.notify_arrival(arrival.clone());
        }
        for arrival in &arrivals {
            second.notify_arrival(arrival.clone());
        }

        for producer in ProducerKind::ALL {
            for index in 0..4 {
                assert_eq!(
                    first.is_accepted(producer, index),
                    second.is_accepted(producer, index)
                );
                assert_eq!(
                    first.matched_reference_index(producer, index),
                    second.matched_reference_index(producer, index)
                );
                assert_eq!(
                    first.cumulative_value(producer, index),
                    second.cumulative_value(producer, index)
                );
            }
        }
    }

    #[test]
    fn snapshot_matches_queries() {
        let mut engine = engine();
        for t in [0.0, 1.0, 2.0] {
            reference(&mut engine, t);
        }
        secondary(&mut engine, ProducerKind::Counter, 1.05);

        let snapshot = engine.snapshot();
        assert_eq!(snapshot.version, 4);
        assert!(snapshot.is_accepted(ProducerKind::Counter, 0));
        assert_eq!(
            snapshot.matched_reference_index(ProducerKind::Counter, 0),
            engine.matched_reference_index(ProducerKind::Counter, 0)
        );
        assert_eq!(
            snapshot.cumulative_value(ProducerKind::Reference, 2),
            engine.cumulative_value(ProducerKind::Reference, 2)
        );
    }
}
