//! Per-stream state containers driven by the orchestrator.

use std::collections::HashSet;

use contracts::{MatchRecord, PayloadHandle, ProducerKind, ReferenceSnapshot};
use tracing::warn;

use crate::arrival_log::ArrivalLog;
use crate::cumulative::CumulativeSeries;
use crate::ledger::AcceptanceLedger;
use crate::matcher::{evaluate_shot, RejectReason};
use crate::spacing::SpacingValidator;

/// Reference (primary) stream: arrival log + spacing flags + chart series.
///
/// A reference shot counts as accepted iff it is space-correct; flags are
/// assigned once at arrival and never revisited, so reference acceptance is
/// sticky by construction.
#[derive(Debug)]
pub(crate) struct ReferenceStream {
    pub(crate) log: ArrivalLog,
    validator: SpacingValidator,
    series: CumulativeSeries,
}

impl ReferenceStream {
    pub(crate) fn new(tolerance_spacing: f64) -> Self {
        Self {
            log: ArrivalLog::new(),
            validator: SpacingValidator::new(tolerance_spacing),
            series: CumulativeSeries::default(),
        }
    }

    /// Record a reference arrival; returns `(index, space_correct)`.
    pub(crate) fn push(&mut self, timestamp: Option<f64>, payload: PayloadHandle) -> (u64, bool) {
        let index = self.log.record_arrival(timestamp, payload);
        let flag = self.validator.observe_latest(&self.log);
        self.series = CumulativeSeries::rebuild(self.validator.flags());
        (index, flag)
    }

    pub(crate) fn space_correct(&self, index: u64) -> bool {
        self.validator.is_space_correct(index)
    }

    pub(crate) fn space_correct_opt(&self, index: u64) -> Option<bool> {
        self.validator.get(index)
    }

    pub(crate) fn series(&self) -> &CumulativeSeries {
        &self.series
    }

    pub(crate) fn accepted_count(&self) -> u64 {
        self.validator.flags().iter().filter(|&&f| f).count() as u64
    }

    /// Immutable snapshot handed to secondary matchers.
    pub(crate) fn snapshot(&self) -> ReferenceSnapshot {
        ReferenceSnapshot {
            // missing-timestamp reference entries are unmatchable; they carry
            // space_correct = false, so a NaN placeholder can never be chosen
            timestamps: self
                .log
                .timestamps()
                .iter()
                .map(|t| t.unwrap_or(f64::NAN))
                .collect(),
            space_correct: self.validator.flags().to_vec(),
            period: self.log.estimate_period(),
        }
    }
}

/// One secondary stream: log, sticky ledger, match records, chart series, and
/// the dedup set for once-per-index rejection diagnostics.
#[derive(Debug)]
pub(crate) struct SecondaryStream {
    pub(crate) producer: ProducerKind,
    pub(crate) log: ArrivalLog,
    pub(crate) ledger: AcceptanceLedger,
    records: Vec<MatchRecord>,
    series: CumulativeSeries,
    reported_rejects: HashSet<u64>,
}

impl SecondaryStream {
    pub(crate) fn new(producer: ProducerKind) -> Self {
        Self {
            producer,
            log: ArrivalLog::new(),
            ledger: AcceptanceLedger::new(),
            records: Vec::new(),
            series: CumulativeSeries::default(),
            reported_rejects: HashSet::new(),
        }
    }

    /// Record an arrival; returns its local shot index.
    pub(crate) fn push(&mut self, timestamp: Option<f64>, payload: PayloadHandle) -> u64 {
        self.log.record_arrival(timestamp, payload)
    }

    /// Re-evaluate every unlocked index against the reference snapshot.
    ///
    /// Locked indices are skipped entirely; their records are already final.
    /// The cumulative series is rebuilt from the ledger mask afterwards.
    pub(crate) fn rerun(&mut self, reference: &ReferenceSnapshot, tolerance_match: f64) {
        let shots = self.log.len();
        self.ledger.ensure_len(shots);
        self.records.resize(shots, MatchRecord::rejected());

        for index in 0..shots as u64 {
            if self.ledger.get(index) {
                continue;
            }

            let outcome = evaluate_shot(
                index,
                self.log.timestamp(index),
                reference,
                tolerance_match,
            );

            if outcome.record.accepted {
                self.ledger.set_accepted(index);
                metrics::counter!(
                    "shot_syncer_shots_accepted_total",
                    "producer" => self.producer.label()
                )
                .increment(1);
            } else if let Some(reason) = outcome.reason {
                self.diagnose_rejection(index, reason);
            }

            self.records[index as usize] = outcome.record;
        }

        self.series = CumulativeSeries::rebuild(self.ledger.mask());
        metrics::gauge!(
            "shot_syncer_cumulative_record_high",
            "producer" => self.producer.label()
        )
        .set(self.series.record_high() as f64);
    }

    /// Emit the rejection diagnostic for `index` at most once, no matter how
    /// many reruns re-derive it. "Reference not there yet" is not reported;
    /// that state resolves itself on the next reference arrival.
    fn diagnose_rejection(&mut self, index: u64, reason: RejectReason) {
        if matches!(reason, RejectReason::NoReferenceData) {
            return;
        }
        if !self.reported_rejects.insert(index) {
            return;
        }

        match reason {
            RejectReason::MissingTimestamp => {
                warn!(
                    producer = %self.producer,
                    shot_index = index,
                    "artifact has no extractable timestamp, shot permanently rejected"
                );
            }
            RejectReason::ToleranceExceeded { distance, window } => {
                warn!(
                    producer = %self.producer,
                    shot_index = index,
                    distance,
                    window,
                    "no reference shot within tolerance window"
                );
            }
            RejectReason::SpacingViolation { reference_index } => {
                warn!(
                    producer = %self.producer,
                    shot_index = index,
                    reference_index,
                    "nearest reference shot failed spacing check"
                );
            }
            RejectReason::NoReferenceData => unreachable!(),
        }

        metrics::counter!(
            "shot_syncer_shots_rejected_total",
            "producer" => self.producer.label()
        )
        .increment(1);
    }

    pub(crate) fn record(&self, index: u64) -> Option<&MatchRecord> {
        self.records.get(index as usize)
    }

    pub(crate) fn records(&self) -> &[MatchRecord] {
        &self.records
    }

    pub(crate) fn series(&self) -> &CumulativeSeries {
        &self.series
    }
}
