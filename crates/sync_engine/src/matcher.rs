//! Nearest-timestamp matching of secondary shots against the reference
//! timeline.

use contracts::{MatchRecord, ReferenceSnapshot};

/// Result of evaluating one secondary shot index.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MatchOutcome {
    /// The resulting record (accepted records are locked)
    pub record: MatchRecord,

    /// Why the shot was rejected, when it was
    pub reason: Option<RejectReason>,
}

impl MatchOutcome {
    fn accepted(reference_index: u64) -> Self {
        Self {
            record: MatchRecord::accepted_at(reference_index),
            reason: None,
        }
    }

    fn rejected(reason: RejectReason) -> Self {
        Self {
            record: MatchRecord::rejected(),
            reason: Some(reason),
        }
    }
}

/// Rejection causes, surfaced as once-per-index diagnostics.
///
/// None of these are errors: a rejected shot is a normal, representable
/// outcome and the index stays eligible for re-evaluation on later cycles
/// (except `MissingTimestamp`, which is terminal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RejectReason {
    /// The artifact had no extractable timestamp; permanently rejected
    MissingTimestamp,

    /// No reference shot exists at this index yet (secondary stream ahead)
    NoReferenceData,

    /// Nearest reference shot is outside the tolerance window
    ToleranceExceeded { distance: f64, window: f64 },

    /// Nearest reference shot failed its own spacing check
    SpacingViolation { reference_index: u64 },
}

/// Evaluate secondary shot `index` with timestamp `timestamp` against the
/// reference snapshot.
///
/// With an undefined reference period, acceptance falls back to index
/// identity: the same-index reference shot must exist and be space-correct.
/// With a defined period, the nearest reference timestamp must lie within
/// `tolerance_match * period` and its shot must be space-correct. Ties on
/// distance resolve to the smallest reference index.
///
/// Callers must short-circuit on already-locked indices before calling this;
/// the function itself is pure.
pub fn evaluate_shot(
    index: u64,
    timestamp: Option<f64>,
    reference: &ReferenceSnapshot,
    tolerance_match: f64,
) -> MatchOutcome {
    let timestamp = match timestamp {
        Some(t) => t,
        None => return MatchOutcome::rejected(RejectReason::MissingTimestamp),
    };

    if !reference.period.defined {
        return match reference.space_correct.get(index as usize) {
            Some(true) => MatchOutcome::accepted(index),
            Some(false) => MatchOutcome::rejected(RejectReason::SpacingViolation {
                reference_index: index,
            }),
            None => MatchOutcome::rejected(RejectReason::NoReferenceData),
        };
    }

    let nearest = reference
        .timestamps
        .iter()
        .enumerate()
        .map(|(j, &t)| (j as u64, (timestamp - t).abs()))
        // strict less-than keeps the first (smallest) index on ties
        .fold(None::<(u64, f64)>, |best, (j, d)| match best {
            Some((_, best_d)) if best_d <= d => best,
            _ => Some((j, d)),
        });

    let (nearest_index, distance) = match nearest {
        Some(found) => found,
        None => return MatchOutcome::rejected(RejectReason::NoReferenceData),
    };

    let window = tolerance_match * reference.period.value;
    if distance > window {
        return MatchOutcome::rejected(RejectReason::ToleranceExceeded { distance, window });
    }

    if !reference.space_correct[nearest_index as usize] {
        return MatchOutcome::rejected(RejectReason::SpacingViolation {
            reference_index: nearest_index,
        });
    }

    MatchOutcome::accepted(nearest_index)
}
