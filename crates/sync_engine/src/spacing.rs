//! Spacing validation for the reference stream.

use tracing::debug;

use crate::arrival_log::ArrivalLog;

/// Flags each reference shot as space-correct when its gap from the previous
/// shot is consistent with the running period estimate.
///
/// Flags are computed once, at arrival time, with the period estimate that
/// includes the new shot - and never revisited. This matches the streaming
/// behavior of the source system: a later outlier can change the period but
/// not already-assigned flags.
#[derive(Debug, Clone)]
pub struct SpacingValidator {
    tolerance: f64,
    flags: Vec<bool>,
}

impl SpacingValidator {
    /// Create a validator with the given tolerance fraction.
    pub fn new(tolerance: f64) -> Self {
        Self {
            tolerance,
            flags: Vec::new(),
        }
    }

    /// Compute and store the flag for the newest shot in `log`.
    ///
    /// Must be called exactly once per reference arrival, after the arrival
    /// has been appended. Returns the flag.
    pub fn observe_latest(&mut self, log: &ArrivalLog) -> bool {
        debug_assert_eq!(self.flags.len() + 1, log.len());

        let index = (log.len() - 1) as u64;
        let flag = self.compute_flag(log, index);
        self.flags.push(flag);

        if !flag {
            debug!(index, "reference shot spacing violated");
        }
        flag
    }

    fn compute_flag(&self, log: &ArrivalLog, index: u64) -> bool {
        // unreadable artifacts are permanently rejected, even at shot 0
        let current = match log.timestamp(index) {
            Some(t) => t,
            None => return false,
        };

        // shot 0 has no prior point to compare
        if index == 0 {
            return true;
        }

        let previous = match log.timestamp(index - 1) {
            Some(t) => t,
            // spacing against an unreadable predecessor is undecidable
            None => return false,
        };

        let period = log.estimate_period();
        if !period.defined {
            // optimistic default: no period to check against yet
            return true;
        }

        let gap = current - previous;
        (gap - period.value).abs() <= self.tolerance * period.value
    }

    /// Flag for reference shot `index`; false if the shot does not exist yet.
    pub fn is_space_correct(&self, index: u64) -> bool {
        self.flags.get(index as usize).copied().unwrap_or(false)
    }

    /// Flag for reference shot `index`, None if not seen yet.
    pub fn get(&self, index: u64) -> Option<bool> {
        self.flags.get(index as usize).copied()
    }

    /// All flags in shot order.
    pub fn flags(&self) -> &[bool] {
        &self.flags
    }
}
