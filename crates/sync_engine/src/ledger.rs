//! Sticky acceptance bookkeeping.

/// Per-stream sticky boolean per shot index.
///
/// `set_accepted` is idempotent and irreversible; there is no way to reject a
/// previously accepted shot. The matcher consults `get` before evaluating an
/// index and skips re-matching entirely when it reads true, which is what
/// protects accepted shots from later period-estimate regressions.
#[derive(Debug, Default, Clone)]
pub struct AcceptanceLedger {
    accepted: Vec<bool>,
}

impl AcceptanceLedger {
    /// Create an empty ledger.
    pub fn new() -> Self {
        Self::default()
    }

    /// Grow the ledger to cover `len` shots (new entries start rejected).
    pub fn ensure_len(&mut self, len: usize) {
        if self.accepted.len() < len {
            self.accepted.resize(len, false);
        }
    }

    /// Whether shot `index` is locked as accepted.
    pub fn get(&self, index: u64) -> bool {
        self.accepted.get(index as usize).copied().unwrap_or(false)
    }

    /// Lock shot `index` as accepted. No-op when already set.
    pub fn set_accepted(&mut self, index: u64) {
        let index = index as usize;
        if index >= self.accepted.len() {
            self.accepted.resize(index + 1, false);
        }
        self.accepted[index] = true;
    }

    /// Number of locked shots.
    pub fn locked_count(&self) -> u64 {
        self.accepted.iter().filter(|&&a| a).count() as u64
    }

    /// Accepted mask in shot order.
    pub fn mask(&self) -> &[bool] {
        &self.accepted
    }
}
