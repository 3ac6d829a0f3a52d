//! Sync engine configuration contracts that can be shared across crates.

use serde::{Deserialize, Serialize};

use crate::ProducerKind;

/// Sync engine configuration
///
/// Tolerances are fractions of the estimated inter-shot period. Both varied
/// across deployments (0.2 and 0.3 were observed), so neither is hardcoded.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Reference (primary) stream
    #[serde(default = "default_reference")]
    pub reference: ProducerKind,

    /// Secondary streams matched against the reference timeline
    #[serde(default = "default_secondaries")]
    pub secondaries: Vec<ProducerKind>,

    /// Spacing tolerance fraction for the reference stream
    #[serde(default = "default_tolerance_spacing")]
    pub tolerance_spacing: f64,

    /// Matching tolerance fraction for secondary streams
    #[serde(default = "default_tolerance_match")]
    pub tolerance_match: f64,
}

fn default_reference() -> ProducerKind {
    ProducerKind::Reference
}

fn default_secondaries() -> Vec<ProducerKind> {
    vec![
        ProducerKind::Counter,
        ProducerKind::Digitizer,
        ProducerKind::LockLog,
    ]
}

fn default_tolerance_spacing() -> f64 {
    0.2
}

fn default_tolerance_match() -> f64 {
    0.3
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            reference: default_reference(),
            secondaries: default_secondaries(),
            tolerance_spacing: default_tolerance_spacing(),
            tolerance_match: default_tolerance_match(),
        }
    }
}
