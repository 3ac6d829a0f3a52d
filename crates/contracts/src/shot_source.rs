//! ArrivalSource trait - Artifact arrival source abstraction
//!
//! Decouples the engine from how arrivals are discovered. The real system
//! watches acquisition directories; tests and demos use mock sources. Both
//! sides speak this interface.

use std::sync::Arc;

use crate::{ProducerKind, ShotArrival};

/// Arrival callback type
///
/// When a source discovers a new artifact, it sends a `ShotArrival` through
/// this callback. Uses `Arc` to allow callback sharing across contexts.
pub type ArrivalCallback = Arc<dyn Fn(ShotArrival) + Send + Sync>;

/// Artifact arrival source trait
///
/// The source is responsible for parsing artifacts far enough to extract an
/// arrival timestamp, and for deduplicating repeated sightings of the same
/// artifact - the engine assumes each call is a genuinely new shot.
pub trait ArrivalSource: Send + Sync {
    /// Name of this source (for logging)
    fn name(&self) -> &str;

    /// Stream this source feeds
    fn producer(&self) -> ProducerKind;

    /// Register the arrival callback and start producing
    ///
    /// Repeated calls while already listening must be idempotent.
    fn listen(&self, callback: ArrivalCallback);

    /// Stop producing arrivals
    fn stop(&self);

    /// Check if currently listening
    fn is_listening(&self) -> bool;
}
