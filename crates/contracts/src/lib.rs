//! # Contracts
//!
//! Frozen interface contracts (ICD), defining inter-module data structures and traits.
//! All business crates can only depend on this crate, reverse dependencies are prohibited.
//!
//! ## Time Model
//! - Uses artifact arrival wall-clock time (seconds, f64) as the only clock
//! - `local_shot_index` is the per-producer arrival order; there is no shared
//!   shot identifier across producers

mod blueprint;
mod error;
mod producer;
mod record;
mod report;
mod report_sink;
mod shot;
mod shot_source;
mod sync_config;

pub use blueprint::*;
pub use error::*;
pub use producer::ProducerKind;
pub use record::*;
pub use report::*;
pub use report_sink::*;
pub use shot::*;
pub use shot_source::{ArrivalCallback, ArrivalSource};
pub use sync_config::*;
