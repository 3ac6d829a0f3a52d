//! # Ingestion Pipeline
//!
//! Artifact arrival ingestion module.
//!
//! Responsibilities:
//! - Register arrival sources (mock today, acquisition watchers later)
//! - Deduplicate repeated sightings of the same artifact
//! - Backpressure management and drop policy
//! - Send `ShotArrival` to downstream via async-channel
//!
//! The engine assumes every arrival it sees is a genuinely new shot, so
//! duplicate filtering lives here, not downstream.
//!
//! ## Usage Example
//!
//! ```ignore
//! use ingestion::{IngestionPipeline, MockArrivalSource};
//! use contracts::ProducerKind;
//!
//! let mut pipeline = IngestionPipeline::new(100);
//!
//! let source = MockArrivalSource::reference("jkam", 1.0);
//! pipeline.register_source(Box::new(source), None);
//!
//! pipeline.start_all();
//! let rx = pipeline.take_receiver().unwrap();
//! while let Ok(arrival) = rx.recv().await {
//!     // hand to the engine
//! }
//! ```

mod adapter;
mod config;
mod error;
mod generic_adapter;
mod mock;
mod pipeline;

// Re-exports
pub use adapter::SourceAdapter;
pub use config::{BackpressureConfig, DropPolicy, IngestionMetrics, MetricsSnapshot};
pub use contracts::ShotArrival;
pub use error::{IngestionError, Result};
pub use generic_adapter::GenericSourceAdapter;
pub use mock::{MockArrivalSource, MockSourceConfig};
pub use pipeline::IngestionPipeline;
