//! Ingestion Pipeline main entry

use std::collections::HashMap;
use std::sync::Arc;

use async_channel::{bounded, Receiver, Sender};
use contracts::{ArrivalSource, ShotArrival};
use tracing::{debug, info, instrument};

use crate::adapter::SourceAdapter;
use crate::config::{BackpressureConfig, IngestionMetrics};
use crate::generic_adapter::GenericSourceAdapter;

/// Ingestion Pipeline
///
/// Manages one adapter per acquisition subsystem and merges their arrivals
/// into a single ordered stream for the engine.
pub struct IngestionPipeline {
    /// Registered adapters, keyed by source name
    adapters: HashMap<String, Box<dyn SourceAdapter>>,

    /// Shared metrics
    metrics: Arc<IngestionMetrics>,

    /// Arrival sender (shared by all adapters)
    tx: Sender<ShotArrival>,

    /// Arrival receiver
    rx: Option<Receiver<ShotArrival>>,

    /// Default backpressure configuration
    default_config: BackpressureConfig,
}

impl IngestionPipeline {
    /// Create new Ingestion Pipeline
    ///
    /// # Arguments
    /// * `channel_capacity` - Channel capacity
    pub fn new(channel_capacity: usize) -> Self {
        let (tx, rx) = bounded(channel_capacity);

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
            default_config: BackpressureConfig {
                channel_capacity,
                ..Default::default()
            },
        }
    }

    /// Create with custom backpressure configuration
    pub fn with_config(config: BackpressureConfig) -> Self {
        let (tx, rx) = bounded(config.channel_capacity);

        Self {
            adapters: HashMap::new(),
            metrics: Arc::new(IngestionMetrics::new()),
            tx,
            rx: Some(rx),
            default_config: config,
        }
    }

    /// Register an arrival source
    ///
    /// # Arguments
    /// * `source` - Source implementing the `ArrivalSource` trait
    /// * `config` - Optional backpressure configuration
    #[instrument(
        name = "ingestion_register_source",
        skip(self, source, config),
        fields(source = %source.name(), stream = %source.producer())
    )]
    pub fn register_source(
        &mut self,
        source: Box<dyn ArrivalSource>,
        config: Option<BackpressureConfig>,
    ) {
        let adapter = GenericSourceAdapter::new(
            source,
            config.unwrap_or_else(|| self.default_config.clone()),
        );
        let name = adapter.source_name().to_string();
        debug!(source = %name, "registered arrival source");
        self.adapters.insert(name, Box::new(adapter));
    }

    /// Start all registered sources
    #[instrument(name = "ingestion_start_all", skip(self))]
    pub fn start_all(&self) {
        info!(count = self.adapters.len(), "starting all arrival sources");
        for (name, adapter) in &self.adapters {
            self.start_adapter(name, adapter.as_ref());
        }
    }

    /// Stop all sources
    #[instrument(name = "ingestion_stop_all", skip(self))]
    pub fn stop_all(&self) {
        info!(count = self.adapters.len(), "stopping all arrival sources");
        for (name, adapter) in &self.adapters {
            self.stop_adapter(name, adapter.as_ref());
        }
    }

    fn start_adapter(&self, name: &str, adapter: &dyn SourceAdapter) {
        if !adapter.is_listening() {
            debug!(source = %name, "starting adapter");
            adapter.start(self.tx.clone(), self.metrics.clone());
        }
    }

    fn stop_adapter(&self, name: &str, adapter: &dyn SourceAdapter) {
        if adapter.is_listening() {
            debug!(source = %name, "stopping adapter");
            adapter.stop();
        }
    }

    /// Get arrival stream receiver
    ///
    /// Note: Can only be called once, subsequent calls return None
    pub fn take_receiver(&mut self) -> Option<Receiver<ShotArrival>> {
        self.rx.take()
    }

    /// Get metrics reference
    pub fn metrics(&self) -> Arc<IngestionMetrics> {
        self.metrics.clone()
    }

    /// Get registered source count
    pub fn source_count(&self) -> usize {
        self.adapters.len()
    }

    /// Check if specified source is listening
    pub fn is_source_listening(&self, name: &str) -> bool {
        self.adapters
            .get(name)
            .map(|a| a.is_listening())
            .unwrap_or(false)
    }
}

impl Drop for IngestionPipeline {
    fn drop(&mut self) {
        self.stop_all();
    }
}
