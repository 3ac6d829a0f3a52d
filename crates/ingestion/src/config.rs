//! Backpressure configuration and metrics

use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};

/// Drop policy when the arrival channel is full
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DropPolicy {
    /// Drop the arrival that just came in
    #[default]
    DropNewest,
    /// Drop the oldest queued arrival
    DropOldest,
}

/// Backpressure configuration
#[derive(Debug, Clone)]
pub struct BackpressureConfig {
    /// Channel capacity
    pub channel_capacity: usize,

    /// Drop policy when full
    pub drop_policy: DropPolicy,
}

impl Default for BackpressureConfig {
    fn default() -> Self {
        Self {
            channel_capacity: 100,
            drop_policy: DropPolicy::DropNewest,
        }
    }
}

impl BackpressureConfig {
    /// Create new backpressure configuration
    pub fn new(channel_capacity: usize, drop_policy: DropPolicy) -> Self {
        Self {
            channel_capacity,
            drop_policy,
        }
    }
}

/// Ingestion metrics
#[derive(Debug, Default)]
pub struct IngestionMetrics {
    /// Total arrivals received
    pub arrivals_received: AtomicU64,

    /// Total arrivals dropped
    pub arrivals_dropped: AtomicU64,

    /// Repeated sightings filtered out
    pub duplicates_filtered: AtomicU64,

    /// Current queue length
    pub queue_len: AtomicUsize,
}

impl IngestionMetrics {
    /// Create new metrics instance
    pub fn new() -> Self {
        Self::default()
    }

    /// Record arrival received
    pub fn record_received(&self) {
        self.arrivals_received.fetch_add(1, Ordering::Relaxed);
    }

    /// Record arrival dropped
    pub fn record_dropped(&self) {
        self.arrivals_dropped.fetch_add(1, Ordering::Relaxed);
    }

    /// Record duplicate filtered
    pub fn record_duplicate(&self) {
        self.duplicates_filtered.fetch_add(1, Ordering::Relaxed);
    }

    /// Update queue length
    pub fn update_queue_len(&self, len: usize) {
        self.queue_len.store(len, Ordering::Relaxed);
    }

    /// Get snapshot
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            arrivals_received: self.arrivals_received.load(Ordering::Relaxed),
            arrivals_dropped: self.arrivals_dropped.load(Ordering::Relaxed),
            duplicates_filtered: self.duplicates_filtered.load(Ordering::Relaxed),
            queue_len: self.queue_len.load(Ordering::Relaxed),
        }
    }
}

/// Metrics snapshot
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Total arrivals received
    pub arrivals_received: u64,

    /// Total arrivals dropped
    pub arrivals_dropped: u64,

    /// Repeated sightings filtered out
    pub duplicates_filtered: u64,

    /// Current queue length
    pub queue_len: usize,
}
