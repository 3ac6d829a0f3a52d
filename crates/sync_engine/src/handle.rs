//! EngineHandle - single-writer actor wrapping the engine.
//!
//! All arrivals are serialized through one queue; concurrent readers observe
//! versioned snapshots through a watch channel and never see partial state.

use std::sync::Arc;

use contracts::{ShotArrival, ShotReport, SyncConfig};
use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, error, instrument, warn};

use crate::engine::ShotSyncEngine;
use crate::snapshot::EngineSnapshot;

/// Handle to a running engine actor.
pub struct EngineHandle {
    tx: mpsc::Sender<ShotArrival>,
    snapshot_rx: watch::Receiver<Arc<EngineSnapshot>>,
    worker_handle: JoinHandle<()>,
}

impl EngineHandle {
    /// Spawn the engine actor.
    ///
    /// Reports are forwarded to `report_tx` (when given) with `try_send`: a
    /// slow consumer drops reports rather than stalling arrival processing.
    /// Snapshot state is unaffected by drops.
    pub fn spawn(
        config: SyncConfig,
        queue_capacity: usize,
        report_tx: Option<mpsc::Sender<ShotReport>>,
    ) -> Self {
        let engine = ShotSyncEngine::new(config);
        let (tx, rx) = mpsc::channel(queue_capacity);
        let (snapshot_tx, snapshot_rx) = watch::channel(Arc::new(engine.snapshot()));

        let worker_handle = tokio::spawn(async move {
            engine_worker(engine, rx, snapshot_tx, report_tx).await;
        });

        Self {
            tx,
            snapshot_rx,
            worker_handle,
        }
    }

    /// Queue an arrival, waiting for queue space.
    ///
    /// Returns false if the actor has stopped.
    pub async fn notify(&self, arrival: ShotArrival) -> bool {
        self.tx.send(arrival).await.is_ok()
    }

    /// Queue an arrival without waiting; drops it when the queue is full.
    pub fn try_notify(&self, arrival: ShotArrival) -> bool {
        match self.tx.try_send(arrival) {
            Ok(()) => true,
            Err(mpsc::error::TrySendError::Full(a)) => {
                warn!(producer = %a.producer, "engine queue full, arrival dropped");
                false
            }
            Err(mpsc::error::TrySendError::Closed(_)) => {
                error!("engine actor stopped unexpectedly");
                false
            }
        }
    }

    /// Latest published snapshot.
    pub fn snapshot(&self) -> Arc<EngineSnapshot> {
        self.snapshot_rx.borrow().clone()
    }

    /// Subscribe to snapshot updates (for rendering loops).
    pub fn subscribe(&self) -> watch::Receiver<Arc<EngineSnapshot>> {
        self.snapshot_rx.clone()
    }

    /// Shut down the actor, draining queued arrivals first.
    #[instrument(name = "engine_handle_shutdown", skip(self))]
    pub async fn shutdown(self) {
        drop(self.tx);
        if let Err(e) = self.worker_handle.await {
            error!(error = ?e, "engine worker panicked");
        }
        debug!("engine handle shutdown complete");
    }
}

async fn engine_worker(
    mut engine: ShotSyncEngine,
    mut rx: mpsc::Receiver<ShotArrival>,
    snapshot_tx: watch::Sender<Arc<EngineSnapshot>>,
    report_tx: Option<mpsc::Sender<ShotReport>>,
) {
    debug!("engine worker started");

    while let Some(arrival) = rx.recv().await {
        let report = engine.notify_arrival(arrival);
        snapshot_tx.send_replace(Arc::new(engine.snapshot()));

        if let Some(tx) = &report_tx {
            if let Err(mpsc::error::TrySendError::Full(r)) = tx.try_send(report) {
                warn!(
                    producer = %r.producer,
                    shot_index = r.shot_index,
                    "report channel full, report dropped"
                );
            }
        }
    }

    debug!(arrivals = engine.version(), "engine worker stopped");
}

#[cfg(test)]
mod tests {
    use super::*;
    use contracts::{PayloadHandle, ProducerKind};

    #[tokio::test]
    async fn actor_processes_arrivals_in_order() {
        let (report_tx, mut report_rx) = mpsc::channel(16);
        let handle = EngineHandle::spawn(SyncConfig::default(), 16, Some(report_tx));

        for t in [0.0, 1.0, 2.0] {
            assert!(
                handle
                    .notify(ShotArrival::new(
                        ProducerKind::Reference,
                        t,
                        PayloadHandle::Empty
                    ))
                    .await
            );
        }
        handle
            .notify(ShotArrival::new(
                ProducerKind::Counter,
                1.02,
                PayloadHandle::Empty,
            ))
            .await;

        let mut reports = Vec::new();
        for _ in 0..4 {
            reports.push(report_rx.recv().await.unwrap());
        }
        assert_eq!(reports[0].producer, ProducerKind::Reference);
        assert_eq!(reports[3].producer, ProducerKind::Counter);
        assert!(reports[3].accepted);
        assert_eq!(reports[3].matched_reference_index, Some(1));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn snapshot_is_versioned_and_consistent() {
        let handle = EngineHandle::spawn(SyncConfig::default(), 16, None);
        let mut updates = handle.subscribe();

        handle
            .notify(ShotArrival::new(
                ProducerKind::Reference,
                0.0,
                PayloadHandle::Empty,
            ))
            .await;

        updates.changed().await.unwrap();
        let snapshot = updates.borrow_and_update().clone();
        assert_eq!(snapshot.version, 1);
        assert!(snapshot.reference_space_correct(0));

        handle.shutdown().await;
    }

    #[tokio::test]
    async fn shutdown_drains_queue() {
        let handle = EngineHandle::spawn(SyncConfig::default(), 16, None);
        for t in [0.0, 1.0] {
            handle
                .notify(ShotArrival::new(
                    ProducerKind::Reference,
                    t,
                    PayloadHandle::Empty,
                ))
                .await;
        }
        let snapshot_rx = handle.subscribe();
        handle.shutdown().await;
        assert_eq!(snapshot_rx.borrow().version, 2);
    }
}
