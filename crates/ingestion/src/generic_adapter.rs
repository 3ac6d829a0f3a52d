//! 通用到达源适配器
//!
//! 基于 `ArrivalSource` trait 的统一适配器实现。
//! 允许 IngestionPipeline 以统一方式处理 mock 与真实采集源。

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_channel::Sender;
use contracts::{ArrivalCallback, ArrivalSource, PayloadHandle, ProducerKind, ShotArrival};
use tracing::{debug, trace};

use crate::adapter::{send_arrival, SourceAdapter};
use crate::config::{BackpressureConfig, IngestionMetrics};

/// 通用到达源适配器
///
/// 将 `ArrivalSource` trait 适配为 `SourceAdapter`，并在这里完成重复
/// artifact 过滤：同一文件路径的第二次出现被丢弃，下游引擎因此可以假设
/// 每次到达都是新 shot。
pub struct GenericSourceAdapter {
    source_name: String,
    source: Box<dyn ArrivalSource>,
    config: BackpressureConfig,
    listening: Arc<AtomicBool>,
    seen_paths: Arc<Mutex<HashSet<PathBuf>>>,
}

impl GenericSourceAdapter {
    /// 创建新的通用适配器
    pub fn new(source: Box<dyn ArrivalSource>, config: BackpressureConfig) -> Self {
        Self {
            source_name: source.name().to_string(),
            source,
            config,
            listening: Arc::new(AtomicBool::new(false)),
            seen_paths: Arc::new(Mutex::new(HashSet::new())),
        }
    }
}

impl SourceAdapter for GenericSourceAdapter {
    fn source_name(&self) -> &str {
        &self.source_name
    }

    fn producer(&self) -> ProducerKind {
        self.source.producer()
    }

    fn start(&self, tx: Sender<ShotArrival>, metrics: Arc<IngestionMetrics>) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let source_name = self.source_name.clone();
        let drop_policy = self.config.drop_policy;
        let listening = self.listening.clone();
        let seen_paths = self.seen_paths.clone();

        debug!(source = %source_name, "starting generic adapter");

        let callback: ArrivalCallback = Arc::new(move |arrival: ShotArrival| {
            if !listening.load(Ordering::Relaxed) {
                return;
            }

            if is_duplicate(&seen_paths, &arrival.payload) {
                metrics.record_duplicate();
                trace!(source = %source_name, "duplicate artifact sighting filtered");
                return;
            }

            metrics.record_received();
            trace!(source = %source_name, "adapter received arrival");
            send_arrival(&tx, arrival, &metrics, &source_name, drop_policy);
        });

        self.source.listen(callback);
    }

    fn stop(&self) {
        if self.listening.swap(false, Ordering::SeqCst) {
            debug!(source = %self.source_name, "stopping generic adapter");
            self.source.stop();
        }
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

/// Path-backed artifacts are keyed by path; inline and empty payloads carry no
/// stable identity and pass through.
fn is_duplicate(seen: &Mutex<HashSet<PathBuf>>, payload: &PayloadHandle) -> bool {
    match payload {
        PayloadHandle::Path(path) => match seen.lock() {
            Ok(mut set) => !set.insert(path.clone()),
            Err(_) => false,
        },
        PayloadHandle::Inline(_) | PayloadHandle::Empty => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::DropPolicy;
    use async_channel::bounded;
    use std::time::Duration;

    /// Scripted ArrivalSource for testing
    struct TestArrivalSource {
        name: String,
        producer: ProducerKind,
        listening: Arc<AtomicBool>,
        arrivals: Vec<ShotArrival>,
    }

    impl TestArrivalSource {
        fn new(name: &str, producer: ProducerKind, arrivals: Vec<ShotArrival>) -> Self {
            Self {
                name: name.to_string(),
                producer,
                listening: Arc::new(AtomicBool::new(false)),
                arrivals,
            }
        }
    }

    impl ArrivalSource for TestArrivalSource {
        fn name(&self) -> &str {
            &self.name
        }

        fn producer(&self) -> ProducerKind {
            self.producer
        }

        fn listen(&self, callback: ArrivalCallback) {
            if self.listening.swap(true, Ordering::SeqCst) {
                return;
            }
            for arrival in self.arrivals.clone() {
                callback(arrival);
            }
        }

        fn stop(&self) {
            self.listening.store(false, Ordering::SeqCst);
        }

        fn is_listening(&self) -> bool {
            self.listening.load(Ordering::Relaxed)
        }
    }

    fn path_arrival(path: &str, t: f64) -> ShotArrival {
        ShotArrival::new(ProducerKind::Counter, t, PayloadHandle::path(path))
    }

    #[test]
    fn test_generic_adapter_forwards() {
        let source = TestArrivalSource::new(
            "fpga_watch",
            ProducerKind::Counter,
            vec![
                path_arrival("/data/fpga_0000.bin", 0.0),
                path_arrival("/data/fpga_0001.bin", 2.0),
            ],
        );
        let adapter =
            GenericSourceAdapter::new(Box::new(source), BackpressureConfig::new(10, DropPolicy::DropNewest));

        let (tx, rx) = bounded(10);
        let metrics = Arc::new(IngestionMetrics::new());

        adapter.start(tx, metrics.clone());
        assert!(adapter.is_listening());

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 2);
        assert_eq!(metrics.snapshot().arrivals_received, 2);

        adapter.stop();
        assert!(!adapter.is_listening());
    }

    #[test]
    fn test_duplicate_sightings_filtered() {
        let source = TestArrivalSource::new(
            "fpga_watch",
            ProducerKind::Counter,
            vec![
                path_arrival("/data/fpga_0000.bin", 0.0),
                path_arrival("/data/fpga_0000.bin", 0.1),
                path_arrival("/data/fpga_0001.bin", 2.0),
            ],
        );
        let adapter = GenericSourceAdapter::new(Box::new(source), BackpressureConfig::default());

        let (tx, rx) = bounded(10);
        let metrics = Arc::new(IngestionMetrics::new());
        adapter.start(tx, metrics.clone());

        let mut received = 0;
        while rx.try_recv().is_ok() {
            received += 1;
        }
        assert_eq!(received, 2);
        assert_eq!(metrics.snapshot().duplicates_filtered, 1);
    }

    #[test]
    fn test_backpressure_drop_newest() {
        let arrivals: Vec<_> = (0..5)
            .map(|i| path_arrival(&format!("/data/fpga_{i:04}.bin"), i as f64 * 2.0))
            .collect();
        let source = TestArrivalSource::new("fpga_watch", ProducerKind::Counter, arrivals);
        let adapter =
            GenericSourceAdapter::new(Box::new(source), BackpressureConfig::new(2, DropPolicy::DropNewest));

        let (tx, rx) = bounded(2);
        let metrics = Arc::new(IngestionMetrics::new());
        adapter.start(tx, metrics.clone());

        // Nothing consumes during listen, so only the first two fit.
        std::thread::sleep(Duration::from_millis(10));
        let snapshot = metrics.snapshot();
        assert_eq!(snapshot.arrivals_dropped, 3);
        assert_eq!(rx.len(), 2);
    }
}
