//! # Integration Tests
//!
//! 集成测试与端到端测试。
//!
//! 负责：
//! - 合约与配置链路测试
//! - 引擎接收语义的跨 crate 场景测试
//! - 模拟 e2e 测试（无需采集硬件）

#[cfg(test)]
mod contract_tests {
    use config_loader::{ConfigFormat, ConfigLoader};
    use contracts::ProducerKind;

    #[test]
    fn test_contracts_compile() {
        // 验证 contracts crate 可编译
        let _ = contracts::ConfigVersion::V1;
    }

    #[test]
    fn test_blueprint_feeds_engine_config() {
        let toml = r#"
[run]
name = "heterodyne_scan"

[[streams]]
producer = "reference"
expected_period_s = 2.0

[[streams]]
producer = "digitizer"
expected_period_s = 2.0

[sync]
secondaries = ["digitizer"]
tolerance_spacing = 0.2
tolerance_match = 0.3

[[sinks]]
name = "run_log"
sink_type = "log"
"#;
        let blueprint = ConfigLoader::load_from_str(toml, ConfigFormat::Toml).unwrap();
        let engine = sync_engine::ShotSyncEngine::new(blueprint.sync.clone());
        assert_eq!(engine.config().reference, ProducerKind::Reference);
        assert_eq!(engine.config().secondaries, vec![ProducerKind::Digitizer]);
    }
}

#[cfg(test)]
mod scenario_tests {
    use contracts::{PayloadHandle, ProducerKind, ShotArrival, SyncConfig};
    use sync_engine::ShotSyncEngine;

    fn arrival(producer: ProducerKind, t: f64) -> ShotArrival {
        ShotArrival::new(producer, t, PayloadHandle::Empty)
    }

    /// Steady clocks: every secondary shot pairs with its reference shot.
    #[test]
    fn test_steady_run_accepts_everything() {
        let mut engine = ShotSyncEngine::new(SyncConfig::default());

        for i in 0..4 {
            engine.notify_arrival(arrival(ProducerKind::Reference, i as f64 * 2.0));
        }
        for (i, t) in [0.05, 2.04, 4.1, 5.95].iter().enumerate() {
            let report = engine.notify_arrival(arrival(ProducerKind::Counter, *t));
            assert!(report.accepted, "shot {i} at {t} should be accepted");
            assert_eq!(report.matched_reference_index, Some(i as u64));
            assert_eq!(report.cumulative_value, i as u64 + 1);
        }
    }

    /// A late reference shot is flagged, and the secondary shot matched to it
    /// is rejected even though the timestamps line up.
    #[test]
    fn test_spacing_violation_propagates_to_secondary() {
        let mut engine = ShotSyncEngine::new(SyncConfig::default());

        for t in [0.0, 2.0, 4.0] {
            let report = engine.notify_arrival(arrival(ProducerKind::Reference, t));
            assert_eq!(report.reference_space_correct, Some(true));
        }
        // Gap 1.0 against whole-span period (5-0)/3: flagged.
        let late = engine.notify_arrival(arrival(ProducerKind::Reference, 5.0));
        assert_eq!(late.reference_space_correct, Some(false));

        let report = engine.notify_arrival(arrival(ProducerKind::Digitizer, 5.1));
        assert!(!report.accepted);
        assert_eq!(report.cumulative_value, 0);
    }

    /// An acceptance granted under an early period estimate survives the
    /// estimate later turning against it.
    #[test]
    fn test_acceptance_survives_period_revision() {
        let mut engine = ShotSyncEngine::new(SyncConfig::default());

        // Single reference shot: period undefined, index-identity matching.
        engine.notify_arrival(arrival(ProducerKind::Reference, 10.0));
        let report = engine.notify_arrival(arrival(ProducerKind::Counter, 55.5));
        assert!(report.accepted);
        assert_eq!(report.matched_reference_index, Some(0));

        // Period becomes 1.0; re-evaluation of shot 0 would fail by 45 seconds.
        engine.notify_arrival(arrival(ProducerKind::Reference, 11.0));
        engine.notify_arrival(arrival(ProducerKind::Reference, 12.0));

        assert!(engine.is_accepted(ProducerKind::Counter, 0));
        assert_eq!(
            engine.matched_reference_index(ProducerKind::Counter, 0),
            Some(0)
        );
    }

    /// A timestamp-less artifact occupies its index forever but never matches.
    #[test]
    fn test_missing_timestamp_permanently_rejected() {
        let mut engine = ShotSyncEngine::new(SyncConfig::default());

        for t in [0.0, 2.0, 4.0] {
            engine.notify_arrival(arrival(ProducerKind::Reference, t));
        }
        let report = engine.notify_arrival(ShotArrival::without_timestamp(
            ProducerKind::LockLog,
            PayloadHandle::Empty,
        ));
        assert!(!report.accepted);
        assert_eq!(report.shot_index, 0);

        // The next shot takes index 1 and matches normally; index 0 stays dead.
        let next = engine.notify_arrival(arrival(ProducerKind::LockLog, 2.1));
        assert_eq!(next.shot_index, 1);
        assert!(next.accepted);
        assert!(!engine.is_accepted(ProducerKind::LockLog, 0));
        assert_eq!(engine.cumulative_value(ProducerKind::LockLog, 1), 1);
    }
}

#[cfg(test)]
mod property_tests {
    use contracts::{PayloadHandle, ProducerKind, ShotArrival, SyncConfig};
    use sync_engine::ShotSyncEngine;

    fn arrival(producer: ProducerKind, t: f64) -> ShotArrival {
        ShotArrival::new(producer, t, PayloadHandle::Empty)
    }

    /// Erratic reference timing interleaved with secondaries; the set of
    /// accepted secondary indices must only ever grow.
    #[test]
    fn test_accepted_set_is_monotone() {
        let sequence = vec![
            arrival(ProducerKind::Reference, 0.0),
            arrival(ProducerKind::Counter, 0.1),
            arrival(ProducerKind::Reference, 2.0),
            arrival(ProducerKind::Counter, 2.2),
            arrival(ProducerKind::Reference, 9.5), // outlier inflates the period
            arrival(ProducerKind::Counter, 9.4),
            arrival(ProducerKind::Reference, 11.5),
            arrival(ProducerKind::Reference, 13.5),
            arrival(ProducerKind::Counter, 13.6),
        ];

        let mut engine = ShotSyncEngine::new(SyncConfig::default());
        let mut previously_accepted: Vec<u64> = Vec::new();

        for step in sequence {
            engine.notify_arrival(step);
            for index in &previously_accepted {
                assert!(
                    engine.is_accepted(ProducerKind::Counter, *index),
                    "shot {index} lost its acceptance"
                );
            }
            let snapshot = engine.snapshot();
            previously_accepted = (0..16)
                .filter(|i| snapshot.is_accepted(ProducerKind::Counter, *i))
                .collect();
        }
    }

    /// Same arrival sequence, two engines: identical verdicts.
    #[test]
    fn test_replay_is_deterministic() {
        let sequence = || {
            vec![
                arrival(ProducerKind::Reference, 0.0),
                arrival(ProducerKind::Digitizer, 0.2),
                arrival(ProducerKind::Reference, 2.1),
                arrival(ProducerKind::Digitizer, 2.0),
                arrival(ProducerKind::Reference, 3.9),
                arrival(ProducerKind::Digitizer, 7.7),
            ]
        };

        let run = |steps: Vec<ShotArrival>| {
            let mut engine = ShotSyncEngine::new(SyncConfig::default());
            steps
                .into_iter()
                .map(|a| serde_json::to_string(&engine.notify_arrival(a)).unwrap())
                .collect::<Vec<_>>()
        };

        assert_eq!(run(sequence()), run(sequence()));
    }
}

#[cfg(test)]
mod e2e_tests {
    use std::collections::HashMap;
    use std::time::Duration;

    use contracts::{ProducerKind, ShotReport, SinkConfig, SinkType, SyncConfig};
    use dispatcher::create_dispatcher;
    use ingestion::{IngestionPipeline, MockArrivalSource};
    use sync_engine::EngineHandle;
    use tokio::sync::mpsc;

    /// End-to-end: MockArrivalSource -> IngestionPipeline -> EngineHandle -> Dispatcher
    ///
    /// 验证完整的数据流：
    /// 1. Mock 源生成周期性 shot 到达
    /// 2. Engine actor 做接收判定并发 ShotReport
    /// 3. Dispatcher 将报告分发到 sinks
    #[tokio::test]
    async fn test_e2e_mock_pipeline() {
        let shots_per_stream = 5u64;

        // Setup: mock sources, merged by the ingestion pipeline
        let mut pipeline = IngestionPipeline::new(100);
        pipeline.register_source(
            Box::new(
                MockArrivalSource::reference("jkam_mock", 2.0)
                    .with_max_shots(shots_per_stream)
                    .with_tick_interval(Duration::from_millis(1)),
            ),
            None,
        );
        pipeline.register_source(
            Box::new(
                MockArrivalSource::for_producer("fpga_mock", ProducerKind::Counter, 2.0)
                    .with_jitter(0.05)
                    .with_max_shots(shots_per_stream)
                    .with_tick_interval(Duration::from_millis(1)),
            ),
            None,
        );

        // Engine actor publishing reports
        let (report_tx, report_rx) = mpsc::channel::<ShotReport>(100);
        let engine = EngineHandle::spawn(SyncConfig::default(), 100, Some(report_tx));

        // Dispatcher with file + log sinks
        let out_dir = tempfile::tempdir().unwrap();
        let sink_configs = vec![
            SinkConfig {
                name: "run_log".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "run_files".to_string(),
                sink_type: SinkType::File,
                queue_capacity: 50,
                params: HashMap::from([
                    (
                        "base_path".to_string(),
                        out_dir.path().to_string_lossy().to_string(),
                    ),
                    ("run_label".to_string(), "e2e".to_string()),
                ]),
            },
        ];
        let dispatcher = create_dispatcher(sink_configs, report_rx).unwrap();
        let dispatcher_handle = dispatcher.spawn();

        // Run pipeline
        let arrival_rx = pipeline.take_receiver().unwrap();
        pipeline.start_all();

        let total = shots_per_stream * 2;
        let forwarder = tokio::spawn(async move {
            let mut forwarded = 0u64;
            while forwarded < total {
                match tokio::time::timeout(Duration::from_secs(5), arrival_rx.recv()).await {
                    Ok(Ok(arrival)) => {
                        engine.notify(arrival).await;
                        forwarded += 1;
                    }
                    _ => break,
                }
            }
            // Draining shutdown guarantees every report is emitted
            let snapshot = engine.snapshot();
            engine.shutdown().await;
            (forwarded, snapshot)
        });

        let (forwarded, _snapshot) =
            tokio::time::timeout(Duration::from_secs(10), forwarder)
                .await
                .expect("pipeline timed out")
                .expect("forwarder panicked");
        assert_eq!(forwarded, total);

        pipeline.stop_all();

        // Report channel is closed once the engine actor stops
        tokio::time::timeout(Duration::from_secs(5), dispatcher_handle)
            .await
            .expect("dispatcher timed out")
            .expect("dispatcher panicked");

        // Every shot produced exactly one JSON line in its stream file
        let run_dir = out_dir.path().join("e2e");
        let reference_lines =
            std::fs::read_to_string(run_dir.join("reference.jsonl")).unwrap();
        assert_eq!(reference_lines.lines().count(), shots_per_stream as usize);

        let counter_lines = std::fs::read_to_string(run_dir.join("counter.jsonl")).unwrap();
        assert_eq!(counter_lines.lines().count(), shots_per_stream as usize);

        for line in counter_lines.lines() {
            let report: ShotReport = serde_json::from_str(line).unwrap();
            assert_eq!(report.producer, ProducerKind::Counter);
        }
    }

    /// Dispatcher with multiple sinks sees every report in each sink.
    #[tokio::test]
    async fn test_dispatcher_multiple_sinks() {
        use contracts::{PayloadHandle, ReportMeta};

        let (tx, rx) = mpsc::channel::<ShotReport>(10);

        let sink_configs = vec![
            SinkConfig {
                name: "log1".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
            SinkConfig {
                name: "log2".to_string(),
                sink_type: SinkType::Log,
                queue_capacity: 50,
                params: HashMap::new(),
            },
        ];

        let dispatcher = create_dispatcher(sink_configs, rx).unwrap();

        // Check metrics before running
        let metrics = dispatcher.metrics();
        assert_eq!(metrics.len(), 2);

        let handle = dispatcher.spawn();

        for i in 0..5 {
            let report = ShotReport {
                producer: ProducerKind::Reference,
                shot_index: i,
                timestamp: Some(i as f64 * 2.0),
                accepted: true,
                matched_reference_index: None,
                cumulative_value: i + 1,
                reference_space_correct: Some(true),
                payload: PayloadHandle::Empty,
                meta: ReportMeta::default(),
            };
            tx.send(report).await.unwrap();
        }

        drop(tx);

        let _ = tokio::time::timeout(Duration::from_secs(2), handle).await;
    }
}
