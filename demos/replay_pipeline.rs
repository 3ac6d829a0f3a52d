//! Replay Pipeline Demo
//!
//! Runs the full chain without any acquisition hardware: mock arrival
//! sources feed the sync engine actor, whose per-shot reports fan out to
//! the configured sinks.
//!
//! Run with: cargo run --bin replay_pipeline [config.toml]

use std::time::Duration;

use config_loader::ConfigLoader;
use contracts::{ExperimentBlueprint, ShotReport};
use dispatcher::create_dispatcher;
use ingestion::{IngestionPipeline, MockArrivalSource};
use observability::{AcceptanceAggregator, LogFormat, ObservabilityConfig};
use sync_engine::EngineHandle;
use tokio::sync::mpsc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logging (human-readable, no Prometheus for a demo run)
    observability::init_with_config(ObservabilityConfig {
        log_format: LogFormat::Compact,
        metrics_port: None,
        default_log_level: "info".to_string(),
    })?;

    tracing::info!("Starting Replay Pipeline Demo");

    // ==== Stage 1: Use default config or load from file ====
    let blueprint = if let Some(path) = std::env::args().nth(1) {
        tracing::info!(path = %path, "Loading blueprint config");
        ConfigLoader::load_from_path(std::path::Path::new(&path))?
    } else {
        // Minimal built-in blueprint
        create_demo_blueprint()?
    };

    // ==== Stage 2: Setup Ingestion Pipeline with mock sources ====
    tracing::info!("Setting up ingestion pipeline...");
    let shots_per_stream = 20u64;
    let mut ingestion = IngestionPipeline::new(100);

    for stream in &blueprint.streams {
        let name = format!("{}_mock", stream.producer.label());
        let source = MockArrivalSource::for_producer(
            &name,
            stream.producer,
            stream.expected_period_s,
        )
        .with_jitter(stream.expected_period_s * 0.02)
        .with_max_shots(shots_per_stream)
        .with_tick_interval(Duration::from_millis(20));
        ingestion.register_source(Box::new(source), None);
        tracing::info!(source = %name, "Registered arrival source");
    }

    tracing::info!(
        source_count = ingestion.source_count(),
        "Ingestion pipeline configured"
    );

    // ==== Stage 3: Setup Engine actor and Dispatcher ====
    tracing::info!("Configuring sync engine...");
    let (report_tx, mut report_rx) = mpsc::channel::<ShotReport>(100);
    let engine = EngineHandle::spawn(blueprint.sync.clone(), 100, Some(report_tx));

    let (sink_tx, sink_rx) = mpsc::channel::<ShotReport>(100);
    let dispatcher = create_dispatcher(blueprint.sinks.clone(), sink_rx)?;
    let dispatcher_handle = dispatcher.spawn();

    // Tee reports into the dispatcher while aggregating run statistics
    let aggregator_handle = tokio::spawn(async move {
        let mut aggregator = AcceptanceAggregator::new();
        while let Some(report) = report_rx.recv().await {
            aggregator.update(&report);
            if sink_tx.send(report).await.is_err() {
                break;
            }
        }
        aggregator
    });

    // ==== Stage 4: Run ====
    tracing::info!("Starting pipeline...");
    ingestion.start_all();
    let arrival_rx = ingestion.take_receiver().unwrap();

    let target = shots_per_stream * blueprint.streams.len() as u64;
    tracing::info!(target, "Running pipeline");

    let pipeline_handle = tokio::spawn(async move {
        let mut forwarded = 0u64;
        while forwarded < target {
            match tokio::time::timeout(Duration::from_secs(5), arrival_rx.recv()).await {
                Ok(Ok(arrival)) => {
                    tracing::debug!(
                        stream = %arrival.producer,
                        timestamp = ?arrival.timestamp,
                        "Received arrival"
                    );
                    if !engine.notify(arrival).await {
                        break;
                    }
                    forwarded += 1;
                }
                _ => break,
            }
        }
        engine.shutdown().await;
        forwarded
    });

    let result = tokio::time::timeout(Duration::from_secs(60), pipeline_handle).await;

    // ==== Stage 5: Cleanup ====
    tracing::info!("Shutting down and cleaning up...");
    ingestion.stop_all();

    // Aggregator finishes once the engine actor closes the report channel;
    // dropping its sink sender then lets the dispatcher drain and stop.
    if let Ok(aggregator) = aggregator_handle.await {
        println!("{}", aggregator.summary());
    }
    let _ = tokio::time::timeout(Duration::from_secs(10), dispatcher_handle).await;

    match result {
        Ok(Ok(count)) => tracing::info!(shots = count, "Pipeline completed successfully"),
        Ok(Err(e)) => tracing::warn!("Pipeline error: {:?}", e),
        Err(_) => tracing::warn!("Pipeline timed out"),
    }

    Ok(())
}

fn create_demo_blueprint() -> Result<ExperimentBlueprint, Box<dyn std::error::Error>> {
    let toml = r#"
[run]
name = "replay_demo"

[[streams]]
producer = "reference"
expected_period_s = 1.0

[[streams]]
producer = "counter"
expected_period_s = 1.0

[[streams]]
producer = "digitizer"
expected_period_s = 1.0

[sync]
secondaries = ["counter", "digitizer"]
tolerance_spacing = 0.2
tolerance_match = 0.3

[[sinks]]
name = "run_log"
sink_type = "log"

[[sinks]]
name = "run_files"
sink_type = "file"
[sinks.params]
base_path = "./output"
"#;
    Ok(ConfigLoader::load_from_str(
        toml,
        config_loader::ConfigFormat::Toml,
    )?)
}
