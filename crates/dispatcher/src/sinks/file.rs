//! FileSink - appends reports to per-stream JSON-lines files

use contracts::{ContractError, ProducerKind, ReportSink, ShotReport};
use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::PathBuf;
use tracing::{debug, error, instrument};

/// Configuration for FileSink
#[derive(Debug, Clone)]
pub struct FileSinkConfig {
    /// Base output directory
    pub base_path: PathBuf,

    /// Run directory name; defaults to a timestamp so reruns never collide
    pub run_label: String,
}

impl FileSinkConfig {
    /// Create config from params map
    pub fn from_params(params: &HashMap<String, String>) -> Self {
        let base_path = params
            .get("base_path")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("./output"));

        let run_label = params.get("run_label").cloned().unwrap_or_else(|| {
            chrono::Local::now()
                .format("run_%Y%m%d_%H%M%S")
                .to_string()
        });

        Self {
            base_path,
            run_label,
        }
    }
}

/// Sink that appends each report as one JSON line to a per-stream file
///
/// Layout: `<base_path>/<run_label>/<stream>.jsonl`. One file per stream,
/// opened lazily on the first report from that stream.
pub struct FileSink {
    name: String,
    run_dir: PathBuf,
    writers: HashMap<ProducerKind, BufWriter<File>>,
}

impl FileSink {
    /// Create a new FileSink
    pub fn new(name: impl Into<String>, config: FileSinkConfig) -> std::io::Result<Self> {
        let run_dir = config.base_path.join(&config.run_label);
        fs::create_dir_all(&run_dir)?;

        Ok(Self {
            name: name.into(),
            run_dir,
            writers: HashMap::new(),
        })
    }

    /// Create from params map (for factory)
    pub fn from_params(
        name: impl Into<String>,
        params: &HashMap<String, String>,
    ) -> std::io::Result<Self> {
        let config = FileSinkConfig::from_params(params);
        Self::new(name, config)
    }

    /// Directory the current run writes into
    pub fn run_dir(&self) -> &PathBuf {
        &self.run_dir
    }

    fn writer_for(&mut self, producer: ProducerKind) -> std::io::Result<&mut BufWriter<File>> {
        use std::collections::hash_map::Entry;
        match self.writers.entry(producer) {
            Entry::Occupied(entry) => Ok(entry.into_mut()),
            Entry::Vacant(entry) => {
                let path = self.run_dir.join(format!("{}.jsonl", producer.label()));
                let file = OpenOptions::new().create(true).append(true).open(path)?;
                Ok(entry.insert(BufWriter::new(file)))
            }
        }
    }

    fn append_report(&mut self, report: &ShotReport) -> std::io::Result<()> {
        let line = serde_json::to_string(report)
            .map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))?;
        let writer = self.writer_for(report.producer)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        Ok(())
    }

    fn persist_report(&mut self, report: &ShotReport) -> Result<(), ContractError> {
        self.append_report(report).map_err(|e| {
            error!(
                sink = %self.name,
                stream = %report.producer,
                shot_index = report.shot_index,
                error = %e,
                "Write failed"
            );
            ContractError::sink_write(&self.name, e.to_string())
        })
    }

    fn flush_all(&mut self) -> Result<(), ContractError> {
        for (producer, writer) in &mut self.writers {
            writer.flush().map_err(|e| {
                error!(sink = "file", stream = %producer, error = %e, "Flush failed");
                ContractError::sink_write(producer.label(), e.to_string())
            })?;
        }
        Ok(())
    }
}

impl ReportSink for FileSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "file_sink_write",
        skip(self, report),
        fields(sink = %self.name, stream = %report.producer, shot_index = report.shot_index)
    )]
    async fn write(&mut self, report: &ShotReport) -> Result<(), ContractError> {
        self.persist_report(report)?;
        Ok(())
    }

    #[instrument(name = "file_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        self.flush_all()
    }

    #[instrument(name = "file_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        self.flush_all()?;
        self.writers.clear();
        debug!(sink = %self.name, "FileSink closed");
        Ok(())
    }
}
