//! LogSink - logs report summary via tracing

use contracts::{ContractError, ReportSink, ShotReport};
use tracing::{info, instrument};

/// Sink that logs shot verdicts, the headless stand-in for the run table
pub struct LogSink {
    name: String,
}

impl LogSink {
    /// Create a new LogSink with the given name
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into() }
    }

    fn log_report_summary(&self, report: &ShotReport) {
        info!(
            sink = %self.name,
            stream = %report.producer,
            shot_index = report.shot_index,
            accepted = report.accepted,
            matched = ?report.matched_reference_index,
            cumulative = report.cumulative_value,
            record_high = report.meta.record_high,
            "ShotReport received"
        );
    }
}

impl ReportSink for LogSink {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(
        name = "log_sink_write",
        skip(self, report),
        fields(sink = %self.name, shot_index = report.shot_index)
    )]
    async fn write(&mut self, report: &ShotReport) -> Result<(), ContractError> {
        self.log_report_summary(report);
        Ok(())
    }

    #[instrument(name = "log_sink_flush", skip(self))]
    async fn flush(&mut self) -> Result<(), ContractError> {
        // Nothing to flush for log sink
        Ok(())
    }

    #[instrument(name = "log_sink_close", skip(self))]
    async fn close(&mut self) -> Result<(), ContractError> {
        info!(sink = %self.name, "LogSink closed");
        Ok(())
    }
}
