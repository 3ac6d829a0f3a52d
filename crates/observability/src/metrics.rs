//! 同步引擎指标收集模块
//!
//! 基于 ShotReport 收集和统计各流的接收判定指标。

use contracts::{ProducerKind, ShotReport};
use metrics::{counter, gauge, histogram};

/// 从 ShotReport 记录指标
///
/// 每次 Sync Engine 产出 ShotReport 时调用此函数来记录指标。
///
/// # Example
///
/// ```ignore
/// use observability::metrics::record_shot_report;
///
/// let report = engine.notify_arrival(arrival);
/// record_shot_report(&report);
/// ```
pub fn record_shot_report(report: &ShotReport) {
    let stream = report.producer.label().to_string();

    // 逐流 shot 计数器
    counter!("shot_sync_shots_total", "stream" => stream.clone()).increment(1);

    // 最新 shot 索引 (用于检测停滞的流)
    gauge!("shot_sync_last_shot_index", "stream" => stream.clone()).set(report.shot_index as f64);

    // 接收/拒绝计数
    let verdict = if report.accepted {
        "accepted"
    } else {
        "rejected"
    };
    counter!(
        "shot_sync_verdicts_total",
        "stream" => stream.clone(),
        "verdict" => verdict.to_string()
    )
    .increment(1);

    // 连续接收计数与历史最高水位
    gauge!("shot_sync_cumulative_value", "stream" => stream.clone())
        .set(report.cumulative_value as f64);
    gauge!("shot_sync_record_high", "stream" => stream.clone()).set(report.meta.record_high as f64);

    // 永久接收的 shot 数
    gauge!("shot_sync_locked_count", "stream" => stream.clone())
        .set(report.meta.locked_count as f64);

    // 周期估计 (秒 -> 毫秒)
    if report.meta.stream_period.defined {
        gauge!("shot_sync_stream_period_ms", "stream" => stream.clone())
            .set(report.meta.stream_period.value * 1000.0);
        histogram!("shot_sync_stream_period_ms_hist", "stream" => stream.clone())
            .record(report.meta.stream_period.value * 1000.0);
    }
    if report.meta.reference_period.defined {
        gauge!("shot_sync_reference_period_ms").set(report.meta.reference_period.value * 1000.0);
    }

    // 缺失时间戳的 shot
    if report.timestamp.is_none() {
        counter!("shot_sync_missing_timestamps_total", "stream" => stream).increment(1);
    }
}

/// 记录 shot 到达 (接入层)
pub fn record_arrival_received(producer: ProducerKind) {
    counter!(
        "shot_sync_arrivals_received_total",
        "stream" => producer.label().to_string()
    )
    .increment(1);
}

/// 记录报告分发
pub fn record_report_dispatched(sink_name: &str, success: bool) {
    let status = if success { "success" } else { "failure" };
    counter!(
        "shot_sync_reports_dispatched_total",
        "sink" => sink_name.to_string(),
        "status" => status.to_string()
    )
    .increment(1);
}

/// 接收判定聚合器
///
/// 在内存中聚合指标，便于统计和输出摘要。
#[derive(Debug, Clone, Default)]
pub struct AcceptanceAggregator {
    /// 各流的计数
    pub streams: std::collections::HashMap<ProducerKind, StreamTally>,
}

/// 单个流的聚合计数
#[derive(Debug, Clone, Default)]
pub struct StreamTally {
    /// 总 shot 数
    pub total_shots: u64,

    /// 接收的 shot 数
    pub accepted: u64,

    /// 缺失时间戳的 shot 数
    pub missing_timestamps: u64,

    /// 历史最高连续接收
    pub record_high: u64,

    /// 周期估计统计 (毫秒)
    pub period_stats: RunningStats,
}

impl AcceptanceAggregator {
    /// 创建新的聚合器
    pub fn new() -> Self {
        Self::default()
    }

    /// 更新聚合统计
    pub fn update(&mut self, report: &ShotReport) {
        let tally = self.streams.entry(report.producer).or_default();
        tally.total_shots += 1;
        if report.accepted {
            tally.accepted += 1;
        }
        if report.timestamp.is_none() {
            tally.missing_timestamps += 1;
        }
        tally.record_high = tally.record_high.max(report.meta.record_high);
        if report.meta.stream_period.defined {
            tally
                .period_stats
                .push(report.meta.stream_period.value * 1000.0);
        }
    }

    /// 生成摘要报告
    pub fn summary(&self) -> AcceptanceSummary {
        let mut streams: Vec<_> = self
            .streams
            .iter()
            .map(|(producer, tally)| StreamSummary {
                producer: *producer,
                total_shots: tally.total_shots,
                accepted: tally.accepted,
                acceptance_rate: if tally.total_shots > 0 {
                    tally.accepted as f64 / tally.total_shots as f64 * 100.0
                } else {
                    0.0
                },
                missing_timestamps: tally.missing_timestamps,
                record_high: tally.record_high,
                period_ms: StatsSummary::from(&tally.period_stats),
            })
            .collect();
        streams.sort_by_key(|s| s.producer);
        AcceptanceSummary { streams }
    }

    /// 重置统计
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// 聚合摘要
#[derive(Debug, Clone, Default)]
pub struct AcceptanceSummary {
    pub streams: Vec<StreamSummary>,
}

/// 单个流的摘要
#[derive(Debug, Clone)]
pub struct StreamSummary {
    pub producer: ProducerKind,
    pub total_shots: u64,
    pub accepted: u64,
    pub acceptance_rate: f64,
    pub missing_timestamps: u64,
    pub record_high: u64,
    pub period_ms: StatsSummary,
}

impl std::fmt::Display for AcceptanceSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "=== Acceptance Summary ===")?;
        for s in &self.streams {
            writeln!(
                f,
                "{}: {}/{} accepted ({:.2}%), record_high={}, missing_ts={}",
                s.producer, s.accepted, s.total_shots, s.acceptance_rate, s.record_high,
                s.missing_timestamps
            )?;
            writeln!(f, "  period (ms): {}", s.period_ms)?;
        }
        Ok(())
    }
}

/// 统计摘要
#[derive(Debug, Clone, Default)]
pub struct StatsSummary {
    pub count: u64,
    pub min: f64,
    pub max: f64,
    pub mean: f64,
    pub std_dev: f64,
}

impl From<&RunningStats> for StatsSummary {
    fn from(stats: &RunningStats) -> Self {
        Self {
            count: stats.count(),
            min: stats.min(),
            max: stats.max(),
            mean: stats.mean(),
            std_dev: stats.std_dev(),
        }
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.count == 0 {
            write!(f, "N/A")
        } else {
            write!(
                f,
                "min={:.3}, max={:.3}, mean={:.3}, std={:.3} (n={})",
                self.min, self.max, self.mean, self.std_dev, self.count
            )
        }
    }
}

/// 在线统计计算器 (Welford's algorithm)
#[derive(Debug, Clone, Default)]
pub struct RunningStats {
    count: u64,
    mean: f64,
    m2: f64,
    min: f64,
    max: f64,
}

impl RunningStats {
    /// 添加新值
    pub fn push(&mut self, value: f64) {
        self.count += 1;

        if self.count == 1 {
            self.min = value;
            self.max = value;
            self.mean = value;
            self.m2 = 0.0;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);

            let delta = value - self.mean;
            self.mean += delta / self.count as f64;
            let delta2 = value - self.mean;
            self.m2 += delta * delta2;
        }
    }

    /// 样本数量
    pub fn count(&self) -> u64 {
        self.count
    }

    /// 均值
    pub fn mean(&self) -> f64 {
        if self.count == 0 {
            0.0
        } else {
            self.mean
        }
    }

    /// 方差
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }

    /// 标准差
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// 最小值
    pub fn min(&self) -> f64 {
        self.min
    }

    /// 最大值
    pub fn max(&self) -> f64 {
        self.max
    }
}
