//! ExperimentBlueprint - Config Loader 输出
//!
//! 描述完整的运行配置：producer 流、同步容差、输出路由。

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::{ProducerKind, SyncConfig};

/// 配置版本
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ConfigVersion {
    #[default]
    V1,
}

/// 完整的实验运行配置蓝图
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExperimentBlueprint {
    /// 配置版本
    #[serde(default)]
    pub version: ConfigVersion,

    /// 运行设置
    #[serde(default)]
    pub run: RunConfig,

    /// Producer 流定义列表
    pub streams: Vec<StreamConfig>,

    /// 同步容差配置
    #[serde(default)]
    pub sync: SyncConfig,

    /// 输出路由配置
    #[serde(default)]
    pub sinks: Vec<SinkConfig>,
}

/// 运行配置：标识与数据根目录
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunConfig {
    /// Run label (e.g. "cavity_scan_07")
    #[serde(default = "default_run_name")]
    pub name: String,

    /// Root directory the acquisition subsystems write into
    #[serde(default)]
    pub data_root: Option<String>,
}

fn default_run_name() -> String {
    "unnamed_run".to_string()
}

impl Default for RunConfig {
    fn default() -> Self {
        Self {
            name: default_run_name(),
            data_root: None,
        }
    }
}

/// 单个 producer 流配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamConfig {
    /// 流类别
    pub producer: ProducerKind,

    /// 预期 shot 周期 (秒)，仅用于 mock 源与诊断，必须 > 0
    #[serde(default = "default_expected_period")]
    pub expected_period_s: f64,

    /// 流特定属性 (文件扩展名、子目录名等)
    #[serde(default)]
    pub attributes: HashMap<String, String>,
}

fn default_expected_period() -> f64 {
    1.0
}

/// Sink 输出配置
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SinkConfig {
    /// Sink 名称
    pub name: String,

    /// Sink 类型
    pub sink_type: SinkType,

    /// 队列容量
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    /// 类型特定参数
    #[serde(default)]
    pub params: HashMap<String, String>,
}

fn default_queue_capacity() -> usize {
    100
}

/// Sink 类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SinkType {
    /// 日志输出
    Log,
    /// JSON-lines 文件输出
    File,
}

impl ExperimentBlueprint {
    /// Streams configured as secondaries (everything but the reference).
    pub fn secondary_streams(&self) -> impl Iterator<Item = &StreamConfig> {
        let reference = self.sync.reference;
        self.streams.iter().filter(move |s| s.producer != reference)
    }

    /// The configured reference stream, if present.
    pub fn reference_stream(&self) -> Option<&StreamConfig> {
        self.streams
            .iter()
            .find(|s| s.producer == self.sync.reference)
    }
}
