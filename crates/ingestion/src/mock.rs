//! Mock 到达源
//!
//! 用于无采集硬件环境的测试与演示。生成周期性的 shot 到达，
//! 可配置抖动、丢 shot 率与时间戳缺失率。确定性：同一 seed
//! 产生同一序列。

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use contracts::{ArrivalCallback, ArrivalSource, PayloadHandle, ProducerKind, ShotArrival};
use tracing::{debug, trace};

/// Mock 到达源配置
#[derive(Debug, Clone)]
pub struct MockSourceConfig {
    /// 源名称
    pub name: String,

    /// 所属流
    pub producer: ProducerKind,

    /// shot 周期 (秒)
    pub period_s: f64,

    /// 时间戳抖动幅度 (秒，均匀分布在 ±jitter_s 内)
    pub jitter_s: f64,

    /// 丢 shot 概率 (0.0 - 1.0)：该拍完全不产生到达
    pub dropout_rate: f64,

    /// 时间戳缺失概率 (0.0 - 1.0)：到达携带 `timestamp = None`
    pub missing_timestamp_rate: f64,

    /// 产生的 shot 数上限 (None = 直到 stop)
    pub max_shots: Option<u64>,

    /// 实际等待的节拍间隔 (None = period_s；测试用小值加速)
    pub tick_interval: Option<Duration>,

    /// 伪随机种子
    pub seed: u64,
}

impl Default for MockSourceConfig {
    fn default() -> Self {
        Self {
            name: "mock_source".to_string(),
            producer: ProducerKind::Reference,
            period_s: 1.0,
            jitter_s: 0.0,
            dropout_rate: 0.0,
            missing_timestamp_rate: 0.0,
            max_shots: None,
            tick_interval: None,
            seed: 0x5eed,
        }
    }
}

/// Mock 到达源
///
/// 模拟一个采集子系统按固定实验节拍写出 artifact。
pub struct MockArrivalSource {
    config: MockSourceConfig,
    listening: Arc<AtomicBool>,
}

impl MockArrivalSource {
    /// 创建新的 Mock 到达源
    pub fn new(config: MockSourceConfig) -> Self {
        Self {
            config,
            listening: Arc::new(AtomicBool::new(false)),
        }
    }

    /// 创建参考流 (主相机) 源
    pub fn reference(name: &str, period_s: f64) -> Self {
        Self::new(MockSourceConfig {
            name: name.to_string(),
            producer: ProducerKind::Reference,
            period_s,
            ..Default::default()
        })
    }

    /// 创建指定流的源
    pub fn for_producer(name: &str, producer: ProducerKind, period_s: f64) -> Self {
        Self::new(MockSourceConfig {
            name: name.to_string(),
            producer,
            period_s,
            ..Default::default()
        })
    }

    /// 设置抖动幅度
    pub fn with_jitter(mut self, jitter_s: f64) -> Self {
        self.config.jitter_s = jitter_s;
        self
    }

    /// 设置丢 shot 率
    pub fn with_dropout(mut self, dropout_rate: f64) -> Self {
        self.config.dropout_rate = dropout_rate;
        self
    }

    /// 设置时间戳缺失率
    pub fn with_missing_timestamps(mut self, rate: f64) -> Self {
        self.config.missing_timestamp_rate = rate;
        self
    }

    /// 设置 shot 数上限
    pub fn with_max_shots(mut self, max_shots: u64) -> Self {
        self.config.max_shots = Some(max_shots);
        self
    }

    /// 设置节拍间隔 (测试加速)
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.config.tick_interval = Some(interval);
        self
    }
}

impl ArrivalSource for MockArrivalSource {
    fn name(&self) -> &str {
        &self.config.name
    }

    fn producer(&self) -> ProducerKind {
        self.config.producer
    }

    fn listen(&self, callback: ArrivalCallback) {
        if self.listening.swap(true, Ordering::SeqCst) {
            return;
        }

        let config = self.config.clone();
        let listening = self.listening.clone();

        debug!(
            source = %config.name,
            stream = %config.producer,
            period_s = config.period_s,
            "mock arrival source started"
        );

        std::thread::spawn(move || {
            let tick = config
                .tick_interval
                .unwrap_or_else(|| Duration::from_secs_f64(config.period_s));
            let mut rng = XorShift::new(config.seed);
            let mut beat: u64 = 0;
            let mut emitted: u64 = 0;

            while listening.load(Ordering::Relaxed) {
                if let Some(max) = config.max_shots {
                    if emitted >= max {
                        break;
                    }
                }

                let nominal = beat as f64 * config.period_s;
                beat += 1;

                if rng.next_f64() < config.dropout_rate {
                    trace!(source = %config.name, beat, "mock shot dropped");
                    std::thread::sleep(tick);
                    continue;
                }

                let jitter = (rng.next_f64() * 2.0 - 1.0) * config.jitter_s;
                let payload = PayloadHandle::path(format!(
                    "/mock/{}/{}_{:04}.h5",
                    config.name,
                    config.producer.label(),
                    emitted
                ));

                let arrival = if rng.next_f64() < config.missing_timestamp_rate {
                    ShotArrival::without_timestamp(config.producer, payload)
                } else {
                    ShotArrival::new(config.producer, nominal + jitter, payload)
                };

                emitted += 1;
                trace!(source = %config.name, beat, "mock arrival emitted");
                callback(arrival);

                std::thread::sleep(tick);
            }

            listening.store(false, Ordering::SeqCst);
            debug!(source = %config.name, emitted, "mock arrival source stopped");
        });
    }

    fn stop(&self) {
        self.listening.store(false, Ordering::SeqCst);
    }

    fn is_listening(&self) -> bool {
        self.listening.load(Ordering::Relaxed)
    }
}

/// Tiny deterministic PRNG (xorshift64*), enough for jitter/dropout draws.
struct XorShift {
    state: u64,
}

impl XorShift {
    fn new(seed: u64) -> Self {
        Self {
            state: seed.max(1),
        }
    }

    fn next_u64(&mut self) -> u64 {
        let mut x = self.state;
        x ^= x >> 12;
        x ^= x << 25;
        x ^= x >> 27;
        self.state = x;
        x.wrapping_mul(0x2545_F491_4F6C_DD1D)
    }

    fn next_f64(&mut self) -> f64 {
        (self.next_u64() >> 11) as f64 / (1u64 << 53) as f64
    }
}
