//! 到达源适配器 trait

use std::sync::Arc;

use async_channel::{Sender, TrySendError};
use contracts::{ProducerKind, ShotArrival};
use tracing::trace;

use crate::config::{DropPolicy, IngestionMetrics};

/// 到达源适配器 trait
///
/// 每个注册的源对应一个适配器，负责：
/// 1. 挂接 `ArrivalSource` 回调
/// 2. 过滤重复 artifact
/// 3. 发送到通道（处理背压）
pub trait SourceAdapter: Send + Sync {
    /// 获取源名称
    fn source_name(&self) -> &str;

    /// 获取所属流
    fn producer(&self) -> ProducerKind;

    /// 启动到达采集
    ///
    /// # Arguments
    /// * `tx` - 到达发送通道
    /// * `metrics` - 共享的 ingestion 指标
    fn start(&self, tx: Sender<ShotArrival>, metrics: Arc<IngestionMetrics>);

    /// 停止到达采集
    fn stop(&self);

    /// 检查是否正在监听
    fn is_listening(&self) -> bool;
}

/// Send arrival, handling backpressure policy
#[inline]
pub(crate) fn send_arrival(
    tx: &Sender<ShotArrival>,
    arrival: ShotArrival,
    metrics: &Arc<IngestionMetrics>,
    source_name: &str,
    drop_policy: DropPolicy,
) {
    match tx.try_send(arrival) {
        Ok(_) => {
            metrics.update_queue_len(tx.len());
            trace!(source = %source_name, "arrival sent");
        }
        Err(TrySendError::Full(_)) => {
            metrics.record_dropped();
            match drop_policy {
                DropPolicy::DropNewest => {
                    trace!(source = %source_name, "arrival dropped (newest)");
                }
                DropPolicy::DropOldest => {
                    // TODO: needs a pop-capable channel for true DropOldest
                    trace!(source = %source_name, "arrival dropped (oldest fallback)");
                }
            }
        }
        Err(TrySendError::Closed(_)) => {
            tracing::warn!(source = %source_name, "channel closed");
        }
    }
}
