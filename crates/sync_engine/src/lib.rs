//! # Sync Engine
//!
//! 多流 shot 同步与 acceptance 引擎。
//!
//! 负责：
//! - 到达时间记录与全历史周期估计
//! - Reference 流间距校验 (space-correct)
//! - Secondary 流最近时间戳匹配
//! - Sticky acceptance（一旦接受永不撤销）
//! - 棘轮式 cumulative streak 序列
//!
//! ## 使用示例
//!
//! ```ignore
//! use contracts::{PayloadHandle, ProducerKind, ShotArrival, SyncConfig};
//! use sync_engine::ShotSyncEngine;
//!
//! let mut engine = ShotSyncEngine::new(SyncConfig::default());
//!
//! let report = engine.notify_arrival(ShotArrival::new(
//!     ProducerKind::Reference,
//!     0.0,
//!     PayloadHandle::path("/data/jkam_0000.h5"),
//! ));
//! assert!(report.accepted);
//! ```

mod arrival_log;
mod cumulative;
mod engine;
mod handle;
mod ledger;
mod matcher;
mod snapshot;
mod spacing;
mod stream;

pub use arrival_log::ArrivalLog;
pub use cumulative::CumulativeSeries;
pub use engine::ShotSyncEngine;
pub use handle::EngineHandle;
pub use ledger::AcceptanceLedger;
pub use matcher::{evaluate_shot, MatchOutcome, RejectReason};
pub use snapshot::{EngineSnapshot, StreamSnapshot};
pub use spacing::SpacingValidator;

// Re-export contracts types
pub use contracts::{
    MatchRecord, PeriodEstimate, ProducerKind, ReferenceSnapshot, ReportMeta, ShotArrival,
    ShotReport, SyncConfig,
};
