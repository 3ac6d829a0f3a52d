//! Ingestion 错误类型

use thiserror::Error;

/// Ingestion 错误
#[derive(Debug, Error)]
pub enum IngestionError {
    /// 通道已关闭
    #[error("channel closed for source {source_name}")]
    ChannelClosed {
        /// 源名称
        source_name: String,
    },

    /// 源未在监听
    #[error("source {source_name} is not listening")]
    SourceNotListening {
        /// 源名称
        source_name: String,
    },

    /// 源已在监听
    #[error("source {source_name} is already listening")]
    AlreadyListening {
        /// 源名称
        source_name: String,
    },

    /// 同名源重复注册
    #[error("source {source_name} is already registered")]
    DuplicateSource {
        /// 源名称
        source_name: String,
    },
}

/// Ingestion Result 类型别名
pub type Result<T> = std::result::Result<T, IngestionError>;
