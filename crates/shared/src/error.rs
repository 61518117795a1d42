//! 统一错误处理模块
//!
//! 定义基础设施层（配置加载、可观测性初始化）共享的错误类型，使用 thiserror 提供良好的错误信息。
//! 业务层的渠道发送错误由各服务自行定义，并通过 `#[from]` 包装本类型。

use thiserror::Error;

/// 基础设施错误类型
#[derive(Debug, Error)]
pub enum SharedError {
    // ==================== 配置错误 ====================
    #[error("配置加载失败: {0}")]
    Config(#[from] config::ConfigError),

    #[error("配置项无效: {key} - {message}")]
    InvalidConfig { key: String, message: String },

    // ==================== 可观测性错误 ====================
    #[error("日志初始化失败: {0}")]
    Tracing(String),

    #[error("指标导出器初始化失败: {0}")]
    Metrics(String),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, SharedError>;

impl SharedError {
    /// 获取错误码
    pub fn code(&self) -> &'static str {
        match self {
            Self::Config(_) => "CONFIG_ERROR",
            Self::InvalidConfig { .. } => "INVALID_CONFIG",
            Self::Tracing(_) => "TRACING_ERROR",
            Self::Metrics(_) => "METRICS_ERROR",
        }
    }
}
