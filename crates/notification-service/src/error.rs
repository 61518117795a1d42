//! 通知服务错误类型
//!
//! 定义渠道网关发送、模板配置等场景的错误分类。
//! 渠道发送器会把这些错误折叠为失败结果，调用方永远不会直接收到。

use notify_shared::events::NotificationChannel;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotificationError {
    #[error("通知发送失败: 渠道={channel}, 原因={reason}")]
    SendFailed {
        channel: NotificationChannel,
        reason: String,
    },

    #[error("收件地址无效: 渠道={channel}, 地址={destination:?}")]
    InvalidDestination {
        channel: NotificationChannel,
        destination: String,
    },

    #[error("外部服务错误: {service} - {message}")]
    ExternalService { service: String, message: String },

    #[error("外部服务超时: {service}")]
    ExternalServiceTimeout { service: String },

    #[error("通知模板无效: {name} - {reason}")]
    TemplateInvalid { name: String, reason: String },

    #[error(transparent)]
    Shared(#[from] notify_shared::error::SharedError),
}

/// 错误结果类型别名
pub type Result<T> = std::result::Result<T, NotificationError>;

impl NotificationError {
    /// 获取错误码，写入结构化发送结果
    pub fn code(&self) -> &'static str {
        match self {
            Self::SendFailed { .. } => "SEND_FAILED",
            Self::InvalidDestination { .. } => "INVALID_DESTINATION",
            Self::ExternalService { .. } => "EXTERNAL_SERVICE_ERROR",
            Self::ExternalServiceTimeout { .. } => "EXTERNAL_SERVICE_TIMEOUT",
            Self::TemplateInvalid { .. } => "TEMPLATE_INVALID",
            Self::Shared(e) => e.code(),
        }
    }

    /// 是否为可重试错误
    ///
    /// 仅用于日志分类，发送器本身不做重试
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::ExternalService { .. } | Self::ExternalServiceTimeout { .. }
        )
    }
}
