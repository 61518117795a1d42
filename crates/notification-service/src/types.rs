//! 发送结果类型定义

use serde::{Deserialize, Serialize};

use notify_shared::events::NotificationChannel as Channel;

use crate::error::NotificationError;

/// 发送状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SendStatus {
    Success,
    Failed,
}

/// 单渠道发送结果
///
/// 布尔接口之外的结构化结果，携带失败类型和原因，便于接入观测
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChannelResult {
    pub channel: Channel,
    pub status: SendStatus,
    /// 失败时的错误码，取自 `NotificationError::code`
    pub error_code: Option<String>,
    /// 失败时的错误信息
    pub error: Option<String>,
    /// 外部网关返回的消息 ID（成功时）
    pub external_message_id: Option<String>,
    /// 发送耗时（毫秒）
    pub duration_ms: u64,
}

impl ChannelResult {
    /// 创建成功结果
    pub fn success(channel: Channel, external_message_id: String, duration_ms: u64) -> Self {
        Self {
            channel,
            status: SendStatus::Success,
            error_code: None,
            error: None,
            external_message_id: Some(external_message_id),
            duration_ms,
        }
    }

    /// 创建失败结果
    pub fn failed(channel: Channel, error: &NotificationError, duration_ms: u64) -> Self {
        Self {
            channel,
            status: SendStatus::Failed,
            error_code: Some(error.code().to_string()),
            error: Some(error.to_string()),
            external_message_id: None,
            duration_ms,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == SendStatus::Success
    }
}

/// 一组并行发送的汇总
///
/// 仅用于日志，不返回给通知接口的调用方
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DispatchSummary {
    pub total: usize,
    pub succeeded: usize,
}

impl DispatchSummary {
    pub fn from_outcomes(outcomes: &[bool]) -> Self {
        Self {
            total: outcomes.len(),
            succeeded: outcomes.iter().filter(|ok| **ok).count(),
        }
    }

    pub fn failed(&self) -> usize {
        self.total - self.succeeded
    }

    /// 是否所有发送都成功（空集合视为成功）
    pub fn all_succeeded(&self) -> bool {
        self.succeeded == self.total
    }
}
