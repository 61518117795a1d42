//! 通知渠道网关
//!
//! 定义短信、邮件、Push 三类外部网关的 trait，并提供模拟实现。
//!
//! ## 支持的渠道
//!
//! - **SMS**: 短信网关
//! - **Email**: 邮件投递服务
//! - **Push**: App 推送网关（如 FCM、APNs）
//!
//! 网关只负责"接收目标地址和内容，成功或失败"，不做重试和超时控制。
//! 失败到布尔值的折叠由 `ChannelSender` 完成。

mod email;
mod push;
mod sms;

pub use email::SimulatedEmailGateway;
pub use push::SimulatedPushGateway;
pub use sms::SimulatedSmsGateway;

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// 短信内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SmsMessage {
    pub to: String,
    pub body: String,
}

/// 邮件内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EmailMessage {
    pub to: String,
    pub subject: String,
    pub body: String,
    /// 邮件服务商侧的模板标识（可选）
    pub template: Option<String>,
}

/// Push 内容
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PushMessage {
    pub user_id: String,
    pub title: String,
    pub body: String,
    /// 客户端透传数据（可选）
    pub data: Option<serde_json::Value>,
}

/// 短信网关
///
/// 成功时返回网关侧的消息 ID
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SmsGateway: Send + Sync {
    async fn send(&self, message: &SmsMessage) -> Result<String>;
}

/// 邮件网关
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait EmailGateway: Send + Sync {
    async fn send(&self, message: &EmailMessage) -> Result<String>;
}

/// Push 网关
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PushGateway: Send + Sync {
    async fn send(&self, message: &PushMessage) -> Result<String>;
}

/// 三个渠道网关的组合，由组合根注入
#[derive(Clone)]
pub struct Gateways {
    pub sms: Arc<dyn SmsGateway>,
    pub email: Arc<dyn EmailGateway>,
    pub push: Arc<dyn PushGateway>,
}

impl Gateways {
    pub fn new(
        sms: Arc<dyn SmsGateway>,
        email: Arc<dyn EmailGateway>,
        push: Arc<dyn PushGateway>,
    ) -> Self {
        Self { sms, email, push }
    }

    /// 使用模拟网关（记录日志并固定延迟）
    pub fn simulated(latency: Duration) -> Self {
        Self {
            sms: Arc::new(SimulatedSmsGateway::new(latency)),
            email: Arc::new(SimulatedEmailGateway::new(latency)),
            push: Arc::new(SimulatedPushGateway::new(latency)),
        }
    }
}
