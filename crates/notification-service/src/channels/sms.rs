//! SMS 短信网关
//!
//! 当前为模拟实现，生产环境需要接入真实的短信服务。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use notify_shared::events::NotificationChannel;

use super::{SmsGateway, SmsMessage};
use crate::error::{NotificationError, Result};

/// 模拟短信网关
///
/// 记录日志并等待固定延迟，模拟一次外部调用。
pub struct SimulatedSmsGateway {
    latency: Duration,
}

impl SimulatedSmsGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl SmsGateway for SimulatedSmsGateway {
    async fn send(&self, message: &SmsMessage) -> Result<String> {
        if message.to.trim().is_empty() {
            return Err(NotificationError::InvalidDestination {
                channel: NotificationChannel::Sms,
                destination: message.to.clone(),
            });
        }

        debug!(to = %message.to, content_length = message.body.len(), "SMS 发送中...");

        // 模拟网络延迟
        tokio::time::sleep(self.latency).await;

        let message_id = format!("sms_{}", Uuid::new_v4());

        info!(
            channel = "SMS",
            to = %message.to,
            message_id = %message_id,
            body = %message.body,
            "模拟发送短信"
        );

        Ok(message_id)
    }
}
