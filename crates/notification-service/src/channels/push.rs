//! App Push 推送网关
//!
//! 当前为模拟实现，生产环境中替换为 APNs / FCM 等推送服务的 SDK 调用。

use std::time::Duration;

use async_trait::async_trait;
use tracing::info;
use uuid::Uuid;

use notify_shared::events::NotificationChannel;

use super::{PushGateway, PushMessage};
use crate::error::{NotificationError, Result};

/// 模拟 Push 网关
pub struct SimulatedPushGateway {
    latency: Duration,
}

impl SimulatedPushGateway {
    pub fn new(latency: Duration) -> Self {
        Self { latency }
    }
}

#[async_trait]
impl PushGateway for SimulatedPushGateway {
    async fn send(&self, message: &PushMessage) -> Result<String> {
        if message.user_id.trim().is_empty() {
            return Err(NotificationError::InvalidDestination {
                channel: NotificationChannel::Push,
                destination: message.user_id.clone(),
            });
        }

        tokio::time::sleep(self.latency).await;

        let message_id = format!("push_{}", Uuid::now_v7());

        info!(
            channel = "PUSH",
            user_id = %message.user_id,
            message_id = %message_id,
            title = %message.title,
            has_data = message.data.is_some(),
            "模拟发送 Push 通知"
        );

        Ok(message_id)
    }
}
