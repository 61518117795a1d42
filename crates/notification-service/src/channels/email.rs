//! Email 邮件网关
//!
//! 当前为模拟实现，生产环境需要接入真实的邮件服务（如 SendGrid、AWS SES）。

use std::time::Duration;

use async_trait::async_trait;
use tracing::{debug, info};
use uuid::Uuid;

use notify_shared::events::NotificationChannel;

use super::{EmailGateway, EmailMessage};
use crate::error::{NotificationError, Result};

/// 模拟邮件网关
pub struct SimulatedEmailGateway {
    latency: Duration,
    /// 发件人地址
    from_address: String,
}

impl SimulatedEmailGateway {
    pub fn new(latency: Duration) -> Self {
        Self {
            latency,
            from_address: "noreply@logistics.local".to_string(),
        }
    }

    pub fn with_from_address(mut self, from_address: impl Into<String>) -> Self {
        self.from_address = from_address.into();
        self
    }

    /// 粗略校验邮箱格式，真实校验交给邮件服务商
    fn is_valid_address(address: &str) -> bool {
        let address = address.trim();
        match address.split_once('@') {
            Some((local, domain)) => !local.is_empty() && !domain.is_empty(),
            None => false,
        }
    }
}

#[async_trait]
impl EmailGateway for SimulatedEmailGateway {
    async fn send(&self, message: &EmailMessage) -> Result<String> {
        if !Self::is_valid_address(&message.to) {
            return Err(NotificationError::InvalidDestination {
                channel: NotificationChannel::Email,
                destination: message.to.clone(),
            });
        }

        debug!(
            to = %message.to,
            from = %self.from_address,
            template = ?message.template,
            "Email 发送中..."
        );

        tokio::time::sleep(self.latency).await;

        let message_id = format!("email_{}", Uuid::new_v4());

        info!(
            channel = "EMAIL",
            to = %message.to,
            message_id = %message_id,
            subject = %message.subject,
            "模拟发送邮件"
        );

        Ok(message_id)
    }
}
