//! 渠道发送器
//!
//! 通知链路的叶子节点：每次调用只访问一次对应网关，任何网关错误都在这里被吞掉，
//! 以 `false`（或失败的 `ChannelResult`）返回，不会向上传播。
//!
//! 布尔接口 `send_*` 定义为结构化接口 `deliver_*` 的 `is_success()`，两者行为一致。

use std::time::Instant;

use futures::future::{BoxFuture, join_all};
use tracing::{debug, warn};

use notify_shared::events::NotificationChannel as Channel;
use notify_shared::observability::metrics;

use crate::channels::{EmailMessage, Gateways, PushMessage, SmsMessage};
use crate::error::Result;
use crate::types::{ChannelResult, DispatchSummary};

/// 渠道发送器
#[derive(Clone)]
pub struct ChannelSender {
    gateways: Gateways,
}

impl ChannelSender {
    pub fn new(gateways: Gateways) -> Self {
        Self { gateways }
    }

    /// 发送短信，返回是否成功
    pub async fn send_sms(&self, to: &str, message: &str) -> bool {
        self.deliver_sms(to, message).await.is_success()
    }

    /// 发送邮件，返回是否成功
    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        template: Option<&str>,
    ) -> bool {
        self.deliver_email(to, subject, body, template)
            .await
            .is_success()
    }

    /// 发送 Push，返回是否成功
    pub async fn send_push(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> bool {
        self.deliver_push(user_id, title, body, data)
            .await
            .is_success()
    }

    /// 发送短信，返回结构化结果
    pub async fn deliver_sms(&self, to: &str, message: &str) -> ChannelResult {
        let start = Instant::now();
        let payload = SmsMessage {
            to: to.to_string(),
            body: message.to_string(),
        };

        let outcome = self.gateways.sms.send(&payload).await;
        finish(Channel::Sms, to, outcome, start)
    }

    /// 发送邮件，返回结构化结果
    pub async fn deliver_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        template: Option<&str>,
    ) -> ChannelResult {
        let start = Instant::now();
        let payload = EmailMessage {
            to: to.to_string(),
            subject: subject.to_string(),
            body: body.to_string(),
            template: template.map(str::to_string),
        };

        let outcome = self.gateways.email.send(&payload).await;
        finish(Channel::Email, to, outcome, start)
    }

    /// 发送 Push，返回结构化结果
    pub async fn deliver_push(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        data: Option<serde_json::Value>,
    ) -> ChannelResult {
        let start = Instant::now();
        let payload = PushMessage {
            user_id: user_id.to_string(),
            title: title.to_string(),
            body: body.to_string(),
            data,
        };

        let outcome = self.gateways.push.send(&payload).await;
        finish(Channel::Push, user_id, outcome, start)
    }
}

/// 把网关返回折叠为发送结果，并记录日志与指标
fn finish(
    channel: Channel,
    destination: &str,
    outcome: Result<String>,
    start: Instant,
) -> ChannelResult {
    let elapsed = start.elapsed();
    let duration_ms = elapsed.as_millis() as u64;

    let result = match outcome {
        Ok(message_id) => {
            debug!(
                channel = %channel,
                destination = %destination,
                message_id = %message_id,
                duration_ms,
                "渠道发送成功"
            );
            ChannelResult::success(channel, message_id, duration_ms)
        }
        Err(e) => {
            warn!(
                channel = %channel,
                destination = %destination,
                error_code = e.code(),
                retryable = e.is_retryable(),
                error = %e,
                "渠道发送失败"
            );
            ChannelResult::failed(channel, &e, duration_ms)
        }
    };

    metrics::record_channel_send(channel, result.is_success(), elapsed.as_secs_f64());
    result
}

/// 并行执行一组发送并等待全部结束
///
/// 没有并发上限；单个发送失败不影响其他发送。
pub(crate) async fn settle_all(sends: Vec<BoxFuture<'_, bool>>) -> DispatchSummary {
    let outcomes = join_all(sends).await;
    DispatchSummary::from_outcomes(&outcomes)
}
