//! 批量通知
//!
//! 向一组用户 ID 推送同一条消息。用户 ID 不携带手机号和邮箱，
//! 因此只有 Push 渠道真正发送，SMS / Email 会被记录后跳过。

use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{info, instrument, warn};

use notify_shared::config::BulkConfig;
use notify_shared::events::NotificationChannel;
use notify_shared::observability::metrics;

use crate::sender::ChannelSender;
use crate::types::DispatchSummary;

/// 批量通知分发器
#[derive(Clone)]
pub struct BulkDispatcher {
    sender: ChannelSender,
    config: BulkConfig,
}

impl BulkDispatcher {
    pub fn new(sender: ChannelSender, config: BulkConfig) -> Self {
        Self { sender, config }
    }

    /// 批量发送通知
    ///
    /// `channels` 为空时使用配置中的默认渠道（默认仅 Push）。
    /// 每个接收人的失败都被吞掉，所有发送结束后才返回。
    #[instrument(skip(self, recipient_ids, message, channels), fields(recipients = recipient_ids.len()))]
    pub async fn send_bulk_notification(
        &self,
        recipient_ids: &[String],
        title: &str,
        message: &str,
        channels: Option<&[NotificationChannel]>,
    ) {
        let channels = channels.unwrap_or(&self.config.default_channels);

        for skipped in channels.iter().filter(|c| **c != NotificationChannel::Push) {
            warn!(
                channel = %skipped,
                "批量通知只支持按用户 ID 推送，跳过该渠道"
            );
        }

        if !channels.contains(&NotificationChannel::Push) {
            info!("渠道集合中不含 Push，批量通知无需发送");
            return;
        }

        metrics::record_bulk_dispatch(recipient_ids.len());

        let summary = self.push_all(recipient_ids, title, message).await;
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            failed = summary.failed(),
            max_concurrency = ?self.config.max_concurrency,
            "批量通知发送完成"
        );
    }

    async fn push_all(&self, recipient_ids: &[String], title: &str, message: &str) -> DispatchSummary {
        let outcomes: Vec<bool> = match self.config.max_concurrency {
            Some(limit) => {
                stream::iter(recipient_ids)
                    .map(|user_id| self.sender.send_push(user_id, title, message, None))
                    .buffer_unordered(limit.max(1))
                    .collect()
                    .await
            }
            None => {
                join_all(
                    recipient_ids
                        .iter()
                        .map(|user_id| self.sender.send_push(user_id, title, message, None)),
                )
                .await
            }
        };

        DispatchSummary::from_outcomes(&outcomes)
    }
}
