//! 通知服务门面
//!
//! 组合根持有一个 `NotificationService` 实例，所有通知能力都从这里调用。
//! 三个渠道网关由调用方注入，不存在进程级单例。

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use serde_json::Value;
use tracing::info;

use notify_shared::config::AppConfig;
use notify_shared::events::NotificationChannel;

use crate::bulk::BulkDispatcher;
use crate::channels::Gateways;
use crate::error::Result;
use crate::models::{Dispute, Operator, Recipient, Registration, Shipment};
use crate::notifier::EventNotifier;
use crate::sender::ChannelSender;
use crate::template::{TemplateDispatcher, TemplateRegistry};
use crate::types::ChannelResult;

/// 通知服务
#[derive(Clone)]
pub struct NotificationService {
    sender: ChannelSender,
    notifier: EventNotifier,
    bulk: BulkDispatcher,
    templates: TemplateDispatcher,
}

impl NotificationService {
    /// 使用注入的网关创建服务
    ///
    /// 模板注册表由内置模板加配置覆盖构建，配置中的模板不合法时返回错误
    pub fn new(gateways: Gateways, config: &AppConfig) -> Result<Self> {
        let registry = TemplateRegistry::from_config(&config.templates)?;
        let sender = ChannelSender::new(gateways);

        info!(
            templates = registry.len(),
            admin_push_targets = config.dispatch.admin.user_ids.len(),
            bulk_max_concurrency = ?config.dispatch.bulk.max_concurrency,
            "通知服务已创建"
        );

        Ok(Self {
            notifier: EventNotifier::new(sender.clone(), config.dispatch.clone()),
            bulk: BulkDispatcher::new(sender.clone(), config.dispatch.bulk.clone()),
            templates: TemplateDispatcher::new(sender.clone(), Arc::new(registry)),
            sender,
        })
    }

    /// 使用模拟网关创建服务
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let latency = Duration::from_millis(config.dispatch.simulated_latency_ms);
        Self::new(Gateways::simulated(latency), config)
    }

    pub fn template_registry(&self) -> &TemplateRegistry {
        self.templates.registry()
    }

    // ==================== 单渠道发送 ====================

    pub async fn send_sms(&self, to: &str, message: &str) -> bool {
        self.sender.send_sms(to, message).await
    }

    pub async fn send_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        template: Option<&str>,
    ) -> bool {
        self.sender.send_email(to, subject, body, template).await
    }

    pub async fn send_push(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> bool {
        self.sender.send_push(user_id, title, body, data).await
    }

    pub async fn deliver_sms(&self, to: &str, message: &str) -> ChannelResult {
        self.sender.deliver_sms(to, message).await
    }

    pub async fn deliver_email(
        &self,
        to: &str,
        subject: &str,
        body: &str,
        template: Option<&str>,
    ) -> ChannelResult {
        self.sender.deliver_email(to, subject, body, template).await
    }

    pub async fn deliver_push(
        &self,
        user_id: &str,
        title: &str,
        body: &str,
        data: Option<Value>,
    ) -> ChannelResult {
        self.sender.deliver_push(user_id, title, body, data).await
    }

    // ==================== 生命周期事件 ====================

    pub async fn notify_shipment_created(&self, shipment: &Shipment) {
        self.notifier.notify_shipment_created(shipment).await
    }

    pub async fn notify_shipment_assigned(&self, shipment: &Shipment, operator: &Operator) {
        self.notifier
            .notify_shipment_assigned(shipment, operator)
            .await
    }

    pub async fn notify_pickup_completed(&self, shipment: &Shipment) {
        self.notifier.notify_pickup_completed(shipment).await
    }

    pub async fn notify_delivery_completed(&self, shipment: &Shipment) {
        self.notifier.notify_delivery_completed(shipment).await
    }

    pub async fn notify_delivery_delay(
        &self,
        shipment: &Shipment,
        reason: &str,
        new_eta: DateTime<Utc>,
    ) {
        self.notifier
            .notify_delivery_delay(shipment, reason, new_eta)
            .await
    }

    pub async fn notify_operator_job_available(&self, operator_ids: &[String], shipment: &Shipment) {
        self.notifier
            .notify_operator_job_available(operator_ids, shipment)
            .await
    }

    pub async fn notify_operator_payment(&self, operator: &Operator, amount: f64, reference: &str) {
        self.notifier
            .notify_operator_payment(operator, amount, reference)
            .await
    }

    pub async fn notify_admin_dispute(&self, dispute: &Dispute) {
        self.notifier.notify_admin_dispute(dispute).await
    }

    pub async fn notify_admin_registration(&self, registration: &Registration) {
        self.notifier.notify_admin_registration(registration).await
    }

    // ==================== 批量与模板 ====================

    pub async fn send_bulk_notification(
        &self,
        recipient_ids: &[String],
        title: &str,
        message: &str,
        channels: Option<&[NotificationChannel]>,
    ) {
        self.bulk
            .send_bulk_notification(recipient_ids, title, message, channels)
            .await
    }

    pub async fn send_template_notification(
        &self,
        template_name: &str,
        data: &Value,
        recipient: &Recipient,
    ) {
        self.templates
            .send_template_notification(template_name, data, recipient)
            .await
    }
}
