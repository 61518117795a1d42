//! 生命周期事件通知
//!
//! 每个物流事件对应固定的渠道组合，消息内容直接拼接，不经过模板引擎。
//! 同一事件的所有发送并发执行，全部结束后才返回；单个渠道失败只记录日志。
//!
//! | 事件 | 渠道 |
//! |------|------|
//! | 运单创建 | 客户短信、客户邮件 |
//! | 运单分配 | 客户短信、司机短信、客户邮件 |
//! | 揽收完成 | 客户短信、客户 Push |
//! | 签收完成 | 客户短信、客户邮件、客户 Push |
//! | 配送延误 | 客户短信、客户邮件、客户 Push |
//! | 新任务可接 | 每个司机 Push |
//! | 司机结算 | 司机短信、司机邮件、司机 Push |
//! | 争议 / 注册审核 | 管理员邮件、每个管理员 Push |

use chrono::{DateTime, Utc};
use futures::FutureExt;
use futures::future::BoxFuture;
use serde_json::json;
use tracing::{info, instrument, warn};

use notify_shared::config::DispatchConfig;
use notify_shared::events::LifecycleEvent;
use notify_shared::observability::metrics;

use crate::models::{Dispute, Operator, Registration, Shipment};
use crate::sender::{ChannelSender, settle_all};
use crate::types::DispatchSummary;

/// ETA 展示格式
const ETA_FORMAT: &str = "%Y-%m-%d %H:%M UTC";

/// 生命周期事件通知器
///
/// 无状态，重复调用会重复发送
#[derive(Clone)]
pub struct EventNotifier {
    sender: ChannelSender,
    dispatch: DispatchConfig,
}

impl EventNotifier {
    pub fn new(sender: ChannelSender, dispatch: DispatchConfig) -> Self {
        Self { sender, dispatch }
    }

    /// 运单创建：客户短信 + 邮件
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id))]
    pub async fn notify_shipment_created(&self, shipment: &Shipment) {
        let tracking_url = self.dispatch.tracking_url(&shipment.id);
        let sms = format!(
            "Your shipment {} has been created. Track it here: {}",
            shipment.id, tracking_url
        );
        let subject = format!("Shipment Created - {}", shipment.id);
        let body = format!(
            "Hi {},\n\nYour shipment {} has been created and is awaiting pickup from {}.\nTrack it here: {}\n\nThank you for shipping with us.",
            shipment.customer_name, shipment.id, shipment.pickup_address, tracking_url
        );

        let sends = vec![
            self.sender.send_sms(&shipment.customer_phone, &sms).boxed(),
            self.sender
                .send_email(
                    &shipment.customer_email,
                    &subject,
                    &body,
                    Some(LifecycleEvent::ShipmentCreated.as_str()),
                )
                .boxed(),
        ];

        self.dispatch_event(LifecycleEvent::ShipmentCreated, sends)
            .await;
    }

    /// 运单分配：客户短信 + 司机短信 + 客户邮件
    #[instrument(skip(self, shipment, operator), fields(shipment_id = %shipment.id, operator_id = %operator.id))]
    pub async fn notify_shipment_assigned(&self, shipment: &Shipment, operator: &Operator) {
        let customer_sms = format!(
            "Your shipment {} has been assigned to {}. Contact: {}",
            shipment.id, operator.name, operator.phone
        );
        let operator_sms = format!(
            "New job assigned: shipment {}. Pickup at {}. Customer: {} ({})",
            shipment.id, shipment.pickup_address, shipment.customer_name, shipment.customer_phone
        );
        let subject = format!("Shipment Assigned - {}", shipment.id);
        let body = format!(
            "Hi {},\n\nYour shipment {} has been assigned to {}.\nYou can reach them at {}.\nTrack it here: {}",
            shipment.customer_name,
            shipment.id,
            operator.name,
            operator.phone,
            self.dispatch.tracking_url(&shipment.id)
        );

        let sends = vec![
            self.sender
                .send_sms(&shipment.customer_phone, &customer_sms)
                .boxed(),
            self.sender.send_sms(&operator.phone, &operator_sms).boxed(),
            self.sender
                .send_email(
                    &shipment.customer_email,
                    &subject,
                    &body,
                    Some(LifecycleEvent::ShipmentAssigned.as_str()),
                )
                .boxed(),
        ];

        self.dispatch_event(LifecycleEvent::ShipmentAssigned, sends)
            .await;
    }

    /// 揽收完成：客户短信 + Push
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id))]
    pub async fn notify_pickup_completed(&self, shipment: &Shipment) {
        let sms = format!(
            "Your shipment {} has been picked up and is on its way. Track it here: {}",
            shipment.id,
            self.dispatch.tracking_url(&shipment.id)
        );
        let title = "Shipment Picked Up";
        let body = format!("Your shipment {} has been picked up.", shipment.id);
        let data = json!({
            "type": LifecycleEvent::PickupCompleted.as_str(),
            "shipmentId": shipment.id,
        });

        let sends = vec![
            self.sender.send_sms(&shipment.customer_phone, &sms).boxed(),
            self.sender
                .send_push(&shipment.customer_id, title, &body, Some(data))
                .boxed(),
        ];

        self.dispatch_event(LifecycleEvent::PickupCompleted, sends)
            .await;
    }

    /// 签收完成：客户短信 + 邮件 + Push
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id))]
    pub async fn notify_delivery_completed(&self, shipment: &Shipment) {
        let sms = format!(
            "Your shipment {} has been delivered. Thank you for shipping with us!",
            shipment.id
        );
        let subject = format!("Shipment Delivered - {}", shipment.id);
        let body = format!(
            "Hi {},\n\nYour shipment {} has been delivered.\n\nThank you for shipping with us.",
            shipment.customer_name, shipment.id
        );
        let title = "Shipment Delivered";
        let push_body = format!("Your shipment {} has been delivered.", shipment.id);
        let data = json!({
            "type": LifecycleEvent::DeliveryCompleted.as_str(),
            "shipmentId": shipment.id,
        });

        let sends = vec![
            self.sender.send_sms(&shipment.customer_phone, &sms).boxed(),
            self.sender
                .send_email(
                    &shipment.customer_email,
                    &subject,
                    &body,
                    Some(LifecycleEvent::DeliveryCompleted.as_str()),
                )
                .boxed(),
            self.sender
                .send_push(&shipment.customer_id, title, &push_body, Some(data))
                .boxed(),
        ];

        self.dispatch_event(LifecycleEvent::DeliveryCompleted, sends)
            .await;
    }

    /// 配送延误：客户短信 + 邮件 + Push，附带原因和新的预计送达时间
    #[instrument(skip(self, shipment), fields(shipment_id = %shipment.id))]
    pub async fn notify_delivery_delay(
        &self,
        shipment: &Shipment,
        reason: &str,
        new_eta: DateTime<Utc>,
    ) {
        let eta = new_eta.format(ETA_FORMAT).to_string();
        let sms = format!(
            "Your shipment {} is delayed: {}. New estimated delivery: {}",
            shipment.id, reason, eta
        );
        let subject = format!("Delivery Delayed - {}", shipment.id);
        let body = format!(
            "Hi {},\n\nWe're sorry, your shipment {} is delayed.\nReason: {}\nNew estimated delivery: {}\n\nTrack it here: {}",
            shipment.customer_name,
            shipment.id,
            reason,
            eta,
            self.dispatch.tracking_url(&shipment.id)
        );
        let title = "Delivery Delayed";
        let push_body = format!("Shipment {} is delayed. New ETA: {}", shipment.id, eta);
        let data = json!({
            "type": LifecycleEvent::DeliveryDelayed.as_str(),
            "shipmentId": shipment.id,
            "newEta": new_eta.to_rfc3339(),
        });

        let sends = vec![
            self.sender.send_sms(&shipment.customer_phone, &sms).boxed(),
            self.sender
                .send_email(
                    &shipment.customer_email,
                    &subject,
                    &body,
                    Some(LifecycleEvent::DeliveryDelayed.as_str()),
                )
                .boxed(),
            self.sender
                .send_push(&shipment.customer_id, title, &push_body, Some(data))
                .boxed(),
        ];

        self.dispatch_event(LifecycleEvent::DeliveryDelayed, sends)
            .await;
    }

    /// 新任务可接：向每个司机发 Push
    #[instrument(skip(self, operator_ids, shipment), fields(shipment_id = %shipment.id, operators = operator_ids.len()))]
    pub async fn notify_operator_job_available(&self, operator_ids: &[String], shipment: &Shipment) {
        if operator_ids.is_empty() {
            warn!("没有可通知的司机");
        }

        let title = "New Job Available";
        let body = format!(
            "New job near {}. Estimated earnings: {:.2}",
            shipment.pickup_address, shipment.estimated_earnings
        );
        let data = json!({
            "type": LifecycleEvent::OperatorJobAvailable.as_str(),
            "shipmentId": shipment.id,
        });

        let sends: Vec<BoxFuture<'_, bool>> = operator_ids
            .iter()
            .map(|operator_id| {
                self.sender
                    .send_push(operator_id, title, &body, Some(data.clone()))
                    .boxed()
            })
            .collect();

        self.dispatch_event(LifecycleEvent::OperatorJobAvailable, sends)
            .await;
    }

    /// 司机结算：司机短信 + 邮件 + Push
    #[instrument(skip(self, operator), fields(operator_id = %operator.id))]
    pub async fn notify_operator_payment(&self, operator: &Operator, amount: f64, reference: &str) {
        let sms = format!(
            "Payment of {:.2} has been sent to your account. Reference: {}",
            amount, reference
        );
        let subject = format!("Payment Sent - {}", reference);
        let body = format!(
            "Hi {},\n\nA payment of {:.2} has been sent to your account.\nReference: {}",
            operator.name, amount, reference
        );
        let title = "Payment Sent";
        let push_body = format!("You received a payment of {:.2}.", amount);
        let data = json!({
            "type": LifecycleEvent::OperatorPayment.as_str(),
            "reference": reference,
            "amount": amount,
        });

        let sends = vec![
            self.sender.send_sms(&operator.phone, &sms).boxed(),
            self.sender
                .send_email(
                    &operator.email,
                    &subject,
                    &body,
                    Some(LifecycleEvent::OperatorPayment.as_str()),
                )
                .boxed(),
            self.sender
                .send_push(&operator.id, title, &push_body, Some(data))
                .boxed(),
        ];

        self.dispatch_event(LifecycleEvent::OperatorPayment, sends)
            .await;
    }

    /// 运单争议：管理员邮件 + 每个管理员 Push
    #[instrument(skip(self, dispute), fields(dispute_id = %dispute.id, priority = %dispute.priority))]
    pub async fn notify_admin_dispute(&self, dispute: &Dispute) {
        let subject = format!(
            "[{}] New Dispute - {}",
            dispute.priority.as_str().to_uppercase(),
            dispute.id
        );
        let body = format!(
            "A new dispute {} was opened for shipment {}.\nPriority: {}",
            dispute.id, dispute.shipment_id, dispute.priority
        );
        let title = "New Dispute";
        let push_body = format!(
            "Dispute {} ({}) on shipment {}",
            dispute.id, dispute.priority, dispute.shipment_id
        );
        let data = json!({
            "type": LifecycleEvent::AdminDispute.as_str(),
            "disputeId": dispute.id,
            "shipmentId": dispute.shipment_id,
        });

        self.notify_admins(
            LifecycleEvent::AdminDispute,
            &subject,
            &body,
            title,
            &push_body,
            data,
        )
        .await;
    }

    /// 注册审核：管理员邮件 + 每个管理员 Push
    #[instrument(skip(self, registration), fields(kind = registration.kind()))]
    pub async fn notify_admin_registration(&self, registration: &Registration) {
        let subject = format!(
            "New {} Registration - {}",
            capitalize(registration.kind()),
            registration.label()
        );
        let body = format!(
            "A new {} registration is awaiting review: {}",
            registration.kind(),
            registration.label()
        );
        let title = "New Registration";
        let push_body = format!(
            "{} registration pending: {}",
            capitalize(registration.kind()),
            registration.label()
        );
        let data = json!({
            "type": LifecycleEvent::AdminRegistration.as_str(),
            "registration": registration,
        });

        self.notify_admins(
            LifecycleEvent::AdminRegistration,
            &subject,
            &body,
            title,
            &push_body,
            data,
        )
        .await;
    }

    async fn notify_admins(
        &self,
        event: LifecycleEvent,
        subject: &str,
        body: &str,
        title: &str,
        push_body: &str,
        data: serde_json::Value,
    ) {
        let admin = &self.dispatch.admin;

        let mut sends: Vec<BoxFuture<'_, bool>> = Vec::with_capacity(admin.user_ids.len() + 1);
        sends.push(
            self.sender
                .send_email(&admin.email, subject, body, Some(event.as_str()))
                .boxed(),
        );
        for user_id in &admin.user_ids {
            sends.push(
                self.sender
                    .send_push(user_id, title, push_body, Some(data.clone()))
                    .boxed(),
            );
        }

        self.dispatch_event(event, sends).await;
    }

    /// 并发执行并记录汇总
    async fn dispatch_event(
        &self,
        event: LifecycleEvent,
        sends: Vec<BoxFuture<'_, bool>>,
    ) -> DispatchSummary {
        let summary = settle_all(sends).await;
        metrics::record_event_dispatch(event);

        if summary.all_succeeded() {
            info!(
                event = %event,
                total = summary.total,
                succeeded = summary.succeeded,
                "事件通知发送完成"
            );
        } else {
            warn!(
                event = %event,
                total = summary.total,
                succeeded = summary.succeeded,
                failed = summary.failed(),
                "事件通知部分渠道发送失败"
            );
        }
        summary
    }
}

fn capitalize(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use chrono::TimeZone;

    use super::*;
    use crate::channels::{
        EmailMessage, Gateways, MockEmailGateway, MockPushGateway, MockSmsGateway, PushMessage,
        SmsMessage,
    };
    use crate::error::NotificationError;
    use crate::models::DisputePriority;
    use notify_shared::config::AdminConfig;
    use notify_shared::events::NotificationChannel;

    fn shipment() -> Shipment {
        Shipment {
            id: "S1".to_string(),
            customer_id: "cust-1".to_string(),
            customer_name: "Alice".to_string(),
            customer_phone: "+1".to_string(),
            customer_email: "a@b.com".to_string(),
            pickup_address: "1 Dock Rd".to_string(),
            estimated_earnings: 42.5,
        }
    }

    fn operator() -> Operator {
        Operator {
            id: "op-1".to_string(),
            name: "Dan".to_string(),
            phone: "+2".to_string(),
            email: "dan@fleet.com".to_string(),
        }
    }

    fn notifier_with(
        sms: MockSmsGateway,
        email: MockEmailGateway,
        push: MockPushGateway,
    ) -> EventNotifier {
        let dispatch = DispatchConfig {
            tracking_base_url: "https://t.example/".to_string(),
            admin: AdminConfig {
                email: "ops@example.com".to_string(),
                user_ids: vec!["admin-1".to_string(), "admin-2".to_string()],
            },
            ..DispatchConfig::default()
        };
        let gateways = Gateways::new(Arc::new(sms), Arc::new(email), Arc::new(push));
        EventNotifier::new(ChannelSender::new(gateways), dispatch)
    }

    #[tokio::test]
    async fn test_shipment_created_sends_sms_and_email() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .withf(|m: &SmsMessage| {
                m.to == "+1" && m.body.contains("S1") && m.body.contains("https://t.example/S1")
            })
            .times(1)
            .returning(|_| Ok("sms_1".to_string()));
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| {
                m.to == "a@b.com"
                    && m.subject.contains("Shipment Created")
                    && m.body.contains("Alice")
            })
            .times(1)
            .returning(|_| Ok("email_1".to_string()));

        let notifier = notifier_with(sms, email, MockPushGateway::new());
        notifier.notify_shipment_created(&shipment()).await;
    }

    #[tokio::test]
    async fn test_notifier_called_twice_sends_twice() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .times(2)
            .returning(|_| Ok("sms_1".to_string()));
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .times(2)
            .returning(|_| Ok("email_1".to_string()));

        let notifier = notifier_with(sms, email, MockPushGateway::new());
        notifier.notify_shipment_created(&shipment()).await;
        notifier.notify_shipment_created(&shipment()).await;
    }

    #[tokio::test]
    async fn test_shipment_assigned_notifies_customer_and_operator() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .withf(|m: &SmsMessage| m.to == "+1" && m.body.contains("Dan"))
            .times(1)
            .returning(|_| Ok("sms_c".to_string()));
        sms.expect_send()
            .withf(|m: &SmsMessage| m.to == "+2" && m.body.contains("1 Dock Rd"))
            .times(1)
            .returning(|_| Ok("sms_o".to_string()));
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.to == "a@b.com")
            .times(1)
            .returning(|_| Ok("email_1".to_string()));

        let notifier = notifier_with(sms, email, MockPushGateway::new());
        notifier
            .notify_shipment_assigned(&shipment(), &operator())
            .await;
    }

    #[tokio::test]
    async fn test_pickup_completed_sms_and_push() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .times(1)
            .returning(|_| Ok("sms_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send()
            .withf(|m: &PushMessage| {
                m.user_id == "cust-1"
                    && m.data.as_ref().and_then(|d| d.get("shipmentId"))
                        == Some(&serde_json::json!("S1"))
            })
            .times(1)
            .returning(|_| Ok("push_1".to_string()));

        let notifier = notifier_with(sms, MockEmailGateway::new(), push);
        notifier.notify_pickup_completed(&shipment()).await;
    }

    #[tokio::test]
    async fn test_delivery_completed_tolerates_failures() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send().times(1).returning(|_| {
            Err(NotificationError::SendFailed {
                channel: NotificationChannel::Sms,
                reason: "carrier rejected".to_string(),
            })
        });
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .times(1)
            .returning(|_| Ok("email_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send().times(1).returning(|_| {
            Err(NotificationError::ExternalServiceTimeout {
                service: "fcm".to_string(),
            })
        });

        let notifier = notifier_with(sms, email, push);
        notifier.notify_delivery_completed(&shipment()).await;
    }

    #[tokio::test]
    async fn test_delivery_delay_includes_reason_and_eta() {
        let eta = Utc.with_ymd_and_hms(2026, 3, 1, 14, 30, 0).unwrap();

        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .withf(|m: &SmsMessage| {
                m.body.contains("road closure") && m.body.contains("2026-03-01 14:30 UTC")
            })
            .times(1)
            .returning(|_| Ok("sms_1".to_string()));
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.body.contains("Reason: road closure"))
            .times(1)
            .returning(|_| Ok("email_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send()
            .times(1)
            .returning(|_| Ok("push_1".to_string()));

        let notifier = notifier_with(sms, email, push);
        notifier
            .notify_delivery_delay(&shipment(), "road closure", eta)
            .await;
    }

    #[tokio::test]
    async fn test_operator_job_available_pushes_each_operator() {
        let mut push = MockPushGateway::new();
        push.expect_send()
            .withf(|m: &PushMessage| m.body.contains("42.50"))
            .times(3)
            .returning(|m| Ok(format!("push_{}", m.user_id)));

        let notifier = notifier_with(MockSmsGateway::new(), MockEmailGateway::new(), push);
        let ids = vec!["op-1".to_string(), "op-2".to_string(), "op-3".to_string()];
        notifier
            .notify_operator_job_available(&ids, &shipment())
            .await;
    }

    #[tokio::test]
    async fn test_operator_job_available_empty_list() {
        let notifier = notifier_with(
            MockSmsGateway::new(),
            MockEmailGateway::new(),
            MockPushGateway::new(),
        );
        notifier
            .notify_operator_job_available(&[], &shipment())
            .await;
    }

    #[tokio::test]
    async fn test_operator_payment_all_channels() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .withf(|m: &SmsMessage| m.to == "+2" && m.body.contains("120.00"))
            .times(1)
            .returning(|_| Ok("sms_1".to_string()));
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.to == "dan@fleet.com" && m.subject.contains("PAY-9"))
            .times(1)
            .returning(|_| Ok("email_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send()
            .withf(|m: &PushMessage| m.user_id == "op-1")
            .times(1)
            .returning(|_| Ok("push_1".to_string()));

        let notifier = notifier_with(sms, email, push);
        notifier
            .notify_operator_payment(&operator(), 120.0, "PAY-9")
            .await;
    }

    #[tokio::test]
    async fn test_admin_dispute_email_and_admin_pushes() {
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.to == "ops@example.com" && m.subject.starts_with("[HIGH]"))
            .times(1)
            .returning(|_| Ok("email_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send()
            .withf(|m: &PushMessage| m.user_id.starts_with("admin-"))
            .times(2)
            .returning(|_| Ok("push_1".to_string()));

        let notifier = notifier_with(MockSmsGateway::new(), email, push);
        let dispute = Dispute {
            id: "D1".to_string(),
            shipment_id: "S1".to_string(),
            priority: DisputePriority::High,
        };
        notifier.notify_admin_dispute(&dispute).await;
    }

    #[tokio::test]
    async fn test_admin_dispute_without_admin_users_sends_email_only() {
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.to == "ops@example.com")
            .times(1)
            .returning(|_| Ok("email_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send().times(0);

        let dispatch = DispatchConfig {
            admin: AdminConfig {
                email: "ops@example.com".to_string(),
                user_ids: vec![],
            },
            ..DispatchConfig::default()
        };
        let gateways = Gateways::new(
            Arc::new(MockSmsGateway::new()),
            Arc::new(email),
            Arc::new(push),
        );
        let notifier = EventNotifier::new(ChannelSender::new(gateways), dispatch);
        let dispute = Dispute {
            id: "D2".to_string(),
            shipment_id: "S2".to_string(),
            priority: DisputePriority::Low,
        };
        notifier.notify_admin_dispute(&dispute).await;
    }

    #[tokio::test]
    async fn test_admin_registration_vehicle() {
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.subject == "New Vehicle Registration - KX-123")
            .times(1)
            .returning(|_| Ok("email_1".to_string()));
        let mut push = MockPushGateway::new();
        push.expect_send()
            .times(2)
            .returning(|_| Ok("push_1".to_string()));

        let notifier = notifier_with(MockSmsGateway::new(), email, push);
        let registration = Registration::Vehicle {
            registration_number: "KX-123".to_string(),
        };
        notifier.notify_admin_registration(&registration).await;
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("company"), "Company");
        assert_eq!(capitalize(""), "");
    }
}
