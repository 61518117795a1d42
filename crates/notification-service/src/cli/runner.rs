//! 命令执行器
//!
//! 负责把 CLI 子命令转化为通知服务调用。

use anyhow::{Result, bail};
use chrono::{Duration, Utc};
use serde_json::{Map, Value};
use tracing::info;

use notify_shared::events::NotificationChannel;

use crate::models::{Dispute, DisputePriority, Operator, Recipient, Registration, Shipment};
use crate::service::NotificationService;

/// 命令执行器
pub struct CommandRunner {
    service: NotificationService,
}

impl CommandRunner {
    pub fn new(service: NotificationService) -> Self {
        Self { service }
    }

    /// 执行 demo 命令
    ///
    /// 按运单生命周期顺序触发每一种事件通知
    pub async fn run_demo(&self) -> Result<()> {
        let shipment = sample_shipment();
        let operator = sample_operator();
        info!(shipment_id = %shipment.id, operator_id = %operator.id, "开始演示生命周期通知");

        self.service.notify_shipment_created(&shipment).await;
        self.service
            .notify_operator_job_available(
                &[operator.id.clone(), "op-2002".to_string()],
                &shipment,
            )
            .await;
        self.service
            .notify_shipment_assigned(&shipment, &operator)
            .await;
        self.service.notify_pickup_completed(&shipment).await;
        self.service
            .notify_delivery_delay(&shipment, "heavy traffic", Utc::now() + Duration::hours(2))
            .await;
        self.service.notify_delivery_completed(&shipment).await;
        self.service
            .notify_operator_payment(&operator, shipment.estimated_earnings, "PAY-2024-0001")
            .await;
        self.service
            .notify_admin_dispute(&Dispute {
                id: "DSP-1".to_string(),
                shipment_id: shipment.id.clone(),
                priority: DisputePriority::High,
            })
            .await;
        self.service
            .notify_admin_registration(&Registration::Vehicle {
                registration_number: "KA-01-AB-1234".to_string(),
            })
            .await;

        info!("生命周期通知演示完成");
        Ok(())
    }

    /// 执行 template 命令
    pub async fn run_template(
        &self,
        name: &str,
        data: Vec<(String, String)>,
        phone: Option<String>,
        email: Option<String>,
    ) -> Result<()> {
        if self.service.template_registry().get(name).is_none() {
            bail!(
                "模板 `{}` 不存在，可用模板: {}",
                name,
                self.service.template_registry().names().join(", ")
            );
        }
        let recipient = Recipient::new(phone, email);
        if recipient.contact_phone().is_none() && recipient.contact_email().is_none() {
            bail!("至少需要提供 --phone 或 --email");
        }

        let data: Map<String, Value> = data
            .into_iter()
            .map(|(key, value)| (key, Value::String(value)))
            .collect();

        self.service
            .send_template_notification(name, &Value::Object(data), &recipient)
            .await;
        Ok(())
    }

    /// 执行 bulk 命令
    pub async fn run_bulk(
        &self,
        recipient_ids: &[String],
        title: &str,
        message: &str,
        channels: &[NotificationChannel],
    ) -> Result<()> {
        let channels = (!channels.is_empty()).then_some(channels);

        self.service
            .send_bulk_notification(recipient_ids, title, message, channels)
            .await;
        Ok(())
    }

    /// 执行 templates 命令
    pub fn run_templates(&self) -> Result<()> {
        let registry = self.service.template_registry();
        for name in registry.names() {
            if let Some(template) = registry.get(name) {
                println!("{name:<24} {}", template.kind());
            }
        }
        Ok(())
    }
}

fn sample_shipment() -> Shipment {
    Shipment {
        id: "SHP-1001".to_string(),
        customer_id: "cust-501".to_string(),
        customer_name: "Alice Chen".to_string(),
        customer_phone: "+15550100".to_string(),
        customer_email: "alice@example.com".to_string(),
        pickup_address: "12 Harbour Rd, Dock 4".to_string(),
        estimated_earnings: 38.5,
    }
}

fn sample_operator() -> Operator {
    Operator {
        id: "op-2001".to_string(),
        name: "Dan Wu".to_string(),
        phone: "+15550199".to_string(),
        email: "dan@fleet.example.com".to_string(),
    }
}
