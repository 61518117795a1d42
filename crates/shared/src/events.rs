//! 通知渠道与生命周期事件定义
//!
//! 渠道枚举同时被配置（批量默认渠道）、指标标签和发送结果使用，
//! 因此放在共享库中统一维护。

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// NotificationChannel: 通知投递渠道
// ---------------------------------------------------------------------------

/// 通知投递渠道
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum NotificationChannel {
    Sms,
    Email,
    Push,
}

impl NotificationChannel {
    /// 渠道标识，用于日志字段和指标标签
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Sms => "SMS",
            Self::Email => "EMAIL",
            Self::Push => "PUSH",
        }
    }
}

impl fmt::Display for NotificationChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotificationChannel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sms" => Ok(Self::Sms),
            "email" => Ok(Self::Email),
            "push" => Ok(Self::Push),
            other => Err(format!("未知的通知渠道: {other}")),
        }
    }
}

// ---------------------------------------------------------------------------
// LifecycleEvent: 触发通知的业务事件
// ---------------------------------------------------------------------------

/// 触发通知的物流生命周期事件
///
/// 每个事件对应一个固定的渠道组合，见 `EventNotifier`。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    ShipmentCreated,
    ShipmentAssigned,
    PickupCompleted,
    DeliveryCompleted,
    DeliveryDelayed,
    OperatorJobAvailable,
    OperatorPayment,
    AdminDispute,
    AdminRegistration,
}

impl LifecycleEvent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ShipmentCreated => "shipment_created",
            Self::ShipmentAssigned => "shipment_assigned",
            Self::PickupCompleted => "pickup_completed",
            Self::DeliveryCompleted => "delivery_completed",
            Self::DeliveryDelayed => "delivery_delayed",
            Self::OperatorJobAvailable => "operator_job_available",
            Self::OperatorPayment => "operator_payment",
            Self::AdminDispute => "admin_dispute",
            Self::AdminRegistration => "admin_registration",
        }
    }
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_channel_serialization() {
        let json = serde_json::to_string(&NotificationChannel::Push).unwrap();
        assert_eq!(json, "\"PUSH\"");

        let channels: Vec<NotificationChannel> =
            serde_json::from_str(r#"["SMS", "EMAIL", "PUSH"]"#).unwrap();
        assert_eq!(
            channels,
            vec![
                NotificationChannel::Sms,
                NotificationChannel::Email,
                NotificationChannel::Push
            ]
        );
    }

    #[test]
    fn test_channel_from_str() {
        assert_eq!("sms".parse::<NotificationChannel>(), Ok(NotificationChannel::Sms));
        assert_eq!(" Push ".parse::<NotificationChannel>(), Ok(NotificationChannel::Push));
        assert!("fax".parse::<NotificationChannel>().is_err());
    }

    #[test]
    fn test_lifecycle_event_names() {
        assert_eq!(LifecycleEvent::ShipmentCreated.as_str(), "shipment_created");
        assert_eq!(LifecycleEvent::AdminRegistration.to_string(), "admin_registration");

        let json = serde_json::to_string(&LifecycleEvent::DeliveryDelayed).unwrap();
        assert_eq!(json, "\"delivery_delayed\"");
    }
}
