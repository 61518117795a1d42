//! 领域模型定义
//!
//! 所有模型都是调用方按值传入的瞬时数据，通知服务不会保存或回写。

use std::fmt;

use serde::{Deserialize, Serialize};

/// 运单
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Shipment {
    pub id: String,
    pub customer_id: String,
    pub customer_name: String,
    pub customer_phone: String,
    pub customer_email: String,
    pub pickup_address: String,
    /// 司机预计收入
    pub estimated_earnings: f64,
}

/// 司机 / 承运人
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Operator {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub email: String,
}

/// 争议优先级
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DisputePriority {
    Low,
    Medium,
    High,
    Urgent,
}

impl DisputePriority {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Urgent => "urgent",
        }
    }
}

impl fmt::Display for DisputePriority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// 运单争议
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Dispute {
    pub id: String,
    pub shipment_id: String,
    pub priority: DisputePriority,
}

/// 待审核的注册申请
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Registration {
    /// 企业注册
    Company { name: String },
    /// 车辆注册
    #[serde(rename_all = "camelCase")]
    Vehicle { registration_number: String },
}

impl Registration {
    /// 注册类型名，用于消息正文
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Company { .. } => "company",
            Self::Vehicle { .. } => "vehicle",
        }
    }

    /// 企业名称或车牌号
    pub fn label(&self) -> &str {
        match self {
            Self::Company { name } => name,
            Self::Vehicle {
                registration_number,
            } => registration_number,
        }
    }
}

/// 模板通知的接收人
///
/// 手机号和邮箱均可缺省，缺省的渠道不会发送
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recipient {
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl Recipient {
    pub fn new(phone: Option<String>, email: Option<String>) -> Self {
        Self { phone, email }
    }

    /// 仅有手机号的接收人
    pub fn with_phone(phone: impl Into<String>) -> Self {
        Self {
            phone: Some(phone.into()),
            email: None,
        }
    }

    /// 仅有邮箱的接收人
    pub fn with_email(email: impl Into<String>) -> Self {
        Self {
            phone: None,
            email: Some(email.into()),
        }
    }

    /// 追加邮箱
    pub fn and_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// 可用的手机号，空白视为未提供
    pub fn contact_phone(&self) -> Option<&str> {
        non_blank(self.phone.as_deref())
    }

    /// 可用的邮箱，空白视为未提供
    pub fn contact_email(&self) -> Option<&str> {
        non_blank(self.email.as_deref())
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}
