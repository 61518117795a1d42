//! 物流通知分发服务
//!
//! 面向客户、司机和管理员，把物流生命周期事件转换为短信、邮件、App Push 三类通知。
//! 同一次通知内的各渠道并发发送，单个渠道失败只记录日志，不会影响其他渠道，
//! 也不会向调用方抛出。
//!
//! - `channels`：外部网关 trait 及模拟实现
//! - `sender`：单渠道发送，网关错误在此折叠为 `false`
//! - `notifier`：生命周期事件到渠道组合的映射
//! - `bulk`：按用户 ID 批量 Push
//! - `template`：`{{variable}}` 模板与按模板发送
//! - `service`：对外门面

pub mod bulk;
pub mod channels;
pub mod cli;
pub mod error;
pub mod models;
pub mod notifier;
pub mod sender;
pub mod service;
pub mod template;
pub mod types;

pub use error::{NotificationError, Result};
pub use models::{Dispute, DisputePriority, Operator, Recipient, Registration, Shipment};
pub use service::NotificationService;
pub use types::{ChannelResult, DispatchSummary, SendStatus};
