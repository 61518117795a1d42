//! CLI 模块
//!
//! 提供命令行接口，支持以下功能：
//!
//! - `demo` - 用示例运单、司机依次触发所有生命周期通知
//! - `template` - 按模板发送一次通知
//! - `bulk` - 向一组用户 ID 批量推送
//! - `templates` - 列出已注册的模板
//!
//! # 使用示例
//!
//! ```bash
//! # 演示全部事件通知
//! notification-dispatch demo
//!
//! # 模板发送
//! notification-dispatch template shipment_created -d shipment_id=S1 -d tracking_url=https://t/S1 --phone +15550100
//!
//! # 批量推送
//! notification-dispatch bulk u1,u2,u3 --title "Service notice" --message "Depot closed today"
//! ```

pub mod bootstrap;
pub mod commands;
pub mod runner;

pub use commands::{Cli, Commands};
pub use runner::CommandRunner;
