//! CLI 命令定义
//!
//! 使用 clap derive 宏定义命令行接口结构。

use clap::{Parser, Subcommand};

use notify_shared::events::NotificationChannel;

/// 通知分发命令行工具
///
/// 使用模拟网关演示各类通知，使用 `--help` 查看各子命令的详细说明。
#[derive(Parser, Debug)]
#[command(name = "notification-dispatch")]
#[command(version, about = "物流通知分发工具")]
#[command(propagate_version = true)]
pub struct Cli {
    /// 日志级别 (trace, debug, info, warn, error)，不指定时使用配置文件
    #[arg(short, long, global = true)]
    pub log_level: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// 子命令枚举
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// 用示例数据依次触发所有生命周期事件通知
    Demo,

    /// 按模板发送通知
    ///
    /// 接收人至少提供手机号或邮箱之一，缺省的渠道不会发送。
    Template {
        /// 模板名称
        name: String,

        /// 模板变量，格式 key=value，可重复
        #[arg(short, long = "data", value_parser = parse_key_val)]
        data: Vec<(String, String)>,

        /// 接收人手机号
        #[arg(long)]
        phone: Option<String>,

        /// 接收人邮箱
        #[arg(long)]
        email: Option<String>,
    },

    /// 向一组用户 ID 批量推送
    Bulk {
        /// 用户 ID，逗号分隔
        #[arg(value_delimiter = ',', required = true)]
        recipient_ids: Vec<String>,

        /// 通知标题
        #[arg(short, long)]
        title: String,

        /// 通知内容
        #[arg(short, long)]
        message: String,

        /// 渠道（sms, email, push），逗号分隔；不指定时使用配置中的默认渠道
        #[arg(short, long, value_delimiter = ',')]
        channels: Vec<NotificationChannel>,
    },

    /// 列出已注册的通知模板
    Templates,
}

/// 解析 key=value 形式的参数
fn parse_key_val(s: &str) -> Result<(String, String), String> {
    let (key, value) = s
        .split_once('=')
        .ok_or_else(|| format!("无效的 key=value: 缺少 '=' in `{s}`"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(format!("无效的 key=value: key 为空 in `{s}`"));
    }
    Ok((key.to_string(), value.to_string()))
}
