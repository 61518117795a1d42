//! Prometheus 指标模块
//!
//! 基于 metrics crate 和 metrics-exporter-prometheus 实现指标收集与导出。
//! 未安装 recorder 时所有记录函数都是空操作，单元测试无需额外准备。

use std::net::SocketAddr;

use metrics_exporter_prometheus::PrometheusBuilder;
use tracing::info;

use super::ObservabilityConfig;
use crate::error::{Result, SharedError};
use crate::events::{LifecycleEvent, NotificationChannel};

/// Metrics 资源守卫
///
/// 导出器的 HTTP 监听任务由 metrics-exporter-prometheus 在运行时内托管
pub struct MetricsHandle {
    pub addr: SocketAddr,
}

/// 初始化 Prometheus 指标导出
///
/// 在指定端口暴露 `/metrics` 端点。
pub fn init(config: &ObservabilityConfig) -> Result<MetricsHandle> {
    let addr = SocketAddr::from(([0, 0, 0, 0], config.metrics_port));

    PrometheusBuilder::new()
        .with_http_listener(addr)
        .install()
        .map_err(|e| SharedError::Metrics(e.to_string()))?;

    register_common_metrics(&config.service_name);
    info!("Metrics exporter listening on {}", addr);

    Ok(MetricsHandle { addr })
}

/// 注册通用指标描述
fn register_common_metrics(service_name: &str) {
    metrics::describe_counter!(
        "notification_channel_sends_total",
        "Total number of channel send attempts"
    );
    metrics::describe_histogram!(
        "notification_channel_send_duration_seconds",
        "Channel send duration in seconds"
    );
    metrics::describe_counter!(
        "notification_events_total",
        "Total number of lifecycle event notifications dispatched"
    );
    metrics::describe_counter!(
        "notification_bulk_recipients_total",
        "Total number of recipients targeted by bulk dispatch"
    );
    metrics::describe_counter!(
        "notification_template_dispatch_total",
        "Total number of template dispatch requests"
    );

    metrics::counter!("service_starts_total", "service" => service_name.to_string()).increment(1);
}

// ============================================================================
// 便捷的指标记录函数
// ============================================================================

/// 记录单次渠道发送
#[inline]
pub fn record_channel_send(channel: NotificationChannel, success: bool, duration_secs: f64) {
    let status = if success { "success" } else { "failed" };
    metrics::counter!(
        "notification_channel_sends_total",
        "channel" => channel.as_str(),
        "status" => status
    )
    .increment(1);

    metrics::histogram!(
        "notification_channel_send_duration_seconds",
        "channel" => channel.as_str()
    )
    .record(duration_secs);
}

/// 记录生命周期事件通知
#[inline]
pub fn record_event_dispatch(event: LifecycleEvent) {
    metrics::counter!("notification_events_total", "event" => event.as_str()).increment(1);
}

/// 记录批量发送的接收人数
#[inline]
pub fn record_bulk_dispatch(recipients: usize) {
    metrics::counter!("notification_bulk_recipients_total").increment(recipients as u64);
}

/// 记录模板发送请求
#[inline]
pub fn record_template_dispatch(template: &str, found: bool) {
    metrics::counter!(
        "notification_template_dispatch_total",
        "template" => template_label(template, found),
        "found" => if found { "true" } else { "false" }
    )
    .increment(1);
}

/// 未注册的模板名来自调用方，统一归为 "unknown"，避免标签基数无限增长
fn template_label(template: &str, found: bool) -> String {
    if found {
        template.to_string()
    } else {
        "unknown".to_string()
    }
}
