//! 启动装配
//!
//! 加载配置并构建通知服务。配置文件不存在时使用默认值，
//! 但格式错误、取值不合法或模板无效都会让启动失败。

use std::path::Path;

use anyhow::{Context, Result};

use notify_shared::config::AppConfig;

use crate::service::NotificationService;

/// 服务名，决定 config/{service_name}.toml 的文件名
pub const SERVICE_NAME: &str = "notification-service";

/// 按环境变量（CONFIG_DIR、NOTIFY_ENV）定位配置并加载
pub fn load_config() -> Result<AppConfig> {
    AppConfig::load(SERVICE_NAME).context("加载配置失败")
}

/// 从指定目录加载配置
pub fn load_config_from(config_dir: &Path, environment: &str) -> Result<AppConfig> {
    AppConfig::load_from(config_dir, environment, SERVICE_NAME)
        .with_context(|| format!("加载配置失败: {}", config_dir.display()))
}

/// 使用模拟网关构建通知服务
pub fn build_service(config: &AppConfig) -> Result<NotificationService> {
    NotificationService::from_config(config).context("通知服务初始化失败")
}
