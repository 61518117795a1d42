//! 配置管理模块
//!
//! 支持多格式配置文件加载，环境变量覆盖，以及类型安全的配置访问。

use std::collections::HashMap;
use std::path::Path;

use config::{Config, Environment, File};
use serde::Deserialize;

use crate::error::{Result, SharedError};
use crate::events::NotificationChannel;
use crate::observability::ObservabilityConfig;

/// 管理员联系方式
///
/// 争议、注册审核等后台通知的接收方
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AdminConfig {
    /// 管理员邮箱
    pub email: String,
    /// 接收 Push 的管理员用户 ID
    pub user_ids: Vec<String>,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            email: "ops@logistics.local".to_string(),
            user_ids: Vec::new(),
        }
    }
}

/// 批量发送配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct BulkConfig {
    /// 最大并发发送数，为空时不限制
    pub max_concurrency: Option<usize>,
    /// 调用方未指定渠道时使用的默认渠道
    pub default_channels: Vec<NotificationChannel>,
}

impl Default for BulkConfig {
    fn default() -> Self {
        Self {
            max_concurrency: None,
            default_channels: vec![NotificationChannel::Push],
        }
    }
}

/// 分发配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    /// 模拟网关的固定延迟（毫秒）
    pub simulated_latency_ms: u64,
    /// 物流追踪链接前缀，运单号拼接在其后
    pub tracking_base_url: String,
    pub admin: AdminConfig,
    pub bulk: BulkConfig,
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            simulated_latency_ms: 100,
            tracking_base_url: "https://track.logistics.local/shipments".to_string(),
            admin: AdminConfig::default(),
            bulk: BulkConfig::default(),
        }
    }
}

impl DispatchConfig {
    /// 生成运单追踪链接
    pub fn tracking_url(&self, shipment_id: &str) -> String {
        format!(
            "{}/{}",
            self.tracking_base_url.trim_end_matches('/'),
            shipment_id
        )
    }
}

/// 邮件模板配置
#[derive(Debug, Clone, Deserialize)]
pub struct EmailTemplateConfig {
    pub subject: String,
    pub body: String,
}

/// 单个通知模板配置
///
/// 至少需要配置 sms 或 email 之一，是否合法由模板注册表在启动时校验
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TemplateConfig {
    pub sms: Option<String>,
    pub email: Option<EmailTemplateConfig>,
}

/// 应用配置
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub service_name: String,
    pub environment: String,
    pub dispatch: DispatchConfig,
    /// 按模板名覆盖或追加内置模板
    pub templates: HashMap<String, TemplateConfig>,
    pub observability: ObservabilityConfig,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            service_name: "notification-service".to_string(),
            environment: "development".to_string(),
            dispatch: DispatchConfig::default(),
            templates: HashMap::new(),
            observability: ObservabilityConfig::default(),
        }
    }
}

impl AppConfig {
    /// 从配置文件和环境变量加载配置
    ///
    /// 加载顺序（后加载的会覆盖先加载的同名配置项）：
    /// 1. config/default.toml（默认配置）
    /// 2. config/{environment}.toml（环境特定配置）
    /// 3. config/{service_name}.toml（服务特定配置）
    /// 4. 环境变量（NOTIFY_ 前缀，`__` 分隔层级，如 NOTIFY_DISPATCH__SIMULATED_LATENCY_MS）
    ///
    /// 配置文件不存在时跳过；文件格式错误或取值不合法时返回错误。
    pub fn load(service_name: &str) -> Result<Self> {
        // .env 文件不存在时忽略
        let _ = dotenvy::dotenv();

        let env = std::env::var("NOTIFY_ENV").unwrap_or_else(|_| "development".to_string());
        let config_dir = std::env::var("CONFIG_DIR").unwrap_or_else(|_| "config".to_string());

        Self::load_from(Path::new(&config_dir), &env, service_name)
    }

    /// 从指定目录加载配置，环境名由调用方给出
    pub fn load_from(config_dir: &Path, env: &str, service_name: &str) -> Result<Self> {
        let builder = Config::builder()
            .set_default("service_name", service_name)?
            .set_default("environment", env)?
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            .add_source(File::from(config_dir.join(format!("{env}.toml"))).required(false))
            .add_source(
                File::from(config_dir.join(format!("{service_name}.toml"))).required(false),
            )
            .add_source(
                Environment::with_prefix("NOTIFY")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true),
            );

        let config: Self = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 校验配置取值
    pub fn validate(&self) -> Result<()> {
        if self.dispatch.bulk.max_concurrency == Some(0) {
            return Err(SharedError::InvalidConfig {
                key: "dispatch.bulk.max_concurrency".to_string(),
                message: "必须大于 0".to_string(),
            });
        }
        if self.dispatch.admin.email.trim().is_empty() {
            return Err(SharedError::InvalidConfig {
                key: "dispatch.admin.email".to_string(),
                message: "不能为空".to_string(),
            });
        }
        Ok(())
    }

    /// 是否为生产环境
    pub fn is_production(&self) -> bool {
        self.environment == "production"
    }
}
