//! 通知模板
//!
//! 提供 `{{variable}}` 占位符替换、只读模板注册表以及按模板发送的分发器。
//!
//! ## 使用示例
//!
//! ```ignore
//! let data = serde_json::json!({"shipment_id": "S1", "tracking_url": "https://t/S1"});
//! let sms = TemplateEngine::render("Shipment {{shipment_id}}: {{tracking_url}}", &data);
//! // 输出: "Shipment S1: https://t/S1"
//! ```

use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, LazyLock};

use futures::FutureExt;
use futures::future::BoxFuture;
use regex::{Captures, Regex};
use serde_json::Value;
use tracing::{debug, info, instrument, warn};

use notify_shared::config::TemplateConfig;
use notify_shared::observability::metrics;

use crate::error::{NotificationError, Result};
use crate::models::Recipient;
use crate::sender::{ChannelSender, settle_all};

/// 匹配 `{{variable_name}}`，变量名只允许 ASCII 字母、数字、下划线
static PLACEHOLDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{([A-Za-z0-9_]+)\}\}").unwrap());

// ---------------------------------------------------------------------------
// 占位符替换
// ---------------------------------------------------------------------------

/// 模板引擎
pub struct TemplateEngine;

impl TemplateEngine {
    /// 渲染模板
    ///
    /// 从左到右单遍扫描，`{{key}}` 替换为 `data[key]` 的字符串形式；
    /// 替换后的值不会再被扫描。缺失（或为 null）的变量保留原样。
    pub fn render(template: &str, data: &Value) -> String {
        PLACEHOLDER
            .replace_all(template, |caps: &Captures| {
                let var_name = &caps[1];
                match lookup(data, var_name) {
                    Some(value) => value,
                    None => {
                        debug!(variable = var_name, "模板变量未找到，保留原样");
                        caps[0].to_string()
                    }
                }
            })
            .into_owned()
    }

    /// 提取模板中的所有变量名（按出现顺序，可重复）
    pub fn extract_variables(template: &str) -> Vec<String> {
        PLACEHOLDER
            .captures_iter(template)
            .map(|caps| caps[1].to_string())
            .collect()
    }

    /// 列出模板中在 data 里找不到的变量
    pub fn missing_variables(template: &str, data: &Value) -> Vec<String> {
        let mut missing: Vec<String> = Vec::new();
        for name in Self::extract_variables(template) {
            if lookup(data, &name).is_none() && !missing.contains(&name) {
                missing.push(name);
            }
        }
        missing
    }
}

/// 取出变量的字符串形式
///
/// 字符串直接使用，数值、布尔等非字符串类型转为 JSON 文本
fn lookup(data: &Value, key: &str) -> Option<String> {
    match data.get(key)? {
        Value::Null => None,
        Value::String(s) => Some(s.clone()),
        other => Some(other.to_string()),
    }
}

// ---------------------------------------------------------------------------
// 模板定义与注册表
// ---------------------------------------------------------------------------

/// 邮件模板
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailTemplate {
    pub subject: String,
    pub body: String,
}

impl EmailTemplate {
    pub fn new(subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            body: body.into(),
        }
    }
}

/// 通知模板，至少包含一个渠道
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NotificationTemplate {
    SmsOnly { sms: String },
    EmailOnly { email: EmailTemplate },
    Both { sms: String, email: EmailTemplate },
}

impl NotificationTemplate {
    pub fn sms(&self) -> Option<&str> {
        match self {
            Self::SmsOnly { sms } | Self::Both { sms, .. } => Some(sms),
            Self::EmailOnly { .. } => None,
        }
    }

    pub fn email(&self) -> Option<&EmailTemplate> {
        match self {
            Self::EmailOnly { email } | Self::Both { email, .. } => Some(email),
            Self::SmsOnly { .. } => None,
        }
    }

    pub fn kind(&self) -> &'static str {
        match self {
            Self::SmsOnly { .. } => "sms-only",
            Self::EmailOnly { .. } => "email-only",
            Self::Both { .. } => "sms+email",
        }
    }

    /// 从配置构建模板，两个渠道都未配置时报错
    pub fn from_config(name: &str, config: &TemplateConfig) -> Result<Self> {
        let email = config
            .email
            .as_ref()
            .map(|e| EmailTemplate::new(e.subject.clone(), e.body.clone()));

        match (config.sms.clone(), email) {
            (Some(sms), Some(email)) => Ok(Self::Both { sms, email }),
            (Some(sms), None) => Ok(Self::SmsOnly { sms }),
            (None, Some(email)) => Ok(Self::EmailOnly { email }),
            (None, None) => Err(NotificationError::TemplateInvalid {
                name: name.to_string(),
                reason: "至少需要配置 sms 或 email".to_string(),
            }),
        }
    }
}

/// 模板注册表
///
/// 启动时构建一次，之后只读。
#[derive(Debug, Clone, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, NotificationTemplate>,
}

impl TemplateRegistry {
    /// 创建空注册表
    pub fn new() -> Self {
        Self::default()
    }

    /// 创建带有内置模板的注册表
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register_default_templates();
        registry
    }

    /// 内置模板加配置覆盖
    ///
    /// 同名配置覆盖内置模板，新名字追加为新模板
    pub fn from_config(overrides: &HashMap<String, TemplateConfig>) -> Result<Self> {
        let mut registry = Self::with_defaults();
        // 按名字排序，保证错误信息稳定
        let ordered: BTreeMap<_, _> = overrides.iter().collect();
        for (name, config) in ordered {
            let template = NotificationTemplate::from_config(name, config)?;
            registry.register(name.clone(), template);
        }
        Ok(registry)
    }

    fn register_default_templates(&mut self) {
        self.register(
            "shipment_created",
            NotificationTemplate::Both {
                sms: "Your shipment {{shipment_id}} has been created. Track it here: {{tracking_url}}"
                    .to_string(),
                email: EmailTemplate::new(
                    "Shipment Created - {{shipment_id}}",
                    "Hi {{customer_name}},\n\nYour shipment {{shipment_id}} has been created.\nTrack it here: {{tracking_url}}\n\nThank you for shipping with us.",
                ),
            },
        );

        self.register(
            "shipment_delivered",
            NotificationTemplate::Both {
                sms: "Your shipment {{shipment_id}} has been delivered. Thank you!".to_string(),
                email: EmailTemplate::new(
                    "Shipment Delivered - {{shipment_id}}",
                    "Hi {{customer_name}},\n\nYour shipment {{shipment_id}} was delivered on {{delivered_at}}.\n\nThank you for shipping with us.",
                ),
            },
        );

        self.register(
            "delivery_delayed",
            NotificationTemplate::SmsOnly {
                sms: "Your shipment {{shipment_id}} is delayed. New ETA: {{eta}}.".to_string(),
            },
        );

        self.register(
            "payment_receipt",
            NotificationTemplate::EmailOnly {
                email: EmailTemplate::new(
                    "Payment Received - {{amount}}",
                    "Hi {{name}},\n\nWe have received your payment of {{amount}} for shipment {{shipment_id}}.\nReference: {{reference}}",
                ),
            },
        );
    }

    /// 注册模板（同名覆盖）
    pub fn register(&mut self, name: impl Into<String>, template: NotificationTemplate) {
        self.templates.insert(name.into(), template);
    }

    pub fn get(&self, name: &str) -> Option<&NotificationTemplate> {
        self.templates.get(name)
    }

    /// 已注册的模板名（排序后）
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.templates.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

// ---------------------------------------------------------------------------
// 模板分发
// ---------------------------------------------------------------------------

/// 模板分发器
///
/// 查找模板、替换占位符，再按接收人拥有的联系方式发送短信和/或邮件。
#[derive(Clone)]
pub struct TemplateDispatcher {
    sender: ChannelSender,
    registry: Arc<TemplateRegistry>,
}

impl TemplateDispatcher {
    pub fn new(sender: ChannelSender, registry: Arc<TemplateRegistry>) -> Self {
        Self { sender, registry }
    }

    pub fn registry(&self) -> &TemplateRegistry {
        &self.registry
    }

    /// 按模板发送通知
    ///
    /// 模板不存在时直接返回；接收人没有手机号和邮箱时不发送任何渠道。
    #[instrument(skip(self, data, recipient), fields(template = %template_name))]
    pub async fn send_template_notification(
        &self,
        template_name: &str,
        data: &Value,
        recipient: &Recipient,
    ) {
        let Some(template) = self.registry.get(template_name) else {
            warn!("通知模板未找到，跳过发送");
            metrics::record_template_dispatch(template_name, false);
            return;
        };
        metrics::record_template_dispatch(template_name, true);

        let sms_body = template.sms().map(|sms| TemplateEngine::render(sms, data));
        let email = template.email().map(|email| {
            (
                TemplateEngine::render(&email.subject, data),
                TemplateEngine::render(&email.body, data),
            )
        });

        let mut sends: Vec<BoxFuture<'_, bool>> = Vec::with_capacity(2);
        if let (Some(body), Some(phone)) = (sms_body.as_deref(), recipient.contact_phone()) {
            sends.push(self.sender.send_sms(phone, body).boxed());
        }
        if let (Some((subject, body)), Some(to)) = (email.as_ref(), recipient.contact_email()) {
            sends.push(
                self.sender
                    .send_email(to, subject, body, Some(template_name))
                    .boxed(),
            );
        }

        if sends.is_empty() {
            debug!(
                has_phone = recipient.contact_phone().is_some(),
                has_email = recipient.contact_email().is_some(),
                template_kind = template.kind(),
                "接收人没有可用的联系方式，跳过发送"
            );
            return;
        }

        let summary = settle_all(sends).await;
        info!(
            total = summary.total,
            succeeded = summary.succeeded,
            "模板通知发送完成"
        );
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::channels::{
        EmailMessage, Gateways, MockEmailGateway, MockPushGateway, MockSmsGateway, SmsMessage,
    };
    use notify_shared::config::EmailTemplateConfig;

    fn dispatcher_with(sms: MockSmsGateway, email: MockEmailGateway) -> TemplateDispatcher {
        let gateways = Gateways::new(
            Arc::new(sms),
            Arc::new(email),
            Arc::new(MockPushGateway::new()),
        );
        TemplateDispatcher::new(
            ChannelSender::new(gateways),
            Arc::new(TemplateRegistry::with_defaults()),
        )
    }

    #[test]
    fn test_render_missing_key_left_literal() {
        let data = json!({"name": "Bob"});
        let result = TemplateEngine::render("Hi {{name}}, ETA {{eta}}", &data);
        assert_eq!(result, "Hi Bob, ETA {{eta}}");
    }

    #[test]
    fn test_render_repeated_and_non_string_values() {
        let data = json!({"name": "Bob", "count": 3, "paid": true});
        let result = TemplateEngine::render("{{name}} x{{count}} {{name}} paid={{paid}}", &data);
        assert_eq!(result, "Bob x3 Bob paid=true");
    }

    #[test]
    fn test_render_is_single_pass() {
        // 替换后的值包含占位符语法，不会被再次展开
        let data = json!({"a": "{{b}}", "b": "nope"});
        assert_eq!(TemplateEngine::render("value={{a}}", &data), "value={{b}}");
    }

    #[test]
    fn test_render_ignores_non_word_placeholders() {
        let data = json!({"first-name": "Bob", "x": "1"});
        let result = TemplateEngine::render("{{first-name}} {{ x }} {{x}}", &data);
        assert_eq!(result, "{{first-name}} {{ x }} 1");
    }

    #[test]
    fn test_render_null_and_non_object_data() {
        assert_eq!(
            TemplateEngine::render("{{eta}}", &json!({"eta": null})),
            "{{eta}}"
        );
        assert_eq!(TemplateEngine::render("{{eta}}", &json!("text")), "{{eta}}");
    }

    #[test]
    fn test_extract_and_missing_variables() {
        let template = "{{shipment_id}} {{eta}} {{shipment_id}}";
        assert_eq!(
            TemplateEngine::extract_variables(template),
            vec!["shipment_id", "eta", "shipment_id"]
        );

        let missing = TemplateEngine::missing_variables(template, &json!({"shipment_id": "S1"}));
        assert_eq!(missing, vec!["eta".to_string()]);
    }

    #[test]
    fn test_registry_defaults() {
        let registry = TemplateRegistry::with_defaults();

        let created = registry.get("shipment_created").unwrap();
        assert!(created.sms().is_some());
        assert!(created.email().is_some());
        assert_eq!(registry.get("delivery_delayed").unwrap().kind(), "sms-only");
        assert_eq!(registry.get("payment_receipt").unwrap().kind(), "email-only");
        assert!(registry.get("unknown_template").is_none());
        assert_eq!(
            registry.names(),
            vec![
                "delivery_delayed",
                "payment_receipt",
                "shipment_created",
                "shipment_delivered"
            ]
        );
    }

    #[test]
    fn test_registry_config_overrides_and_additions() {
        let mut overrides = HashMap::new();
        overrides.insert(
            "delivery_delayed".to_string(),
            TemplateConfig {
                sms: Some("Delayed: {{shipment_id}}".to_string()),
                email: None,
            },
        );
        overrides.insert(
            "welcome".to_string(),
            TemplateConfig {
                sms: None,
                email: Some(EmailTemplateConfig {
                    subject: "Welcome {{name}}".to_string(),
                    body: "Glad to have you".to_string(),
                }),
            },
        );

        let registry = TemplateRegistry::from_config(&overrides).unwrap();
        assert_eq!(
            registry.get("delivery_delayed").unwrap().sms(),
            Some("Delayed: {{shipment_id}}")
        );
        assert_eq!(registry.get("welcome").unwrap().kind(), "email-only");
        assert_eq!(registry.len(), 5);
    }

    #[test]
    fn test_registry_rejects_empty_template() {
        let mut overrides = HashMap::new();
        overrides.insert("broken".to_string(), TemplateConfig::default());

        let err = TemplateRegistry::from_config(&overrides).unwrap_err();
        assert_eq!(err.code(), "TEMPLATE_INVALID");
        assert!(err.to_string().contains("broken"));
    }

    #[tokio::test]
    async fn test_template_sms_only_when_no_email() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .withf(|m: &SmsMessage| {
                m.to == "+1"
                    && m.body == "Your shipment S1 has been created. Track it here: http://x"
                    && !m.body.contains("{{")
            })
            .times(1)
            .returning(|_| Ok("sms_1".to_string()));
        // 接收人没有邮箱，邮件网关不应被调用
        let email = MockEmailGateway::new();

        let dispatcher = dispatcher_with(sms, email);
        dispatcher
            .send_template_notification(
                "shipment_created",
                &json!({"shipment_id": "S1", "tracking_url": "http://x"}),
                &Recipient::with_phone("+1"),
            )
            .await;
    }

    #[tokio::test]
    async fn test_template_both_channels() {
        let mut sms = MockSmsGateway::new();
        sms.expect_send()
            .times(1)
            .returning(|_| Ok("sms_1".to_string()));
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| {
                m.to == "a@b.com"
                    && m.subject == "Shipment Created - S1"
                    && m.body.starts_with("Hi Alice,")
                    && m.template.as_deref() == Some("shipment_created")
            })
            .times(1)
            .returning(|_| Ok("email_1".to_string()));

        let dispatcher = dispatcher_with(sms, email);
        dispatcher
            .send_template_notification(
                "shipment_created",
                &json!({"shipment_id": "S1", "tracking_url": "http://x", "customer_name": "Alice"}),
                &Recipient::with_phone("+1").and_email("a@b.com"),
            )
            .await;
    }

    #[tokio::test]
    async fn test_unknown_template_is_noop() {
        // 没有设置任何期望，任何网关调用都会让测试失败
        let dispatcher = dispatcher_with(MockSmsGateway::new(), MockEmailGateway::new());
        dispatcher
            .send_template_notification("unknown_template", &json!({}), &Recipient::with_phone("+1"))
            .await;
    }

    #[tokio::test]
    async fn test_recipient_without_contacts_is_noop() {
        let dispatcher = dispatcher_with(MockSmsGateway::new(), MockEmailGateway::new());
        dispatcher
            .send_template_notification(
                "shipment_created",
                &json!({"shipment_id": "S1"}),
                &Recipient::default(),
            )
            .await;
    }

    #[tokio::test]
    async fn test_blank_contacts_count_as_absent() {
        // 空字符串和纯空白的联系方式都不应触发发送
        let dispatcher = dispatcher_with(MockSmsGateway::new(), MockEmailGateway::new());
        dispatcher
            .send_template_notification(
                "shipment_created",
                &json!({"shipment_id": "S1", "tracking_url": "http://x"}),
                &Recipient::new(Some(String::new()), Some("   ".to_string())),
            )
            .await;
    }

    #[tokio::test]
    async fn test_blank_phone_still_sends_email() {
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.to == "a@b.com")
            .times(1)
            .returning(|_| Ok("email_1".to_string()));

        let dispatcher = dispatcher_with(MockSmsGateway::new(), email);
        dispatcher
            .send_template_notification(
                "shipment_created",
                &json!({"shipment_id": "S1", "tracking_url": "http://x"}),
                &Recipient::new(Some(" ".to_string()), Some("a@b.com".to_string())),
            )
            .await;
    }

    #[tokio::test]
    async fn test_email_only_template_skips_phone() {
        let mut email = MockEmailGateway::new();
        email
            .expect_send()
            .withf(|m: &EmailMessage| m.subject == "Payment Received - 42.50")
            .times(1)
            .returning(|_| Ok("email_1".to_string()));

        let dispatcher = dispatcher_with(MockSmsGateway::new(), email);
        dispatcher
            .send_template_notification(
                "payment_receipt",
                &json!({"amount": "42.50", "name": "Bob"}),
                &Recipient::with_phone("+1").and_email("bob@example.com"),
            )
            .await;
    }
}
