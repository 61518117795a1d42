//! 通知分发命令行入口
//!
//! 加载配置、初始化可观测性，使用模拟网关执行子命令。

use anyhow::Result;
use clap::Parser;
use tracing::{info, warn};

use notification_service::cli::{Cli, CommandRunner, Commands, bootstrap};
use notify_shared::observability;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 1. 加载配置，文件格式错误或取值不合法时直接退出
    let config = bootstrap::load_config()?;

    // 2. 可观测性：命令行日志级别覆盖配置文件
    let mut obs_config = config
        .observability
        .clone()
        .with_service_name(&config.service_name);
    if let Some(level) = &cli.log_level {
        obs_config = obs_config.with_log_level(level.clone());
    }
    let _guard = observability::init(&obs_config)?;

    if config.is_production() {
        warn!("生产环境使用的是模拟网关，通知不会真正送达");
    }
    info!(
        environment = %config.environment,
        latency_ms = config.dispatch.simulated_latency_ms,
        "Configuration loaded"
    );

    // 3. 组合根：注入模拟网关
    let service = bootstrap::build_service(&config)?;
    let runner = CommandRunner::new(service);

    match cli.command {
        Commands::Demo => runner.run_demo().await?,
        Commands::Template {
            name,
            data,
            phone,
            email,
        } => runner.run_template(&name, data, phone, email).await?,
        Commands::Bulk {
            recipient_ids,
            title,
            message,
            channels,
        } => {
            runner
                .run_bulk(&recipient_ids, &title, &message, &channels)
                .await?
        }
        Commands::Templates => runner.run_templates()?,
    }

    Ok(())
}
