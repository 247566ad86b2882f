//! TNC 自然保护助手
//!
//! 入口：加载配置、初始化日志、创建命令循环与 TUI，并运行主循环。
//! 可选参数：配置文件路径（覆盖 config/default.toml 中的键）。

use std::path::PathBuf;

use anyhow::Context;
use tnc_assistant::config::{load_config, AppConfig};
use tnc_assistant::{core::create_agent, observability, ui::run_app};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let config_path = std::env::args().nth(1).map(PathBuf::from);

    let loaded = load_config(config_path);
    let cfg = match &loaded {
        Ok(cfg) => cfg.clone(),
        Err(_) => AppConfig::default(),
    };
    observability::init(cfg.app.log_file.as_deref()).context("Failed to initialize logging")?;
    if let Err(e) = &loaded {
        tracing::warn!("Config load failed ({}), using defaults", e);
    }

    // 返回命令发送端、状态接收端；缺少 OPENAI_API_KEY 时在这里失败
    let (cmd_tx, state_rx) = create_agent(&cfg)
        .await
        .context("Failed to create agent")?;

    run_app(&cfg.app.name, state_rx, cmd_tx)
        .await
        .context("App run failed")?;

    Ok(())
}
