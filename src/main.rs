// ==========================================
// 库存对账同步 - 命令行入口
// ==========================================
// 用法:
//   inventory-sync <inventory_file> [config_path]
//
// 标准输出: 三桶汇总 JSON {updated, failed, skipped}
// 标准错误: 日志
// ==========================================

use anyhow::{bail, Context, Result};
use inventory_sync::config::load_config;
use inventory_sync::engine::{SyncExecutor, SyncOptions};
use inventory_sync::gateway::ShopifyGateway;
use inventory_sync::logging;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<()> {
    let mut args = std::env::args().skip(1);
    let Some(file_path) = args.next().map(PathBuf::from) else {
        bail!("用法: inventory-sync <inventory_file> [config_path]");
    };
    let config_path = args.next().map(PathBuf::from);

    let config = load_config(config_path.as_deref()).context("加载配置失败")?;
    logging::init(config.logging.format);

    tracing::info!("==================================================");
    tracing::info!("{} v{}", inventory_sync::APP_NAME, inventory_sync::VERSION);
    tracing::info!("==================================================");
    match &config.source {
        Some(path) => tracing::info!(path = %display_path(path), "已加载配置文件"),
        None => tracing::warn!("未找到配置文件，使用内嵌默认配置"),
    }

    // 逐行处理前检查凭据
    config.require_credentials()?;

    let bytes = std::fs::read(&file_path)
        .with_context(|| format!("读取文件失败: {}", file_path.display()))?;
    let file_name = file_path
        .file_name()
        .and_then(|n| n.to_str())
        .map(str::to_string);

    let gateway = ShopifyGateway::new(&config.shopify, config.retry.policy())?;
    let executor = SyncExecutor::new(Arc::new(gateway), SyncOptions::from(&config.sync));

    let report = executor.run(&bytes, file_name.as_deref()).await?;
    tracing::info!(
        run_id = %report.run_id,
        source = %display_path(&file_path),
        "汇总已输出"
    );

    println!("{}", serde_json::to_string_pretty(&report.summary)?);
    Ok(())
}

fn display_path(path: &Path) -> String {
    path.canonicalize()
        .unwrap_or_else(|_| path.to_path_buf())
        .display()
        .to_string()
}
