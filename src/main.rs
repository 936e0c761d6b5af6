use anyhow::{Context, Result};
use clap::Parser;
use tracing::{error, info};

use annotation_backfill::api_constants::api_config::CHECK_TEXT;
use annotation_backfill::config::{BackfillConfig, Cli};
use annotation_backfill::pipeline::Backfill;
use annotation_backfill::stats::{format_duration, print_run_report};
use annotation_backfill::utils::init_logging;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // 初始化日志系统
    init_logging(cli.verbose, cli.quiet);

    let config = BackfillConfig::from(&cli);
    config.validate().context("配置无效")?;

    if !cli.quiet {
        info!("🚀 启动注释回填");
        info!("📂 语料目录: {}", config.root().display());
        info!("🌐 翻译服务: {}", config.api_urls().join(", "));
        info!("🔤 语言: {} → {}", config.source_lang(), config.target_lang());
        if config.is_dry_run() {
            info!("🔍 试运行模式：不发请求，不写文件");
        }
    }

    let backfill = Backfill::from_config(config).context("创建回填流水线失败")?;

    if cli.check {
        match backfill.check_connection().await {
            Ok(sample) => info!("✓ 翻译服务连通: {} → {}", CHECK_TEXT, sample),
            Err(e) => {
                error!("❌ 无法连接翻译服务: {}", e);
                std::process::exit(1);
            }
        }
    }

    match backfill.run().await {
        Ok(stats) => {
            if !cli.quiet {
                info!("✅ 完成！总耗时: {}", format_duration(stats.elapsed));
                print_run_report(&stats);
            }
        }
        Err(e) => {
            error!("❌ 回填失败: {}", e);
            std::process::exit(1);
        }
    }

    Ok(())
}
