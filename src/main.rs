//! AI Javadoc Augmenter - Rust CLI
//!
//! 扫描 Java 仓库，为缺少 Javadoc 的类型与方法调用本地 LLM 生成注释，
//! 并按原位置写回源文件。

use anyhow::{bail, Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod config;
mod docgen;
mod error;
mod extract;
mod llm;

use config::AppConfig;
use docgen::{BatchProcessor, ClassRelationships, CommentGenerator, SourceScanner};
use error::AppError;
use llm::LlmClient;

#[derive(Parser)]
#[command(
    name = "javadoc-ai",
    about = "Generate Javadoc comments for a Java repository with a local LLM"
)]
struct Cli {
    /// Java 仓库根目录
    root: PathBuf,

    /// 配置文件路径（JSON）
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// 覆盖配置中的模型名称
    #[arg(short, long)]
    model: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    // 初始化日志
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "javadoc_ai=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let cli = Cli::parse();

    let mut config = AppConfig::load(cli.config.as_deref()).context("加载配置失败")?;
    if let Some(model) = cli.model {
        config.ollama.model = model;
    }

    info!("Starting Javadoc generation for {}", cli.root.display());
    info!(
        "Endpoint: {}, model: {}",
        config.ollama.base_url(),
        config.ollama.model
    );

    // 端点必须在启动时可达，否则整个运行没有意义，直接终止
    let client = Arc::new(
        LlmClient::new(config.ollama.base_url())
            .map_err(|e| AppError::Llm(e.to_string()))
            .context("初始化 LLM 客户端失败")?,
    );
    if let Err(e) = client.health_check().await {
        bail!("生成服务不可用 ({}): {}", config.ollama.base_url(), e);
    }

    let scanner = SourceScanner::new(&config.processing);
    let files = scanner.scan(&cli.root).context("扫描源码目录失败")?;
    if files.is_empty() {
        warn!("未在 {} 下找到任何 .java 文件", cli.root.display());
        return Ok(());
    }
    info!("Found {} Java files to process", files.len());

    // 类关系只是 Prompt 的补充上下文，构建或写盘失败不阻塞主流程
    let relationships = ClassRelationships::build(&files).unwrap_or_else(|e| {
        warn!("构建类关系失败: {}", e);
        ClassRelationships::default()
    });
    if !relationships.is_empty() {
        let side_file = cli.root.join(&config.processing.relationships_file);
        match relationships.save(&side_file) {
            Ok(()) => info!(
                "Class relationships saved: {} ({} classes)",
                side_file.display(),
                relationships.len()
            ),
            Err(e) => warn!("写入类关系文件失败 ({}): {}", side_file.display(), e),
        }
    }

    let generator = Arc::new(CommentGenerator::new(
        Arc::clone(&client),
        config.ollama.clone(),
    ));
    let processor = BatchProcessor::new(
        generator,
        Arc::new(relationships),
        config.processing.clone(),
    );

    let stats = processor.run(files).await;
    info!(
        "Run complete: {} files, {} written, {} unchanged, {} failed",
        stats.total, stats.written, stats.unchanged, stats.failed
    );

    Ok(())
}
