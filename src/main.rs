//! MimicCursor 服务入口
//!
//! 加载配置 (CAMOU_CONFIG / CAMOU_CONFIG_N) 后启动 HTTP API。

use anyhow::{Context, Result};
use std::sync::Arc;
use tracing::info;

use mimiccursor::api::{self, AppState};
use mimiccursor::{MaskConfig, TimingParams};

/// 默认监听地址
const DEFAULT_ADDR: &str = "127.0.0.1:8899";

#[tokio::main]
async fn main() -> Result<()> {
    // 日志
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "mimiccursor=debug,tower_http=info".into()),
        )
        .init();

    info!("🚀 MimicCursor v{} 启动中...", env!("CARGO_PKG_VERSION"));

    // ① 配置
    let config = MaskConfig::from_env();
    let timing = TimingParams::from_config(&config);
    info!(
        "✅ 配置就绪: {} 项, 点数范围 [{}, {}]",
        config.len(),
        timing.min_points.saturating_add(2),
        timing.max_points
    );

    // ② API 服务
    let state = Arc::new(AppState {
        config: Arc::new(config),
    });
    let app = api::build_router(state);

    let addr = std::env::var("MIMICCURSOR_ADDR").unwrap_or_else(|_| DEFAULT_ADDR.to_string());
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .with_context(|| format!("监听 {addr} 失败"))?;
    info!("🌐 API 服务启动: http://{addr}");
    info!("📌 端点: GET /status, POST /trajectory");

    axum::serve(listener, app).await?;
    Ok(())
}
