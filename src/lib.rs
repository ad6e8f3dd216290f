//! Roulette Tracker - 物理预测服务
//!
//! 库入口：模块组织 + 服务启动

pub mod error;
pub mod infra;
pub mod domain;
pub mod config;
pub mod state;
pub mod api;
pub mod services;

use std::sync::Arc;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use crate::config::EnvConfig;
use crate::state::{get_shutdown_token, AppState};

/// 运行时配置（命令行覆盖项）
#[derive(Debug, Default, Clone)]
pub struct RuntimeConfig {
    /// 监听端口覆盖
    pub port_override: Option<u16>,
    /// 监听地址覆盖
    pub host_override: Option<String>,
}

/// 初始化 tracing 日志
///
/// `RUST_LOG` 优先，否则使用默认过滤规则
pub fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("roulette_tracker=info,tower_http=info"));

    let fmt_layer = tracing_subscriber::fmt::layer().with_target(true);

    tracing_subscriber::registry()
        .with(filter)
        .with(fmt_layer)
        .init();
}

/// 初始化并运行预测服务
///
/// 阻塞直到收到 shutdown 信号（Ctrl-C）或监听失败
pub async fn init_and_run_server(runtime: RuntimeConfig) -> std::io::Result<()> {
    let mut config = EnvConfig::from_env();
    if let Some(port) = runtime.port_override {
        config.port = port;
    }
    if let Some(host) = runtime.host_override {
        config.host = host;
    }

    let host = config.host.clone();
    let port = config.port;

    let state = Arc::new(AppState::new(config));
    let app = api::router(state);

    // Ctrl-C 触发全局 shutdown
    let shutdown = get_shutdown_token();
    tokio::spawn(async {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::info!("Ctrl-C received, shutting down");
            state::trigger_shutdown();
        }
    });

    let listener = tokio::net::TcpListener::bind((host.as_str(), port)).await?;

    let primary_ip = infra::net::primary_ip();
    tracing::info!(
        host = %host,
        port = port,
        url = %infra::net::service_url(primary_ip, port),
        "Prediction server listening"
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(async move { shutdown.cancelled().await })
        .await
}
