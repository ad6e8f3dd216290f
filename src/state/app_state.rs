//! 应用状态

use chrono::{DateTime, Utc};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio_util::sync::CancellationToken;

use crate::config::EnvConfig;

/// 全局 shutdown token，用于优雅关闭服务
static GLOBAL_SHUTDOWN: std::sync::OnceLock<CancellationToken> = std::sync::OnceLock::new();

/// 获取全局 shutdown token
pub fn get_shutdown_token() -> CancellationToken {
    GLOBAL_SHUTDOWN.get_or_init(CancellationToken::new).clone()
}

/// 触发全局 shutdown
pub fn trigger_shutdown() {
    if let Some(token) = GLOBAL_SHUTDOWN.get() {
        token.cancel();
    }
}

/// 应用状态
pub struct AppState {
    /// 环境配置
    pub config: EnvConfig,
    /// 服务启动时间
    pub started_at: DateTime<Utc>,
    /// 已响应的预测次数
    predictions_served: AtomicU64,
}

impl AppState {
    /// 创建新的应用状态
    pub fn new(config: EnvConfig) -> Self {
        tracing::info!(
            host = %config.host,
            port = config.port,
            run_from_repo = config.install.run_from_repo,
            install_dir = %config.install.install_dir.display(),
            "Loaded configuration"
        );

        Self {
            config,
            started_at: Utc::now(),
            predictions_served: AtomicU64::new(0),
        }
    }

    /// 记录一次预测响应
    pub fn record_prediction(&self) {
        self.predictions_served.fetch_add(1, Ordering::Relaxed);
    }

    /// 已响应的预测次数
    pub fn predictions_served(&self) -> u64 {
        self.predictions_served.load(Ordering::Relaxed)
    }

    /// 服务运行秒数
    pub fn uptime_secs(&self) -> i64 {
        (Utc::now() - self.started_at).num_seconds()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prediction_counter() {
        let state = AppState::new(EnvConfig::from_env());
        assert_eq!(state.predictions_served(), 0);

        state.record_prediction();
        state.record_prediction();
        assert_eq!(state.predictions_served(), 2);
    }
}
