//! 服务状态 API
//!
//! 包含 / 和 /health 端点

use axum::{extract::State, response::IntoResponse, routing::get, Json, Router};
use std::sync::Arc;

use crate::config::env::constants::{SERVICE_NAME, VERSION};
use crate::state::AppState;

/// 创建状态路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/", get(status))
        .route("/health", get(status))
}

/// 服务状态
///
/// GET /, GET /health
/// 无需认证
async fn status(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let uptime_secs = state.uptime_secs();
    let uptime = format!(
        "{}d {}h {}m {}s",
        uptime_secs / 86400,
        (uptime_secs % 86400) / 3600,
        (uptime_secs % 3600) / 60,
        uptime_secs % 60
    );

    let host = hostname::get()
        .map(|h| h.to_string_lossy().to_string())
        .unwrap_or_else(|_| "unknown".to_string());

    Json(serde_json::json!({
        "server": SERVICE_NAME,
        "version": VERSION,
        "status": "ok",
        "hostname": host,
        "started_at": state.started_at.to_rfc3339(),
        "uptime": uptime,
        "predictions_served": state.predictions_served(),
    }))
}
