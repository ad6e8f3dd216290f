//! 预测 API
//!
//! 包含 /predict_marks 端点

use axum::{extract::State, routing::post, Json, Router};
use std::sync::Arc;

use crate::domain::marks::{MarksRequest, MarksResponse};
use crate::error::{ApiError, ApiResult};
use crate::services::prediction::{self, PredictError};
use crate::state::AppState;

/// 创建预测路由
pub fn router() -> Router<Arc<AppState>> {
    Router::new().route("/predict_marks", post(predict_marks))
}

/// 标记点预测
///
/// POST /predict_marks
/// 标记点不足返回 400，其余计算失败返回 500
async fn predict_marks(
    State(state): State<Arc<AppState>>,
    Json(request): Json<MarksRequest>,
) -> ApiResult<Json<MarksResponse>> {
    tracing::debug!(
        wheel_marks = request.wheel_times.len(),
        ball_marks = request.ball_times.len(),
        mode = %request.mode,
        "Prediction requested"
    );

    match prediction::compute_predictions(&request) {
        Ok(response) => {
            state.record_prediction();
            tracing::info!(
                left = response.left_prediction,
                right = response.right_prediction,
                "Prediction computed"
            );
            Ok(Json(response))
        }
        Err(e @ PredictError::InsufficientMarks) => Err(ApiError::bad_request(e.to_string())),
    }
}
