//! 预测请求/响应模型

use serde::{Deserialize, Serialize};

/// 标记点预测请求
///
/// `wheel_times` / `ball_times` 为轮盘与球经过固定标记点的时间戳（秒）
#[derive(Clone, Debug, Deserialize)]
pub struct MarksRequest {
    pub wheel_times: Vec<f64>,
    pub ball_times: Vec<f64>,
    /// 轮盘标记点个数（客户端统计信息，不参与计算）
    pub wheel_marks: u32,
    /// 球标记点个数（客户端统计信息，不参与计算）
    pub ball_marks: u32,
    /// 采样模式 (e.g., "3x3")
    #[serde(default = "default_mode")]
    pub mode: String,
}

fn default_mode() -> String {
    "3x3".to_string()
}

/// 标记点预测响应
///
/// 对两个旋转方向各给出一个预测号码
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct MarksResponse {
    pub left_prediction: u8,
    pub right_prediction: u8,
}

/// 轮盘旋转方向
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SpinDirection {
    Left,
    Right,
}

impl SpinDirection {
    /// 转换为字符串
    pub fn as_str(&self) -> &'static str {
        match self {
            SpinDirection::Left => "left",
            SpinDirection::Right => "right",
        }
    }
}
