//! 物理预测核心
//!
//! 根据轮盘/球经过标记点的时间戳估计角速度与角减速度，
//! 推算球脱离轨道的时刻与双方扫过的角度，映射到轮面口袋

use std::f64::consts::PI;

use thiserror::Error;

use crate::domain::marks::{MarksRequest, MarksResponse, SpinDirection};
use crate::domain::wheel;

/// 重力加速度 (m/s²)
const G: f64 = 9.81;

/// 轨道坡角 (rad)
const TRACK_SLOPE: f64 = 0.02;

/// 经验散射偏移（口袋数）
const SCATTER_OFFSET: usize = 5;

/// 左旋方向偏移（口袋数）
const LEFT_DIRECTION_OFFSET: usize = 12;

/// 预测错误
#[derive(Debug, Error, PartialEq)]
pub enum PredictError {
    #[error("Not enough marks to compute prediction")]
    InsufficientMarks,
}

/// 平均角频率（转/秒）
///
/// 少于 2 个标记点或平均周期非正时返回 0
pub fn angular_velocity(times: &[f64]) -> f64 {
    if times.len() < 2 {
        return 0.0;
    }

    let periods: Vec<f64> = times.windows(2).map(|w| w[1] - w[0]).collect();
    let avg_period = periods.iter().sum::<f64>() / periods.len() as f64;

    if avg_period > 0.0 {
        1.0 / avg_period
    } else {
        0.0
    }
}

/// 角减速度 (rad/s²)
///
/// 对区间中点处的瞬时角速度 ω = 2π/Δt 做最小二乘回归，取负斜率。
/// 非递增的时间区间被丢弃；可用区间少于 2 个或回归退化时返回 0
pub fn angular_deceleration(times: &[f64]) -> f64 {
    if times.len() < 3 {
        return 0.0;
    }

    let mut velocities: Vec<f64> = Vec::new();
    let mut midpoints: Vec<f64> = Vec::new();

    for w in times.windows(2) {
        let dt = w[1] - w[0];
        if dt <= 0.0 {
            continue;
        }
        velocities.push(2.0 * PI / dt);
        midpoints.push((w[1] + w[0]) / 2.0);
    }

    if velocities.len() < 2 {
        return 0.0;
    }

    let n = velocities.len() as f64;
    let sum_x: f64 = midpoints.iter().sum();
    let sum_y: f64 = velocities.iter().sum();
    let sum_xy: f64 = midpoints.iter().zip(&velocities).map(|(x, v)| x * v).sum();
    let sum_x2: f64 = midpoints.iter().map(|x| x * x).sum();

    let denom = n * sum_x2 - sum_x * sum_x;
    if denom == 0.0 {
        return 0.0;
    }

    let slope = (n * sum_xy - sum_x * sum_y) / denom;
    // 减速时 ω 随时间下降，取负使减速度为正
    -slope
}

/// 单方向预测
fn predict_for_direction(
    wheel_times: &[f64],
    ball_times: &[f64],
    direction: SpinDirection,
) -> u8 {
    let mut wheel_omega = 2.0 * PI * angular_velocity(wheel_times);
    let mut ball_omega = 2.0 * PI * angular_velocity(ball_times);
    let mut wheel_alpha = angular_deceleration(wheel_times);
    let mut ball_alpha = angular_deceleration(ball_times);

    // 退化输入的保底值
    if wheel_alpha <= 0.0 {
        wheel_alpha = 0.1;
    }
    if ball_alpha <= 0.0 {
        ball_alpha = 0.1;
    }
    if wheel_omega <= 0.0 {
        wheel_omega = 1.0;
    }
    if ball_omega <= 0.0 {
        ball_omega = 2.0;
    }

    // 球维持在轨道上所需的临界速度平方
    let critical_velocity_squared = G * TRACK_SLOPE.tan() * 0.5;
    let critical_velocity = critical_velocity_squared.sqrt();

    let mut t_drop = if ball_alpha > 0.0 && ball_omega > critical_velocity {
        (ball_omega - critical_velocity) / ball_alpha
    } else {
        3.0
    };
    if t_drop < 0.0 {
        t_drop = 3.0;
    }
    if t_drop > 10.0 {
        t_drop = 5.0;
    }

    let mut theta_ball = ball_omega * t_drop - 0.5 * ball_alpha * t_drop * t_drop;
    let mut theta_wheel = wheel_omega * t_drop - 0.5 * wheel_alpha * t_drop * t_drop;

    if !theta_ball.is_finite() {
        theta_ball = 2.0 * PI * 3.0;
    }
    if !theta_wheel.is_finite() {
        theta_wheel = 2.0 * PI * 2.0;
    }

    let (relative_turns, direction_offset) = match direction {
        SpinDirection::Left => (
            (theta_ball + theta_wheel) / (2.0 * PI),
            LEFT_DIRECTION_OFFSET,
        ),
        SpinDirection::Right => ((theta_ball - theta_wheel) / (2.0 * PI), 0),
    };

    let pockets = wheel::POCKETS as f64;
    let pocket_offset = ((relative_turns.abs() * pockets) % pockets) as usize;
    let final_index = (pocket_offset + SCATTER_OFFSET + direction_offset) % wheel::POCKETS;

    wheel::pocket_at(final_index)
}

/// 计算双方向预测
pub fn compute_predictions(req: &MarksRequest) -> Result<MarksResponse, PredictError> {
    if req.wheel_times.len() < 2 || req.ball_times.len() < 2 {
        return Err(PredictError::InsufficientMarks);
    }

    let left = predict_for_direction(&req.wheel_times, &req.ball_times, SpinDirection::Left);
    let right = predict_for_direction(&req.wheel_times, &req.ball_times, SpinDirection::Right);

    Ok(MarksResponse {
        left_prediction: left,
        right_prediction: right,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(wheel_times: Vec<f64>, ball_times: Vec<f64>) -> MarksRequest {
        MarksRequest {
            wheel_marks: wheel_times.len() as u32,
            ball_marks: ball_times.len() as u32,
            wheel_times,
            ball_times,
            mode: "3x3".to_string(),
        }
    }

    #[test]
    fn test_angular_velocity_uniform_marks() {
        let v = angular_velocity(&[0.0, 1.0, 2.0, 3.0]);
        assert!((v - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_angular_velocity_too_few_marks() {
        assert_eq!(angular_velocity(&[]), 0.0);
        assert_eq!(angular_velocity(&[1.0]), 0.0);
    }

    #[test]
    fn test_angular_velocity_non_positive_period() {
        assert_eq!(angular_velocity(&[3.0, 1.0]), 0.0);
    }

    #[test]
    fn test_deceleration_constant_speed_is_zero() {
        assert_eq!(angular_deceleration(&[0.0, 1.0, 2.0, 3.0]), 0.0);
    }

    #[test]
    fn test_deceleration_slowing_wheel() {
        // 周期 1s -> 2s：ω 从 2π 降到 π，中点 0.5 和 2.0
        let a = angular_deceleration(&[0.0, 1.0, 3.0]);
        let expected = 2.0 * PI / 3.0;
        assert!((a - expected).abs() < 1e-9, "got {}", a);
    }

    #[test]
    fn test_deceleration_too_few_marks() {
        assert_eq!(angular_deceleration(&[0.0, 1.0]), 0.0);
    }

    #[test]
    fn test_deceleration_drops_non_increasing_intervals() {
        // dt=0 的区间被丢弃后只剩一个可用区间
        assert_eq!(angular_deceleration(&[0.0, 1.0, 1.0]), 0.0);
    }

    #[test]
    fn test_deceleration_degenerate_regression() {
        // 两个可用区间中点相同，回归分母为 0
        assert_eq!(angular_deceleration(&[0.0, 2.0, 0.0, 2.0]), 0.0);
    }

    #[test]
    fn test_predictions_known_values() {
        // 轮盘 1 rps、球 2.5 rps，均匀标记（减速度走保底值 0.1）
        let req = request(vec![0.0, 1.0, 2.0], vec![0.0, 0.4, 0.8]);
        let resp = compute_predictions(&req).unwrap();
        assert_eq!(resp.left_prediction, 24);
        assert_eq!(resp.right_prediction, 1);
    }

    #[test]
    fn test_predictions_identical_channels() {
        // 轮盘与球速度相同：右旋相对角为 0，落在固定散射偏移上
        let req = request(vec![0.0, 1.0], vec![0.0, 1.0]);
        let resp = compute_predictions(&req).unwrap();
        assert_eq!(resp.left_prediction, 15);
        assert_eq!(resp.right_prediction, 21);
    }

    #[test]
    fn test_predictions_are_deterministic() {
        let req = request(vec![0.0, 0.9, 1.9, 3.1], vec![0.0, 0.3, 0.7, 1.2]);
        let a = compute_predictions(&req).unwrap();
        let b = compute_predictions(&req).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_predictions_land_on_wheel() {
        let req = request(vec![0.0, 1.1, 2.3], vec![0.0, 0.5, 1.1]);
        let resp = compute_predictions(&req).unwrap();
        assert!(wheel::ROULETTE_SEQUENCE.contains(&resp.left_prediction));
        assert!(wheel::ROULETTE_SEQUENCE.contains(&resp.right_prediction));
    }

    #[test]
    fn test_predictions_insufficient_marks() {
        let req = request(vec![0.0], vec![0.0, 0.5]);
        assert_eq!(
            compute_predictions(&req),
            Err(PredictError::InsufficientMarks)
        );

        let req = request(vec![0.0, 1.0], vec![]);
        assert_eq!(
            compute_predictions(&req),
            Err(PredictError::InsufficientMarks)
        );
    }
}
