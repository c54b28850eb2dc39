//! 轨迹合成错误
//!
//! 几何前置条件在 release 构建中同样必须成立，
//! 因此全部以显式错误返回，而不是 debug_assert。

use thiserror::Error;

/// 轨迹合成中的不变量违例 (调用方 bug)
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TrajectoryError {
    /// 控制点集合为空
    #[error("控制点集合为空")]
    EmptyControlPoints,

    /// 采样数为 0
    #[error("采样点数必须大于 0")]
    ZeroSamples,

    /// NaN / 无穷大坐标或参数
    #[error("{what} 必须是有限数值")]
    NonNumeric { what: &'static str },

    /// 边界反转 (low > high)
    #[error("{axis} 轴边界反转: {low} > {high}")]
    InvertedBounds { axis: char, low: f64, high: f64 },

    /// 扰动频率不在 [0,1]
    #[error("扰动频率必须在 [0,1] 内, 实际: {0}")]
    InvalidFrequency(f64),

    /// 正态分布标准差非法
    #[error("扰动标准差非法: {0}")]
    InvalidDeviation(f64),

    /// 起止点跨度过大，采样点数超出上限
    #[error("起止点跨度过大: {0}")]
    SpanTooLarge(f64),

    /// 参数不在 [0,1]
    #[error("参数必须在 [0,1] 内, 实际: {0}")]
    OutOfUnitRange(f64),

    /// 目标点数 < 2，无法保证起止点
    #[error("目标点数至少为 2, 实际: {0}")]
    TooFewSamples(i32),
}

pub type Result<T> = std::result::Result<T, TrajectoryError>;
