//! MimicCursor: 拟人化鼠标轨迹合成
//!
//! 架构:
//! - bezier: 贝塞尔曲线求值 (Bernstein 多项式，无状态)
//! - config: 键值配置提供者 + 时长参数
//! - trajectory: 轨迹合成 (节点 → 曲线 → 扰动 → 缓动重采样)
//! - api: HTTP 接口，供外部输入注入端调用

pub mod api;
pub mod bezier;
pub mod config;
pub mod error;
pub mod trajectory;

pub use bezier::Point;
pub use config::{ConfigProvider, MaskConfig, TimingParams};
pub use error::TrajectoryError;
pub use trajectory::{Trajectory, TrajectorySynthesizer};

/// 使用系统熵与进程级配置合成一条轨迹
pub fn synthesize(from: Point, to: Point) -> error::Result<Trajectory> {
    TrajectorySynthesizer::from_entropy().synthesize(from, to)
}
