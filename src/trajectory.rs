//! 拟人化鼠标轨迹合成
//!
//! 流水线: 起止点 → 随机内部节点 → 贝塞尔采样 → y 轴扰动 → 缓动重采样。
//! 随机源与配置均由调用方注入，固定种子即可得到确定性输出。

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, Normal};
use serde::Serialize;
use tracing::debug;

use crate::bezier::{self, Point};
use crate::config::{ConfigProvider, MaskConfig, TimingParams};
use crate::error::{Result, TrajectoryError};

/// 包围盒外扩边距 (像素)
const BOUNDARY_MARGIN: f64 = 80.0;
/// 内部节点数量
const KNOTS_COUNT: usize = 2;
/// 扰动: 正态分布均值
const DISTORTION_MEAN: f64 = 1.0;
/// 扰动: 正态分布标准差
const DISTORTION_STDEV: f64 = 1.0;
/// 扰动: 每个内部点被扰动的概率
const DISTORTION_FREQUENCY: f64 = 0.5;
/// 原始曲线采样点数上限
pub const MAX_CURVE_SAMPLES: usize = 1_000_000;

/// 节点采样边界
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub left: f64,
    pub right: f64,
    pub down: f64,
    pub up: f64,
}

impl Bounds {
    /// 起止点包围盒，四周各外扩 margin
    pub fn around(from: Point, to: Point, margin: f64) -> Self {
        Self {
            left: from.x.min(to.x) - margin,
            right: from.x.max(to.x) + margin,
            down: from.y.min(to.y) - margin,
            up: from.y.max(to.y) + margin,
        }
    }

    fn validate(&self) -> Result<()> {
        let all = [self.left, self.right, self.down, self.up];
        if !all.iter().all(|v| v.is_finite()) {
            return Err(TrajectoryError::NonNumeric { what: "节点边界" });
        }
        if self.left > self.right {
            return Err(TrajectoryError::InvertedBounds {
                axis: 'x',
                low: self.left,
                high: self.right,
            });
        }
        if self.down > self.up {
            return Err(TrajectoryError::InvertedBounds {
                axis: 'y',
                low: self.down,
                high: self.up,
            });
        }
        Ok(())
    }
}

/// 最终输出的整数轨迹
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Trajectory {
    pub points: Vec<(i32, i32)>,
}

impl Trajectory {
    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<(i32, i32)> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<(i32, i32)> {
        self.points.last().copied()
    }

    /// 展平为 x0, y0, x1, y1, ... (供输入注入端使用)
    pub fn flatten(&self) -> Vec<i32> {
        self.points.iter().flat_map(|&(x, y)| [x, y]).collect()
    }
}

/// ease-out 二次缓动: 前段推进快、后段推进慢
pub fn ease_out_quad(t: f64) -> Result<f64> {
    if !(0.0..=1.0).contains(&t) {
        return Err(TrajectoryError::OutOfUnitRange(t));
    }
    Ok(-t * (t - 2.0))
}

/// 轨迹合成器
pub struct TrajectorySynthesizer<R, C> {
    rng: R,
    config: C,
}

impl TrajectorySynthesizer<StdRng, &'static MaskConfig> {
    /// 系统熵播种 + 进程级配置
    pub fn from_entropy() -> Self {
        Self::new(StdRng::from_entropy(), MaskConfig::global())
    }
}

impl<R: Rng, C: ConfigProvider> TrajectorySynthesizer<R, C> {
    pub fn new(rng: R, config: C) -> Self {
        Self { rng, config }
    }

    /// 当前配置下的时长参数 (每次调用重新读取)
    pub fn timing(&self) -> TimingParams {
        TimingParams::from_config(&self.config)
    }

    /// 生成 from → to 的完整轨迹
    pub fn synthesize(&mut self, from: Point, to: Point) -> Result<Trajectory> {
        if !from.is_finite() {
            return Err(TrajectoryError::NonNumeric { what: "起点" });
        }
        if !to.is_finite() {
            return Err(TrajectoryError::NonNumeric { what: "终点" });
        }

        let bounds = Bounds::around(from, to, BOUNDARY_MARGIN);
        let knots = self.generate_internal_knots(bounds, KNOTS_COUNT)?;
        let curve = generate_points(from, to, &knots)?;
        let distorted = self.distort_points(
            &curve,
            DISTORTION_MEAN,
            DISTORTION_STDEV,
            DISTORTION_FREQUENCY,
        )?;
        let timing = self.timing();
        let trajectory = tween_points(&distorted, timing)?;

        debug!(
            "🖱️ 轨迹 ({:.0},{:.0}) → ({:.0},{:.0}): 曲线 {} 点, 输出 {} 点 (min={}, max={})",
            from.x,
            from.y,
            to.x,
            to.y,
            curve.len(),
            trajectory.len(),
            timing.min_points,
            timing.max_points,
        );
        Ok(trajectory)
    }

    /// 在边界内独立均匀采样 count 个内部节点
    pub fn generate_internal_knots(
        &mut self,
        bounds: Bounds,
        count: usize,
    ) -> Result<Vec<Point>> {
        bounds.validate()?;
        let rng = &mut self.rng;
        let xs: Vec<f64> = (0..count)
            .map(|_| rng.gen_range(bounds.left..=bounds.right))
            .collect();
        let ys: Vec<f64> = (0..count)
            .map(|_| rng.gen_range(bounds.down..=bounds.up))
            .collect();
        Ok(xs.into_iter().zip(ys).map(Point::from).collect())
    }

    /// 内部点按 frequency 概率在 y 轴加上取整的正态偏移; 首尾原样保留
    pub fn distort_points(
        &mut self,
        points: &[Point],
        mean: f64,
        stdev: f64,
        frequency: f64,
    ) -> Result<Vec<Point>> {
        if !mean.is_finite() {
            return Err(TrajectoryError::NonNumeric { what: "扰动均值" });
        }
        if !(0.0..=1.0).contains(&frequency) {
            return Err(TrajectoryError::InvalidFrequency(frequency));
        }
        let normal =
            Normal::new(mean, stdev).map_err(|_| TrajectoryError::InvalidDeviation(stdev))?;
        if !points.iter().all(Point::is_finite) {
            return Err(TrajectoryError::NonNumeric { what: "曲线点" });
        }
        if points.len() <= 2 {
            return Ok(points.to_vec());
        }

        let last = points.len() - 1;
        let mut distorted = Vec::with_capacity(points.len());
        distorted.push(points[0]);
        for p in &points[1..last] {
            let delta = if self.rng.gen::<f64>() < frequency {
                normal.sample(&mut self.rng).round()
            } else {
                0.0
            };
            distorted.push(Point::new(p.x, p.y + delta));
        }
        distorted.push(points[last]);
        Ok(distorted)
    }
}

/// 原始曲线: 采样数取两轴跨度较大者 (至少 2)
pub fn generate_points(from: Point, to: Point, knots: &[Point]) -> Result<Vec<Point>> {
    let span = (from.x - to.x).abs().max((from.y - to.y).abs()).max(2.0);
    if !span.is_finite() {
        return Err(TrajectoryError::NonNumeric { what: "起止点跨度" });
    }
    if span > MAX_CURVE_SAMPLES as f64 {
        return Err(TrajectoryError::SpanTooLarge(span));
    }
    let mid_pts_cnt = span as usize;

    let mut control = Vec::with_capacity(knots.len() + 2);
    control.push(from);
    control.extend_from_slice(knots);
    control.push(to);
    bezier::sample_curve(&control, mid_pts_cnt)
}

/// 目标点数: 路径长度的 1/4 次幂缩放，限制在 [min+2, max]
pub fn target_point_count(total_length: f64, timing: TimingParams) -> i32 {
    let scaled = (total_length.powf(0.25) * 20.0) as i32;
    timing.max_points.min(timing.min_points.saturating_add(2).max(scaled))
}

/// 按 ease-out 缓动在时间上重采样，并取整输出
pub fn tween_points(points: &[Point], timing: TimingParams) -> Result<Trajectory> {
    if points.is_empty() {
        return Err(TrajectoryError::EmptyControlPoints);
    }
    if !points.iter().all(Point::is_finite) {
        return Err(TrajectoryError::NonNumeric { what: "曲线点" });
    }

    let total_length: f64 = points.windows(2).map(|w| w[0].distance_to(&w[1])).sum();
    let target = target_point_count(total_length, timing);
    if target < 2 {
        return Err(TrajectoryError::TooFewSamples(target));
    }

    let last = points.len() - 1;
    let out = (0..target)
        .map(|i| -> Result<(i32, i32)> {
            let t = f64::from(i) / f64::from(target - 1);
            let eased = ease_out_quad(t)?;
            let index = ((eased * last as f64) as usize).min(last);
            Ok(points[index].rounded())
        })
        .collect::<Result<Vec<_>>>()?;
    Ok(Trajectory { points: out })
}
