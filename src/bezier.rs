//! 贝塞尔曲线求值
//!
//! 纯数学组件: 给定有序控制点，按 Bernstein 多项式加权求曲线上的点。
//! 无状态、无随机性，不依赖轨迹合成器。

use serde::{Deserialize, Serialize};

use crate::error::{Result, TrajectoryError};

/// 屏幕像素坐标点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn is_finite(&self) -> bool {
        self.x.is_finite() && self.y.is_finite()
    }

    /// 欧氏距离
    pub fn distance_to(&self, other: &Point) -> f64 {
        let dx = other.x - self.x;
        let dy = other.y - self.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// 四舍五入到整数像素
    pub fn rounded(&self) -> (i32, i32) {
        (self.x.round() as i32, self.y.round() as i32)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// 二项式系数 C(n, k)
///
/// 用乘法递推代替阶乘，n 较大时也不会溢出。
pub fn binomial(n: u32, k: u32) -> f64 {
    if k > n {
        return 0.0;
    }
    let k = k.min(n - k);
    (0..k).fold(1.0, |acc, i| acc * f64::from(n - i) / f64::from(i + 1))
}

/// Bernstein 基函数 b(i,n)(t) = C(n,i) · t^i · (1-t)^(n-i)
pub fn bernstein(t: f64, i: u32, n: u32) -> f64 {
    binomial(n, i) * t.powi(i as i32) * (1.0 - t).powi((n - i) as i32)
}

/// 在参数 t 处求曲线点
pub fn evaluate(control: &[Point], t: f64) -> Result<Point> {
    if control.is_empty() {
        return Err(TrajectoryError::EmptyControlPoints);
    }
    if !(0.0..=1.0).contains(&t) {
        return Err(TrajectoryError::OutOfUnitRange(t));
    }
    Ok(weighted_sum(control, t))
}

/// 在 t = k/(N-1), k = 0..N-1 处均匀采样 N 个点
///
/// t=0 与 t=1 时权重退化为选择首/尾控制点，因此首尾采样与端点完全相等。
pub fn sample_curve(control: &[Point], n_points: usize) -> Result<Vec<Point>> {
    if control.is_empty() {
        return Err(TrajectoryError::EmptyControlPoints);
    }
    if n_points == 0 {
        return Err(TrajectoryError::ZeroSamples);
    }
    if !control.iter().all(Point::is_finite) {
        return Err(TrajectoryError::NonNumeric { what: "控制点" });
    }

    let denom = n_points.saturating_sub(1).max(1) as f64;
    Ok((0..n_points)
        .map(|k| weighted_sum(control, k as f64 / denom))
        .collect())
}

fn weighted_sum(control: &[Point], t: f64) -> Point {
    let n = (control.len() - 1) as u32;
    control
        .iter()
        .enumerate()
        .fold(Point::new(0.0, 0.0), |acc, (i, p)| {
            let w = bernstein(t, i as u32, n);
            Point::new(acc.x + p.x * w, acc.y + p.y * w)
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cubic() -> Vec<Point> {
        vec![
            Point::new(0.0, 0.0),
            Point::new(25.0, 80.0),
            Point::new(75.0, -40.0),
            Point::new(100.0, 10.0),
        ]
    }

    #[test]
    fn test_binomial_values() {
        assert_eq!(binomial(0, 0), 1.0);
        assert_eq!(binomial(3, 1), 3.0);
        assert_eq!(binomial(5, 2), 10.0);
        assert_eq!(binomial(10, 5), 252.0);
        assert_eq!(binomial(3, 4), 0.0);
        // 阶乘实现在 n=21 时已溢出 i64
        assert!((binomial(30, 15) - 155_117_520.0).abs() < 1e-3);
    }

    #[test]
    fn test_partition_of_unity() {
        for n in 0..=12 {
            for step in 0..=20 {
                let t = step as f64 / 20.0;
                let sum: f64 = (0..=n).map(|i| bernstein(t, i, n)).sum();
                assert!((sum - 1.0).abs() < 1e-9, "n={n} t={t} sum={sum}");
            }
        }
    }

    #[test]
    fn test_sample_endpoints_exact() {
        let control = cubic();
        let pts = sample_curve(&control, 50).unwrap();
        assert_eq!(pts.len(), 50);
        assert_eq!(pts[0], control[0]);
        assert_eq!(pts[49], control[3]);
    }

    #[test]
    fn test_linear_midpoint() {
        let control = [Point::new(0.0, 0.0), Point::new(10.0, 20.0)];
        let mid = evaluate(&control, 0.5).unwrap();
        assert!((mid.x - 5.0).abs() < 1e-12);
        assert!((mid.y - 10.0).abs() < 1e-12);
    }

    #[test]
    fn test_single_control_point() {
        let control = [Point::new(3.0, 4.0)];
        let pts = sample_curve(&control, 3).unwrap();
        assert!(pts.iter().all(|p| *p == control[0]));
    }

    #[test]
    fn test_invalid_inputs() {
        assert_eq!(sample_curve(&[], 5), Err(TrajectoryError::EmptyControlPoints));
        assert_eq!(sample_curve(&cubic(), 0), Err(TrajectoryError::ZeroSamples));
        let bad = [Point::new(f64::NAN, 0.0), Point::new(1.0, 1.0)];
        assert!(matches!(
            sample_curve(&bad, 2),
            Err(TrajectoryError::NonNumeric { .. })
        ));
        assert!(evaluate(&[], 0.5).is_err());
        assert_eq!(evaluate(&cubic(), 1.5), Err(TrajectoryError::OutOfUnitRange(1.5)));
        assert_eq!(evaluate(&cubic(), -0.1), Err(TrajectoryError::OutOfUnitRange(-0.1)));
        assert!(matches!(
            evaluate(&cubic(), f64::NAN),
            Err(TrajectoryError::OutOfUnitRange(_))
        ));
        assert_eq!(evaluate(&cubic(), 1.0).unwrap(), Point::new(100.0, 10.0));
    }
}
