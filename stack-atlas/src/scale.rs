//! 不同采样分辨率之间的坐标换算.
//!
//! 分辨率以 "每像素 (体素) 对应的物理长度" 表示, 如 0.325 µm/px 或 25 µm/voxel.
//! 在分辨率 `from` 下计算出的变换换算到分辨率 `to` 时, 位置按 `from / to`
//! 等比缩放, 方向与相对尺度不变, 因此只有平移部分需要缩放.

use crate::error::{AtlasError, AtlasResult};
use crate::transform::{Transform2d, Transform3d};
use nalgebra::Point3;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 采样分辨率 (每像素物理长度). 总是正的有限值.
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(try_from = "f64", into = "f64"))]
pub struct Resolution(f64);

impl Resolution {
    /// 构建分辨率. `value` 必须为正的有限值, 否则返回 `None`.
    pub fn new(value: f64) -> Option<Self> {
        is_valid(value).then_some(Self(value))
    }

    /// 分辨率数值.
    #[inline]
    pub fn get(&self) -> f64 {
        self.0
    }
}

impl TryFrom<f64> for Resolution {
    type Error = AtlasError;

    fn try_from(value: f64) -> Result<Self, Self::Error> {
        Self::new(value).ok_or(AtlasError::InvalidResolution {
            from: value,
            to: value,
        })
    }
}

impl From<Resolution> for f64 {
    #[inline]
    fn from(r: Resolution) -> Self {
        r.0
    }
}

#[inline]
fn is_valid(v: f64) -> bool {
    v.is_finite() && v > 0.0
}

/// 计算从分辨率 `from` 换算到 `to` 的缩放因子 `from / to`.
///
/// 任一分辨率非正或非有限时返回 [`AtlasError::InvalidResolution`].
pub fn scale_factor(from: f64, to: f64) -> AtlasResult<f64> {
    if is_valid(from) && is_valid(to) {
        Ok(from / to)
    } else {
        Err(AtlasError::InvalidResolution { from, to })
    }
}

/// 可以在不同分辨率之间换算的对象.
pub trait Rescale: Sized {
    /// 以缩放因子 `factor` 换算. 调用方保证 `factor` 合法.
    fn rescale_by(&self, factor: f64) -> Self;

    /// 从分辨率 `from` 换算到分辨率 `to`.
    #[inline]
    fn rescale(&self, from: f64, to: f64) -> AtlasResult<Self> {
        Ok(self.rescale_by(scale_factor(from, to)?))
    }
}

impl Rescale for Transform2d {
    #[inline]
    fn rescale_by(&self, factor: f64) -> Self {
        self.scale_translation(factor)
    }
}

impl Rescale for Transform3d {
    #[inline]
    fn rescale_by(&self, factor: f64) -> Self {
        self.scale_translation(factor)
    }
}

impl Rescale for Point3<f64> {
    #[inline]
    fn rescale_by(&self, factor: f64) -> Self {
        Point3::from(self.coords * factor)
    }
}

/// 将变换从分辨率 `from` 换算到分辨率 `to`: 平移部分乘以 `from / to`.
#[inline]
pub fn rescale<T: Rescale>(transform: &T, from: f64, to: f64) -> AtlasResult<T> {
    transform.rescale(from, to)
}

/// 将点坐标从分辨率 `from` 换算到分辨率 `to`.
///
/// 例如标志点以微米给出 (`from = 1.0`), 图谱体素为 25 µm (`to = 25.0`).
#[inline]
pub fn rescale_point(p: &Point3<f64>, from: f64, to: f64) -> AtlasResult<Point3<f64>> {
    p.rescale(from, to)
}

/// 批量换算点坐标. 分辨率只校验一次.
pub fn rescale_points(points: &[Point3<f64>], from: f64, to: f64) -> AtlasResult<Vec<Point3<f64>>> {
    let factor = scale_factor(from, to)?;
    Ok(points.iter().map(|p| p.rescale_by(factor)).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invalid_resolution() {
        let t = Transform2d::identity();
        for (from, to) in [(0.0, 1.0), (1.0, 0.0), (-1.0, 2.0), (1.0, f64::NAN)] {
            assert!(matches!(
                rescale(&t, from, to),
                Err(AtlasError::InvalidResolution { .. })
            ));
        }
        assert!(Resolution::new(0.0).is_none());
        assert!(Resolution::new(-0.3).is_none());
        assert_eq!(Resolution::new(0.325).map(|r| r.get()), Some(0.325));
    }

    #[test]
    fn test_only_translation_changes() {
        let t = Transform2d::rigid(0.4, 100.0, -30.0);
        let s = rescale(&t, 10.4, 0.325).unwrap();
        assert_eq!(s.linear(), t.linear());
        assert_relative_eq!(s.translation().x, 100.0 * 32.0, epsilon = 1e-9);
        assert_relative_eq!(s.translation().y, -30.0 * 32.0, epsilon = 1e-9);
    }

    #[test]
    fn test_round_trip() {
        let t = Transform2d::rigid(-1.1, 7.5, 3.25);
        for (r1, r2) in [(0.325, 10.4), (1.0, 25.0), (3.0, 0.7), (2.0, 2.0)] {
            let back = rescale(&rescale(&t, r1, r2).unwrap(), r2, r1).unwrap();
            assert!(back.max_abs_diff(&t) < 1e-9);
        }

        let t3 = Transform3d::translation_xyz(nalgebra::Vector3::new(1.0, 2.0, 3.0));
        let back = rescale(&rescale(&t3, 0.46, 10.0).unwrap(), 10.0, 0.46).unwrap();
        assert!(back.max_abs_diff(&t3) < 1e-12);
    }

    #[test]
    fn test_points() {
        let pts = [Point3::new(250.0, 500.0, 50.0), Point3::new(0.0, 25.0, -25.0)];
        let out = rescale_points(&pts, 1.0, 25.0).unwrap();
        assert_relative_eq!(out[0], Point3::new(10.0, 20.0, 2.0), epsilon = 1e-12);
        assert_relative_eq!(out[1], Point3::new(0.0, 1.0, -1.0), epsilon = 1e-12);
        assert_relative_eq!(
            rescale_point(&pts[0], 1.0, 25.0).unwrap(),
            out[0],
            epsilon = 1e-12
        );
    }
}
