//! 结构原点的推导与变换.

use super::StructureVolume;
use crate::transform::Transform3d;
use nalgebra::Point3;
use std::collections::BTreeMap;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 对结构原点施加全局变换时, 以哪一点为准.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum OriginPivot {
    /// 直接变换原点 (数组 `[0, 0, 0]` 处的角点).
    #[default]
    Corner,

    /// 变换体积中心, 再由中心反推角点: `start = T(origin + shape / 2) - shape / 2`.
    Center,
}

impl<T> StructureVolume<T> {
    /// 对原点施加 `transform` 后的新原点. 体积数据本身不重采样.
    pub fn map_origin(&self, transform: &Transform3d, pivot: OriginPivot) -> [f64; 3] {
        let (r, c, z) = self.shape();
        let half = [r as f64 / 2.0, c as f64 / 2.0, z as f64 / 2.0];
        let o = self.origin;
        match pivot {
            OriginPivot::Corner => transform.apply_point(&Point3::from(o)).into(),
            OriginPivot::Center => {
                let center = Point3::new(o[0] + half[0], o[1] + half[1], o[2] + half[2]);
                let p = transform.apply_point(&center);
                [p.x - half[0], p.y - half[1], p.z - half[2]]
            }
        }
    }

    /// 同 [`map_origin`](Self::map_origin), 但直接替换原点.
    pub fn with_mapped_origin(mut self, transform: &Transform3d, pivot: OriginPivot) -> Self {
        self.origin = self.map_origin(transform, pivot);
        self
    }
}

/// 由逐切片轮廓推出结构的原点与平面跨度.
///
/// `contours` 为 `切片 z -> [(x, y)]`. 返回 `(origin, (rows, cols))`, 其中
/// `origin = [min_y, min_x, min_z]` 按数组轴顺序 `(row, col, z)` 排列,
/// 跨度为 `(max_y - min_y, max_x - min_x)` 向零取整.
/// 没有任何轮廓点时返回 `None`.
pub fn origin_and_extent(
    contours: &BTreeMap<i64, Vec<[f64; 2]>>,
) -> Option<([f64; 3], (usize, usize))> {
    let min_z = contours
        .iter()
        .find(|(_, pts)| !pts.is_empty())
        .map(|(z, _)| *z)?;

    let (mut min_x, mut min_y) = (f64::INFINITY, f64::INFINITY);
    let (mut max_x, mut max_y) = (f64::NEG_INFINITY, f64::NEG_INFINITY);
    for [x, y] in contours.values().flatten() {
        min_x = min_x.min(*x);
        min_y = min_y.min(*y);
        max_x = max_x.max(*x);
        max_y = max_y.max(*y);
    }

    let span = |hi: f64, lo: f64| (hi - lo).max(0.0) as usize;
    Some((
        [min_y, min_x, min_z as f64],
        (span(max_y, min_y), span(max_x, min_x)),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Vector3;
    use ndarray::Array3;

    #[test]
    fn test_map_origin() {
        let v = StructureVolume::new("s", Array3::<u8>::zeros((4, 2, 6)), [10.0, 20.0, 30.0]);
        let t = Transform3d::translation_xyz(Vector3::new(1.0, -2.0, 0.5));
        assert_eq!(v.map_origin(&t, OriginPivot::Corner), [11.0, 18.0, 30.5]);
        assert_eq!(v.map_origin(&t, OriginPivot::Center), [11.0, 18.0, 30.5]);

        // 缩放 2 倍: 中心 (12, 21, 33) -> (24, 42, 66), 再减去半尺寸.
        let s = Transform3d::from_rotation_translation(
            &nalgebra::Matrix3::identity(),
            &Vector3::zeros(),
            2.0,
        );
        let o = v.map_origin(&s, OriginPivot::Center);
        assert_relative_eq!(o[0], 22.0);
        assert_relative_eq!(o[1], 41.0);
        assert_relative_eq!(o[2], 63.0);
        let moved = v.with_mapped_origin(&s, OriginPivot::Corner);
        assert_eq!(moved.origin, [20.0, 40.0, 60.0]);
    }

    #[test]
    fn test_origin_and_extent() {
        let mut contours = BTreeMap::new();
        contours.insert(12, vec![[100.0, 50.0], [130.5, 80.0]]);
        contours.insert(11, vec![]);
        contours.insert(14, vec![[90.0, 60.0], [120.0, 95.9]]);
        let (origin, span) = origin_and_extent(&contours).unwrap();
        assert_eq!(origin, [50.0, 90.0, 12.0]);
        assert_eq!(span, (45, 40));

        assert!(origin_and_extent(&BTreeMap::new()).is_none());
    }
}
