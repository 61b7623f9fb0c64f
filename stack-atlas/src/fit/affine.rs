//! 最小二乘仿射拟合.
//!
//! 记 `X = [src | 1]` (`n × 4`), `Y = tgt` (`n × 3`), 解正规方程
//! `A = (XᵀX)⁻¹ XᵀY`, 齐次矩阵即 `Aᵀ` 加上末行 `[0, 0, 0, 1]`.

use crate::error::{AtlasError, AtlasResult};
use crate::transform::Transform3d;
use itertools::izip;
use nalgebra::{Matrix4, Matrix4x3, Point3, Vector4};

pub(super) fn solve(source: &[Point3<f64>], target: &[Point3<f64>]) -> AtlasResult<Transform3d> {
    let mut xtx = Matrix4::<f64>::zeros();
    let mut xty = Matrix4x3::<f64>::zeros();
    for (x, y) in izip!(source, target) {
        let xh = Vector4::new(x.x, x.y, x.z, 1.0);
        xtx += xh * xh.transpose();
        xty += xh * y.coords.transpose();
    }

    let a = xtx
        .try_inverse()
        .ok_or(AtlasError::DegenerateGeometry)?
        * xty;

    let mut m = Matrix4::identity();
    m.fixed_view_mut::<3, 4>(0, 0).copy_from(&a.transpose());
    let t = Transform3d::from_matrix(m).map_err(|_| AtlasError::DegenerateGeometry)?;
    // 目标点集退化 (如共面) 时, 解出的线性部分奇异.
    t.ensure_invertible(0)
        .map_err(|_| AtlasError::DegenerateGeometry)?;
    Ok(t)
}
