//! Umeyama 刚体 / 相似变换拟合.
//!
//! 参考: S. Umeyama, "Least-squares estimation of transformation parameters
//! between two point patterns", IEEE TPAMI 13(4), 1991.

use super::centroid;
use crate::error::{AtlasError, AtlasResult};
use crate::transform::Transform3d;
use itertools::izip;
use nalgebra::{Matrix3, Point3, Vector3};

pub(super) fn solve(
    source: &[Point3<f64>],
    target: &[Point3<f64>],
    allow_scale: bool,
) -> AtlasResult<Transform3d> {
    let n = source.len() as f64;
    let mu_x = centroid(source);
    let mu_y = centroid(target);

    let mut sigma = Matrix3::<f64>::zeros();
    let mut var_x = 0.0;
    for (x, y) in izip!(source, target) {
        let dx = x - mu_x;
        let dy = y - mu_y;
        sigma += dy * dx.transpose();
        var_x += dx.norm_squared();
    }
    sigma /= n;
    var_x /= n;

    let svd = sigma.svd(true, true);
    let (u, v_t) = match (svd.u, svd.v_t) {
        (Some(u), Some(v_t)) => (u, v_t),
        _ => return Err(AtlasError::DegenerateGeometry),
    };
    let d = svd.singular_values;

    // 反射修正作用在最小奇异值对应的方向上.
    let mut s = [1.0; 3];
    if u.determinant() * v_t.determinant() < 0.0 {
        s[d.imin()] = -1.0;
    }
    let r = u * Matrix3::from_diagonal(&Vector3::from(s)) * v_t;

    let c = if allow_scale {
        let trace: f64 = izip!(d.iter(), s.iter()).map(|(d, s)| d * s).sum();
        trace / var_x
    } else {
        1.0
    };
    if !c.is_finite() || c <= 0.0 {
        return Err(AtlasError::DegenerateGeometry);
    }

    let t = mu_y.coords - c * r * mu_x.coords;
    let ret = Transform3d::from_rotation_translation(&r, &t, c);
    ret.ensure_invertible(0)
        .map_err(|_| AtlasError::DegenerateGeometry)?;
    Ok(ret)
}
