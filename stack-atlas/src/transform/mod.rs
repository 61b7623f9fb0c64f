//! 齐次坐标下的仿射变换.
//!
//! 二维变换以 3×3 矩阵表示, 作用于切片平面 `(x, y)`;
//! 三维变换以 4×4 矩阵表示, 作用于标本空间或图谱体素空间.
//! 两者都是不可变值对象, 复合总是产生新值.
//!
//! 约定: `a * b` 表示先作用 `b` 再作用 `a`, 与矩阵乘法一致.

use crate::consts::SINGULAR_EPS;
use crate::error::{AtlasError, AtlasResult};
use nalgebra::{Matrix2, Matrix3, Matrix4, Point2, Point3, Vector2, Vector3};
use std::ops::Mul;

mod params;

pub use params::AffineParams;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

macro_rules! impl_transform {
    ($name: ident, $mat: ty, $lin: ty, $vec: ty, $point: ty, $n: expr) => {
        impl $name {
            /// 单位变换.
            #[inline]
            pub fn identity() -> Self {
                Self(<$mat>::identity())
            }

            /// 从齐次矩阵构建变换.
            ///
            /// 最后一行必须 (精确地) 为 `[0, .., 0, 1]`, 且所有元素有限, 否则返回
            /// [`AtlasError::NotAffine`]. 该方法不检查线性部分是否奇异,
            /// 奇异性在求逆或参与合成时检查.
            pub fn from_matrix(m: $mat) -> AtlasResult<Self> {
                let last = $n - 1;
                let bottom_ok = (0..last).all(|c| m[(last, c)] == 0.0) && m[(last, last)] == 1.0;
                if bottom_ok && m.iter().all(|v| v.is_finite()) {
                    Ok(Self(m))
                } else {
                    Err(AtlasError::NotAffine)
                }
            }

            /// 获取底层齐次矩阵.
            #[inline]
            pub fn matrix(&self) -> &$mat {
                &self.0
            }

            /// 左上角线性部分 (旋转/剪切/缩放).
            #[inline]
            pub fn linear(&self) -> $lin {
                self.0.fixed_view::<{ $n - 1 }, { $n - 1 }>(0, 0).into_owned()
            }

            /// 平移部分 (最后一列, 不含齐次行).
            #[inline]
            pub fn translation(&self) -> $vec {
                self.0.fixed_view::<{ $n - 1 }, 1>(0, $n - 1).into_owned()
            }

            /// 线性部分的行列式.
            #[inline]
            pub fn determinant(&self) -> f64 {
                self.linear().determinant()
            }

            /// 线性部分是否可逆 (行列式绝对值大于 [`SINGULAR_EPS`]).
            #[inline]
            pub fn is_invertible(&self) -> bool {
                self.determinant().abs() > SINGULAR_EPS
            }

            /// 若不可逆, 返回以 `index` 标记的 [`AtlasError::SingularTransform`].
            #[inline]
            pub fn ensure_invertible(&self, index: usize) -> AtlasResult<()> {
                if self.is_invertible() {
                    Ok(())
                } else {
                    Err(AtlasError::SingularTransform { index })
                }
            }

            /// 求逆变换. 线性部分奇异时返回 [`AtlasError::SingularTransform`] (`index = 0`).
            pub fn try_inverse(&self) -> AtlasResult<Self> {
                self.try_inverse_at(0)
            }

            /// 同 `try_inverse`, 但错误中携带切片索引 `index`.
            pub fn try_inverse_at(&self, index: usize) -> AtlasResult<Self> {
                self.ensure_invertible(index)?;
                let mut inv = self
                    .0
                    .try_inverse()
                    .ok_or(AtlasError::SingularTransform { index })?;
                // 求逆的数值误差不应破坏齐次行.
                let last = $n - 1;
                for c in 0..last {
                    inv[(last, c)] = 0.0;
                }
                inv[(last, last)] = 1.0;
                Ok(Self(inv))
            }

            /// 复合: 先作用 `other`, 再作用 `self`.
            #[inline]
            pub fn then_after(&self, other: &Self) -> Self {
                Self(self.0 * other.0)
            }

            /// 对点施加变换.
            #[inline]
            pub fn apply_point(&self, p: &$point) -> $point {
                self.0.transform_point(p)
            }

            /// 对向量施加变换 (忽略平移).
            #[inline]
            pub fn apply_vector(&self, v: &$vec) -> $vec {
                self.linear() * v
            }

            /// 仅将平移部分乘以 `factor`, 线性部分保持不变.
            #[inline]
            pub fn scale_translation(&self, factor: f64) -> Self {
                let mut m = self.0;
                for r in 0..($n - 1) {
                    m[(r, $n - 1)] *= factor;
                }
                Self(m)
            }

            /// 与 `other` 的逐元素最大绝对差.
            pub fn max_abs_diff(&self, other: &Self) -> f64 {
                self.0
                    .iter()
                    .zip(other.0.iter())
                    .map(|(a, b)| (a - b).abs())
                    .fold(0.0, f64::max)
            }

            /// 是否与单位变换 **精确** 相等.
            #[inline]
            pub fn is_identity(&self) -> bool {
                self.0 == <$mat>::identity()
            }
        }

        impl Default for $name {
            #[inline]
            fn default() -> Self {
                Self::identity()
            }
        }

        impl Mul for $name {
            type Output = $name;

            #[inline]
            fn mul(self, rhs: $name) -> $name {
                self.then_after(&rhs)
            }
        }

        impl Mul<&$name> for &$name {
            type Output = $name;

            #[inline]
            fn mul(self, rhs: &$name) -> $name {
                self.then_after(rhs)
            }
        }
    };
}

/// 二维齐次仿射变换 (3×3).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "AffineParams", try_from = "AffineParams"))]
pub struct Transform2d(Matrix3<f64>);

/// 三维齐次仿射变换 (4×4).
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(into = "[[f64; 4]; 4]", try_from = "[[f64; 4]; 4]"))]
pub struct Transform3d(Matrix4<f64>);

impl_transform!(Transform2d, Matrix3<f64>, Matrix2<f64>, Vector2<f64>, Point2<f64>, 3);
impl_transform!(Transform3d, Matrix4<f64>, Matrix3<f64>, Vector3<f64>, Point3<f64>, 4);

impl Transform2d {
    /// 纯平移.
    #[inline]
    pub fn translation_xy(tx: f64, ty: f64) -> Self {
        Self(Matrix3::new(1.0, 0.0, tx, 0.0, 1.0, ty, 0.0, 0.0, 1.0))
    }

    /// 绕原点逆时针旋转 `radians` 弧度.
    #[inline]
    pub fn rotation(radians: f64) -> Self {
        let (s, c) = radians.sin_cos();
        Self(Matrix3::new(c, -s, 0.0, s, c, 0.0, 0.0, 0.0, 1.0))
    }

    /// 先旋转 `radians`, 再平移 `(tx, ty)`.
    #[inline]
    pub fn rigid(radians: f64, tx: f64, ty: f64) -> Self {
        Self::translation_xy(tx, ty) * Self::rotation(radians)
    }
}

impl Transform3d {
    /// 纯平移.
    #[inline]
    pub fn translation_xyz(t: Vector3<f64>) -> Self {
        Self(Matrix4::new_translation(&t))
    }

    /// 由线性部分 `r`, 平移 `t` 和各向同性缩放 `scale` 组装 `x -> scale * r * x + t`.
    pub fn from_rotation_translation(r: &Matrix3<f64>, t: &Vector3<f64>, scale: f64) -> Self {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&(r * scale));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(t);
        Self(m)
    }
}

impl From<Transform3d> for [[f64; 4]; 4] {
    fn from(t: Transform3d) -> Self {
        let mut rows = [[0.0; 4]; 4];
        for (r, row) in rows.iter_mut().enumerate() {
            for (c, v) in row.iter_mut().enumerate() {
                *v = t.0[(r, c)];
            }
        }
        rows
    }
}

impl TryFrom<[[f64; 4]; 4]> for Transform3d {
    type Error = AtlasError;

    fn try_from(rows: [[f64; 4]; 4]) -> Result<Self, Self::Error> {
        Self::from_matrix(Matrix4::from_fn(|r, c| rows[r][c]))
    }
}
