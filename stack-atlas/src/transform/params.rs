//! 外部配准引擎使用的 6 参数二维仿射表示.

use super::Transform2d;
use crate::error::{AtlasError, AtlasResult};
use nalgebra::Matrix3;
use std::fmt::{self, Formatter};
use std::str::FromStr;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 6 参数二维仿射变换 `(sx, rx, ry, sy, tx, ty)`.
///
/// 与齐次矩阵的对应关系 (与 ImageMagick `AffineProjection` 相同):
///
/// ```text
/// [ sx  ry  tx ]
/// [ rx  sy  ty ]
/// [ 0   0   1  ]
/// ```
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct AffineParams {
    /// `T[0, 0]`.
    pub sx: f64,
    /// `T[1, 0]`.
    pub rx: f64,
    /// `T[0, 1]`.
    pub ry: f64,
    /// `T[1, 1]`.
    pub sy: f64,
    /// `T[0, 2]`.
    pub tx: f64,
    /// `T[1, 2]`.
    pub ty: f64,
}

impl AffineParams {
    /// 单位变换的参数.
    pub const IDENTITY: AffineParams = AffineParams {
        sx: 1.0,
        rx: 0.0,
        ry: 0.0,
        sy: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    /// 转换为齐次变换. 第三行固定为 `[0, 0, 1]`.
    ///
    /// 参数含非有限值时返回 [`AtlasError::NotAffine`].
    pub fn to_transform(&self) -> AtlasResult<Transform2d> {
        let Self {
            sx,
            rx,
            ry,
            sy,
            tx,
            ty,
        } = *self;
        Transform2d::from_matrix(Matrix3::new(sx, ry, tx, rx, sy, ty, 0.0, 0.0, 1.0))
    }

    /// 以数组形式获取参数, 顺序为 `[sx, rx, ry, sy, tx, ty]`.
    #[inline]
    pub fn to_array(&self) -> [f64; 6] {
        [self.sx, self.rx, self.ry, self.sy, self.tx, self.ty]
    }
}

impl From<&Transform2d> for AffineParams {
    fn from(t: &Transform2d) -> Self {
        let m = t.matrix();
        Self {
            sx: m[(0, 0)],
            rx: m[(1, 0)],
            ry: m[(0, 1)],
            sy: m[(1, 1)],
            tx: m[(0, 2)],
            ty: m[(1, 2)],
        }
    }
}

impl From<Transform2d> for AffineParams {
    #[inline]
    fn from(t: Transform2d) -> Self {
        Self::from(&t)
    }
}

impl TryFrom<AffineParams> for Transform2d {
    type Error = AtlasError;

    #[inline]
    fn try_from(p: AffineParams) -> Result<Self, Self::Error> {
        p.to_transform()
    }
}

impl From<[f64; 6]> for AffineParams {
    fn from([sx, rx, ry, sy, tx, ty]: [f64; 6]) -> Self {
        Self {
            sx,
            rx,
            ry,
            sy,
            tx,
            ty,
        }
    }
}

/// 按 `sx,rx,ry,sy,tx,ty` 逗号分隔格式输出, 与 `FromStr` 互逆.
impl fmt::Display for AffineParams {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let [a, b, c, d, e, g] = self.to_array();
        write!(f, "{a},{b},{c},{d},{e},{g}")
    }
}

/// 解析 `"sx,rx,ry,sy,tx,ty"`. 允许逗号两侧有空白.
impl FromStr for AffineParams {
    type Err = AtlasError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(|v| v.trim().parse::<f64>())
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| AtlasError::ParseParams(format!("{s:?}: {e}")))?;
        let arr: [f64; 6] = values.try_into().map_err(|v: Vec<f64>| {
            AtlasError::ParseParams(format!("需要 6 个参数, 得到 {} 个", v.len()))
        })?;
        Ok(arr.into())
    }
}
