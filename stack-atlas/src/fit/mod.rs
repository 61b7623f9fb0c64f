//! 两组对应标志点之间的全局对齐.
//!
//! 给定一一对应的源点集与目标点集, 求把源空间映射到目标空间的三维变换.
//! 两种策略共享点数、退化性等校验:
//!
//! 1. [`FitStrategy::LeastSquaresAffine`]: 一般仿射, 正规方程求解. 需要至少 4 个非共面点.
//! 2. [`FitStrategy::RigidSimilarity`]: Umeyama 刚体 (可选各向同性缩放), 带反射修正.
//!   需要至少 3 个不共线点.
//!
//! 解出的线性部分奇异 (例如目标点集共面) 时同样视为退化, 不返回结果.

use crate::consts::{DEGENERATE_EPS, MIN_AFFINE_FIT_POINTS, MIN_FIT_POINTS};
use crate::error::{AtlasError, AtlasResult};
use crate::landmark::{common_keys, paired_points, LandmarkSet};
use crate::transform::Transform3d;
use itertools::izip;
use nalgebra::{DMatrix, Point3};

mod affine;
mod similarity;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 拟合策略.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum FitStrategy {
    /// 最小二乘一般仿射.
    LeastSquaresAffine,

    /// 刚体 (旋转 + 平移). `allow_scale` 为真时额外求解各向同性缩放.
    RigidSimilarity {
        /// 是否求解缩放.
        allow_scale: bool,
    },
}

impl Default for FitStrategy {
    fn default() -> Self {
        Self::RigidSimilarity { allow_scale: false }
    }
}

/// 拟合结果.
#[derive(Debug, Clone, PartialEq)]
pub struct AlignmentFit {
    /// 把源空间的点映射到目标空间.
    pub transform: Transform3d,

    /// 使用的策略.
    pub strategy: FitStrategy,

    /// 残差的均方根.
    pub rms: f64,

    /// 每个对应点的残差 `|T(src) - tgt|`.
    pub residuals: Vec<f64>,

    /// 参与拟合的标志点名称 (字典序). 直接以坐标拟合时为空.
    pub keys: Vec<String>,
}

/// 点集对齐器.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSetAligner {
    strategy: FitStrategy,
    region: Option<Vec<String>>,
}

impl PointSetAligner {
    /// 使用 `strategy` 创建对齐器.
    pub fn new(strategy: FitStrategy) -> Self {
        Self {
            strategy,
            region: None,
        }
    }

    /// 只使用名称 (或去除 `_L`/`_R` 后的基础名称) 位于 `region` 中的标志点.
    pub fn with_region<I, S>(mut self, region: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.region = Some(region.into_iter().map(Into::into).collect());
        self
    }

    /// 当前策略.
    #[inline]
    pub fn strategy(&self) -> FitStrategy {
        self.strategy
    }

    /// 以坐标序列拟合. `source[i]` 与 `target[i]` 对应.
    pub fn fit(&self, source: &[Point3<f64>], target: &[Point3<f64>]) -> AtlasResult<AlignmentFit> {
        validate(source, target, self.strategy)?;
        let transform = match self.strategy {
            FitStrategy::LeastSquaresAffine => affine::solve(source, target)?,
            FitStrategy::RigidSimilarity { allow_scale } => {
                similarity::solve(source, target, allow_scale)?
            }
        };

        let residuals: Vec<f64> = izip!(source, target)
            .map(|(x, y)| (transform.apply_point(x) - y).norm())
            .collect();
        let rms = (residuals.iter().map(|r| r * r).sum::<f64>() / residuals.len() as f64).sqrt();
        log::debug!(
            "{:?}: {} 个对应点, rms = {rms:.6}",
            self.strategy,
            residuals.len()
        );

        Ok(AlignmentFit {
            transform,
            strategy: self.strategy,
            rms,
            residuals,
            keys: Vec::new(),
        })
    }

    /// 以两个标志点集合拟合: 先取共有名称 (字典序, 受 `region` 限制), 再提取坐标.
    pub fn fit_sets(&self, source: &LandmarkSet, target: &LandmarkSet) -> AtlasResult<AlignmentFit> {
        let keys = common_keys(source, target, self.region.as_deref());
        let (src, tgt) = paired_points(source, target, &keys);
        let mut ret = self.fit(&src, &tgt)?;
        ret.keys = keys;
        Ok(ret)
    }
}

/// 以 `strategy` 拟合 `source -> target`.
#[inline]
pub fn fit(
    source: &[Point3<f64>],
    target: &[Point3<f64>],
    strategy: FitStrategy,
) -> AtlasResult<AlignmentFit> {
    PointSetAligner::new(strategy).fit(source, target)
}

/// 点集质心. 调用方保证非空.
pub(crate) fn centroid(points: &[Point3<f64>]) -> Point3<f64> {
    let sum = points
        .iter()
        .fold(nalgebra::Vector3::zeros(), |acc, p| acc + p.coords);
    Point3::from(sum / points.len() as f64)
}

/// 中心化点集 (`n × 3` 数据矩阵) 的奇异值, 降序.
fn centered_singular_values(points: &[Point3<f64>]) -> [f64; 3] {
    let mu = centroid(points);
    let centered = DMatrix::from_fn(points.len(), 3, |r, c| points[r][c] - mu[c]);
    let mut s = [0.0; 3];
    for (dst, v) in s.iter_mut().zip(centered.singular_values().iter()) {
        *dst = *v;
    }
    s.sort_by(|a, b| b.total_cmp(a));
    s
}

fn validate(
    source: &[Point3<f64>],
    target: &[Point3<f64>],
    strategy: FitStrategy,
) -> AtlasResult<()> {
    if source.len() != target.len() {
        return Err(AtlasError::LengthMismatch {
            source_len: source.len(),
            target_len: target.len(),
        });
    }
    let need = match strategy {
        FitStrategy::LeastSquaresAffine => MIN_AFFINE_FIT_POINTS,
        FitStrategy::RigidSimilarity { .. } => MIN_FIT_POINTS,
    };
    if source.len() < need {
        return Err(AtlasError::UnderdeterminedFit {
            got: source.len(),
            need,
        });
    }
    let finite = |p: &Point3<f64>| p.iter().all(|v| v.is_finite());
    if !source.iter().chain(target).all(finite) {
        return Err(AtlasError::DegenerateGeometry);
    }

    let [s1, s2, s3] = centered_singular_values(source);
    let collinear = s2 <= DEGENERATE_EPS * s1;
    let coplanar = s3 <= DEGENERATE_EPS * s1;
    match strategy {
        _ if collinear => Err(AtlasError::DegenerateGeometry),
        FitStrategy::LeastSquaresAffine if coplanar => Err(AtlasError::DegenerateGeometry),
        _ => Ok(()),
    }
}
