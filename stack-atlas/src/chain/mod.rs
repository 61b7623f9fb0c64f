//! 相邻切片变换链的合成.
//!
//! 外部配准引擎为每对相邻切片 `(i - 1, i)` 给出变换 `P[i]`, 它总是指向
//! "前一张" 切片. 本模块把这些变换合成为 "每张切片到锚点切片" 的变换:
//!
//! - 锚点本身: 单位变换.
//! - 锚点之下 (`index < anchor`): `T = inv(P[anchor]) · … · inv(P[index + 1])`.
//! - 锚点之上 (`index > anchor`): `T = P[index] · … · P[anchor + 1]`.
//!
//! 两个方向各自只维护一个累乘结果, 总代价为 `O(N)`. 合成不做任何正交化修正,
//! 距锚点越远数值漂移越大, 调用方应当容忍这一点.

use crate::error::{AtlasError, AtlasResult};
use crate::scale::Rescale;
use crate::transform::{AffineParams, Transform2d};
use std::cmp::Ordering;

mod pairwise;

pub use pairwise::PairwiseTransforms;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 切片相对锚点的位置, 决定合成的方向.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    /// 锚点本身.
    Anchor,

    /// 索引小于锚点, 需要沿逆变换向上走.
    BelowAnchor,

    /// 索引大于锚点, 直接累乘相邻变换.
    AboveAnchor,
}

impl Direction {
    /// 计算切片 `index` 相对锚点 `anchor` 的方向.
    #[inline]
    pub fn of(index: usize, anchor: usize) -> Self {
        match index.cmp(&anchor) {
            Ordering::Less => Self::BelowAnchor,
            Ordering::Equal => Self::Anchor,
            Ordering::Greater => Self::AboveAnchor,
        }
    }
}

/// 锚点选取策略. 锚点总是由调用方显式给出.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "snake_case"))]
pub enum AnchorPolicy {
    /// 第一张切片 `0`.
    First,

    /// 中间切片 `N / 2`.
    #[default]
    Middle,

    /// 最后一张切片 `N - 1`.
    Last,

    /// 指定索引.
    Index(usize),
}

impl AnchorPolicy {
    /// 对 `len` 张切片解析出锚点索引.
    ///
    /// `len == 0`, 或 `Index(i)` 越界时返回 [`AtlasError::InvalidAnchor`].
    pub fn resolve(&self, len: usize) -> AtlasResult<usize> {
        let anchor = match *self {
            Self::First => 0,
            Self::Middle => len / 2,
            Self::Last => len.wrapping_sub(1),
            Self::Index(i) => i,
        };
        if anchor < len {
            Ok(anchor)
        } else {
            Err(AtlasError::InvalidAnchor { anchor, len })
        }
    }
}

/// 每张切片到锚点切片的变换, 按切片索引存放.
#[derive(Debug, Clone, PartialEq)]
pub struct SectionTransforms {
    anchor: usize,
    transforms: Vec<Transform2d>,
}

impl SectionTransforms {
    /// 锚点索引.
    #[inline]
    pub fn anchor(&self) -> usize {
        self.anchor
    }

    /// 切片总数.
    #[inline]
    pub fn len(&self) -> usize {
        self.transforms.len()
    }

    /// 是否为空? 合成结果至少包含锚点, 因此总是 `false`.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.transforms.is_empty()
    }

    /// 获取切片 `index` 到锚点的变换.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Transform2d> {
        self.transforms.get(index)
    }

    /// 按切片索引升序遍历.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Transform2d)> {
        self.transforms.iter().enumerate()
    }

    /// 将全部变换从分辨率 `from` 换算到 `to`.
    pub fn rescaled(&self, from: f64, to: f64) -> AtlasResult<Self> {
        let factor = crate::scale::scale_factor(from, to)?;
        Ok(Self {
            anchor: self.anchor,
            transforms: self.transforms.iter().map(|t| t.rescale_by(factor)).collect(),
        })
    }

    /// 外部重采样器所需的参数: 每张切片变换的 **逆** 的 6 参数形式, 按切片索引升序.
    pub fn resample_params(&self) -> AtlasResult<Vec<(usize, AffineParams)>> {
        self.iter()
            .map(|(i, t)| Ok((i, AffineParams::from(t.try_inverse_at(i)?))))
            .collect()
    }

    /// 取出底层变换序列.
    #[inline]
    pub fn into_inner(self) -> Vec<Transform2d> {
        self.transforms
    }
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        #[inline]
        fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
        where
            A: FnOnce() -> RA + Send,
            B: FnOnce() -> RB + Send,
            RA: Send,
            RB: Send,
        {
            rayon::join(a, b)
        }
    } else {
        #[inline]
        fn join<A, B, RA, RB>(a: A, b: B) -> (RA, RB)
        where
            A: FnOnce() -> RA,
            B: FnOnce() -> RB,
        {
            (a(), b())
        }
    }
}

/// 沿 `direction` 方向从锚点出发累乘.
///
/// 返回序列的第 `k` 项对应距锚点 `k + 1` 的切片.
fn walk(
    pairwise: &PairwiseTransforms,
    anchor: usize,
    direction: Direction,
) -> AtlasResult<Vec<Transform2d>> {
    let mut acc = Transform2d::identity();
    let ret = match direction {
        Direction::Anchor => Vec::new(),
        Direction::BelowAnchor => (1..=anchor)
            .rev()
            .map(|i| {
                acc = acc * pairwise.require(i)?.try_inverse_at(i)?;
                Ok(acc)
            })
            .collect::<AtlasResult<Vec<_>>>()?,
        Direction::AboveAnchor => (anchor + 1..pairwise.len())
            .map(|i| {
                acc = *pairwise.require(i)? * acc;
                Ok(acc)
            })
            .collect::<AtlasResult<Vec<_>>>()?,
    };
    log::debug!("{direction:?}: 合成 {} 个变换 (锚点 {anchor})", ret.len());
    Ok(ret)
}

/// 把相邻切片变换合成为每张切片到 `anchor` 的变换.
///
/// # 错误
///
/// - `anchor >= N` 或 `N == 0`: [`AtlasError::InvalidAnchor`].
/// - `[1, N - 1]` 上缺少变换: [`AtlasError::MissingTransform`], 指出最小的缺失索引.
/// - 某个 `P[i]` 奇异: [`AtlasError::SingularTransform`].
///
/// 所有变换在任何乘积形成之前完成校验; 出错时不返回任何部分结果.
pub fn compose_to_anchor(
    pairwise: &PairwiseTransforms,
    anchor: usize,
) -> AtlasResult<SectionTransforms> {
    let len = pairwise.len();
    if anchor >= len {
        return Err(AtlasError::InvalidAnchor { anchor, len });
    }
    pairwise.validate()?;

    let (below, above) = join(
        || walk(pairwise, anchor, Direction::BelowAnchor),
        || walk(pairwise, anchor, Direction::AboveAnchor),
    );
    let (below, above) = (below?, above?);

    let transforms = (0..len)
        .map(|index| match Direction::of(index, anchor) {
            Direction::Anchor => Transform2d::identity(),
            Direction::BelowAnchor => below[anchor - index - 1],
            Direction::AboveAnchor => above[index - anchor - 1],
        })
        .collect();
    Ok(SectionTransforms { anchor, transforms })
}

/// 按锚点策略解析锚点后合成.
pub fn compose_with_policy(
    pairwise: &PairwiseTransforms,
    policy: AnchorPolicy,
) -> AtlasResult<SectionTransforms> {
    compose_to_anchor(pairwise, policy.resolve(pairwise.len())?)
}
