use crate::error::{AtlasError, AtlasResult};
use crate::transform::{AffineParams, Transform2d};
use std::collections::BTreeMap;

/// 相邻切片之间的变换集合.
///
/// 对切片总数为 `N` 的序列, 索引 `i ∈ [1, N - 1]` 处的变换 `P[i]`
/// 把切片 `i` 映射到切片 `i - 1` 上. 索引 `0` 与 `>= N` 的条目不参与合成.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PairwiseTransforms {
    len: usize,
    map: BTreeMap<usize, Transform2d>,
}

impl PairwiseTransforms {
    /// 为 `len` 张切片创建空集合.
    pub fn new(len: usize) -> Self {
        Self {
            len,
            map: BTreeMap::new(),
        }
    }

    /// 从外部配准引擎给出的 `(i, params)` 序列构建.
    ///
    /// 任一参数不是合法仿射变换时返回 [`AtlasError::NotAffine`].
    pub fn from_params<I>(len: usize, params: I) -> AtlasResult<Self>
    where
        I: IntoIterator<Item = (usize, AffineParams)>,
    {
        let mut ret = Self::new(len);
        for (index, p) in params {
            ret.insert(index, p.to_transform()?);
        }
        Ok(ret)
    }

    /// 切片总数 `N`.
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    /// 切片序列是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// 设置 `P[index]`, 返回旧值.
    pub fn insert(&mut self, index: usize, t: Transform2d) -> Option<Transform2d> {
        self.map.insert(index, t)
    }

    /// 获取 `P[index]`.
    #[inline]
    pub fn get(&self, index: usize) -> Option<&Transform2d> {
        self.map.get(&index)
    }

    /// 按索引升序遍历已有的变换.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Transform2d)> {
        self.map.iter().map(|(i, t)| (*i, t))
    }

    /// 获取 `P[index]`, 缺失时返回 [`AtlasError::MissingTransform`].
    #[inline]
    pub(crate) fn require(&self, index: usize) -> AtlasResult<&Transform2d> {
        self.get(index)
            .ok_or(AtlasError::MissingTransform { index })
    }

    /// 检查 `[1, N - 1]` 上的每个变换都存在且可逆.
    ///
    /// 先检查缺失 (报告最小的缺失索引), 再检查奇异 (报告最小的奇异索引).
    pub fn validate(&self) -> AtlasResult<()> {
        if let Some(index) = (1..self.len).find(|i| !self.map.contains_key(i)) {
            return Err(AtlasError::MissingTransform { index });
        }
        (1..self.len).try_for_each(|i| self.require(i)?.ensure_invertible(i))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Matrix3;

    fn singular() -> Transform2d {
        Transform2d::from_matrix(Matrix3::new(0.0, 0.0, 1.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0)).unwrap()
    }

    #[test]
    fn test_validate_reports_smallest_missing() {
        let mut p = PairwiseTransforms::new(6);
        p.insert(1, Transform2d::identity());
        p.insert(2, singular());
        p.insert(4, Transform2d::identity());
        assert_eq!(p.validate(), Err(AtlasError::MissingTransform { index: 3 }));

        p.insert(3, Transform2d::identity());
        p.insert(5, Transform2d::identity());
        assert_eq!(p.validate(), Err(AtlasError::SingularTransform { index: 2 }));

        p.insert(2, Transform2d::identity());
        assert_eq!(p.validate(), Ok(()));
    }

    #[test]
    fn test_extra_entries_ignored() {
        let mut p = PairwiseTransforms::new(2);
        p.insert(0, singular());
        p.insert(1, Transform2d::identity());
        p.insert(9, singular());
        assert!(p.validate().is_ok());
        assert_eq!(p.iter().count(), 3);
    }

    #[test]
    fn test_from_params() {
        let p = PairwiseTransforms::from_params(
            3,
            [
                (1, AffineParams::IDENTITY),
                (2, AffineParams::from([1.0, 0.0, 0.0, 1.0, 4.0, -2.0])),
            ],
        )
        .unwrap();
        assert_eq!(p.len(), 3);
        assert_eq!(p.get(2).unwrap().translation().x, 4.0);

        let bad = AffineParams::from([f64::NAN, 0.0, 0.0, 1.0, 0.0, 0.0]);
        assert_eq!(
            PairwiseTransforms::from_params(2, [(1, bad)]),
            Err(AtlasError::NotAffine)
        );
    }
}
