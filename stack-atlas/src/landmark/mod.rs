//! 带名称的三维标志点集合, 如各解剖结构在标本中的质心.

use crate::consts::{LEFT_SUFFIX, RIGHT_SUFFIX};
use nalgebra::Point3;
use std::collections::{BTreeMap, BTreeSet};

/// 名称 -> 三维坐标. 键按字典序遍历.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LandmarkSet {
    points: BTreeMap<String, Point3<f64>>,
}

impl LandmarkSet {
    /// 空集合.
    pub fn new() -> Self {
        Self::default()
    }

    /// 插入标志点, 返回同名的旧坐标.
    pub fn insert<S: Into<String>>(&mut self, name: S, p: Point3<f64>) -> Option<Point3<f64>> {
        self.points.insert(name.into(), p)
    }

    /// 获取标志点坐标.
    #[inline]
    pub fn get(&self, name: &str) -> Option<&Point3<f64>> {
        self.points.get(name)
    }

    /// 是否包含名为 `name` 的标志点?
    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.points.contains_key(name)
    }

    /// 标志点个数.
    #[inline]
    pub fn len(&self) -> usize {
        self.points.len()
    }

    /// 是否为空?
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// 按名称字典序遍历.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Point3<f64>)> {
        self.points.iter().map(|(k, v)| (k.as_str(), v))
    }

    /// 按名称字典序遍历名称.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.points.keys().map(String::as_str)
    }

    /// 对每个坐标施加 `op`, 返回新集合.
    pub fn map_points<F>(&self, op: F) -> Self
    where
        F: Fn(&Point3<f64>) -> Point3<f64>,
    {
        Self {
            points: self.points.iter().map(|(k, v)| (k.clone(), op(v))).collect(),
        }
    }

    /// 仅保留名称 (或其去除左右后缀后的基础名称) 位于 `region` 中的标志点.
    pub fn retain_region<S: AsRef<str>>(&mut self, region: &[S]) {
        let region = region_set(region);
        self.points.retain(|k, _| in_region(k, &region));
    }
}

impl<S: Into<String>> FromIterator<(S, Point3<f64>)> for LandmarkSet {
    fn from_iter<I: IntoIterator<Item = (S, Point3<f64>)>>(iter: I) -> Self {
        Self {
            points: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

/// 去除双侧结构名称的 `_L` / `_R` 后缀. 其它名称原样返回.
pub fn base_name(name: &str) -> &str {
    name.strip_suffix(LEFT_SUFFIX)
        .or_else(|| name.strip_suffix(RIGHT_SUFFIX))
        .unwrap_or(name)
}

fn region_set<S: AsRef<str>>(region: &[S]) -> BTreeSet<&str> {
    region.iter().map(AsRef::as_ref).collect()
}

#[inline]
fn in_region(name: &str, region: &BTreeSet<&str>) -> bool {
    region.contains(name) || region.contains(base_name(name))
}

/// 两个集合共有的名称, 按字典序排列.
///
/// 若给出 `region`, 则只保留名称 (或其基础名称) 位于其中的项.
pub fn common_keys<S: AsRef<str>>(
    a: &LandmarkSet,
    b: &LandmarkSet,
    region: Option<&[S]>,
) -> Vec<String> {
    let region = region.map(region_set);
    a.names()
        .filter(|k| b.contains(k))
        .filter(|k| region.as_ref().map_or(true, |r| in_region(k, r)))
        .map(str::to_owned)
        .collect()
}

/// 按 `keys` 的顺序从两个集合中取出对应点. 调用方保证每个键在两个集合中都存在;
/// 不存在的键被跳过.
pub fn paired_points(
    a: &LandmarkSet,
    b: &LandmarkSet,
    keys: &[String],
) -> (Vec<Point3<f64>>, Vec<Point3<f64>>) {
    keys.iter()
        .filter_map(|k| Some((*a.get(k)?, *b.get(k)?)))
        .unzip()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn set(names: &[&str]) -> LandmarkSet {
        names
            .iter()
            .enumerate()
            .map(|(i, n)| (*n, Point3::new(i as f64, 0.0, 0.0)))
            .collect()
    }

    #[test]
    fn test_base_name() {
        assert_eq!(base_name("7N_L"), "7N");
        assert_eq!(base_name("7N_R"), "7N");
        assert_eq!(base_name("SC"), "SC");
        assert_eq!(base_name("_L"), "");
    }

    #[test]
    fn test_common_keys_sorted() {
        let a = set(&["VLL_R", "SC", "7N_L", "Amb_L"]);
        let b = set(&["SC", "7N_L", "LC_R", "VLL_R"]);
        let keys = common_keys::<&str>(&a, &b, None);
        assert_eq!(keys, ["7N_L", "SC", "VLL_R"]);

        let keys = common_keys(&a, &b, Some(&["7N", "SC"][..]));
        assert_eq!(keys, ["7N_L", "SC"]);
    }

    #[test]
    fn test_paired_points_follow_key_order() {
        let a = set(&["a", "b", "c"]);
        let b = set(&["c", "b", "a"]);
        let keys = vec!["c".to_string(), "a".to_string(), "zz".to_string()];
        let (pa, pb) = paired_points(&a, &b, &keys);
        assert_eq!(pa, vec![Point3::new(2.0, 0.0, 0.0), Point3::new(0.0, 0.0, 0.0)]);
        assert_eq!(pb, vec![Point3::new(0.0, 0.0, 0.0), Point3::new(2.0, 0.0, 0.0)]);
    }

    #[test]
    fn test_retain_region_and_map() {
        let mut a = set(&["7N_L", "7N_R", "SC", "LC_L"]);
        a.retain_region(&["7N", "SC"]);
        assert_eq!(a.names().collect::<Vec<_>>(), ["7N_L", "7N_R", "SC"]);

        let b = a.map_points(|p| Point3::from(p.coords * 2.0));
        assert_eq!(b.get("SC"), Some(&Point3::new(4.0, 0.0, 0.0)));
        assert_eq!(b.len(), 3);
    }
}
