//! 结构放置规划: 原点取整, 与图谱求交, 裁剪.
//!
//! 规划是纯计算, 与写入分离; 开启 `rayon` 时对结构并行规划, 写入始终按输入顺序串行.

use super::StructureVolume;
use crate::Idx3d;
use std::ops::Range;

/// 单个结构的放置结果.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum PlacementNotice {
    /// 完全位于图谱内部.
    Placed,

    /// 部分越界. `clipped[axis] = (before, after)` 为该轴在起点前和终点后被裁掉的体素数.
    PartiallyClipped {
        /// 每个轴被裁掉的范围.
        clipped: [(usize, usize); 3],
    },

    /// 与图谱没有交集, 未写入任何体素.
    SkippedOutOfBounds,
}

/// 报告中的一项.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PlacementEntry {
    /// 结构名称.
    pub name: String,

    /// 取整后的起点 (图谱体素空间).
    pub start: [i64; 3],

    /// 放置结果.
    pub notice: PlacementNotice,

    /// 累加时发生整数溢出 (回绕) 的体素个数.
    pub overflowed: usize,
}

impl PlacementEntry {
    pub(super) fn log(&self) {
        match self.notice {
            PlacementNotice::Placed => {
                log::trace!("{}: 起点 {:?}", self.name, self.start);
            }
            PlacementNotice::PartiallyClipped { clipped } => {
                log::warn!(
                    "{}: 起点 {:?} 部分越界, 裁剪 {:?}",
                    self.name,
                    self.start,
                    clipped
                );
            }
            PlacementNotice::SkippedOutOfBounds => {
                log::warn!("{}: 起点 {:?} 完全越界, 跳过", self.name, self.start);
            }
        }
        if self.overflowed > 0 {
            log::warn!("{}: {} 个体素累加溢出, 已回绕", self.name, self.overflowed);
        }
    }
}

/// 一轮放置的报告, 按输入顺序每个结构一项.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PlacementReport {
    entries: Vec<PlacementEntry>,
}

impl PlacementReport {
    pub(super) fn new(entries: Vec<PlacementEntry>) -> Self {
        Self { entries }
    }

    /// 全部条目.
    #[inline]
    pub fn entries(&self) -> &[PlacementEntry] {
        &self.entries
    }

    /// 至少写入了一个体素的结构个数 (含部分裁剪的).
    pub fn placed(&self) -> usize {
        self.count(|n| !matches!(n, PlacementNotice::SkippedOutOfBounds))
    }

    /// 部分裁剪的结构个数.
    pub fn clipped(&self) -> usize {
        self.count(|n| matches!(n, PlacementNotice::PartiallyClipped { .. }))
    }

    /// 越界跳过的结构个数.
    pub fn skipped(&self) -> usize {
        self.count(|n| matches!(n, PlacementNotice::SkippedOutOfBounds))
    }

    /// 全部结构累加溢出的体素总数.
    pub fn overflowed(&self) -> usize {
        self.entries.iter().map(|e| e.overflowed).sum()
    }

    /// 按名称查找.
    pub fn get(&self, name: &str) -> Option<&PlacementEntry> {
        self.entries.iter().find(|e| e.name == name)
    }

    fn count<F: Fn(&PlacementNotice) -> bool>(&self, pred: F) -> usize {
        self.entries.iter().filter(|e| pred(&e.notice)).count()
    }
}

/// 写入区域: 图谱中的切片范围与结构数组中的切片范围, 两者形状一致.
#[derive(Clone, Debug, PartialEq, Eq)]
pub(super) struct Region {
    pub(super) atlas: [Range<usize>; 3],
    pub(super) local: [Range<usize>; 3],
}

/// 规划单个结构. 原点含非有限值时视为完全越界.
fn plan(origin: &[f64; 3], shape: Idx3d, atlas: Idx3d) -> ([i64; 3], PlacementNotice, Option<Region>) {
    let start = origin.map(|v| v.round() as i64);
    if origin.iter().any(|v| !v.is_finite()) {
        return (start, PlacementNotice::SkippedOutOfBounds, None);
    }

    let len = [shape.0, shape.1, shape.2];
    let bound = [atlas.0, atlas.1, atlas.2];
    let mut region = Region {
        atlas: [0..0, 0..0, 0..0],
        local: [0..0, 0..0, 0..0],
    };
    let mut clipped = [(0usize, 0usize); 3];

    for axis in 0..3 {
        let lo_raw = start[axis];
        let hi_raw = lo_raw.saturating_add(len[axis] as i64);
        let lo = lo_raw.max(0);
        let hi = hi_raw.min(bound[axis] as i64);
        if hi <= lo {
            return (start, PlacementNotice::SkippedOutOfBounds, None);
        }
        clipped[axis] = ((lo - lo_raw) as usize, (hi_raw - hi) as usize);
        region.atlas[axis] = lo as usize..hi as usize;
        region.local[axis] = (lo - lo_raw) as usize..(hi - lo_raw) as usize;
    }

    let notice = if clipped.iter().all(|&(b, a)| b == 0 && a == 0) {
        PlacementNotice::Placed
    } else {
        PlacementNotice::PartiallyClipped { clipped }
    };
    (start, notice, Some(region))
}

fn plan_one<T>(s: &StructureVolume<T>, atlas: Idx3d) -> (PlacementEntry, Option<Region>) {
    let (start, notice, region) = plan(&s.origin, s.shape(), atlas);
    let entry = PlacementEntry {
        name: s.name.clone(),
        start,
        notice,
        overflowed: 0,
    };
    (entry, region)
}

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        /// 借助 `rayon` 并行规划全部结构, 结果保持输入顺序.
        pub(super) fn plan_all<T: Sync>(
            structures: &[StructureVolume<T>],
            atlas: Idx3d,
        ) -> Vec<(PlacementEntry, Option<Region>)> {
            structures.par_iter().map(|s| plan_one(s, atlas)).collect()
        }
    } else {
        pub(super) fn plan_all<T>(
            structures: &[StructureVolume<T>],
            atlas: Idx3d,
        ) -> Vec<(PlacementEntry, Option<Region>)> {
            structures.iter().map(|s| plan_one(s, atlas)).collect()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plan_inside() {
        let (start, notice, region) = plan(&[1.0, 2.0, 0.0], (2, 2, 2), (5, 5, 5));
        assert_eq!(start, [1, 2, 0]);
        assert_eq!(notice, PlacementNotice::Placed);
        let r = region.unwrap();
        assert_eq!(r.atlas, [1..3, 2..4, 0..2]);
        assert_eq!(r.local, [0..2, 0..2, 0..2]);
    }

    #[test]
    fn test_plan_clip_both_sides() {
        let (_, notice, region) = plan(&[-2.0, 0.0, 0.0], (10, 1, 1), (5, 5, 5));
        assert_eq!(
            notice,
            PlacementNotice::PartiallyClipped {
                clipped: [(2, 3), (0, 0), (0, 0)]
            }
        );
        let r = region.unwrap();
        assert_eq!(r.atlas[0], 0..5);
        assert_eq!(r.local[0], 2..7);
    }

    #[test]
    fn test_plan_skip() {
        // 恰好贴着边界之外.
        let (_, notice, region) = plan(&[0.0, 5.0, 0.0], (1, 1, 1), (5, 5, 5));
        assert_eq!(notice, PlacementNotice::SkippedOutOfBounds);
        assert!(region.is_none());

        let (_, notice, _) = plan(&[-3.0, 0.0, 0.0], (3, 1, 1), (5, 5, 5));
        assert_eq!(notice, PlacementNotice::SkippedOutOfBounds);

        let (_, notice, _) = plan(&[f64::NAN, 0.0, 0.0], (3, 1, 1), (5, 5, 5));
        assert_eq!(notice, PlacementNotice::SkippedOutOfBounds);

        // 空结构.
        let (_, notice, _) = plan(&[0.0; 3], (0, 1, 1), (5, 5, 5));
        assert_eq!(notice, PlacementNotice::SkippedOutOfBounds);
    }

    #[test]
    fn test_report_counts() {
        let entry = |name: &str, notice| PlacementEntry {
            name: name.to_string(),
            start: [0; 3],
            notice,
            overflowed: 0,
        };
        let report = PlacementReport::new(vec![
            entry("a", PlacementNotice::Placed),
            entry(
                "b",
                PlacementNotice::PartiallyClipped {
                    clipped: [(1, 0), (0, 0), (0, 0)],
                },
            ),
            entry("c", PlacementNotice::SkippedOutOfBounds),
        ]);
        assert_eq!(report.placed(), 2);
        assert_eq!(report.clipped(), 1);
        assert_eq!(report.skipped(), 1);
        assert_eq!(report.overflowed(), 0);
        assert_eq!(report.get("c").map(|e| e.notice), Some(PlacementNotice::SkippedOutOfBounds));
        assert!(report.get("zz").is_none());
    }
}
