//! 结构体积与共享图谱体积.
//!
//! 每个解剖结构以一个三维标签数组加上它在图谱体素空间中的原点给出.
//! 构建图谱时, 所有结构被依次 **累加** (而非覆盖) 到同一个图谱体积中,
//! 越界部分被裁剪掉. 整数体素溢出时回绕, 溢出的体素数记录在放置报告中.
//!
//! 图谱体积的生命周期由类型保证:
//!
//! 1. [`AtlasSession::allocate`] 分配全零体积;
//! 2. [`AtlasSession::place`] 消耗会话, 放置全部结构, 返回 [`AtlasVolume`] 与放置报告;
//! 3. [`AtlasVolume`] 不可克隆, 也没有放置接口, 因此同一次分配至多放置一轮.
//!
//! 数组轴顺序统一为 `(row, col, z)`.

use crate::error::{AtlasError, AtlasResult};
use crate::Idx3d;
use ndarray::{s, Array3, Zip};
use num::{ToPrimitive, Zero};

mod origin;
mod placement;
mod threshold;

pub use origin::{origin_and_extent, OriginPivot};
pub use placement::{PlacementEntry, PlacementNotice, PlacementReport};
pub use threshold::{dice, threshold_quantile};

/// 可以放入图谱的体素类型.
pub trait Voxel: Copy + Zero + Send + Sync {
    /// 把 `v` 累加到 `self` 上. 整数溢出时回绕并返回 `true`; 浮点数总是返回 `false`.
    fn accumulate(&mut self, v: Self) -> bool;
}

macro_rules! impl_voxel_int {
    ($($t: ty),*) => {
        $(
            impl Voxel for $t {
                #[inline]
                fn accumulate(&mut self, v: Self) -> bool {
                    let (sum, overflow) = self.overflowing_add(v);
                    *self = sum;
                    overflow
                }
            }
        )*
    };
}

macro_rules! impl_voxel_float {
    ($($t: ty),*) => {
        $(
            impl Voxel for $t {
                #[inline]
                fn accumulate(&mut self, v: Self) -> bool {
                    *self += v;
                    false
                }
            }
        )*
    };
}

impl_voxel_int!(u8, u16, u32, u64, usize, i8, i16, i32, i64, isize);
impl_voxel_float!(f32, f64);

/// 单个解剖结构的体积数据.
#[derive(Debug, Clone, PartialEq)]
pub struct StructureVolume<T> {
    /// 结构名称, 如 `7N_L`.
    pub name: String,

    /// 标签数组, 轴顺序 `(row, col, z)`.
    pub data: Array3<T>,

    /// 数组 `[0, 0, 0]` 处体素在图谱体素空间中的位置, 轴顺序同 `data`.
    pub origin: [f64; 3],
}

impl<T> StructureVolume<T> {
    /// 构建结构体积.
    pub fn new<S: Into<String>>(name: S, data: Array3<T>, origin: [f64; 3]) -> Self {
        Self {
            name: name.into(),
            data,
            origin,
        }
    }

    /// 数组形状.
    #[inline]
    pub fn shape(&self) -> Idx3d {
        self.data.dim()
    }
}

impl<T: Copy + Zero> StructureVolume<T> {
    /// 把二值掩膜涂成标签 `label`, 掩膜外为 0.
    pub fn from_mask<S: Into<String>>(
        name: S,
        mask: &Array3<bool>,
        label: T,
        origin: [f64; 3],
    ) -> Self {
        Self::new(
            name,
            mask.mapv(|m| if m { label } else { T::zero() }),
            origin,
        )
    }
}

impl<T: Copy + ToPrimitive> StructureVolume<T> {
    /// 以体素值为权重的质心 (数组索引空间). 总权重为 0 时返回 `None`.
    pub fn center_of_mass(&self) -> Option<[f64; 3]> {
        let mut acc = [0.0; 3];
        let mut total = 0.0;
        for ((r, c, z), v) in self.data.indexed_iter() {
            let w = v.to_f64().unwrap_or(0.0);
            if w == 0.0 {
                continue;
            }
            acc[0] += w * r as f64;
            acc[1] += w * c as f64;
            acc[2] += w * z as f64;
            total += w;
        }
        (total != 0.0).then(|| acc.map(|a| a / total))
    }

    /// 质心在图谱体素空间中的位置: `center_of_mass + origin`.
    pub fn com_in_atlas(&self) -> Option<[f64; 3]> {
        let com = self.center_of_mass()?;
        Some([
            com[0] + self.origin[0],
            com[1] + self.origin[1],
            com[2] + self.origin[2],
        ])
    }
}

/// 图谱体积的形状 `(rows, cols, sections)`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct AtlasShape {
    /// 行数 (高度方向).
    pub rows: usize,

    /// 列数 (宽度方向).
    pub cols: usize,

    /// 切片数.
    pub sections: usize,
}

impl AtlasShape {
    /// 直接指定形状.
    #[inline]
    pub fn new(rows: usize, cols: usize, sections: usize) -> Self {
        Self {
            rows,
            cols,
            sections,
        }
    }

    /// 由标本全分辨率宽高 (像素), 降采样因子与切片数推出图谱形状:
    /// `(floor(height / f), floor(width / f), sections)`.
    ///
    /// `downsample` 必须为正的有限值, 否则返回 [`AtlasError::InvalidResolution`].
    pub fn from_specimen(
        width: usize,
        height: usize,
        downsample: f64,
        sections: usize,
    ) -> AtlasResult<Self> {
        if !downsample.is_finite() || downsample <= 0.0 {
            return Err(AtlasError::InvalidResolution {
                from: downsample,
                to: 1.0,
            });
        }
        let div = |v: usize| (v as f64 / downsample).floor() as usize;
        Ok(Self::new(div(height), div(width), sections))
    }

    /// 以三维索引形式获取.
    #[inline]
    pub fn dim(&self) -> Idx3d {
        (self.rows, self.cols, self.sections)
    }
}

impl From<Idx3d> for AtlasShape {
    #[inline]
    fn from((rows, cols, sections): Idx3d) -> Self {
        Self::new(rows, cols, sections)
    }
}

/// 一次图谱构建会话. 持有唯一的图谱体积.
#[derive(Debug)]
pub struct AtlasSession<T> {
    data: Array3<T>,
}

impl<T: Voxel> AtlasSession<T> {
    /// 分配全零图谱体积.
    pub fn allocate<S: Into<AtlasShape>>(shape: S) -> Self {
        Self {
            data: Array3::zeros(shape.into().dim()),
        }
    }

    /// 图谱形状.
    #[inline]
    pub fn shape(&self) -> AtlasShape {
        self.data.dim().into()
    }

    /// 按输入顺序把所有结构累加进图谱, 消耗会话.
    ///
    /// 越界, 部分越界或累加溢出都不会导致错误, 而是记录在返回的报告中.
    pub fn place(mut self, structures: &[StructureVolume<T>]) -> (AtlasVolume<T>, PlacementReport) {
        let shape = self.data.dim();
        let plans = placement::plan_all(structures, shape);

        let mut entries = Vec::with_capacity(structures.len());
        for (structure, (mut entry, region)) in structures.iter().zip(plans) {
            if let Some(r) = region {
                let [a0, a1, a2] = r.atlas;
                let [l0, l1, l2] = r.local;
                let mut overflowed = 0;
                Zip::from(self.data.slice_mut(s![a0, a1, a2]))
                    .and(structure.data.slice(s![l0, l1, l2]))
                    .for_each(|dst, src| overflowed += usize::from(dst.accumulate(*src)));
                entry.overflowed = overflowed;
            }
            entry.log();
            entries.push(entry);
        }

        let report = PlacementReport::new(entries);
        log::info!(
            "图谱 {:?}: 放置 {} 个结构, 其中 {} 个被裁剪, {} 个越界跳过, {} 个体素累加溢出",
            shape,
            report.placed(),
            report.clipped(),
            report.skipped(),
            report.overflowed()
        );
        (AtlasVolume { data: self.data }, report)
    }
}

/// 放置完成的图谱体积. 不可克隆.
#[derive(Debug)]
pub struct AtlasVolume<T> {
    data: Array3<T>,
}

impl<T> AtlasVolume<T> {
    /// 获取底层数组.
    #[inline]
    pub fn data(&self) -> &Array3<T> {
        &self.data
    }

    /// 取出底层数组.
    #[inline]
    pub fn into_inner(self) -> Array3<T> {
        self.data
    }

    /// 图谱形状.
    #[inline]
    pub fn shape(&self) -> AtlasShape {
        self.data.dim().into()
    }
}

impl<T: Copy + PartialEq> AtlasVolume<T> {
    /// 值为 `label` 的体素个数.
    pub fn count(&self, label: T) -> usize {
        self.data.iter().filter(|v| **v == label).count()
    }
}

impl<T: Zero> AtlasVolume<T> {
    /// 非零体素个数.
    pub fn nonzero(&self) -> usize {
        self.data.iter().filter(|v| !v.is_zero()).count()
    }
}
