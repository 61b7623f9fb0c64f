//! 通用常量.

/// 结构标签值.
pub mod label {
    /// 图谱中未被任何结构覆盖的体素值.
    pub const BACKGROUND: u8 = 0;

    /// 二值结构掩膜中, 结构内部的体素值.
    pub const FOREGROUND: u8 = 1;

    /// 体素是否是背景?
    #[inline]
    pub const fn is_background(p: u8) -> bool {
        matches!(p, BACKGROUND)
    }

    /// 体素是否被至少一个结构覆盖?
    #[inline]
    pub const fn is_covered(p: u8) -> bool {
        !is_background(p)
    }
}

/// 线性部分行列式的绝对值不大于该值时, 变换被视为奇异.
pub const SINGULAR_EPS: f64 = 1e-10;

/// 中心化点集的奇异值之比不大于该值时, 点集被视为退化 (共线或共面).
pub const DEGENERATE_EPS: f64 = 1e-9;

/// 三维刚体 / 相似变换拟合所需的最少对应点数.
pub const MIN_FIT_POINTS: usize = 3;

/// 三维一般仿射拟合所需的最少对应点数 (维数加一).
pub const MIN_AFFINE_FIT_POINTS: usize = 4;

/// 分位数阈值化时, 结构体积内没有正值体素的后备阈值.
pub const FALLBACK_THRESHOLD: f32 = 0.5;

/// 双侧结构名称的左侧后缀, 如 `7N_L`.
pub const LEFT_SUFFIX: &str = "_L";

/// 双侧结构名称的右侧后缀, 如 `7N_R`.
pub const RIGHT_SUFFIX: &str = "_R";
