//! 运行时错误.

use thiserror::Error;

/// 变换合成、坐标缩放与点集拟合的运行时错误.
///
/// 这些错误都是结构性或数值上的不可能, 一旦出现, 整个操作中止, 不返回部分结果.
/// 结构放置越界不属于错误, 见 [`crate::volume::PlacementNotice`].
#[derive(Error, Debug, Clone, PartialEq)]
pub enum AtlasError {
    /// 相邻切片变换链存在缺口. 参数为缺失的切片索引 `i`, 即缺少 `i -> i - 1` 的变换.
    #[error("缺少切片 {index} -> {} 的相邻变换", .index.wrapping_sub(1))]
    MissingTransform {
        /// 缺失的切片索引.
        index: usize,
    },

    /// 变换的线性部分奇异 (行列式近似为 0), 不可求逆.
    #[error("切片 {index} 的变换奇异, 不可求逆")]
    SingularTransform {
        /// 出错的切片索引. 对于不属于任何切片的独立变换, 该值为 0.
        index: usize,
    },

    /// 矩阵最后一行不是 `[0, .., 0, 1]`, 或含有非有限值.
    #[error("矩阵不是合法的齐次仿射变换")]
    NotAffine,

    /// 锚点切片越界, 或切片序列为空.
    #[error("锚点 {anchor} 越界 (切片总数 {len})")]
    InvalidAnchor {
        /// 请求的锚点.
        anchor: usize,

        /// 切片总数.
        len: usize,
    },

    /// 分辨率必须为正的有限值.
    #[error("非法分辨率: {from} -> {to}")]
    InvalidResolution {
        /// 原分辨率.
        from: f64,

        /// 目标分辨率.
        to: f64,
    },

    /// 标本几何信息推出的图谱平面为空 (宽或高为 0, 或小于降采样因子).
    #[error("标本几何 {width}×{height} (降采样 {downsample}) 推出的图谱平面为空")]
    EmptyAtlasPlane {
        /// 全分辨率宽度.
        width: usize,

        /// 全分辨率高度.
        height: usize,

        /// 降采样因子.
        downsample: f64,
    },

    /// 对应点数不足以确定变换.
    ///
    /// `got` 代表目前已有的点, `need` 代表实际拟合需要的最少点数.
    #[error("对应点不足: 已有 {got} 个, 至少需要 {need} 个")]
    UnderdeterminedFit {
        /// 已有点数.
        got: usize,

        /// 最少点数.
        need: usize,
    },

    /// 点集退化 (共线, 或仿射拟合时共面), 拟合问题不适定.
    #[error("点集退化 (共线或共面), 无法拟合")]
    DegenerateGeometry,

    /// 源点集与目标点集长度不一致.
    #[error("点集长度不一致: 源 {source_len} 个, 目标 {target_len} 个")]
    LengthMismatch {
        /// 源点个数.
        source_len: usize,

        /// 目标点个数.
        target_len: usize,
    },

    /// 无法解析外部配准引擎给出的 6 参数仿射变换.
    #[error("无法解析仿射参数: {0}")]
    ParseParams(String),
}

/// 合成 / 拟合运行时结果.
pub type AtlasResult<T> = Result<T, AtlasError>;
