#![warn(missing_docs)]

//! 核心库. 把连续切片的相邻配准结果合成为统一坐标系, 在标本之间拟合全局对齐,
//! 并将各解剖结构的体积拼装成共享的三维图谱.
//!
//! 核心模块 (`transform`, `chain`, `scale`, `landmark`, `fit`, `volume`) 不做任何 I/O;
//! 文件格式由 `dataset` 负责.
//!
//! # 注意
//!
//! 1. 图像格式转换、掩膜生成、相邻切片配准本身都由外部工具完成,
//!   本 crate 只消费它们的输出 (6 参数仿射, 结构体积与原点, 标志点).
//! 2. 结构性或数值上的错误 (缺失变换, 奇异矩阵, 退化点集) 会中止整个操作,
//!   不返回部分结果. 结构越界不是错误, 记录在放置报告中.
//!
//! # 开发计划
//!
//! ### 齐次仿射变换 ✅
//!
//! 二维 3×3 与三维 4×4 齐次变换, 复合, 求逆, 与外部 6 参数格式互转.
//!
//! 实现位于 `stack-atlas/src/transform`.
//!
//! ### 变换链合成 ✅
//!
//! 相邻切片变换 -> 每张切片到锚点切片的变换. 锚点之下走逆变换, 锚点之上直接累乘,
//! 方向以 `Direction` 显式表示. 两个方向可以借助 `rayon` 并行.
//!
//! 实现位于 `stack-atlas/src/chain`.
//!
//! ### 分辨率换算 ✅
//!
//! 只缩放平移部分; 点坐标整体缩放.
//!
//! 实现位于 `stack-atlas/src/scale.rs`.
//!
//! ### 标志点拟合 ✅
//!
//! 1. 最小二乘仿射 (正规方程). ✅
//! 2. Umeyama 刚体 / 相似变换, 带反射修正. ✅
//! 3. 残差与 RMS 报告. ✅
//!
//! 实现位于 `stack-atlas/src/fit`.
//!
//! ### 结构体积拼装 ✅
//!
//! 原点取整, 越界裁剪, 重叠累加. 图谱由一次会话独占, 放置后才交出.
//!
//! 实现位于 `stack-atlas/src/volume`.
//!
//! ### 小功能 ✅
//!
//! 1. 质心, 原点/跨度推导, 分位数阈值化, Dice 系数. ✅
//! 2. npz 归档并行读取. ✅
//! 3. JSON 配置. ✅

/// 三维索引, 同时也可一定程度上用作非负整数向量. 轴顺序 `(row, col, z)`.
pub type Idx3d = (usize, usize, usize);

pub mod chain;
pub mod config;
pub mod consts;
pub mod dataset;
pub mod error;
pub mod fit;
pub mod landmark;
pub mod prelude;
pub mod scale;
pub mod transform;
pub mod volume;

pub use chain::{compose_to_anchor, compose_with_policy, AnchorPolicy, Direction};
pub use error::{AtlasError, AtlasResult};
pub use transform::{AffineParams, Transform2d, Transform3d};
