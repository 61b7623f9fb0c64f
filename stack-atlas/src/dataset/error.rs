use crate::error::AtlasError;
use ndarray_npy::{ReadNpzError, WriteNpyError};
use std::path::PathBuf;
use thiserror::Error;

/// 数据集读写错误.
#[derive(Error, Debug)]
pub enum DatasetError {
    /// workers 太大. 最多支持 64.
    #[error("工作通道过多: 最多 {0} 个")]
    TooManyWorkers(usize),

    /// 读取 npz 归档错误.
    #[error("读取 npz 归档失败: {0}")]
    ReadNpz(#[from] ReadNpzError),

    /// 写入 npy 文件错误.
    #[error("写入 npy 文件失败: {0}")]
    WriteNpy(#[from] WriteNpyError),

    /// JSON 解析或序列化错误.
    #[cfg(feature = "serde")]
    #[error("JSON 错误: {0}")]
    Json(#[from] serde_json::Error),

    /// 原点文件格式错误.
    #[error("原点文件 {path:?} 格式错误: {reason}")]
    ParseOrigin {
        /// 文件路径.
        path: PathBuf,

        /// 错误原因.
        reason: String,
    },

    /// 读入的数据不满足合成 / 拟合的约束.
    #[error(transparent)]
    Atlas(#[from] AtlasError),

    /// 归档读取通道的锁被毒化 (持锁线程 panic).
    #[error("归档读取通道不可用")]
    Poisoned,

    /// 其他底层 I/O 错误.
    #[error("I/O 错误: {0}")]
    Io(#[from] std::io::Error),
}

/// 数据集读写结果.
pub type DatasetResult<T> = Result<T, DatasetError>;
