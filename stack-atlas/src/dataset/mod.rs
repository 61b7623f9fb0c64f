//! 数据集操作.
//!
//! 核心模块不做任何 I/O; 本模块负责外部协作方提供的文件格式:
//!
//! 1. 结构体积: `.npz` 归档, 每个结构一个 `{name}.npy`;
//! 2. 结构原点: 目录下的 `{name}.txt`;
//! 3. 标志点与相邻切片变换: JSON (需要 `serde` feature);
//! 4. 拼装完成的图谱: `.npy`.

use std::path::{Path, PathBuf};

mod error;
mod files;
mod npz_archive;

pub use error::{DatasetError, DatasetResult};
pub use files::{parse_origin, read_origin, read_origins_dir, write_atlas, write_origin, ORIGIN_EXT};
pub use npz_archive::StructureArchive;

#[cfg(feature = "serde")]
pub use files::{read_landmarks, read_pairwise, write_landmarks, write_section_params};

/// 获取 `{用户主目录}/dataset/atlas` 目录.
pub fn home_atlas_dir() -> Option<PathBuf> {
    let mut ans = dirs::home_dir()?;
    ans.extend(["dataset", "atlas"]);
    Some(ans)
}

/// 获取 `{用户主目录}/dataset/atlas` 目录下给定继续项组成的全路径.
pub fn home_atlas_dir_with<P: AsRef<Path>, I: IntoIterator<Item = P>>(it: I) -> Option<PathBuf> {
    let mut ans = home_atlas_dir()?;
    ans.extend(it);
    Some(ans)
}
