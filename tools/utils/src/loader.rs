//! 对 `stack-atlas::dataset` 的更一层封装. 约定数据目录布局:
//!
//! ```text
//! {数据目录}/
//!   config.json            可选, 缺省时使用默认配置
//!   pairwise.json          相邻切片变换
//!   landmarks/fixed.json   参考标本 (图谱) 标志点
//!   landmarks/moving.json  待对齐标本标志点
//!   structure.npz          结构体积
//!   origin/{name}.txt      结构原点
//!   output/                输出目录
//! ```

use stack_atlas::dataset::{self, DatasetResult, StructureArchive};
use stack_atlas::prelude::*;
use std::env;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};

/// 配置文件名.
pub const CONFIG_FILE: &str = "config.json";

/// 相邻切片变换文件名.
pub const PAIRWISE_FILE: &str = "pairwise.json";

/// 标志点目录名.
pub const LANDMARK_DIR: &str = "landmarks";

/// 结构体积归档文件名.
pub const ARCHIVE_FILE: &str = "structure.npz";

/// 原点目录名.
pub const ORIGIN_DIR: &str = "origin";

/// 输出目录名.
pub const OUTPUT_DIR: &str = "output";

/// 获取图谱数据基本路径.
///
/// 1. 若环境变量 `$ATLAS_DATA_DIR` 非空, 则返回其值;
/// 2. 否则, 返回 `$HOME/dataset/atlas`.
pub fn data_dir_from_env_or_home() -> PathBuf {
    match env::var("ATLAS_DATA_DIR") {
        Ok(d) if !d.is_empty() => PathBuf::from(d),
        _ => dataset::home_atlas_dir().expect("无法确定用户主目录"),
    }
}

/// 读取配置. 配置文件不存在时返回默认配置.
pub fn config<P: AsRef<Path>>(dir: P) -> DatasetResult<AtlasConfig> {
    let path = dir.as_ref().join(CONFIG_FILE);
    if path.is_file() {
        AtlasConfig::from_json_file(path)
    } else {
        Ok(AtlasConfig::default())
    }
}

/// 读取相邻切片变换. `sections` 为 0 时由文件内容推断切片数.
pub fn pairwise<P: AsRef<Path>>(dir: P, sections: usize) -> DatasetResult<PairwiseTransforms> {
    let len = (sections != 0).then_some(sections);
    dataset::read_pairwise(dir.as_ref().join(PAIRWISE_FILE), len)
}

/// 读取 `(待对齐, 参考)` 两组标志点.
pub fn landmarks<P: AsRef<Path>>(dir: P) -> DatasetResult<(LandmarkSet, LandmarkSet)> {
    let base = dir.as_ref().join(LANDMARK_DIR);
    let moving = dataset::read_landmarks(base.join("moving.json"))?;
    let fixed = dataset::read_landmarks(base.join("fixed.json"))?;
    Ok((moving, fixed))
}

/// 打开结构体积归档, 工作通道数等于可并行核心数 (至多 64).
pub fn archive<P: AsRef<Path>>(dir: P) -> DatasetResult<StructureArchive> {
    let workers = NonZeroUsize::new(super::cpus().min(64)).unwrap_or(NonZeroUsize::MIN);
    StructureArchive::new(workers, dir.as_ref().join(ARCHIVE_FILE))
}

/// 读取所有结构体积及其原点.
pub fn structures<P: AsRef<Path>>(dir: P) -> DatasetResult<Vec<StructureVolume<u8>>> {
    let dir = dir.as_ref();
    let origins = dataset::read_origins_dir(dir.join(ORIGIN_DIR))?;
    archive(dir)?.load_structures(&origins)
}

/// 输出目录, 不存在时创建.
pub fn output_dir<P: AsRef<Path>>(dir: P) -> DatasetResult<PathBuf> {
    let out = dir.as_ref().join(OUTPUT_DIR);
    std::fs::create_dir_all(&out)?;
    Ok(out)
}
