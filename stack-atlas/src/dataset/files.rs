//! 单文件格式: 原点文本, 标志点 / 变换参数 JSON, 图谱 npy.

use super::{DatasetError, DatasetResult};
use crate::volume::AtlasVolume;
use ndarray_npy::{write_npy, WritableElement};
use std::collections::BTreeMap;
use std::fs;
use std::io::Write;
use std::path::Path;

/// 原点文件扩展名.
pub const ORIGIN_EXT: &str = "txt";

/// 解析原点文本: 三个浮点数 (空白分隔, 通常每行一个), 依次为 `(col, row, z)`.
///
/// 返回按数组轴顺序排列的 `[row, col, z]`.
pub fn parse_origin(text: &str) -> Result<[f64; 3], String> {
    let values = text
        .split_whitespace()
        .map(|v| v.parse::<f64>().map_err(|e| format!("{v:?}: {e}")))
        .collect::<Result<Vec<_>, _>>()?;
    match values[..] {
        [col, row, z] => Ok([row, col, z]),
        _ => Err(format!("需要 3 个数, 得到 {} 个", values.len())),
    }
}

/// 读取单个原点文件.
pub fn read_origin<P: AsRef<Path>>(path: P) -> DatasetResult<[f64; 3]> {
    let path = path.as_ref();
    let text = fs::read_to_string(path)?;
    parse_origin(&text).map_err(|reason| DatasetError::ParseOrigin {
        path: path.to_path_buf(),
        reason,
    })
}

/// 读取目录下所有 `{name}.txt` 原点文件, 以 `name` 为键.
pub fn read_origins_dir<P: AsRef<Path>>(dir: P) -> DatasetResult<BTreeMap<String, [f64; 3]>> {
    let mut ret = BTreeMap::new();
    for entry in fs::read_dir(dir)? {
        let path = entry?.path();
        if path.extension().map_or(true, |e| e != ORIGIN_EXT) {
            continue;
        }
        if let Some(name) = path.file_stem().and_then(|s| s.to_str()) {
            ret.insert(name.to_owned(), read_origin(&path)?);
        }
    }
    Ok(ret)
}

/// 以 `np.savetxt` 的格式写出原点 `[row, col, z]` (文件中为 `col, row, z`).
pub fn write_origin<P: AsRef<Path>>(path: P, origin: &[f64; 3]) -> DatasetResult<()> {
    let [row, col, z] = *origin;
    let mut f = fs::File::create(path)?;
    for v in [col, row, z] {
        writeln!(f, "{v:.18e}")?;
    }
    Ok(())
}

/// 将图谱体积写为 `.npy` 文件.
pub fn write_atlas<P, T>(path: P, atlas: &AtlasVolume<T>) -> DatasetResult<()>
where
    P: AsRef<Path>,
    T: WritableElement,
{
    write_npy(path, atlas.data())?;
    Ok(())
}

cfg_if::cfg_if! {
    if #[cfg(feature = "serde")] {
        use crate::chain::PairwiseTransforms;
        use crate::landmark::LandmarkSet;
        use crate::transform::AffineParams;
        use nalgebra::Point3;
        use std::io::{BufReader, BufWriter};

        /// 读取标志点 JSON: `{ "name": [x, y, z], ... }`.
        pub fn read_landmarks<P: AsRef<Path>>(path: P) -> DatasetResult<LandmarkSet> {
            let reader = BufReader::new(fs::File::open(path)?);
            let raw: BTreeMap<String, [f64; 3]> = serde_json::from_reader(reader)?;
            Ok(raw.into_iter().map(|(k, v)| (k, Point3::from(v))).collect())
        }

        /// 写出标志点 JSON, 格式同 [`read_landmarks`].
        pub fn write_landmarks<P: AsRef<Path>>(path: P, set: &LandmarkSet) -> DatasetResult<()> {
            let raw: BTreeMap<&str, [f64; 3]> = set.iter().map(|(k, p)| (k, (*p).into())).collect();
            let writer = BufWriter::new(fs::File::create(path)?);
            serde_json::to_writer_pretty(writer, &raw)?;
            Ok(())
        }

        /// 读取相邻切片变换 JSON: `{ "i": {"sx": .., "rx": .., "ry": .., "sy": .., "tx": .., "ty": ..}, ... }`,
        /// 其中 `i` 的变换把切片 `i` 映射到切片 `i - 1`.
        ///
        /// `len` 为切片总数; 为 `None` 时取最大索引加一.
        pub fn read_pairwise<P: AsRef<Path>>(
            path: P,
            len: Option<usize>,
        ) -> DatasetResult<PairwiseTransforms> {
            let reader = BufReader::new(fs::File::open(path)?);
            let raw: BTreeMap<usize, AffineParams> = serde_json::from_reader(reader)?;
            let len = len.unwrap_or_else(|| raw.keys().next_back().map_or(0, |i| i + 1));
            Ok(PairwiseTransforms::from_params(len, raw)?)
        }

        /// 写出每张切片的 6 参数变换 JSON, 格式同 [`read_pairwise`].
        pub fn write_section_params<P: AsRef<Path>>(
            path: P,
            rows: &[(usize, AffineParams)],
        ) -> DatasetResult<()> {
            let raw: BTreeMap<usize, AffineParams> = rows.iter().copied().collect();
            let writer = BufWriter::new(fs::File::create(path)?);
            serde_json::to_writer_pretty(writer, &raw)?;
            Ok(())
        }
    }
}
