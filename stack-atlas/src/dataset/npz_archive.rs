use super::{DatasetError, DatasetResult};
use crate::volume::StructureVolume;
use ndarray::{Array3, Ix3, OwnedRepr};
use ndarray_npy::{NpzReader, ReadableElement};
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

const NPY_EXT: &str = ".npy";

/// 结构体积归档: 一个 `.npz` 文件, 每个结构对应其中的 `{name}.npy`.
pub struct StructureArchive {
    entries: Vec<Mutex<NpzReader<File>>>,
    turn: AtomicUsize,
}

impl StructureArchive {
    /// 初始化.
    ///
    /// `workers` 指定了底层工作通道的个数, 最大为 64. 系统会从路径 `p` 打开文件
    /// `workers` 次, 每个通道各自持锁, 以便并行读取.
    pub fn new<P: AsRef<Path>>(workers: NonZeroUsize, p: P) -> DatasetResult<Self> {
        let workers = workers.get();
        if workers > 64 {
            return Err(DatasetError::TooManyWorkers(64));
        }
        let mut v = Vec::with_capacity(workers);
        for _ in 0..workers {
            let file = OpenOptions::new().read(true).open(p.as_ref())?;
            v.push(Mutex::new(NpzReader::new(file)?));
        }
        Ok(Self {
            entries: v,
            turn: AtomicUsize::new(0),
        })
    }

    /// 按结构名称读取体积. `name` 不含 `.npy` 后缀.
    pub fn volume<T: ReadableElement>(&self, name: &str) -> DatasetResult<Array3<T>> {
        let filename = format!("{name}{NPY_EXT}");
        let mut file = self.lock_next()?;
        Ok(file.by_name::<OwnedRepr<T>, Ix3>(filename.as_str())?)
    }

    /// 归档中全部结构名称 (去除 `.npy` 后缀), 按字典序排列.
    pub fn names(&self) -> DatasetResult<Vec<String>> {
        let mut names: Vec<String> = self
            .lock_next()?
            .names()?
            .into_iter()
            .map(|n| n.strip_suffix(NPY_EXT).map(str::to_owned).unwrap_or(n))
            .collect();
        names.sort();
        Ok(names)
    }

    /// 结构个数.
    pub fn len(&self) -> DatasetResult<usize> {
        Ok(self.lock_next()?.len())
    }

    /// 归档是否为空?
    pub fn is_empty(&self) -> DatasetResult<bool> {
        Ok(self.len()? == 0)
    }

    /// 工作通道个数.
    #[inline]
    pub fn worker_len(&self) -> usize {
        self.entries.len()
    }

    /// 读取归档中所有具有原点的结构, 按名称字典序排列.
    ///
    /// 缺少原点的结构会被跳过并记录警告.
    pub fn load_structures<T>(
        &self,
        origins: &BTreeMap<String, [f64; 3]>,
    ) -> DatasetResult<Vec<StructureVolume<T>>>
    where
        T: ReadableElement + Send,
    {
        let names = self.names()?;
        let wanted: Vec<Wanted<'_>> = names
            .iter()
            .filter_map(|n| match origins.get(n) {
                Some(o) => Some((n, *o)),
                None => {
                    log::warn!("{n}: 缺少原点, 跳过");
                    None
                }
            })
            .collect();

        load_all(&wanted, |(name, origin)| {
            self.volume::<T>(name)
                .map(|data| StructureVolume::new(name.as_str(), data, *origin))
        })
    }

    fn lock_next(&self) -> DatasetResult<MutexGuard<'_, NpzReader<File>>> {
        let slot = self.turn.fetch_add(1, Ordering::Relaxed) % self.worker_len();
        self.entries[slot].lock().map_err(|_| DatasetError::Poisoned)
    }
}

type Wanted<'a> = (&'a String, [f64; 3]);

cfg_if::cfg_if! {
    if #[cfg(feature = "rayon")] {
        use rayon::iter::{IntoParallelRefIterator, ParallelIterator};

        /// 借助 `rayon` 并行读取, 结果保持输入顺序.
        fn load_all<T, F>(wanted: &[Wanted<'_>], load: F) -> DatasetResult<Vec<StructureVolume<T>>>
        where
            T: Send,
            F: Fn(&Wanted<'_>) -> DatasetResult<StructureVolume<T>> + Sync + Send,
        {
            wanted.par_iter().map(load).collect()
        }
    } else {
        fn load_all<T, F>(wanted: &[Wanted<'_>], load: F) -> DatasetResult<Vec<StructureVolume<T>>>
        where
            F: Fn(&Wanted<'_>) -> DatasetResult<StructureVolume<T>>,
        {
            wanted.iter().map(load).collect()
        }
    }
}
