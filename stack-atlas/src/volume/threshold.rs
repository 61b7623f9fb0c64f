//! 概率体积阈值化与重叠度评估.

use crate::consts::FALLBACK_THRESHOLD;
use itertools::izip;
use ndarray::Array3;
use num::ToPrimitive;

/// 取正值体素的 `q` 分位数 (线性插值) 作为阈值, 返回严格大于阈值的体素掩膜.
///
/// `q` 被截断到 `[0, 1]`. 体积中没有正值体素时, 阈值退化为 [`FALLBACK_THRESHOLD`].
pub fn threshold_quantile<T: Copy + ToPrimitive>(volume: &Array3<T>, q: f64) -> Array3<bool> {
    let values = volume.mapv(|v| v.to_f64().unwrap_or(0.0));
    let mut positive: Vec<f64> = values.iter().copied().filter(|v| *v > 0.0).collect();
    let threshold = if positive.is_empty() {
        f64::from(FALLBACK_THRESHOLD)
    } else {
        positive.sort_by(f64::total_cmp);
        quantile(&positive, q.clamp(0.0, 1.0))
    };
    values.mapv(|v| v > threshold)
}

/// 已排序非空序列的线性插值分位数.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
}

/// 两个掩膜的 Dice 系数 `2|A ∩ B| / (|A| + |B|)`.
///
/// 形状不同, 或两者都为空时返回 `None`.
pub fn dice(a: &Array3<bool>, b: &Array3<bool>) -> Option<f64> {
    if a.dim() != b.dim() {
        return None;
    }
    let (mut inter, mut total) = (0usize, 0usize);
    for (x, y) in izip!(a.iter(), b.iter()) {
        inter += usize::from(*x && *y);
        total += usize::from(*x) + usize::from(*y);
    }
    (total != 0).then(|| 2.0 * inter as f64 / total as f64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::Array;

    #[test]
    fn test_threshold_quantile() {
        // 正值 1..=8, 中位数 4.5.
        let v = Array::from_shape_vec((3, 3, 1), vec![0.0f32, 1., 2., 3., 4., 5., 6., 7., 8.]).unwrap();
        let m = threshold_quantile(&v, 0.5);
        assert_eq!(m.iter().filter(|x| **x).count(), 4);
        assert!(!m[(1, 1, 0)]);
        assert!(m[(1, 2, 0)]);

        let all = threshold_quantile(&v, -1.0);
        assert_eq!(all.iter().filter(|x| **x).count(), 7);
    }

    #[test]
    fn test_threshold_fallback() {
        let v = Array3::<f32>::zeros((2, 2, 2));
        assert!(threshold_quantile(&v, 0.9).iter().all(|x| !*x));
        let mut v = Array3::<i32>::zeros((1, 1, 2));
        v[(0, 0, 1)] = -3;
        assert!(threshold_quantile(&v, 0.5).iter().all(|x| !*x));
    }

    #[test]
    fn test_dice() {
        let mut a = Array3::from_elem((2, 2, 1), false);
        let mut b = a.clone();
        a[(0, 0, 0)] = true;
        a[(0, 1, 0)] = true;
        b[(0, 1, 0)] = true;
        assert_relative_eq!(dice(&a, &b).unwrap(), 2.0 / 3.0);
        assert_eq!(dice(&a, &a), Some(1.0));
        assert_eq!(dice(&b.mapv(|_| false), &b.mapv(|_| false)), None);
        assert_eq!(dice(&a, &Array3::from_elem((1, 1, 1), true)), None);
    }
}
