//! 图谱构建配置.

use crate::chain::AnchorPolicy;
use crate::error::{AtlasError, AtlasResult};
use crate::fit::{FitStrategy, PointSetAligner};
use crate::scale::scale_factor;
use crate::volume::{AtlasShape, OriginPivot};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// 标本全分辨率几何信息.
#[derive(Copy, Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SpecimenGeometry {
    /// 全分辨率宽度 (像素).
    pub width: usize,

    /// 全分辨率高度 (像素).
    pub height: usize,

    /// 图谱相对全分辨率的降采样因子.
    pub downsample: f64,

    /// 切片数. 为 0 时由相邻变换集合的长度决定.
    pub sections: usize,
}

impl Default for SpecimenGeometry {
    fn default() -> Self {
        Self {
            width: 0,
            height: 0,
            downsample: 32.0,
            sections: 0,
        }
    }
}

/// 一次图谱构建的全部参数.
#[derive(Clone, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct AtlasConfig {
    /// 变换链的锚点.
    pub anchor: AnchorPolicy,

    /// 标志点拟合策略.
    pub strategy: FitStrategy,

    /// 相邻切片变换计算时所用的分辨率 (µm / px).
    pub transform_resolution: f64,

    /// 下游重采样使用的分辨率 (µm / px).
    pub target_resolution: f64,

    /// 标志点坐标单位到图谱体素的换算: 每个图谱体素对应的标志点单位长度.
    pub landmark_scale: f64,

    /// 标本几何信息.
    pub specimen: SpecimenGeometry,

    /// 只用这些结构 (基础名称) 参与拟合. `None` 表示全部.
    pub region: Option<Vec<String>>,

    /// 施加全局变换时以哪一点为准.
    pub origin_pivot: OriginPivot,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            anchor: AnchorPolicy::Middle,
            strategy: FitStrategy::default(),
            transform_resolution: 10.4,
            target_resolution: 0.325,
            landmark_scale: 10.4,
            specimen: SpecimenGeometry::default(),
            region: None,
            origin_pivot: OriginPivot::default(),
        }
    }
}

impl AtlasConfig {
    /// 检查各分辨率均为正的有限值, 且标本几何推出的图谱平面非空.
    pub fn validate(&self) -> AtlasResult<()> {
        scale_factor(self.transform_resolution, self.target_resolution)?;
        scale_factor(1.0, self.landmark_scale)?;
        let shape = self.atlas_shape(0)?;
        if shape.rows == 0 || shape.cols == 0 {
            let SpecimenGeometry {
                width,
                height,
                downsample,
                ..
            } = self.specimen;
            return Err(AtlasError::EmptyAtlasPlane {
                width,
                height,
                downsample,
            });
        }
        Ok(())
    }

    /// 图谱形状. `fallback_sections` 在配置未给出切片数时使用.
    pub fn atlas_shape(&self, fallback_sections: usize) -> AtlasResult<AtlasShape> {
        let SpecimenGeometry {
            width,
            height,
            downsample,
            sections,
        } = self.specimen;
        let sections = if sections == 0 {
            fallback_sections
        } else {
            sections
        };
        AtlasShape::from_specimen(width, height, downsample, sections)
    }

    /// 按配置构建对齐器.
    pub fn aligner(&self) -> PointSetAligner {
        let aligner = PointSetAligner::new(self.strategy);
        match &self.region {
            Some(r) => aligner.with_region(r.iter().cloned()),
            None => aligner,
        }
    }
}

#[cfg(feature = "serde")]
impl AtlasConfig {
    /// 从 JSON 文本解析. 缺省字段取默认值.
    pub fn from_json_str(s: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(s)
    }

    /// 从 JSON 文件读取.
    pub fn from_json_file<P: AsRef<std::path::Path>>(
        path: P,
    ) -> crate::dataset::DatasetResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Ok(Self::from_json_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn specimen(width: usize, height: usize) -> SpecimenGeometry {
        SpecimenGeometry {
            width,
            height,
            ..Default::default()
        }
    }

    #[test]
    fn test_default() {
        let c = AtlasConfig::default();
        assert_eq!(c.anchor, AnchorPolicy::Middle);
        assert_eq!(c.atlas_shape(5).unwrap().dim(), (0, 0, 5));
    }

    #[test]
    fn test_empty_atlas_plane_rejected() {
        // 默认配置没有标本宽高.
        assert_eq!(
            AtlasConfig::default().validate(),
            Err(AtlasError::EmptyAtlasPlane {
                width: 0,
                height: 0,
                downsample: 32.0
            })
        );

        // 高度小于降采样因子, 行数为 0.
        let c = AtlasConfig {
            specimen: specimen(640, 31),
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(AtlasError::EmptyAtlasPlane { height: 31, .. })
        ));

        let c = AtlasConfig {
            specimen: specimen(640, 320),
            ..Default::default()
        };
        assert_eq!(c.validate(), Ok(()));
    }

    #[test]
    fn test_invalid_resolution() {
        let c = AtlasConfig {
            target_resolution: 0.0,
            specimen: specimen(640, 320),
            ..Default::default()
        };
        assert!(matches!(
            c.validate(),
            Err(AtlasError::InvalidResolution { .. })
        ));
    }

    #[test]
    fn test_shape_from_specimen() {
        let c = AtlasConfig {
            specimen: SpecimenGeometry {
                width: 640,
                height: 320,
                downsample: 32.0,
                sections: 7,
            },
            ..Default::default()
        };
        assert_eq!(c.atlas_shape(100).unwrap().dim(), (10, 20, 7));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn test_from_json() {
        let c = AtlasConfig::from_json_str(
            r#"{
                "anchor": {"index": 3},
                "strategy": {"rigid_similarity": {"allow_scale": true}},
                "region": ["7N", "SC"],
                "origin_pivot": "center",
                "specimen": {"width": 100, "height": 50}
            }"#,
        )
        .unwrap();
        assert_eq!(c.anchor, AnchorPolicy::Index(3));
        assert_eq!(c.strategy, FitStrategy::RigidSimilarity { allow_scale: true });
        assert_eq!(c.origin_pivot, OriginPivot::Center);
        assert_eq!(c.specimen.downsample, 32.0);
        assert_eq!(c.target_resolution, 0.325);
        assert_eq!(c.aligner().strategy(), c.strategy);

        let c = AtlasConfig::from_json_str(r#"{"anchor": "last", "strategy": "least_squares_affine"}"#)
            .unwrap();
        assert_eq!(c.anchor, AnchorPolicy::Last);
        assert_eq!(c.strategy, FitStrategy::LeastSquaresAffine);
        assert!(AtlasConfig::from_json_str(r#"{"anchor": "nowhere"}"#).is_err());
    }
}
