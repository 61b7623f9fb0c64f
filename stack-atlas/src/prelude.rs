//! 🧭欢迎光临🗺️
//!
//! 涵盖了本 crate 一系列常用的功能.

pub use crate::Idx3d;

pub use crate::chain::{
    compose_to_anchor, compose_with_policy, AnchorPolicy, Direction, PairwiseTransforms,
    SectionTransforms,
};
pub use crate::config::{AtlasConfig, SpecimenGeometry};
pub use crate::error::{AtlasError, AtlasResult};
pub use crate::fit::{fit, AlignmentFit, FitStrategy, PointSetAligner};
pub use crate::landmark::{base_name, common_keys, LandmarkSet};
pub use crate::scale::{rescale, rescale_point, rescale_points, Rescale, Resolution};
pub use crate::transform::{AffineParams, Transform2d, Transform3d};
pub use crate::volume::{
    AtlasSession, AtlasShape, AtlasVolume, OriginPivot, PlacementNotice, PlacementReport,
    StructureVolume,
};

pub use crate::consts::label::{BACKGROUND, FOREGROUND};

pub use crate::dataset::{self, home_atlas_dir_with, DatasetError, StructureArchive};
