//! 程序运行函数.

use crate::result::AssembleResult;
use stack_atlas::dataset;
use stack_atlas::prelude::*;
use stack_atlas::scale::scale_factor;
use utils::loader;

/// 实际运行.
pub fn run() -> AssembleResult {
    let dir = loader::data_dir_from_env_or_home();
    assert!(dir.is_dir(), "Data directory {dir:?} does not exist");
    let dir = dir.as_path();

    let config = loader::config(dir).expect("Loading config error");
    config.validate().expect("Invalid config");

    // 1. 变换链.
    let pairwise = loader::pairwise(dir, config.specimen.sections)
        .expect("Loading pairwise transforms error");
    let sections =
        compose_with_policy(&pairwise, config.anchor).expect("Composing transforms error");
    let full = sections
        .rescaled(config.transform_resolution, config.target_resolution)
        .expect("Rescaling transforms error");
    let params = full.resample_params().expect("Inverting section transforms error");

    // 2. 标志点拟合, 坐标先换算到图谱体素.
    let (moving, fixed) = loader::landmarks(dir).expect("Loading landmarks error");
    let factor = scale_factor(1.0, config.landmark_scale).expect("Invalid landmark scale");
    let moving = moving.map_points(|p| p.rescale_by(factor));
    let fixed = fixed.map_points(|p| p.rescale_by(factor));
    let fit = config
        .aligner()
        .fit_sets(&moving, &fixed)
        .expect("Fitting landmarks error");

    // 3. 结构放置.
    let structures: Vec<_> = loader::structures(dir)
        .expect("Loading structures error")
        .into_iter()
        .map(|s| s.with_mapped_origin(&fit.transform, config.origin_pivot))
        .collect();
    let shape = config
        .atlas_shape(pairwise.len())
        .expect("Invalid specimen geometry");
    let (atlas, report) = AtlasSession::allocate(shape).place(&structures);

    let out = loader::output_dir(dir).expect("Creating output directory error");
    let atlas_path = out.join("atlas.npy");
    let sections_path = out.join("sections.json");
    dataset::write_atlas(&atlas_path, &atlas).expect("Writing atlas error");
    dataset::write_section_params(&sections_path, &params)
        .expect("Writing section transforms error");

    AssembleResult {
        anchor: full.anchor(),
        sections: full.len(),
        fit,
        shape,
        nonzero: atlas.nonzero(),
        report,
        outputs: vec![atlas_path, sections_path],
    }
}
