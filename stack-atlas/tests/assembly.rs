use approx::assert_relative_eq;
use nalgebra::{Point2, Point3, Rotation3, Vector3};
use ndarray::Array3;
use stack_atlas::prelude::*;

fn init_logger() {
    let _ = simple_logger::SimpleLogger::new()
        .with_level(log::LevelFilter::Debug)
        .init();
}

/// 5 张切片, 每张相对前一张平移并轻微旋转.
fn pairwise() -> PairwiseTransforms {
    let params = (1..5).map(|i| {
        let t = Transform2d::rigid(0.01 * i as f64, 2.0, -1.0);
        (i, AffineParams::from(t))
    });
    PairwiseTransforms::from_params(5, params).unwrap()
}

#[test]
fn test_chain_to_resample_params() {
    init_logger();
    let p = pairwise();
    let sections = compose_with_policy(&p, AnchorPolicy::Middle).unwrap();
    assert_eq!(sections.anchor(), 2);

    // 切片 3 上的点经 T(3) 落到锚点坐标系, 与直接用 P[3] 的结果一致.
    let q = Point2::new(5.0, 7.0);
    let direct = p.get(3).unwrap().apply_point(&q);
    let via = sections.get(3).unwrap().apply_point(&q);
    assert_relative_eq!(direct, via, epsilon = 1e-12);

    // 切片 1 的点经 T(1) 再经 P[2] 回到切片 1.
    let back = p.get(2).unwrap().apply_point(&sections.get(1).unwrap().apply_point(&q));
    assert_relative_eq!(back, q, epsilon = 1e-12);

    let full = sections.rescaled(10.4, 0.325).unwrap();
    for (i, t) in full.iter() {
        let small = sections.get(i).unwrap();
        assert_eq!(t.linear(), small.linear());
        assert_relative_eq!(t.translation(), small.translation() * 32.0, epsilon = 1e-9);
    }
    let rows = full.resample_params().unwrap();
    assert_eq!(rows.len(), 5);
    assert!(rows.windows(2).all(|w| w[0].0 < w[1].0));
}

#[test]
fn test_fit_then_place() {
    init_logger();

    // 参考标本与待对齐标本: 后者是前者旋转平移后的结果.
    let names = ["7N_L", "7N_R", "LC_L", "SC", "VLL_R"];
    let atlas_space = [
        Point3::new(10.0, 10.0, 2.0),
        Point3::new(10.0, 30.0, 2.0),
        Point3::new(20.0, 15.0, 6.0),
        Point3::new(5.0, 20.0, 9.0),
        Point3::new(25.0, 25.0, 4.0),
    ];
    let truth = Transform3d::from_rotation_translation(
        Rotation3::from_euler_angles(0.0, 0.0, 0.3).matrix(),
        &Vector3::new(-4.0, 6.0, 1.0),
        1.0,
    );
    let inverse = truth.try_inverse().unwrap();
    let fixed: LandmarkSet = names.iter().copied().zip(atlas_space).collect();
    let moving = fixed.map_points(|p| inverse.apply_point(p));

    let fit = PointSetAligner::new(FitStrategy::RigidSimilarity { allow_scale: false })
        .fit_sets(&moving, &fixed)
        .unwrap();
    assert_eq!(fit.keys.len(), 5);
    assert!(fit.rms < 1e-9);
    assert!(fit.transform.max_abs_diff(&truth) < 1e-9);

    // 待对齐标本中的结构: 原点经全局变换落到图谱中.
    let mask = Array3::from_elem((3, 3, 2), true);
    let structures: Vec<StructureVolume<u8>> = [
        ("7N_L", Point3::new(10.0, 10.0, 2.0)),
        ("SC", Point3::new(5.0, 20.0, 9.0)),
        ("far", Point3::new(500.0, 500.0, 2.0)),
    ]
    .into_iter()
    .map(|(name, at)| {
        let o = inverse.apply_point(&at);
        StructureVolume::from_mask(name, &mask, FOREGROUND, [o.x, o.y, o.z])
            .with_mapped_origin(&fit.transform, OriginPivot::Corner)
    })
    .collect();

    let session = AtlasSession::allocate(AtlasShape::new(40, 40, 10));
    let (atlas, report) = session.place(&structures);

    assert_eq!(report.entries().len(), 3);
    assert_eq!(report.get("7N_L").unwrap().start, [10, 10, 2]);
    assert_eq!(report.get("7N_L").unwrap().notice, PlacementNotice::Placed);
    // SC 从切片 9 开始, 只剩一张在图谱内.
    assert_eq!(
        report.get("SC").unwrap().notice,
        PlacementNotice::PartiallyClipped {
            clipped: [(0, 0), (0, 0), (0, 1)]
        }
    );
    assert_eq!(
        report.get("far").unwrap().notice,
        PlacementNotice::SkippedOutOfBounds
    );
    assert_eq!(atlas.count(FOREGROUND), 3 * 3 * 2 + 3 * 3);
    assert_eq!(atlas.data()[(11, 11, 3)], FOREGROUND);
    assert_eq!(atlas.data()[(5, 20, 9)], FOREGROUND);
    assert_eq!(atlas.count(BACKGROUND), 40 * 40 * 10 - 27);
}
