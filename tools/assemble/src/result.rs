//! 运行结果.

use stack_atlas::prelude::*;
use std::io::{self, Write};
use std::path::PathBuf;

/// 图谱拼装最终结果.
pub struct AssembleResult {
    pub anchor: usize,
    pub sections: usize,
    pub fit: AlignmentFit,
    pub shape: AtlasShape,
    pub nonzero: usize,
    pub report: PlacementReport,
    pub outputs: Vec<PathBuf>,
}

/// 将变换链与拟合的结果写进 `w` 中.
fn describe_alignment<W: Write>(r: &AssembleResult, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Section chain:")?;
    writeln!(w, "{S4}Sections: {}", r.sections)?;
    writeln!(w, "{S4}Anchor: {}", r.anchor)?;
    writeln!(w, "Landmark fit `{:?}`:", r.fit.strategy)?;
    writeln!(w, "{S4}Common landmarks: {}", r.fit.keys.len())?;
    writeln!(w, "{S4}RMS residual: {:.6} voxels", r.fit.rms)?;
    let worst = r
        .fit
        .keys
        .iter()
        .zip(r.fit.residuals.iter())
        .max_by(|a, b| a.1.total_cmp(b.1));
    match worst {
        Some((k, v)) => write!(w, "{S4}Largest residual: {v:.6} at `{k}`")?,
        None => write!(w, "{S4}Largest residual: /")?,
    }
    Ok(())
}

/// 将放置报告写进 `w` 中.
fn describe_placement<W: Write>(r: &AssembleResult, w: &mut W) -> io::Result<()> {
    const S4: &str = "    ";

    writeln!(w, "Atlas {:?}:", r.shape.dim())?;
    writeln!(w, "{S4}Structures: {}", r.report.entries().len())?;
    writeln!(w, "{S4}Placed: {}", r.report.placed())?;
    writeln!(w, "{S4}Clipped: {}", r.report.clipped())?;
    writeln!(w, "{S4}Skipped: {}", r.report.skipped())?;
    writeln!(w, "{S4}Overflowed voxels: {}", r.report.overflowed())?;
    writeln!(w, "{S4}Non-zero voxels: {}", r.nonzero)?;
    for e in r.report.entries() {
        match e.notice {
            PlacementNotice::Placed => {}
            PlacementNotice::PartiallyClipped { clipped } => {
                writeln!(w, "{S4}{S4}{} at {:?} clipped {:?}", e.name, e.start, clipped)?
            }
            PlacementNotice::SkippedOutOfBounds => {
                writeln!(w, "{S4}{S4}{} at {:?} skipped", e.name, e.start)?
            }
        }
    }
    for p in r.outputs.iter() {
        writeln!(w, "{S4}Written: {}", p.display())?;
    }
    Ok(())
}

impl AssembleResult {
    /// 分析运行结果.
    pub fn analyze(&self) {
        utils::sep();
        let mut buf = Vec::with_capacity(512);

        for describe in [describe_alignment::<Vec<u8>>, describe_placement::<Vec<u8>>] {
            describe(self, &mut buf).expect("Writing into memory buffer error");
            println!("{}", String::from_utf8_lossy(&buf).trim_end());
            buf.clear();

            utils::sep();
        }
    }
}
