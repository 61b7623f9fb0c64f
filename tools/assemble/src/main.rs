//! 图谱拼装: 变换链合成 -> 标志点拟合 -> 结构放置.

mod result;
mod runner;

use log::LevelFilter;
use simple_logger::SimpleLogger;

fn main() {
    let level = std::env::var("ATLAS_LOG")
        .ok()
        .and_then(|s| s.parse::<LevelFilter>().ok())
        .unwrap_or(LevelFilter::Info);
    SimpleLogger::new()
        .with_level(level)
        .init()
        .expect("Logger initialization error");

    runner::run().analyze();
}
