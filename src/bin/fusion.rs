/// 车辆感知融合 (回放)
///
/// 逐帧: 测距读数 → 检测框 → 多目标跟踪 → 单目测距 → 融合 → CSV日志
///
/// 主程序入口: cargo run --bin fusion -- --replay drive.jsonl
use anyhow::Result;
use clap::Parser;
use log::info;

use vehicle_fusion_rs::data_logger::{log_file_stem, CsvLogger};
use vehicle_fusion_rs::input::{load_replay, ReplayDetector, ScriptedSensor};
use vehicle_fusion_rs::logging::init_logging;
use vehicle_fusion_rs::{Args, FusionConfig, PerceptionLoop};

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.verbose, args.log_file.as_deref())?;

    let mut config = FusionConfig::load(&args.config)?;
    if let Some(dir) = &args.log_dir {
        config.logging.directory = dir.clone();
    }
    if args.no_log {
        config.logging.enabled = false;
    }
    config.print_summary();

    let frames = load_replay(&args.replay)?;
    info!("replay: {} frames from {}", frames.len(), args.replay.display());

    let sink = if config.logging.enabled {
        Some(CsvLogger::create(&config.logging.directory, &log_file_stem())?)
    } else {
        None
    };

    let sensor = ScriptedSensor::from_replay(&frames);
    let mut pipeline = PerceptionLoop::new(ReplayDetector, sensor, sink, &config)?;
    let summary = pipeline.run(frames)?;

    if let Some(logger) = pipeline.sink() {
        info!("{} rows written to {}", logger.rows(), logger.path().display());
    }
    info!(
        "done: {} frames, {} fused records",
        summary.frames, summary.records
    );
    Ok(())
}
