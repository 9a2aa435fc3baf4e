/// 感知流水线 (Perception Pipeline)
///
/// 单线程,逐帧顺序执行:
/// 测距读数 → 检测 → 跟踪更新 → 轨迹头测距 → 融合 → 日志
///
/// 所有状态变化在一帧内完成,任意两帧之间都可以安全停止
pub mod perception;

pub use perception::PerceptionLoop;

use crate::fusion::FusedRecord;

/// 单帧处理结果
#[derive(Clone, Debug)]
pub struct FrameSummary {
    pub frame_index: u64,
    pub sensor_distance: f32,
    pub detections: usize,
    pub rejected: usize,
    pub records: Vec<FusedRecord>,
}

/// 整次运行统计
#[derive(Clone, Debug, Default, PartialEq)]
pub struct RunSummary {
    pub frames: u64,
    pub records: u64,
    pub rejected: u64,
    pub tracks_born: u64,
    pub tracks_lost: u64,
}
