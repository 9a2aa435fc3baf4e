// Ultralytics 🚀 AGPL-3.0 License - https://ultralytics.com/license
pub mod config; // 命令行参数
pub mod data_logger; // CSV数据日志
pub mod detection; // 检测接口与多目标跟踪
pub mod distance; // 单目测距
pub mod error; // 错误类型
pub mod fusion; // 距离融合
pub mod input; // 测距传感器与回放输入
pub mod logging; // 运行日志
pub mod pipeline; // 逐帧感知循环
pub mod tracker_config; // 跟踪/融合配置

pub use crate::config::Args;
pub use crate::data_logger::{CsvLogger, MemorySink, RecordSink};
pub use crate::detection::{
    compute_iou, BBox, Detection, MultipleObjectTracker, Track, TrackState, Tracker,
    UpdateReport, VehicleDetector,
};
pub use crate::distance::{CameraCalibration, DistanceEstimate, DistancePredictor};
pub use crate::error::TrackError;
pub use crate::fusion::FusedRecord;
pub use crate::input::RangingSensor;
pub use crate::pipeline::{PerceptionLoop, RunSummary};
pub use crate::tracker_config::{AssignmentMethod, FusionConfig, TentativePolicy, TrackerConfig};
