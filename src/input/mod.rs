/// 输入系统 (Input System)
///
/// 系统边界上的外部协作者:
/// - RangingSensor: 单线测距传感器,每帧采样一次
/// - Replay: 录制的检测框 + 测距回放 (代替视频与传感器驱动)
pub mod replay;
pub mod sensor;

pub use replay::{load_replay, parse_replay, ReplayDetector, ReplayFrame};
pub use sensor::{ConstantSensor, RangingSensor, ScriptedSensor};
