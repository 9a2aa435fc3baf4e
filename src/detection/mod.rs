/// 检测与跟踪 (Detection & Tracking)
///
/// - Detector: 检测器接口 (外部模型)
/// - Tracker:  IoU 关联 + 轨迹生命周期
/// - Assignment: 最优/贪心分配
pub mod assignment;
pub mod detector;
pub mod multi_tracker;
pub mod tracker;
pub mod types;

pub use detector::{ScriptedDetector, VehicleDetector};
pub use multi_tracker::{MultipleObjectTracker, UidAllocator};
pub use tracker::{compute_iou, Track, TrackState, Tracker, UpdateReport};
pub use types::{BBox, Detection};
