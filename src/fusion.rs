//! 距离融合 (Distance fusion)
//!
//! 每个轨迹头: 图像测距 + 本帧唯一一次的测距读数 → 一条记录。
//! 单线传感器不区分目标,同一帧所有记录带相同的 `sensor_distance`。

use chrono::{DateTime, Local};
use log::debug;

use crate::detection::{BBox, Track};
use crate::distance::DistancePredictor;

/// 日志时间格式,毫秒精度
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// 融合记录 (一帧一个轨迹一条)
#[derive(Clone, Debug, PartialEq)]
pub struct FusedRecord {
    pub frame_index: u64,
    pub timestamp: DateTime<Local>,
    pub uid: u64,
    pub bbox: BBox,
    /// 测距传感器读数
    pub sensor_distance: f32,
    /// 图像尺寸测距,框退化时为 None
    pub predicted_distance: Option<f32>,
    /// 地面角 (弧度),底边不落地时为 None
    pub ground_angle: Option<f32>,
    /// 地面角测距
    pub predicted_ground_distance: Option<f32>,
}

impl FusedRecord {
    pub fn timestamp_string(&self) -> String {
        self.timestamp.format(TIMESTAMP_FORMAT).to_string()
    }
}

/// 融合一帧的所有轨迹头
pub fn fuse_heads(
    heads: &[&Track],
    predictor: &DistancePredictor,
    sensor_distance: f32,
    frame_index: u64,
    timestamp: DateTime<Local>,
) -> Vec<FusedRecord> {
    heads
        .iter()
        .map(|track| {
            let bbox = track.latest_bbox();
            let estimate = match predictor.predict(&bbox) {
                Ok(estimate) => Some(estimate),
                Err(e) => {
                    debug!(
                        "frame {}: no ground distance for track {}: {}",
                        frame_index,
                        track.uid(),
                        e
                    );
                    None
                }
            };
            // 地面角失败时尺寸测距仍可能有效
            let predicted_distance = match estimate {
                Some(estimate) => Some(estimate.distance),
                None => predictor.size_distance(&bbox).ok(),
            };

            FusedRecord {
                frame_index,
                timestamp,
                uid: track.uid(),
                bbox,
                sensor_distance,
                predicted_distance,
                ground_angle: estimate.map(|e| e.ground_angle),
                predicted_ground_distance: estimate.map(|e| e.ground_distance),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::detection::{Detection, MultipleObjectTracker, Tracker};
    use crate::tracker_config::TrackerConfig;

    fn tracker_with(boxes: &[[f32; 4]]) -> MultipleObjectTracker {
        let config = TrackerConfig {
            report_tentative: true,
            ..Default::default()
        };
        let mut tracker = MultipleObjectTracker::new(config).unwrap();
        let detections: Vec<Detection> = boxes
            .iter()
            .map(|c| Detection::new(BBox::from_array(*c), 1))
            .collect();
        tracker.update(&detections, 1).unwrap();
        tracker
    }

    #[test]
    fn test_every_head_gets_same_sensor_reading() {
        let tracker = tracker_with(&[[100.0, 280.0, 180.0, 340.0], [500.0, 290.0, 600.0, 380.0]]);
        let heads = tracker.get_track_heads();
        let now = Local::now();
        let records = fuse_heads(&heads, &DistancePredictor::default(), 33.0, 1, now);

        assert_eq!(records.len(), 2);
        assert!(records.iter().all(|r| r.sensor_distance == 33.0));
        assert!(records.iter().all(|r| r.timestamp == now && r.frame_index == 1));
        assert_eq!(records[0].uid, 1);
        assert_eq!(records[1].uid, 2);
        // 图像测距各不相同
        assert_ne!(records[0].predicted_distance, records[1].predicted_distance);
    }

    #[test]
    fn test_prediction_failure_keeps_record() {
        // 底边在地平线以上,地面角测距失败
        let tracker = tracker_with(&[[100.0, 100.0, 180.0, 200.0]]);
        let heads = tracker.get_track_heads();
        let records = fuse_heads(&heads, &DistancePredictor::default(), 12.0, 1, Local::now());

        assert_eq!(records.len(), 1);
        assert_eq!(records[0].sensor_distance, 12.0);
        // 尺寸测距保留: 高 100 → 35, 宽 80 → 52.5
        let distance = records[0].predicted_distance.unwrap();
        assert!((distance - 43.75).abs() < 1e-3);
        assert_eq!(records[0].ground_angle, None);
        assert_eq!(records[0].predicted_ground_distance, None);
        assert_eq!(records[0].bbox, BBox::new(100.0, 100.0, 180.0, 200.0));
    }

    #[test]
    fn test_timestamp_format() {
        let tracker = tracker_with(&[[100.0, 280.0, 180.0, 340.0]]);
        let heads = tracker.get_track_heads();
        let records = fuse_heads(&heads, &DistancePredictor::default(), 1.0, 1, Local::now());
        let ts = records[0].timestamp_string();
        // 2024-01-01 12:00:00.123
        assert_eq!(ts.len(), 23);
        assert_eq!(&ts[19..20], ".");
    }
}
