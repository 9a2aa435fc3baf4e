//! IoU 多目标跟踪器
//! Multiple object tracker: IoU association + track lifecycle
//!
//! 每帧流程:
//! 1. 帧号检查,逐条校验检测
//! 2. 轨迹头与检测的 IoU 亲和矩阵
//! 3. 分配 (默认最优匹配,可选贪心),低于阈值的配对一律不匹配
//! 4. 匹配 → 追加历史;未匹配轨迹 → 计数,超期销毁;未匹配检测 → 新轨迹
//!
//! 状态机: Tentative → Confirmed → Lost → 销毁, Tentative 也可直接 Lost

use anyhow::Result;
use log::{debug, trace, warn};

use super::assignment::{assign, iou_matrix};
use super::tracker::{Track, TrackState, Tracker, UpdateReport};
use super::types::{BBox, Detection};
use crate::error::TrackError;
use crate::tracker_config::TrackerConfig;

/// 轨迹 uid 分配器,单调递增,从1开始,永不复用
#[derive(Debug, Clone)]
pub struct UidAllocator {
    next: u64,
}

impl UidAllocator {
    pub fn new() -> Self {
        Self { next: 1 }
    }

    pub fn allocate(&mut self) -> u64 {
        let uid = self.next;
        self.next += 1;
        uid
    }

    /// 下一个将要分配的 uid
    pub fn peek(&self) -> u64 {
        self.next
    }
}

impl Default for UidAllocator {
    fn default() -> Self {
        Self::new()
    }
}

/// 多目标跟踪器
pub struct MultipleObjectTracker {
    /// 存活轨迹,按 uid 升序
    tracks: Vec<Track>,

    uids: UidAllocator,

    /// 上一次 update 的帧号
    last_frame_id: Option<u64>,

    config: TrackerConfig,
}

impl MultipleObjectTracker {
    pub fn new(config: TrackerConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            tracks: Vec::new(),
            uids: UidAllocator::new(),
            last_frame_id: None,
            config,
        })
    }

    pub fn config(&self) -> &TrackerConfig {
        &self.config
    }

    /// 全部存活轨迹 (任意状态),按 uid 升序
    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    pub fn track(&self, uid: u64) -> Option<&Track> {
        self.tracks.iter().find(|t| t.uid() == uid)
    }

    pub fn next_uid(&self) -> u64 {
        self.uids.peek()
    }

    pub fn last_frame_id(&self) -> Option<u64> {
        self.last_frame_id
    }

    fn check_detection(detection: &Detection, frame_id: u64) -> Result<(), TrackError> {
        if detection.frame_id != frame_id {
            return Err(TrackError::invalid_input(format!(
                "detection from frame {} passed to update for frame {}",
                detection.frame_id, frame_id
            )));
        }
        detection.bbox.validate()
    }
}

impl Default for MultipleObjectTracker {
    fn default() -> Self {
        Self {
            tracks: Vec::new(),
            uids: UidAllocator::new(),
            last_frame_id: None,
            config: TrackerConfig::default(),
        }
    }
}

impl Tracker for MultipleObjectTracker {
    fn update(
        &mut self,
        detections: &[Detection],
        frame_id: u64,
    ) -> Result<UpdateReport, TrackError> {
        // 1. 帧号必须严格递增,失败时不修改任何状态
        let previous = self.last_frame_id.unwrap_or(0);
        if frame_id <= previous {
            return Err(TrackError::SequenceViolation {
                previous,
                got: frame_id,
            });
        }
        self.last_frame_id = Some(frame_id);

        let mut report = UpdateReport {
            frame_id,
            ..Default::default()
        };

        // 2. 逐条校验,坏检测跳过
        let mut valid: Vec<(usize, &Detection)> = Vec::with_capacity(detections.len());
        for (idx, detection) in detections.iter().enumerate() {
            match Self::check_detection(detection, frame_id) {
                Ok(()) => valid.push((idx, detection)),
                Err(e) => {
                    warn!("frame {}: skipping detection #{}: {}", frame_id, idx, e);
                    report.rejected.push((idx, e));
                }
            }
        }

        // 3. IoU 亲和矩阵 + 分配
        let track_boxes: Vec<BBox> = self.tracks.iter().map(|t| t.latest_bbox()).collect();
        let det_boxes: Vec<BBox> = valid.iter().map(|(_, d)| d.bbox).collect();
        let affinity = iou_matrix(&track_boxes, &det_boxes);
        let assignments = assign(
            &affinity,
            self.config.iou_threshold,
            self.config.assignment,
        );

        let mut matched_det = vec![false; valid.len()];
        let mut matched_track = vec![false; self.tracks.len()];

        for (track_idx, local_det_idx) in assignments {
            matched_det[local_det_idx] = true;
            matched_track[track_idx] = true;

            let (det_idx, detection) = valid[local_det_idx];
            let track = &mut self.tracks[track_idx];
            if track.mark_matched(detection, self.config.confirm_hits) {
                debug!("frame {}: track {} confirmed", frame_id, track.uid());
                report.confirmed.push(track.uid());
            }
            trace!(
                "frame {}: track {} <- detection #{} (iou {:.3})",
                frame_id,
                track.uid(),
                det_idx,
                affinity[(track_idx, local_det_idx)]
            );
            report.matched.push((track.uid(), det_idx));
        }

        // 4. 未匹配的轨迹 → 计数,超过宽限期则 Lost 并销毁
        for (track_idx, &matched) in matched_track.iter().enumerate() {
            if matched {
                continue;
            }
            let track = &mut self.tracks[track_idx];
            if track.mark_missed(self.config.max_misses, self.config.tentative_policy) {
                debug!(
                    "frame {}: track {} lost after {} misses",
                    frame_id,
                    track.uid(),
                    track.frames_since_seen()
                );
                report.lost.push(track.uid());
            }
        }
        self.tracks.retain(|t| t.state() != TrackState::Lost);

        // 5. 未匹配的检测 → 新建轨迹
        for (local_det_idx, &matched) in matched_det.iter().enumerate() {
            if matched {
                continue;
            }
            let uid = self.uids.allocate();
            self.tracks.push(Track::new(uid, valid[local_det_idx].1));
            debug!("frame {}: track {} born", frame_id, uid);
            report.born.push(uid);
        }

        Ok(report)
    }

    fn get_track_heads(&self) -> Vec<&Track> {
        self.tracks
            .iter()
            .filter(|t| match t.state() {
                TrackState::Confirmed => true,
                TrackState::Tentative => self.config.report_tentative,
                TrackState::Lost => false,
            })
            .collect()
    }

    /// 清除所有轨迹和帧号游标,uid 分配器保留,重置后 uid 依然不重复
    fn reset(&mut self) {
        self.tracks.clear();
        self.last_frame_id = None;
    }

    fn track_count(&self) -> usize {
        self.tracks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tracker_config::{AssignmentMethod, TentativePolicy};

    fn det(coords: [f32; 4], frame_id: u64) -> Detection {
        Detection::new(BBox::from_array(coords), frame_id)
    }

    fn config_with(f: impl FnOnce(&mut TrackerConfig)) -> TrackerConfig {
        let mut config = TrackerConfig::default();
        f(&mut config);
        config
    }

    fn head_uids(tracker: &MultipleObjectTracker) -> Vec<u64> {
        tracker.get_track_heads().iter().map(|t| t.uid()).collect()
    }

    #[test]
    fn test_single_object_lifecycle() {
        // K=3, G=3
        let mut tracker = MultipleObjectTracker::default();

        let report = tracker.update(&[det([10.0, 10.0, 50.0, 50.0], 1)], 1).unwrap();
        assert_eq!(report.born, vec![1]);
        assert_eq!(tracker.tracks()[0].state(), TrackState::Tentative);
        assert!(tracker.get_track_heads().is_empty());

        tracker.update(&[det([12.0, 11.0, 52.0, 51.0], 2)], 2).unwrap();
        let track = tracker.track(1).unwrap();
        assert_eq!(track.age(), 2);
        assert_eq!(track.state(), TrackState::Tentative);

        tracker.update(&[det([14.0, 12.0, 54.0, 52.0], 3)], 3).unwrap();
        assert_eq!(tracker.track(1).unwrap().state(), TrackState::Tentative);
        let report = tracker.update(&[det([16.0, 13.0, 56.0, 53.0], 4)], 4).unwrap();
        assert_eq!(report.confirmed, vec![1]);
        assert_eq!(head_uids(&tracker), vec![1]);

        // 未匹配 G 次仍存活
        for frame_id in 5..=7 {
            let report = tracker.update(&[], frame_id).unwrap();
            assert!(report.lost.is_empty());
            assert_eq!(
                tracker.track(1).unwrap().frames_since_seen(),
                (frame_id - 4) as u32
            );
            assert_eq!(head_uids(&tracker), vec![1]);
        }

        // 第 G+1 次未匹配销毁
        let report = tracker.update(&[], 8).unwrap();
        assert_eq!(report.lost, vec![1]);
        assert!(tracker.get_track_heads().is_empty());
        assert_eq!(tracker.track_count(), 0);

        // uid 不复用
        let report = tracker.update(&[det([10.0, 10.0, 50.0, 50.0], 9)], 9).unwrap();
        assert_eq!(report.born, vec![2]);
    }

    #[test]
    fn test_smooth_motion_keeps_one_uid() {
        let mut tracker = MultipleObjectTracker::default();
        let mut seen = std::collections::BTreeSet::new();
        for frame_id in 1..=60u64 {
            let dx = frame_id as f32 * 3.0;
            let dy = frame_id as f32 * 0.5;
            tracker
                .update(&[det([100.0 + dx, 80.0 + dy, 180.0 + dx, 140.0 + dy], frame_id)], frame_id)
                .unwrap();
            for track in tracker.tracks() {
                seen.insert(track.uid());
            }
        }
        assert_eq!(seen.len(), 1);
        let track = tracker.track(1).unwrap();
        assert_eq!(track.age(), 60);
        assert!(track.is_confirmed());
        // 历史按帧号严格递增
        assert!(track.history().windows(2).all(|w| w[0].0 < w[1].0));
    }

    #[test]
    fn test_two_separated_detections() {
        let config = config_with(|c| c.report_tentative = true);
        let mut tracker = MultipleObjectTracker::new(config).unwrap();
        let report = tracker
            .update(
                &[det([0.0, 0.0, 20.0, 20.0], 1), det([200.0, 200.0, 240.0, 240.0], 1)],
                1,
            )
            .unwrap();
        assert_eq!(report.born, vec![1, 2]);
        let heads = tracker.get_track_heads();
        assert_eq!(heads.len(), 2);
        assert!(heads.iter().all(|t| t.state() == TrackState::Tentative));
        assert_eq!(heads[0].latest_bbox(), BBox::new(0.0, 0.0, 20.0, 20.0));
        assert_eq!(heads[1].latest_bbox(), BBox::new(200.0, 200.0, 240.0, 240.0));
    }

    #[test]
    fn test_non_overlapping_batches_get_fresh_uids() {
        let mut tracker = MultipleObjectTracker::default();
        let first = tracker
            .update(&[det([0.0, 0.0, 10.0, 10.0], 1), det([20.0, 0.0, 30.0, 10.0], 1)], 1)
            .unwrap();
        let second = tracker
            .update(&[det([0.0, 50.0, 10.0, 60.0], 2), det([20.0, 50.0, 30.0, 60.0], 2)], 2)
            .unwrap();
        assert_eq!(first.born, vec![1, 2]);
        assert_eq!(second.born, vec![3, 4]);
        assert!(second.matched.is_empty());
        // Strict: 未匹配的 Tentative 立即销毁
        assert_eq!(second.lost, vec![1, 2]);
        let uids: Vec<u64> = tracker.tracks().iter().map(|t| t.uid()).collect();
        assert_eq!(uids, vec![3, 4]);
    }

    #[test]
    fn test_lenient_policy_keeps_tentative() {
        let config = config_with(|c| {
            c.tentative_policy = TentativePolicy::Lenient;
            c.max_misses = 2;
        });
        let mut tracker = MultipleObjectTracker::new(config).unwrap();
        tracker.update(&[det([0.0, 0.0, 10.0, 10.0], 1)], 1).unwrap();
        assert!(tracker.update(&[], 2).unwrap().lost.is_empty());
        assert!(tracker.update(&[], 3).unwrap().lost.is_empty());

        // 再次出现: 同一 uid, 但连续匹配计数已清零
        let report = tracker.update(&[det([1.0, 0.0, 11.0, 10.0], 4)], 4).unwrap();
        assert_eq!(report.matched, vec![(1, 0)]);
        assert_eq!(tracker.track(1).unwrap().hit_streak(), 1);

        tracker.update(&[], 5).unwrap();
        tracker.update(&[], 6).unwrap();
        assert_eq!(tracker.update(&[], 7).unwrap().lost, vec![1]);
    }

    #[test]
    fn test_invalid_detections_are_skipped() {
        let mut tracker = MultipleObjectTracker::default();
        let report = tracker
            .update(
                &[
                    det([f32::NAN, 0.0, 10.0, 10.0], 1),
                    det([0.0, 0.0, 10.0, 10.0], 1),
                    det([50.0, 50.0, 40.0, 60.0], 1), // x1 > x2
                    det([100.0, 100.0, 110.0, 110.0], 3), // 帧号不符
                ],
                1,
            )
            .unwrap();
        let rejected: Vec<usize> = report.rejected.iter().map(|(i, _)| *i).collect();
        assert_eq!(rejected, vec![0, 2, 3]);
        assert!(report
            .rejected
            .iter()
            .all(|(_, e)| matches!(e, TrackError::InvalidInput { .. })));
        assert_eq!(report.born, vec![1]);
        assert_eq!(tracker.track_count(), 1);
    }

    #[test]
    fn test_sequence_violation() {
        let mut tracker = MultipleObjectTracker::default();
        tracker.update(&[det([0.0, 0.0, 10.0, 10.0], 5)], 5).unwrap();
        let before = tracker.tracks().to_vec();

        let err = tracker.update(&[det([0.0, 0.0, 10.0, 10.0], 5)], 5).unwrap_err();
        assert_eq!(err, TrackError::SequenceViolation { previous: 5, got: 5 });
        assert!(tracker.update(&[], 4).is_err());
        assert_eq!(tracker.tracks(), before.as_slice());
        assert_eq!(tracker.last_frame_id(), Some(5));

        // 帧号从1开始
        let mut fresh = MultipleObjectTracker::default();
        assert!(fresh.update(&[], 0).is_err());
    }

    #[test]
    fn test_get_track_heads_is_idempotent() {
        let config = config_with(|c| c.confirm_hits = 1);
        let mut tracker = MultipleObjectTracker::new(config).unwrap();
        tracker
            .update(&[det([0.0, 0.0, 10.0, 10.0], 1), det([30.0, 0.0, 40.0, 10.0], 1)], 1)
            .unwrap();
        tracker
            .update(&[det([30.0, 1.0, 40.0, 11.0], 2), det([0.0, 1.0, 10.0, 11.0], 2)], 2)
            .unwrap();
        let a = tracker.get_track_heads();
        let b = tracker.get_track_heads();
        assert_eq!(a, b);
        assert_eq!(head_uids(&tracker), vec![1, 2]);
    }

    #[test]
    fn test_crossing_boxes_stay_one_to_one() {
        for assignment in [AssignmentMethod::Optimal, AssignmentMethod::Greedy] {
            let config = config_with(|c| c.assignment = assignment);
            let mut tracker = MultipleObjectTracker::new(config).unwrap();
            tracker
                .update(&[det([0.0, 0.0, 40.0, 40.0], 1), det([30.0, 0.0, 70.0, 40.0], 1)], 1)
                .unwrap();
            // 两个检测都与两条轨迹重叠
            let report = tracker
                .update(&[det([2.0, 0.0, 42.0, 40.0], 2), det([28.0, 0.0, 68.0, 40.0], 2)], 2)
                .unwrap();
            assert_eq!(report.matched, vec![(1, 0), (2, 1)], "{:?}", assignment);
            assert!(report.born.is_empty());
        }
    }

    #[test]
    fn test_low_iou_spawns_new_track() {
        let mut tracker = MultipleObjectTracker::default();
        tracker.update(&[det([0.0, 0.0, 10.0, 10.0], 1)], 1).unwrap();
        // IoU = 25 / 175 ≈ 0.14 < 0.3
        let report = tracker.update(&[det([5.0, 5.0, 15.0, 15.0], 2)], 2).unwrap();
        assert!(report.matched.is_empty());
        assert_eq!(report.born, vec![2]);
    }

    #[test]
    fn test_reset_keeps_uid_allocator() {
        let mut tracker = MultipleObjectTracker::default();
        tracker.update(&[det([0.0, 0.0, 10.0, 10.0], 1)], 1).unwrap();
        tracker.reset();
        assert_eq!(tracker.track_count(), 0);
        assert_eq!(tracker.last_frame_id(), None);
        let report = tracker.update(&[det([0.0, 0.0, 10.0, 10.0], 1)], 1).unwrap();
        assert_eq!(report.born, vec![2]);
        assert_eq!(tracker.next_uid(), 3);
    }

    #[test]
    fn test_invalid_config_rejected() {
        let config = config_with(|c| c.iou_threshold = 0.0);
        assert!(MultipleObjectTracker::new(config).is_err());
    }
}
