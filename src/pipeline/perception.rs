//! 感知主循环 (Perception loop)
//! 职责: 测距 + 检测 → 跟踪 → 融合 → 记录

use anyhow::{bail, Context, Result};
use chrono::Local;
use log::{info, trace};

use super::{FrameSummary, RunSummary};
use crate::data_logger::RecordSink;
use crate::detection::{Detection, MultipleObjectTracker, Tracker, VehicleDetector};
use crate::distance::DistancePredictor;
use crate::fusion::fuse_heads;
use crate::input::RangingSensor;
use crate::tracker_config::FusionConfig;

pub struct PerceptionLoop<D, S, L, T = MultipleObjectTracker> {
    detector: D,
    sensor: S,
    /// None 表示关闭数据日志
    sink: Option<L>,
    tracker: T,
    predictor: DistancePredictor,

    /// 当前帧号,首帧为1
    frame_index: u64,

    // 统计
    summary: RunSummary,
}

impl<D, S, L> PerceptionLoop<D, S, L, MultipleObjectTracker>
where
    D: VehicleDetector,
    S: RangingSensor,
    L: RecordSink,
{
    /// 按配置创建跟踪器与测距器
    pub fn new(detector: D, sensor: S, sink: Option<L>, config: &FusionConfig) -> Result<Self> {
        let tracker = MultipleObjectTracker::new(config.tracker.clone())?;
        let predictor = DistancePredictor::new(config.calibration.clone())?;
        Ok(Self::with_tracker(detector, sensor, sink, tracker, predictor))
    }
}

impl<D, S, L, T> PerceptionLoop<D, S, L, T>
where
    D: VehicleDetector,
    S: RangingSensor,
    L: RecordSink,
    T: Tracker,
{
    pub fn with_tracker(
        detector: D,
        sensor: S,
        sink: Option<L>,
        tracker: T,
        predictor: DistancePredictor,
    ) -> Self {
        Self {
            detector,
            sensor,
            sink,
            tracker,
            predictor,
            frame_index: 0,
            summary: RunSummary::default(),
        }
    }

    /// 处理一帧
    pub fn process_frame(&mut self, frame: &D::Frame) -> Result<FrameSummary> {
        // 当前时间快照
        let timestamp = Local::now();

        // 先读测距,再检测
        let sensor_distance = self
            .sensor
            .get_distance()
            .context("range sensor read failed")?;
        if !sensor_distance.is_finite() {
            bail!("range sensor returned {}", sensor_distance);
        }

        let bboxes = self
            .detector
            .detect(frame)
            .context("vehicle detection failed")?;

        self.frame_index += 1;
        let frame_index = self.frame_index;
        let detections = Detection::batch(&bboxes, frame_index);
        let report = self.tracker.update(&detections, frame_index)?;

        let heads = self.tracker.get_track_heads();
        let records = fuse_heads(
            &heads,
            &self.predictor,
            sensor_distance,
            frame_index,
            timestamp,
        );

        if let Some(sink) = self.sink.as_mut() {
            sink.log(&records)?;
        }

        self.summary.frames += 1;
        self.summary.records += records.len() as u64;
        self.summary.rejected += report.rejected.len() as u64;
        self.summary.tracks_born += report.born.len() as u64;
        self.summary.tracks_lost += report.lost.len() as u64;

        trace!(
            "frame {}: {} detections, {} heads, range {:.2}",
            frame_index,
            detections.len(),
            records.len(),
            sensor_distance
        );

        Ok(FrameSummary {
            frame_index,
            sensor_distance,
            detections: detections.len(),
            rejected: report.rejected.len(),
            records,
        })
    }

    /// 处理所有帧直到输入结束
    pub fn run(&mut self, frames: impl IntoIterator<Item = D::Frame>) -> Result<RunSummary> {
        for frame in frames {
            self.process_frame(&frame)?;
        }
        let s = &self.summary;
        info!(
            "processed {} frames: {} records, {} tracks born, {} lost, {} detections rejected",
            s.frames, s.records, s.tracks_born, s.tracks_lost, s.rejected
        );
        Ok(self.summary.clone())
    }

    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    pub fn summary(&self) -> &RunSummary {
        &self.summary
    }

    pub fn tracker(&self) -> &T {
        &self.tracker
    }

    pub fn sink(&self) -> Option<&L> {
        self.sink.as_ref()
    }
}
