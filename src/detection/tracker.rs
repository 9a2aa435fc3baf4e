//! 多目标跟踪公共组件
//! Common components for multi-object tracking

use super::types::{BBox, Detection};
use crate::error::TrackError;
use crate::tracker_config::TentativePolicy;

// ========== 公共数据结构 ==========

/// 轨迹生命周期状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackState {
    /// 新生轨迹,尚未连续匹配足够次数
    Tentative,
    /// 已确认,可靠输出
    Confirmed,
    /// 超过宽限期,本次更新结束时销毁
    Lost,
}

/// 跟踪对象 (一个物理目标的持久身份)
#[derive(Clone, Debug, PartialEq)]
pub struct Track {
    /// 唯一跟踪ID,永不复用
    uid: u64,

    /// 历史观测 (frame_id, bbox),按帧号严格递增,至少一个元素
    history: Vec<(u64, BBox)>,

    state: TrackState,

    /// 最近一次匹配的帧号
    last_updated_frame: u64,

    /// 连续未匹配次数
    frames_since_seen: u32,

    /// 出生后(或上次丢失后)连续匹配次数
    hit_streak: u32,
}

impl Track {
    pub(crate) fn new(uid: u64, detection: &Detection) -> Self {
        Self {
            uid,
            history: vec![(detection.frame_id, detection.bbox)],
            state: TrackState::Tentative,
            last_updated_frame: detection.frame_id,
            frames_since_seen: 0,
            hit_streak: 0,
        }
    }

    pub fn uid(&self) -> u64 {
        self.uid
    }

    pub fn state(&self) -> TrackState {
        self.state
    }

    pub fn history(&self) -> &[(u64, BBox)] {
        &self.history
    }

    /// 轨迹头: 最近一次观测
    pub fn head(&self) -> (u64, BBox) {
        self.history[self.history.len() - 1]
    }

    pub fn latest_bbox(&self) -> BBox {
        self.head().1
    }

    pub fn last_updated_frame(&self) -> u64 {
        self.last_updated_frame
    }

    pub fn frames_since_seen(&self) -> u32 {
        self.frames_since_seen
    }

    pub fn hit_streak(&self) -> u32 {
        self.hit_streak
    }

    /// 总观测帧数
    pub fn age(&self) -> usize {
        self.history.len()
    }

    pub fn is_confirmed(&self) -> bool {
        self.state == TrackState::Confirmed
    }

    /// 匹配成功: 追加观测,返回是否在本次晋升为 Confirmed
    pub(crate) fn mark_matched(&mut self, detection: &Detection, confirm_hits: u32) -> bool {
        self.history.push((detection.frame_id, detection.bbox));
        self.last_updated_frame = detection.frame_id;
        self.frames_since_seen = 0;
        self.hit_streak += 1;

        if self.state == TrackState::Tentative && self.hit_streak >= confirm_hits {
            self.state = TrackState::Confirmed;
            return true;
        }
        false
    }

    /// 未匹配: 累加丢失计数,返回是否转为 Lost
    pub(crate) fn mark_missed(&mut self, max_misses: u32, policy: TentativePolicy) -> bool {
        self.frames_since_seen += 1;
        self.hit_streak = 0;

        let lost = match (self.state, policy) {
            (TrackState::Tentative, TentativePolicy::Strict) => true,
            _ => self.frames_since_seen > max_misses,
        };
        if lost {
            self.state = TrackState::Lost;
        }
        lost
    }
}

/// 单次更新的结果汇总
#[derive(Debug, Clone, Default, PartialEq)]
pub struct UpdateReport {
    pub frame_id: u64,
    /// (uid, 检测下标)
    pub matched: Vec<(u64, usize)>,
    /// 新建轨迹
    pub born: Vec<u64>,
    /// 本次晋升为 Confirmed 的轨迹
    pub confirmed: Vec<u64>,
    /// 本次销毁的轨迹
    pub lost: Vec<u64>,
    /// 被拒绝的检测 (检测下标, 原因)
    pub rejected: Vec<(usize, TrackError)>,
}

// ========== 跟踪器统一接口 ==========

/// 多目标跟踪器 Trait
///
/// 单线程使用: `update` 与 `get_track_heads` 不能并发调用
pub trait Tracker {
    /// 更新跟踪器
    ///
    /// # 参数
    /// - `detections`: 当前帧的检测
    /// - `frame_id`: 当前帧号,必须严格大于上一次调用
    ///
    /// # 返回
    /// 本次关联结果;帧号违约时返回 `SequenceViolation` 且状态不变
    fn update(
        &mut self,
        detections: &[Detection],
        frame_id: u64,
    ) -> Result<UpdateReport, TrackError>;

    /// 当前可输出的轨迹,按 uid 升序
    fn get_track_heads(&self) -> Vec<&Track>;

    /// 重置跟踪器 (清除所有跟踪)
    fn reset(&mut self);

    /// 获取当前跟踪数量
    fn track_count(&self) -> usize;
}

// ========== 工具函数 ==========

/// 计算两个边界框的IOU (Intersection over Union)
///
/// 面积按 f64 计算,极大/极小的框也不会溢出。无重叠或并集退化时返回 0
pub fn compute_iou(bbox1: &BBox, bbox2: &BBox) -> f32 {
    let [ax1, ay1, ax2, ay2] = bbox1.to_array().map(f64::from);
    let [bx1, by1, bx2, by2] = bbox2.to_array().map(f64::from);

    let w = ax2.min(bx2) - ax1.max(bx1);
    let h = ay2.min(by2) - ay1.max(by1);
    if !(w > 0.0 && h > 0.0) {
        return 0.0;
    }
    let intersection = w * h;

    let union = (ax2 - ax1) * (ay2 - ay1) + (bx2 - bx1) * (by2 - by1) - intersection;
    if !(union > 0.0) {
        return 0.0;
    }

    (intersection / union).clamp(0.0, 1.0) as f32
}
