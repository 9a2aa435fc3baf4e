/// 跟踪系统数据结构定义
/// Data structures for the vehicle tracking system
use serde::{Deserialize, Serialize};

use crate::error::TrackError;

// ========== 数据结构 ==========

/// 检测框 (Detection bounding box)
///
/// 像素坐标 (x1, y1) 左上, (x2, y2) 右下。构造后不可修改。
/// 检测器输出不可信,所以 `new` 不做校验,由跟踪器调用 `validate` 逐条检查。
#[derive(Clone, Copy, Debug, PartialEq, Default, Serialize, Deserialize)]
pub struct BBox {
    x1: f32,
    y1: f32,
    x2: f32,
    y2: f32,
}

impl BBox {
    pub fn new(x1: f32, y1: f32, x2: f32, y2: f32) -> Self {
        Self { x1, y1, x2, y2 }
    }

    /// 构造并校验
    pub fn try_new(x1: f32, y1: f32, x2: f32, y2: f32) -> Result<Self, TrackError> {
        let bbox = Self::new(x1, y1, x2, y2);
        bbox.validate()?;
        Ok(bbox)
    }

    pub fn from_array(coords: [f32; 4]) -> Self {
        Self::new(coords[0], coords[1], coords[2], coords[3])
    }

    pub fn x1(&self) -> f32 {
        self.x1
    }

    pub fn y1(&self) -> f32 {
        self.y1
    }

    pub fn x2(&self) -> f32 {
        self.x2
    }

    pub fn y2(&self) -> f32 {
        self.y2
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.x1, self.y1, self.x2, self.y2]
    }

    pub fn width(&self) -> f32 {
        self.x2 - self.x1
    }

    pub fn height(&self) -> f32 {
        self.y2 - self.y1
    }

    pub fn area(&self) -> f32 {
        self.width() * self.height()
    }

    /// 中心点
    pub fn center(&self) -> (f32, f32) {
        ((self.x1 + self.x2) / 2.0, (self.y1 + self.y2) / 2.0)
    }

    /// 检查坐标是否有限且 x1 < x2, y1 < y2
    pub fn validate(&self) -> Result<(), TrackError> {
        if !self.to_array().iter().all(|v| v.is_finite()) {
            return Err(TrackError::invalid_input(format!(
                "non-finite coordinates {:?}",
                self.to_array()
            )));
        }
        if self.x1 >= self.x2 || self.y1 >= self.y2 {
            return Err(TrackError::invalid_input(format!(
                "inverted or empty box {:?}",
                self.to_array()
            )));
        }
        Ok(())
    }

    pub fn is_valid(&self) -> bool {
        self.validate().is_ok()
    }

    /// 与另一个框的 IoU, 见 [`compute_iou`](super::tracker::compute_iou)
    pub fn iou(&self, other: &BBox) -> f32 {
        super::tracker::compute_iou(self, other)
    }
}

/// 单帧检测 (一帧内检测器输出的一个框)
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Detection {
    pub bbox: BBox,
    /// 帧序号,从1开始单调递增
    pub frame_id: u64,
}

impl Detection {
    pub fn new(bbox: BBox, frame_id: u64) -> Self {
        Self { bbox, frame_id }
    }

    /// 把检测器的原始框批量包装成本帧的检测
    pub fn batch(bboxes: &[BBox], frame_id: u64) -> Vec<Detection> {
        bboxes
            .iter()
            .map(|bbox| Detection::new(*bbox, frame_id))
            .collect()
    }
}
