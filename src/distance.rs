//! 单目测距 (Monocular distance prediction)
//!
//! 标定针孔模型,仅依赖边界框几何:
//! - 尺寸测距: 已知车辆高/宽 × 焦距 / 像素高/宽
//! - 地面角测距: 框底边射线与地平线夹角 → 相机高度 / tan(角度)
//!
//! 无状态,无 I/O,同样的输入与标定得到同样的结果

use std::f32::consts::FRAC_PI_2;

use anyhow::{bail, Result};
use serde::{Deserialize, Serialize};

use crate::detection::BBox;
use crate::error::TrackError;

/// 相机标定参数
///
/// 长度单位与测距传感器一致 (默认英尺)
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CameraCalibration {
    pub focal_length_px: f32,  // 焦距 (像素)
    pub principal_y_px: f32,   // 主点纵坐标 (像素)
    pub camera_height: f32,    // 相机离地高度
    pub camera_pitch_rad: f32, // 俯仰角,向下为正
    pub vehicle_height: f32,   // 典型车高
    pub vehicle_width: f32,    // 典型车宽
}

impl Default for CameraCalibration {
    fn default() -> Self {
        Self {
            // 960x540 (原始 1280x720 缩放 0.75 后)
            focal_length_px: 700.0,
            principal_y_px: 270.0,
            camera_height: 4.0,
            camera_pitch_rad: 0.0,
            vehicle_height: 5.0,
            vehicle_width: 6.0,
        }
    }
}

impl CameraCalibration {
    pub fn validate(&self) -> Result<()> {
        let values = [
            self.focal_length_px,
            self.principal_y_px,
            self.camera_height,
            self.camera_pitch_rad,
            self.vehicle_height,
            self.vehicle_width,
        ];
        if !values.iter().all(|v| v.is_finite()) {
            bail!("calibration values must be finite: {:?}", self);
        }
        if self.focal_length_px <= 0.0
            || self.camera_height <= 0.0
            || self.vehicle_height <= 0.0
            || self.vehicle_width <= 0.0
        {
            bail!("focal length, camera height and vehicle size must be positive");
        }
        Ok(())
    }
}

/// 测距结果
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DistanceEstimate {
    /// 基于框尺寸的距离
    pub distance: f32,
    /// 框底边的地面角 (弧度,地平线以下为正)
    pub ground_angle: f32,
    /// 基于地面角的距离
    pub ground_distance: f32,
}

/// 距离预测器
#[derive(Clone, Debug, Default)]
pub struct DistancePredictor {
    calibration: CameraCalibration,
}

impl DistancePredictor {
    pub fn new(calibration: CameraCalibration) -> Result<Self> {
        calibration.validate()?;
        Ok(Self { calibration })
    }

    pub fn calibration(&self) -> &CameraCalibration {
        &self.calibration
    }

    /// 由边界框预测距离与地面角
    ///
    /// 零面积、非有限坐标、底边在地平线以上时返回 `DegenerateGeometry`;
    /// 只需尺寸测距时用 [`size_distance`](Self::size_distance)
    pub fn predict(&self, bbox: &BBox) -> Result<DistanceEstimate, TrackError> {
        let distance = self.size_distance(bbox)?;
        let c = &self.calibration;

        let ground_angle =
            c.camera_pitch_rad + ((bbox.y2() - c.principal_y_px) / c.focal_length_px).atan();
        if !(ground_angle > 0.0 && ground_angle < FRAC_PI_2) {
            return Err(TrackError::degenerate(format!(
                "bottom edge y={} does not intersect the ground (angle {:.4} rad)",
                bbox.y2(),
                ground_angle
            )));
        }
        let ground_distance = c.camera_height / ground_angle.tan();

        if !ground_distance.is_finite() {
            return Err(TrackError::degenerate(format!(
                "non-finite estimate for {:?}",
                bbox.to_array()
            )));
        }

        Ok(DistanceEstimate {
            distance,
            ground_angle,
            ground_distance,
        })
    }

    /// 仅按框尺寸测距,不依赖框在画面中的位置
    pub fn size_distance(&self, bbox: &BBox) -> Result<f32, TrackError> {
        if let Err(e) = bbox.validate() {
            return Err(TrackError::degenerate(e.to_string()));
        }
        let c = &self.calibration;

        let by_height = c.focal_length_px * c.vehicle_height / bbox.height();
        let by_width = c.focal_length_px * c.vehicle_width / bbox.width();
        let distance = (by_height + by_width) / 2.0;
        if !distance.is_finite() {
            return Err(TrackError::degenerate(format!(
                "non-finite size estimate for {:?}",
                bbox.to_array()
            )));
        }
        Ok(distance)
    }
}
