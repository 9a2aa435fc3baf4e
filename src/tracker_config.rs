//! 跟踪/融合配置 - 通过JSON文件调整参数

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};

use crate::distance::CameraCalibration;

/// 未匹配的 Tentative 轨迹如何处理
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TentativePolicy {
    /// 首次未匹配即销毁
    Strict,
    /// 与 Confirmed 相同的宽限期
    Lenient,
}

/// 分配算法
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssignmentMethod {
    /// 最小代价二分匹配 (默认,可复现)
    Optimal,
    /// 贪心最大IoU
    Greedy,
}

/// 跟踪器参数配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TrackerConfig {
    pub iou_threshold: f32,                 // 最小匹配IoU
    pub confirm_hits: u32,                  // 连续匹配K次后确认
    pub max_misses: u32,                    // 宽限期G (连续未匹配帧数)
    pub tentative_policy: TentativePolicy,  // Tentative 未匹配策略
    pub assignment: AssignmentMethod,       // 分配算法
    pub report_tentative: bool,             // 轨迹头是否包含 Tentative
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            iou_threshold: 0.3,
            confirm_hits: 3,
            max_misses: 3,
            tentative_policy: TentativePolicy::Strict,
            assignment: AssignmentMethod::Optimal,
            report_tentative: false,
        }
    }
}

impl TrackerConfig {
    /// 参数合法性检查
    pub fn validate(&self) -> Result<()> {
        if !(self.iou_threshold > 0.0 && self.iou_threshold <= 1.0) {
            bail!("iou_threshold must be in (0, 1], got {}", self.iou_threshold);
        }
        if self.confirm_hits == 0 {
            bail!("confirm_hits must be at least 1");
        }
        Ok(())
    }
}

/// 数据日志配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub enabled: bool,
    pub directory: PathBuf,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            directory: PathBuf::from("./logs"),
        }
    }
}

/// 全部配置
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FusionConfig {
    pub tracker: TrackerConfig,
    pub calibration: CameraCalibration,
    pub logging: LoggingConfig,
}

impl Default for FusionConfig {
    fn default() -> Self {
        Self {
            tracker: TrackerConfig::default(),
            calibration: CameraCalibration::default(),
            logging: LoggingConfig::default(),
        }
    }
}

impl FusionConfig {
    /// 从JSON文件加载配置
    ///
    /// 文件不存在时写出默认配置;解析失败时使用默认值;
    /// 其他读取错误与参数非法时报错,不覆盖已有文件
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let config = match fs::read_to_string(path) {
            Ok(json) => match serde_json::from_str::<Self>(&json) {
                Ok(config) => {
                    info!("config loaded from {}", path.display());
                    config
                }
                Err(e) => {
                    warn!("failed to parse {}: {}, using defaults", path.display(), e);
                    Self::default()
                }
            },
            Err(e) if e.kind() == ErrorKind::NotFound => {
                info!("{} not found, writing defaults", path.display());
                let config = Self::default();
                config.save(path)?;
                config
            }
            Err(e) => {
                return Err(e).with_context(|| format!("failed to read {}", path.display()));
            }
        };
        config.validate()?;
        Ok(config)
    }

    /// 保存配置到JSON文件
    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json).with_context(|| format!("failed to write {}", path.display()))?;
        info!("config saved to {}", path.display());
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        self.tracker.validate()?;
        self.calibration.validate()?;
        Ok(())
    }

    /// 打印当前配置
    pub fn print_summary(&self) {
        let t = &self.tracker;
        info!("tracker config:");
        info!("  iou threshold: {:.2}", t.iou_threshold);
        info!("  confirm after: {} hits", t.confirm_hits);
        info!("  grace period: {} misses", t.max_misses);
        info!("  tentative policy: {:?}", t.tentative_policy);
        info!("  assignment: {:?}", t.assignment);
        let c = &self.calibration;
        info!(
            "camera: focal {:.1}px, height {:.2}, pitch {:.3} rad",
            c.focal_length_px, c.camera_height, c.camera_pitch_rad
        );
        if self.logging.enabled {
            info!("data log directory: {}", self.logging.directory.display());
        } else {
            info!("data logging disabled");
        }
    }
}
