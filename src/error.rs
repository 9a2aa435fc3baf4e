//! 跟踪与测距错误类型
//! Error taxonomy for tracking and distance prediction

use thiserror::Error;

/// 跟踪/测距错误
///
/// 每一种失败都与真实结果可区分,不会被吞成 0 或 NaN。
#[derive(Error, Debug, Clone, PartialEq)]
pub enum TrackError {
    /// 检测框格式错误 (非有限值、坐标颠倒、帧号不符),跳过该条目
    #[error("invalid detection: {reason}")]
    InvalidInput { reason: String },

    /// 帧号未严格递增,属于调用方违约
    #[error("frame id must strictly increase: previous {previous}, got {got}")]
    SequenceViolation { previous: u64, got: u64 },

    /// 测距几何退化 (零面积框、地面射线在地平线以上等)
    #[error("degenerate geometry: {reason}")]
    DegenerateGeometry { reason: String },
}

impl TrackError {
    pub fn invalid_input(reason: impl Into<String>) -> Self {
        TrackError::InvalidInput {
            reason: reason.into(),
        }
    }

    pub fn degenerate(reason: impl Into<String>) -> Self {
        TrackError::DegenerateGeometry {
            reason: reason.into(),
        }
    }
}
