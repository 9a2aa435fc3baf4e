//! 车辆检测器接口 (Vehicle detector interface)
//!
//! 检测模型本身不在本 crate 内,这里只定义边界: 输入一帧,输出零个或多个原始框,不带身份

use std::collections::VecDeque;

use anyhow::{bail, Result};

use super::types::BBox;

/// 车辆检测器 Trait
pub trait VehicleDetector {
    /// 帧类型由具体检测器决定 (图像、回放记录等)
    type Frame;

    /// 检测一帧中的车辆,返回像素坐标框
    fn detect(&mut self, frame: &Self::Frame) -> Result<Vec<BBox>>;
}

/// 按顺序返回预设结果的检测器,忽略帧内容
pub struct ScriptedDetector<F> {
    script: VecDeque<Vec<BBox>>,
    _frame: std::marker::PhantomData<fn(&F)>,
}

impl<F> ScriptedDetector<F> {
    pub fn new(script: impl IntoIterator<Item = Vec<BBox>>) -> Self {
        Self {
            script: script.into_iter().collect(),
            _frame: std::marker::PhantomData,
        }
    }

    pub fn remaining(&self) -> usize {
        self.script.len()
    }
}

impl<F> VehicleDetector for ScriptedDetector<F> {
    type Frame = F;

    fn detect(&mut self, _frame: &F) -> Result<Vec<BBox>> {
        match self.script.pop_front() {
            Some(boxes) => Ok(boxes),
            None => bail!("scripted detector exhausted"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scripted_detector_order() {
        let mut detector: ScriptedDetector<()> = ScriptedDetector::new(vec![
            vec![BBox::new(0.0, 0.0, 1.0, 1.0)],
            vec![],
        ]);
        assert_eq!(detector.detect(&()).unwrap().len(), 1);
        assert!(detector.detect(&()).unwrap().is_empty());
        assert_eq!(detector.remaining(), 0);
        assert!(detector.detect(&()).is_err());
    }
}
