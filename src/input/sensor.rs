//! 测距传感器接口
//!
//! 单线传感器 (激光/雷达) 每帧只给一个标量距离,与检测数量无关

use std::collections::VecDeque;

use anyhow::{bail, Result};

/// 测距传感器 Trait
pub trait RangingSensor {
    /// 读取当前距离 (单位与标定一致,默认英尺)
    fn get_distance(&mut self) -> Result<f32>;
}

/// 固定读数
pub struct ConstantSensor {
    distance: f32,
}

impl ConstantSensor {
    pub fn new(distance: f32) -> Self {
        Self { distance }
    }
}

impl RangingSensor for ConstantSensor {
    fn get_distance(&mut self) -> Result<f32> {
        Ok(self.distance)
    }
}

/// 按顺序返回预设读数,用完报错
pub struct ScriptedSensor {
    readings: VecDeque<f32>,
}

impl ScriptedSensor {
    pub fn new(readings: impl IntoIterator<Item = f32>) -> Self {
        Self {
            readings: readings.into_iter().collect(),
        }
    }
}

impl RangingSensor for ScriptedSensor {
    fn get_distance(&mut self) -> Result<f32> {
        match self.readings.pop_front() {
            Some(distance) => Ok(distance),
            None => bail!("no more range readings"),
        }
    }
}
