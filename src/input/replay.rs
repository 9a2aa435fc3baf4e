//! 回放输入 (Replay input)
//!
//! JSON Lines 格式,每行一帧:
//! `{"boxes": [[x1, y1, x2, y2], ...], "range": 31.5}`
//! 空行忽略

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use super::sensor::ScriptedSensor;
use crate::detection::{BBox, VehicleDetector};

/// 一帧回放记录
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// 该帧检测器输出
    #[serde(default)]
    pub boxes: Vec<[f32; 4]>,
    /// 该帧测距读数
    pub range: f32,
}

/// 从文件加载回放
pub fn load_replay(path: impl AsRef<Path>) -> Result<Vec<ReplayFrame>> {
    let path = path.as_ref();
    let file = File::open(path).with_context(|| format!("failed to open {}", path.display()))?;
    parse_replay(BufReader::new(file))
        .with_context(|| format!("failed to parse replay {}", path.display()))
}

/// 解析回放,错误信息带行号
pub fn parse_replay(reader: impl BufRead) -> Result<Vec<ReplayFrame>> {
    let mut frames = Vec::new();
    for (idx, line) in reader.lines().enumerate() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        let frame: ReplayFrame =
            serde_json::from_str(&line).with_context(|| format!("line {}", idx + 1))?;
        frames.push(frame);
    }
    Ok(frames)
}

/// 回放检测器: 直接返回记录中的框
#[derive(Default)]
pub struct ReplayDetector;

impl VehicleDetector for ReplayDetector {
    type Frame = ReplayFrame;

    fn detect(&mut self, frame: &ReplayFrame) -> Result<Vec<BBox>> {
        Ok(frame.boxes.iter().map(|c| BBox::from_array(*c)).collect())
    }
}

impl ScriptedSensor {
    /// 回放中记录的测距读数,按帧顺序
    pub fn from_replay(frames: &[ReplayFrame]) -> Self {
        ScriptedSensor::new(frames.iter().map(|f| f.range))
    }
}
