//! 数据日志 (CSV)
//!
//! 每次运行一个文件,只追加。行格式是下游工具依赖的固定契约:
//! `frame#, time, uid, x1, y1, x2, y2, lidar_d(ft), grnd_angle_d(ft)`

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;

use crate::fusion::FusedRecord;

/// CSV 表头
pub const HEADERS: [&str; 9] = [
    "frame#",
    "time",
    "uid",
    "x1",
    "y1",
    "x2",
    "y2",
    "lidar_d(ft)",
    "grnd_angle_d(ft)",
];

/// 记录输出 Trait
pub trait RecordSink {
    /// 追加一帧的所有记录
    fn log(&mut self, rows: &[FusedRecord]) -> Result<()>;
}

/// 按本地时间生成的运行文件名 (不含扩展名)
pub fn log_file_stem() -> String {
    chrono::Local::now().format("%Y%m%d-%H%M%S").to_string()
}

/// 一条记录对应的 CSV 行
pub fn format_row(record: &FusedRecord) -> String {
    let ground = record
        .predicted_ground_distance
        .map(|d| d.to_string())
        .unwrap_or_default();
    format!(
        "{},{},{},{},{},{},{},{},{}",
        record.frame_index,
        record.timestamp_string(),
        record.uid,
        record.bbox.x1(),
        record.bbox.y1(),
        record.bbox.x2(),
        record.bbox.y2(),
        record.sensor_distance,
        ground
    )
}

/// CSV 文件日志
pub struct CsvLogger {
    path: PathBuf,
    writer: BufWriter<File>,
    rows: u64,
}

impl CsvLogger {
    /// 在 `directory` 下创建 `<stem>.csv` 并写入表头,目录不存在时创建
    pub fn create(directory: impl AsRef<Path>, stem: &str) -> Result<Self> {
        let directory = directory.as_ref();
        fs::create_dir_all(directory)
            .with_context(|| format!("failed to create {}", directory.display()))?;

        let path = directory.join(format!("{}.csv", stem));
        let file =
            File::create(&path).with_context(|| format!("failed to create {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        writeln!(writer, "{}", HEADERS.join(","))?;
        writer.flush()?;

        info!("data log: {}", path.display());
        Ok(Self {
            path,
            writer,
            rows: 0,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 已写入的行数 (不含表头)
    pub fn rows(&self) -> u64 {
        self.rows
    }
}

impl RecordSink for CsvLogger {
    fn log(&mut self, rows: &[FusedRecord]) -> Result<()> {
        for record in rows {
            writeln!(self.writer, "{}", format_row(record))
                .with_context(|| format!("failed to write {}", self.path.display()))?;
        }
        self.writer.flush()?;
        self.rows += rows.len() as u64;
        Ok(())
    }
}

/// 内存日志 (测试用)
#[derive(Default)]
pub struct MemorySink {
    pub rows: Vec<FusedRecord>,
}

impl RecordSink for MemorySink {
    fn log(&mut self, rows: &[FusedRecord]) -> Result<()> {
        self.rows.extend_from_slice(rows);
        Ok(())
    }
}
