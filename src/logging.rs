//! 运行日志: fern 输出到终端,可选同时追加到文件

use std::io::stdout;
use std::path::Path;

use anyhow::{Context, Result};
use fern::Dispatch;
use log::LevelFilter;

use crate::fusion::TIMESTAMP_FORMAT;

/// 构建日志分发器 (未安装)
pub fn dispatch(verbose: bool, log_file: Option<&Path>) -> Result<Dispatch> {
    let level = if verbose {
        LevelFilter::Debug
    } else {
        LevelFilter::Info
    };
    let mut dispatch = Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {} {}] {}",
                chrono::Local::now().format(TIMESTAMP_FORMAT),
                record.level(),
                record.target(),
                message
            ))
        })
        .level(level)
        .chain(stdout());
    if let Some(path) = log_file {
        let file = fern::log_file(path)
            .with_context(|| format!("failed to open log file {}", path.display()))?;
        dispatch = dispatch.chain(file);
    }
    Ok(dispatch)
}

/// 安装全局日志,进程内只能调用一次
pub fn init_logging(verbose: bool, log_file: Option<&Path>) -> Result<()> {
    dispatch(verbose, log_file)?.apply()?;
    Ok(())
}
