use std::path::PathBuf;

use clap::Parser;

/// 车辆感知融合 - 回放检测与测距记录,输出跟踪+融合日志
#[derive(Parser, Debug, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Args {
    /// 回放文件 (JSON Lines, 每行一帧)
    #[arg(short, long)]
    pub replay: PathBuf,

    /// 配置文件 (不存在时写出默认配置)
    #[arg(short, long, default_value = "fusion_config.json")]
    pub config: PathBuf,

    /// 数据日志目录 (覆盖配置文件)
    #[arg(long)]
    pub log_dir: Option<PathBuf>,

    /// 运行日志同时写入该文件 (追加)
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// 关闭CSV数据日志
    #[arg(long, default_value_t = false)]
    pub no_log: bool,

    /// 输出调试日志
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_args() {
        let args = Args::parse_from(["fusion", "--replay", "drive.jsonl", "--no-log"]);
        assert_eq!(args.replay, PathBuf::from("drive.jsonl"));
        assert_eq!(args.config, PathBuf::from("fusion_config.json"));
        assert!(args.no_log);
        assert!(!args.verbose);
        assert!(args.log_dir.is_none());
        assert!(args.log_file.is_none());
    }

    #[test]
    fn test_parse_log_file() {
        let args = Args::parse_from(["fusion", "-r", "drive.jsonl", "--log-file", "run.log"]);
        assert_eq!(args.log_file, Some(PathBuf::from("run.log")));
    }

    #[test]
    fn test_replay_is_required() {
        assert!(Args::try_parse_from(["fusion"]).is_err());
    }
}
