use std::path::Path;

use crate::backfill_error;
use crate::error::Result;

/// 按命令行开关选择日志级别：`quiet` 仅输出错误，优先于 `verbose`
pub fn log_level(verbose: bool, quiet: bool) -> tracing::Level {
    if quiet {
        tracing::Level::ERROR
    } else if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

/// 初始化日志系统
pub fn init_logging(verbose: bool, quiet: bool) {
    tracing_subscriber::fmt()
        .with_max_level(log_level(verbose, quiet))
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();
}

/// 验证语料根目录
pub fn validate_corpus_root(root: &Path) -> Result<()> {
    if !root.exists() {
        return Err(backfill_error!(config, "root", format!("语料目录不存在: {}", root.display())));
    }

    if !root.is_dir() {
        return Err(backfill_error!(config, "root", format!("语料路径不是目录: {}", root.display())));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_level() {
        assert_eq!(log_level(false, false), tracing::Level::INFO);
        assert_eq!(log_level(true, false), tracing::Level::DEBUG);
        // 静默模式仍保留错误输出
        assert_eq!(log_level(false, true), tracing::Level::ERROR);
        assert_eq!(log_level(true, true), tracing::Level::ERROR);
    }

    #[test]
    fn test_validate_corpus_root() {
        let dir = tempfile::tempdir().unwrap();
        assert!(validate_corpus_root(dir.path()).is_ok());
        assert!(validate_corpus_root(&dir.path().join("absent")).is_err());

        let file = dir.path().join("1.json");
        std::fs::write(&file, "{}").unwrap();
        assert!(validate_corpus_root(&file).is_err());
    }
}
