//! 统一错误处理模块
//!
//! 定义回填流水线中可能出现的错误类型。翻译错误只在翻译客户端内部流转，
//! 不会越过客户端边界；只有章节加载与写回错误会终止处理。

// 标准库导入
use std::path::PathBuf;

// 第三方crate导入
use thiserror::Error;

/// 回填流水线统一错误类型
#[derive(Debug, Error)]
pub enum BackfillError {
    /// 章节文件读取失败
    #[error("章节读取失败 [{}]: {}", .path.display(), .source)]
    Read {
        /// 文件路径
        path: PathBuf,
        /// 底层IO错误
        #[source]
        source: std::io::Error,
    },

    /// 章节文档格式错误
    #[error("章节解析失败 [{}]: {}", .path.display(), .source)]
    Parse {
        /// 文件路径
        path: PathBuf,
        /// JSON解析错误
        #[source]
        source: serde_json::Error,
    },

    /// 章节写回失败（磁盘已满、权限不足等）
    #[error("章节写回失败 [{}]: {}", .path.display(), .source)]
    Persistence {
        /// 文件路径
        path: PathBuf,
        /// 底层IO错误
        #[source]
        source: std::io::Error,
    },

    /// 语料目录遍历失败
    #[error("语料遍历失败: {0}")]
    Walk(#[from] walkdir::Error),

    /// 单次翻译调用失败，只在翻译客户端内部使用
    #[error("{}", describe_translation_failure(.message, .status_code))]
    Translation {
        /// 错误消息
        message: String,
        /// HTTP状态码（如果适用）
        status_code: Option<u16>,
    },

    /// 配置相关错误
    #[error("配置错误 [{field}]: {reason}")]
    Configuration {
        /// 配置项名称
        field: String,
        /// 错误原因
        reason: String,
    },
}

fn describe_translation_failure(message: &str, status_code: &Option<u16>) -> String {
    match status_code {
        Some(code) => format!("翻译请求失败 [{}]: {}", code, message),
        None => format!("翻译请求失败: {}", message),
    }
}

/// 回填结果类型别名
pub type Result<T> = std::result::Result<T, BackfillError>;

impl BackfillError {
    /// 是否属于章节加载类错误（读取或解析）
    pub fn is_load_error(&self) -> bool {
        matches!(self, BackfillError::Read { .. } | BackfillError::Parse { .. })
    }
}

/// 便捷的错误创建宏
#[macro_export]
macro_rules! backfill_error {
    (translation, $msg:expr) => {
        $crate::error::BackfillError::Translation {
            message: $msg.to_string(),
            status_code: None,
        }
    };
    (translation, $msg:expr, $code:expr) => {
        $crate::error::BackfillError::Translation {
            message: $msg.to_string(),
            status_code: Some($code),
        }
    };
    (config, $field:expr, $reason:expr) => {
        $crate::error::BackfillError::Configuration {
            field: $field.to_string(),
            reason: $reason.to_string(),
        }
    };
}

/// 从reqwest::Error转换为翻译错误
impl From<reqwest::Error> for BackfillError {
    fn from(error: reqwest::Error) -> Self {
        let status_code = error.status().map(|s| s.as_u16());
        let message = if error.is_timeout() {
            format!("请求超时: {}", error)
        } else {
            error.to_string()
        };
        BackfillError::Translation {
            message,
            status_code,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = BackfillError::Translation {
            message: "Connection failed".to_string(),
            status_code: Some(500),
        };

        assert_eq!(format!("{}", err), "翻译请求失败 [500]: Connection failed");

        let err = backfill_error!(translation, "Connection reset");
        assert_eq!(format!("{}", err), "翻译请求失败: Connection reset");
    }

    #[test]
    fn test_error_macro() {
        let err = backfill_error!(config, "concurrency", "必须大于0");
        match err {
            BackfillError::Configuration { field, reason } => {
                assert_eq!(field, "concurrency");
                assert_eq!(reason, "必须大于0");
            }
            _ => panic!("Wrong error type"),
        }
    }

    #[test]
    fn test_load_error_classification() {
        let parse_source = serde_json::from_str::<serde_json::Value>("{").unwrap_err();
        let parse = BackfillError::Parse {
            path: PathBuf::from("MRK/1.json"),
            source: parse_source,
        };
        assert!(parse.is_load_error());
        assert!(format!("{}", parse).contains("MRK/1.json"));

        let persist = BackfillError::Persistence {
            path: PathBuf::from("MRK/1.json"),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(!persist.is_load_error());
    }
}
