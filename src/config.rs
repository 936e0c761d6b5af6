//! 配置管理模块
//!
//! 提供CLI参数解析和回填配置管理功能。配置只在启动时读取，不支持热加载。

// 标准库导入
use std::path::{Path, PathBuf};
use std::time::Duration;

// 第三方crate导入
use clap::Parser;

// 本地模块导入
use crate::api_constants::{api_config, is_supported_language, is_valid_api_url, service_config};
use crate::backfill_error;
use crate::error::Result;
use crate::scanner::ScanScope;

/// 回填配置
///
/// 支持Builder模式进行链式配置。
///
/// # Examples
///
/// ```rust
/// use annotation_backfill::config::BackfillConfig;
///
/// let config = BackfillConfig::new("/data/mappings")
///     .with_api_urls(vec!["http://localhost:5002/translate".to_string()])
///     .with_concurrency(50)
///     .with_parallel_chapters(4);
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct BackfillConfig {
    /// 语料根目录
    root: PathBuf,
    /// 翻译API地址，多个地址轮询
    api_urls: Vec<String>,
    api_key: Option<String>,
    source_lang: String,
    target_lang: String,
    /// 同时在途的翻译请求上限
    concurrency: usize,
    /// 同时处理的章节数
    parallel_chapters: usize,
    request_timeout: Duration,
    /// 只处理这些书卷，空表示全部
    books: Vec<String>,
    scope: ScanScope,
    /// 章节解析失败时跳过而不是中止
    skip_invalid: bool,
    dry_run: bool,
}

impl BackfillConfig {
    /// 创建新的配置实例
    ///
    /// 默认值：
    /// - API地址: 本地 LibreTranslate
    /// - 语言: ar → en
    /// - 并发上限: 200
    /// - 章节并行度: 1
    /// - 请求超时: 30秒
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            api_urls: vec![api_config::DEFAULT_API_URL.to_string()],
            api_key: None,
            source_lang: service_config::DEFAULT_SOURCE_LANG.to_string(),
            target_lang: service_config::DEFAULT_TARGET_LANG.to_string(),
            concurrency: service_config::DEFAULT_CONCURRENCY,
            parallel_chapters: service_config::DEFAULT_PARALLEL_CHAPTERS,
            request_timeout: Duration::from_secs(api_config::REQUEST_TIMEOUT_SECONDS),
            books: Vec::new(),
            scope: ScanScope::default(),
            skip_invalid: false,
            dry_run: false,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn api_urls(&self) -> &[String] {
        &self.api_urls
    }

    pub fn api_key(&self) -> Option<&str> {
        self.api_key.as_deref()
    }

    pub fn source_lang(&self) -> &str {
        &self.source_lang
    }

    pub fn target_lang(&self) -> &str {
        &self.target_lang
    }

    pub fn concurrency(&self) -> usize {
        self.concurrency
    }

    pub fn parallel_chapters(&self) -> usize {
        self.parallel_chapters
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    pub fn books(&self) -> &[String] {
        &self.books
    }

    pub fn scope(&self) -> ScanScope {
        self.scope
    }

    pub fn skip_invalid(&self) -> bool {
        self.skip_invalid
    }

    pub fn is_dry_run(&self) -> bool {
        self.dry_run
    }

    /// 设置翻译API地址
    pub fn with_api_urls(mut self, urls: Vec<String>) -> Self {
        self.api_urls = urls;
        self
    }

    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key;
        self
    }

    /// 设置源语言与目标语言
    pub fn with_languages(mut self, source: &str, target: &str) -> Self {
        self.source_lang = source.to_string();
        self.target_lang = target.to_string();
        self
    }

    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency;
        self
    }

    pub fn with_parallel_chapters(mut self, parallel: usize) -> Self {
        self.parallel_chapters = parallel;
        self
    }

    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn with_books(mut self, books: Vec<String>) -> Self {
        self.books = books;
        self
    }

    pub fn with_scope(mut self, scope: ScanScope) -> Self {
        self.scope = scope;
        self
    }

    pub fn skip_invalid_chapters(mut self, skip: bool) -> Self {
        self.skip_invalid = skip;
        self
    }

    pub fn dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 检查配置是否可用
    pub fn validate(&self) -> Result<()> {
        if self.api_urls.is_empty() {
            return Err(backfill_error!(config, "api", "至少需要一个翻译API地址"));
        }
        if let Some(url) = self.api_urls.iter().find(|url| !is_valid_api_url(url)) {
            return Err(backfill_error!(config, "api", format!("无效的API地址: {}", url)));
        }

        for (field, lang) in [("source_lang", &self.source_lang), ("target_lang", &self.target_lang)] {
            if !is_supported_language(lang) {
                return Err(backfill_error!(config, field, format!("不支持的语言代码: {}", lang)));
            }
        }
        if self.source_lang == self.target_lang {
            return Err(backfill_error!(config, "target_lang", "源语言与目标语言相同"));
        }

        if self.concurrency == 0 {
            return Err(backfill_error!(config, "concurrency", "并发上限必须大于0"));
        }
        if self.parallel_chapters == 0 {
            return Err(backfill_error!(config, "parallel_chapters", "章节并行度必须大于0"));
        }
        if self.request_timeout.is_zero() {
            return Err(backfill_error!(config, "timeout", "请求超时必须大于0"));
        }
        if self.scope.is_empty() {
            return Err(backfill_error!(config, "scope", "经节与单词不能同时跳过"));
        }

        Ok(())
    }
}

/// CLI参数结构
#[derive(Parser, Debug)]
#[command(author, version, about = "语料注释回填工具 - 在并发上限内调用翻译服务补全缺失的译文", long_about = None)]
pub struct Cli {
    /// 语料根目录（包含各书卷子目录）
    #[arg(value_name = "ROOT", env = "BACKFILL_ROOT")]
    pub root: PathBuf,

    /// 翻译API地址，可重复或用逗号分隔以轮询多个实例
    #[arg(short, long, env = "BACKFILL_API", value_delimiter = ',', default_value = api_config::DEFAULT_API_URL)]
    pub api: Vec<String>,

    /// 翻译API密钥
    #[arg(long, env = "BACKFILL_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    /// 源语言代码
    #[arg(long, default_value = service_config::DEFAULT_SOURCE_LANG)]
    pub source_lang: String,

    /// 目标语言代码
    #[arg(long, default_value = service_config::DEFAULT_TARGET_LANG)]
    pub target_lang: String,

    /// 同时在途的翻译请求上限
    #[arg(short, long, default_value_t = service_config::DEFAULT_CONCURRENCY)]
    pub concurrency: usize,

    /// 同时处理的章节数
    #[arg(long, default_value_t = service_config::DEFAULT_PARALLEL_CHAPTERS)]
    pub parallel_chapters: usize,

    /// 单次请求超时（秒）
    #[arg(long, default_value_t = api_config::REQUEST_TIMEOUT_SECONDS)]
    pub timeout: u64,

    /// 只处理指定书卷，可重复
    #[arg(short, long = "book", value_name = "CODE")]
    pub books: Vec<String>,

    /// 不回填经节级译文
    #[arg(long)]
    pub skip_verses: bool,

    /// 不回填逐词译文
    #[arg(long)]
    pub skip_words: bool,

    /// 章节解析失败时跳过该文件继续处理
    #[arg(long)]
    pub skip_invalid: bool,

    /// 只统计待翻译条目，不发请求也不写文件
    #[arg(long)]
    pub dry_run: bool,

    /// 开始前检查翻译服务连通性
    #[arg(long)]
    pub check: bool,

    /// 详细输出模式
    #[arg(short, long)]
    pub verbose: bool,

    /// 静默模式 (仅输出错误)
    #[arg(short, long)]
    pub quiet: bool,
}

impl From<&Cli> for BackfillConfig {
    fn from(cli: &Cli) -> Self {
        BackfillConfig::new(cli.root.clone())
            .with_api_urls(cli.api.clone())
            .with_api_key(cli.api_key.clone())
            .with_languages(&cli.source_lang, &cli.target_lang)
            .with_concurrency(cli.concurrency)
            .with_parallel_chapters(cli.parallel_chapters)
            .with_request_timeout(Duration::from_secs(cli.timeout))
            .with_books(cli.books.clone())
            .with_scope(ScanScope {
                verses: !cli.skip_verses,
                words: !cli.skip_words,
            })
            .skip_invalid_chapters(cli.skip_invalid)
            .dry_run(cli.dry_run)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::BackfillError;

    fn field_of(err: BackfillError) -> String {
        match err {
            BackfillError::Configuration { field, .. } => field,
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_default_config() {
        let config = BackfillConfig::new("/tmp/corpus");
        assert_eq!(config.source_lang(), "ar");
        assert_eq!(config.target_lang(), "en");
        assert_eq!(config.concurrency(), 200);
        assert_eq!(config.parallel_chapters(), 1);
        assert_eq!(config.api_urls(), &[api_config::DEFAULT_API_URL.to_string()]);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_validation_errors() {
        let base = || BackfillConfig::new("/tmp/corpus");

        assert_eq!(field_of(base().with_concurrency(0).validate().unwrap_err()), "concurrency");
        assert_eq!(field_of(base().with_parallel_chapters(0).validate().unwrap_err()), "parallel_chapters");
        assert_eq!(field_of(base().with_api_urls(vec![]).validate().unwrap_err()), "api");
        assert_eq!(
            field_of(base().with_api_urls(vec!["not a url".to_string()]).validate().unwrap_err()),
            "api"
        );
        assert_eq!(field_of(base().with_languages("xx", "en").validate().unwrap_err()), "source_lang");
        assert_eq!(field_of(base().with_languages("ar", "ar").validate().unwrap_err()), "target_lang");
        assert_eq!(
            field_of(base().with_request_timeout(Duration::ZERO).validate().unwrap_err()),
            "timeout"
        );
        assert_eq!(
            field_of(
                base()
                    .with_scope(ScanScope { verses: false, words: false })
                    .validate()
                    .unwrap_err()
            ),
            "scope"
        );
    }

    #[test]
    fn test_cli_parsing() {
        let cli = Cli::try_parse_from([
            "annotation-backfill",
            "/data/mappings",
            "--api",
            "http://localhost:5002/translate,http://localhost:5003/translate",
            "--concurrency",
            "8",
            "--book",
            "MRK",
            "--book",
            "JHN",
            "--skip-verses",
            "--dry-run",
        ])
        .unwrap();

        let config = BackfillConfig::from(&cli);
        assert_eq!(config.root(), Path::new("/data/mappings"));
        assert_eq!(config.api_urls().len(), 2);
        assert_eq!(config.concurrency(), 8);
        assert_eq!(config.books(), &["MRK".to_string(), "JHN".to_string()]);
        assert_eq!(config.scope(), ScanScope { verses: false, words: true });
        assert!(config.is_dry_run());
        assert!(!config.skip_invalid());
        assert!(config.validate().is_ok());
    }
}
