/// 翻译服务与语料配置常量
///
/// 该文件定义了回填流水线使用的默认配置，方便统一管理和维护
use url::Url;

/// 默认翻译API配置
pub mod api_config {
    /// 默认翻译API地址 (LibreTranslate)
    pub const DEFAULT_API_URL: &str = "http://localhost:5000/translate";

    /// 请求超时时间（秒）
    pub const REQUEST_TIMEOUT_SECONDS: u64 = 30;

    /// 连通性检查使用的样例文本
    pub const CHECK_TEXT: &str = "مرحبا";
}

/// 翻译服务配置
pub mod service_config {
    /// 默认源语言
    pub const DEFAULT_SOURCE_LANG: &str = "ar";

    /// 默认目标语言
    pub const DEFAULT_TARGET_LANG: &str = "en";

    /// 支持的语言代码
    pub const SUPPORTED_LANGUAGES: &[&str] = &[
        "ar", "en", "zh", "ja", "ko", "fr", "de", "es", "it", "pt", "ru",
        "hi", "th", "vi", "id", "ms", "tl", "nl", "sv", "da", "fi", "pl",
        "cs", "sk", "hu", "ro", "bg", "uk", "el", "he", "tr", "fa", "ur",
    ];

    /// 默认并发请求上限
    pub const DEFAULT_CONCURRENCY: usize = 200;

    /// 默认同时处理的章节数
    pub const DEFAULT_PARALLEL_CHAPTERS: usize = 1;
}

/// 语料文件配置
pub mod corpus_config {
    /// 章节文件扩展名
    pub const CHAPTER_EXTENSION: &str = "json";

    /// 章节文档中的经节对象字段
    pub const VERSES_FIELD: &str = "verses";

    /// 经节中的逐词对齐数组字段
    pub const MAPPINGS_FIELD: &str = "mappings";

    /// 源语言字段名（由外部格式固定）
    pub const SOURCE_FIELD: &str = "ar";

    /// 目标语言字段名（由外部格式固定）
    pub const TARGET_FIELD: &str = "en";
}

/// 验证API URL是否有效
pub fn is_valid_api_url(url: &str) -> bool {
    match Url::parse(url) {
        Ok(parsed) => {
            (parsed.scheme() == "http" || parsed.scheme() == "https") && parsed.host().is_some()
        }
        Err(_) => false,
    }
}

/// 验证语言代码是否支持
pub fn is_supported_language(lang: &str) -> bool {
    service_config::SUPPORTED_LANGUAGES.contains(&lang)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_language_validation() {
        assert!(is_supported_language("ar"));
        assert!(is_supported_language("en"));
        assert!(!is_supported_language("xx"));
        assert!(!is_supported_language(""));
    }

    #[test]
    fn test_api_url_validation() {
        assert!(is_valid_api_url(api_config::DEFAULT_API_URL));
        assert!(is_valid_api_url("https://example.com/translate"));
        assert!(is_valid_api_url("http://localhost:5002/translate"));
        assert!(!is_valid_api_url("ftp://example.com"));
        assert!(!is_valid_api_url("invalid-url"));
        assert!(!is_valid_api_url("http://"));
    }
}
