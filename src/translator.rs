//! 翻译客户端
//!
//! 每次调用先从准入闸门取得许可，再发出一次外部翻译请求。任何失败都在本模块
//! 边界内吸收：结果回退为原文，并以 [`TranslationOutcome::FellBack`] 标记，
//! 由调用方计入错误数。不做自动重试，每个任务恰好尝试一次。

// 标准库导入
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// 第三方crate导入
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

// 本地模块导入
use crate::api_constants::api_config;
use crate::backfill_error;
use crate::error::Result;
use crate::gate::AdmissionGate;

/// 单次翻译请求
#[derive(Debug, Clone, Copy)]
pub struct TranslateRequest<'a> {
    pub text: &'a str,
    pub source_lang: &'a str,
    pub target_lang: &'a str,
}

/// 翻译服务后端
#[async_trait]
pub trait TranslationBackend: Send + Sync {
    /// 执行一次翻译调用，失败以 `Err` 返回
    async fn translate(&self, request: TranslateRequest<'_>) -> Result<String>;
}

/// LibreTranslate 请求体
#[derive(Debug, Serialize)]
struct LibreTranslateBody<'a> {
    q: &'a str,
    source: &'a str,
    target: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    api_key: Option<&'a str>,
}

#[derive(Debug, Deserialize)]
struct LibreTranslateResponse {
    #[serde(rename = "translatedText")]
    translated_text: String,
}

/// 解析翻译服务的成功响应体
pub fn parse_translate_response(body: &str) -> Result<String> {
    serde_json::from_str::<LibreTranslateResponse>(body)
        .map(|response| response.translated_text)
        .map_err(|e| backfill_error!(translation, format!("响应格式错误: {}", e)))
}

/// LibreTranslate HTTP 后端，多个地址之间轮询分担负载
#[derive(Debug)]
pub struct LibreTranslateBackend {
    client: Client,
    endpoints: Vec<String>,
    api_key: Option<String>,
    next_endpoint: AtomicUsize,
}

impl LibreTranslateBackend {
    pub fn new(endpoints: Vec<String>, api_key: Option<String>, timeout: Duration) -> Result<Self> {
        if endpoints.is_empty() {
            return Err(backfill_error!(config, "api", "至少需要一个翻译API地址"));
        }

        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| backfill_error!(config, "api", format!("创建HTTP客户端失败: {}", e)))?;

        Ok(Self {
            client,
            endpoints,
            api_key,
            next_endpoint: AtomicUsize::new(0),
        })
    }

    fn pick_endpoint(&self) -> &str {
        let index = self.next_endpoint.fetch_add(1, Ordering::Relaxed) % self.endpoints.len();
        &self.endpoints[index]
    }
}

#[async_trait]
impl TranslationBackend for LibreTranslateBackend {
    async fn translate(&self, request: TranslateRequest<'_>) -> Result<String> {
        let endpoint = self.pick_endpoint();
        let body = LibreTranslateBody {
            q: request.text,
            source: request.source_lang,
            target: request.target_lang,
            api_key: self.api_key.as_deref(),
        };

        let response = self.client.post(endpoint).json(&body).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(backfill_error!(
                translation,
                format!("{} 返回错误状态: {}", endpoint, status),
                status.as_u16()
            ));
        }

        let text = response.text().await?;
        parse_translate_response(&text)
    }
}

/// 翻译结果来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TranslationOutcome {
    Translated,
    /// 调用失败，结果为原文
    FellBack,
}

/// 客户端边界上的翻译结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Translation {
    pub text: String,
    pub outcome: TranslationOutcome,
}

impl Translation {
    pub fn is_fallback(&self) -> bool {
        self.outcome == TranslationOutcome::FellBack
    }
}

/// 受准入闸门约束的翻译客户端
#[derive(Clone)]
pub struct TranslationClient {
    backend: Arc<dyn TranslationBackend>,
    gate: AdmissionGate,
}

impl TranslationClient {
    pub fn new(backend: Arc<dyn TranslationBackend>, gate: AdmissionGate) -> Self {
        Self { backend, gate }
    }

    pub fn gate(&self) -> &AdmissionGate {
        &self.gate
    }

    /// 翻译一条文本；永不失败，失败时返回原文
    pub async fn translate(&self, source_text: &str, source_lang: &str, target_lang: &str) -> Translation {
        let request = TranslateRequest {
            text: source_text,
            source_lang,
            target_lang,
        };

        match self.call(request).await {
            Ok(text) if text.trim().is_empty() => {
                debug!("翻译结果为空，保留原文: {}", source_text);
                Translation {
                    text: source_text.to_string(),
                    outcome: TranslationOutcome::Translated,
                }
            }
            Ok(text) => Translation {
                text,
                outcome: TranslationOutcome::Translated,
            },
            Err(e) => {
                warn!("❌ 翻译失败，回退为原文 '{}': {}", source_text, e);
                Translation {
                    text: source_text.to_string(),
                    outcome: TranslationOutcome::FellBack,
                }
            }
        }
    }

    /// 直接调用后端做连通性检查，错误原样返回
    pub async fn check_connection(&self, source_lang: &str, target_lang: &str) -> Result<String> {
        self.call(TranslateRequest {
            text: api_config::CHECK_TEXT,
            source_lang,
            target_lang,
        })
        .await
    }

    async fn call(&self, request: TranslateRequest<'_>) -> Result<String> {
        let _permit = self.gate.acquire().await?;
        self.backend.translate(request).await
    }
}
