//! 回填流水线
//!
//! 对每个章节：扫描待翻译条目，全部并发提交到共享的准入闸门，等待所有任务
//! 完成后（完整汇合屏障）把结果写入对应字段，再整体写回文件。部分条目失败
//! 不会阻止写回；没有待翻译条目的章节不会被改写。

// 标准库导入
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

// 第三方crate导入
use chrono::Local;
use futures::future::join_all;
use futures::stream::{self, StreamExt};
use tracing::{debug, error, info, warn};

// 本地模块导入
use crate::config::BackfillConfig;
use crate::corpus::{retain_books, sort_chapters, walk_corpus, ChapterRef};
use crate::document::ChapterDocument;
use crate::error::{BackfillError, Result};
use crate::gate::AdmissionGate;
use crate::scanner::{count_pending, pending_tasks, TranslationTask};
use crate::stats::{ChapterStats, RunStats};
use crate::translator::{LibreTranslateBackend, Translation, TranslationBackend, TranslationClient};
use crate::utils::validate_corpus_root;

/// 单个章节的处理结果
#[derive(Debug)]
enum ChapterOutcome {
    Processed(ChapterStats),
    Scanned { verses: usize, words: usize },
    /// 运行已中止，章节未开始处理
    NotStarted,
}

/// 回填流水线
pub struct Backfill {
    client: TranslationClient,
    config: BackfillConfig,
}

impl Backfill {
    /// 使用给定的翻译后端创建流水线
    pub fn new(config: BackfillConfig, backend: Arc<dyn TranslationBackend>) -> Result<Self> {
        config.validate()?;
        let gate = AdmissionGate::new(config.concurrency())?;

        Ok(Self {
            client: TranslationClient::new(backend, gate),
            config,
        })
    }

    /// 按配置创建 LibreTranslate 后端并构建流水线
    pub fn from_config(config: BackfillConfig) -> Result<Self> {
        let backend = LibreTranslateBackend::new(
            config.api_urls().to_vec(),
            config.api_key().map(str::to_string),
            config.request_timeout(),
        )?;
        Self::new(config, Arc::new(backend))
    }

    pub fn config(&self) -> &BackfillConfig {
        &self.config
    }

    /// 检查翻译服务连通性
    pub async fn check_connection(&self) -> Result<String> {
        self.client
            .check_connection(self.config.source_lang(), self.config.target_lang())
            .await
    }

    /// 回填一个已加载的文档（不涉及文件读写）
    ///
    /// 所有待翻译条目并发提交，全部完成后才统一写入结果。
    pub async fn backfill_document(&self, document: &mut ChapterDocument) -> ChapterStats {
        let tasks: Vec<TranslationTask> = pending_tasks(document, self.config.scope()).collect();
        if tasks.is_empty() {
            return ChapterStats::default();
        }

        let source_lang = self.config.source_lang();
        let target_lang = self.config.target_lang();
        let resolved: Vec<(TranslationTask, Translation)> = join_all(tasks.into_iter().map(|task| async move {
            let translation = self.client.translate(&task.source, source_lang, target_lang).await;
            (task, translation)
        }))
        .await;

        let mut stats = ChapterStats::default();
        for (task, translation) in resolved {
            if translation.is_fallback() {
                stats.errors += 1;
            }

            if !document.fill(&task.slot, translation.text) {
                warn!("经节 {} 的目标字段已不存在，丢弃结果", task.slot.verse_number());
                continue;
            }

            if task.is_word() {
                stats.words_translated += 1;
            } else {
                stats.verses_translated += 1;
            }
        }

        stats
    }

    /// 加载、回填并写回一个章节
    pub async fn process_chapter(&self, chapter: &ChapterRef) -> Result<ChapterStats> {
        let mut document = ChapterDocument::load(&chapter.path)?;
        let mut stats = self.backfill_document(&mut document).await;

        if stats.translations() > 0 {
            document.persist(&chapter.path)?;
            stats.written = true;
        }

        Ok(stats)
    }

    /// 只统计章节中待翻译的经节数与词数
    pub fn scan_chapter(&self, chapter: &ChapterRef) -> Result<(usize, usize)> {
        let document = ChapterDocument::load(&chapter.path)?;
        Ok(count_pending(&document, self.config.scope()))
    }

    /// 处理整个语料
    ///
    /// 章节按书卷与章号排序后处理。加载失败默认中止运行（`skip_invalid` 时跳过）；
    /// 写回失败总是中止。中止后不再开始新章节，已在处理中的章节照常完成并写回。
    pub async fn run(&self) -> Result<RunStats> {
        let root = self.config.root();
        validate_corpus_root(root)?;

        let started = Instant::now();
        let mut stats = RunStats {
            dry_run: self.config.is_dry_run(),
            started_at: Local::now(),
            ..Default::default()
        };

        let mut chapters = walk_corpus(root)?;
        retain_books(&mut chapters, self.config.books());
        sort_chapters(&mut chapters);
        stats.chapters_found = chapters.len();

        info!(
            "📚 共 {} 个章节，并发上限 {}，章节并行度 {}",
            chapters.len(),
            self.config.concurrency(),
            self.config.parallel_chapters()
        );

        let total = chapters.len();
        let halted = AtomicBool::new(false);
        let mut first_error: Option<BackfillError> = None;

        let mut outcomes = stream::iter(chapters.iter().enumerate())
            .map(|(index, chapter)| {
                let halted = &halted;
                async move {
                    if halted.load(Ordering::SeqCst) {
                        return (chapter, Ok(ChapterOutcome::NotStarted));
                    }
                    let outcome = self.visit_chapter(index + 1, total, chapter).await;
                    if matches!(&outcome, Err(e) if !self.is_skippable(e)) {
                        halted.store(true, Ordering::SeqCst);
                    }
                    (chapter, outcome)
                }
            })
            .buffer_unordered(self.config.parallel_chapters());

        while let Some((chapter, outcome)) = outcomes.next().await {
            match outcome {
                Ok(ChapterOutcome::Processed(chapter_stats)) => stats.record_chapter(&chapter_stats),
                Ok(ChapterOutcome::Scanned { verses, words }) => {
                    stats.pending_verses += verses;
                    stats.pending_words += words;
                    stats.chapters_unchanged += 1;
                }
                Ok(ChapterOutcome::NotStarted) => {}
                Err(e) if self.is_skippable(&e) => {
                    warn!("⚠️  跳过章节 {}: {}", chapter.label(), e);
                    stats.chapters_skipped += 1;
                }
                Err(e) => {
                    error!("❌ 章节 {} 处理失败: {}", chapter.label(), e);
                    if first_error.is_none() {
                        first_error = Some(e);
                    }
                }
            }
        }

        stats.elapsed = started.elapsed();

        if let Some(e) = first_error {
            warn!(
                "运行中止：已写回 {} 个章节，{} 条翻译",
                stats.chapters_written,
                stats.translations()
            );
            return Err(e);
        }

        Ok(stats)
    }

    async fn visit_chapter(&self, position: usize, total: usize, chapter: &ChapterRef) -> Result<ChapterOutcome> {
        if self.config.is_dry_run() {
            let (verses, words) = self.scan_chapter(chapter)?;
            debug!("[{}/{}] {}: 待翻译经节 {}，单词 {}", position, total, chapter.label(), verses, words);
            return Ok(ChapterOutcome::Scanned { verses, words });
        }

        let chapter_stats = self.process_chapter(chapter).await?;
        if chapter_stats.written {
            info!(
                "📖 [{}/{}] {}: 经节 {}，单词 {}，失败 {}",
                position,
                total,
                chapter.label(),
                chapter_stats.verses_translated,
                chapter_stats.words_translated,
                chapter_stats.errors
            );
        } else {
            debug!("[{}/{}] {}: 无待翻译条目", position, total, chapter.label());
        }

        Ok(ChapterOutcome::Processed(chapter_stats))
    }

    fn is_skippable(&self, error: &BackfillError) -> bool {
        self.config.skip_invalid() && error.is_load_error()
    }
}
