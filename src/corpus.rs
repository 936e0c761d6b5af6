//! 语料遍历
//!
//! 章节文件位于 `<root>/<书卷代码>/<章号>.json`。遍历结果按文件系统的列举
//! 顺序返回，不保证按章号排序；需要确定顺序时调用 [`sort_chapters`]。

// 标准库导入
use std::path::{Path, PathBuf};

// 第三方crate导入
use tracing::debug;
use walkdir::WalkDir;

// 本地模块导入
use crate::api_constants::corpus_config::CHAPTER_EXTENSION;
use crate::error::Result;

/// 一个章节文件
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChapterRef {
    /// 书卷代码（目录名）
    pub book: String,
    /// 章节文件名，如 `1.json`
    pub file_name: String,
    pub path: PathBuf,
}

impl ChapterRef {
    /// 从文件名解析章号
    pub fn chapter_number(&self) -> Option<u32> {
        Path::new(&self.file_name)
            .file_stem()
            .and_then(|stem| stem.to_str())
            .and_then(|stem| stem.parse().ok())
    }

    /// 用于日志显示的标签，如 `MRK/1.json`
    pub fn label(&self) -> String {
        format!("{}/{}", self.book, self.file_name)
    }
}

/// 枚举语料根目录下所有书卷的所有章节文件
pub fn walk_corpus(root: &Path) -> Result<Vec<ChapterRef>> {
    let mut chapters = Vec::new();

    for entry in WalkDir::new(root).min_depth(2).max_depth(2) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        if path.extension().and_then(|ext| ext.to_str()) != Some(CHAPTER_EXTENSION) {
            continue;
        }

        let book = path
            .parent()
            .and_then(|parent| parent.file_name())
            .map(|name| name.to_string_lossy().into_owned());
        let file_name = path.file_name().map(|name| name.to_string_lossy().into_owned());

        if let (Some(book), Some(file_name)) = (book, file_name) {
            chapters.push(ChapterRef {
                book,
                file_name,
                path: path.to_path_buf(),
            });
        }
    }

    debug!("在 {} 下找到 {} 个章节文件", root.display(), chapters.len());
    Ok(chapters)
}

/// 按书卷代码、再按数字章号排序；无法解析章号的文件排在该书卷末尾
pub fn sort_chapters(chapters: &mut [ChapterRef]) {
    chapters.sort_by(|a, b| {
        a.book
            .cmp(&b.book)
            .then_with(|| match (a.chapter_number(), b.chapter_number()) {
                (Some(x), Some(y)) => x.cmp(&y),
                (Some(_), None) => std::cmp::Ordering::Less,
                (None, Some(_)) => std::cmp::Ordering::Greater,
                (None, None) => a.file_name.cmp(&b.file_name),
            })
    });
}

/// 只保留指定书卷；`books` 为空时不过滤
pub fn retain_books(chapters: &mut Vec<ChapterRef>, books: &[String]) {
    if books.is_empty() {
        return;
    }
    chapters.retain(|chapter| books.iter().any(|book| book.eq_ignore_ascii_case(&chapter.book)));
}
