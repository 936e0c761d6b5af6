//! 注释扫描：找出章节中仍缺少目标语言文本的条目

use crate::document::{Annotated, ChapterDocument, Verse, VerseWords};

/// 待填写的目标字段位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Slot {
    /// 经节级目标字段
    Verse { verse: String },
    /// 逐词对齐中的目标字段
    Word { verse: String, word: usize },
}

impl Slot {
    /// 所属经节编号
    pub fn verse_number(&self) -> &str {
        match self {
            Slot::Verse { verse } | Slot::Word { verse, .. } => verse.as_str(),
        }
    }
}

/// 一个翻译任务：源文本及其结果应写入的位置
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranslationTask {
    pub slot: Slot,
    pub source: String,
}

impl TranslationTask {
    pub fn is_word(&self) -> bool {
        matches!(self.slot, Slot::Word { .. })
    }
}

/// 回填范围
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanScope {
    pub verses: bool,
    pub words: bool,
}

impl Default for ScanScope {
    fn default() -> Self {
        Self {
            verses: true,
            words: true,
        }
    }
}

impl ScanScope {
    pub fn is_empty(&self) -> bool {
        !self.verses && !self.words
    }
}

/// 惰性、有限、可重启（`Clone`）的待翻译任务序列
///
/// 顺序为经节顺序，经节内先经节级任务、再按词序输出逐词任务。
#[derive(Debug, Clone)]
pub struct PendingTasks<'a> {
    verses: Vec<(&'a str, &'a Verse)>,
    scope: ScanScope,
    verse: usize,
    // None 表示当前经节的经节级字段尚未检查
    word: Option<usize>,
}

/// 扫描章节，返回待翻译任务序列
pub fn pending_tasks(document: &ChapterDocument, scope: ScanScope) -> PendingTasks<'_> {
    PendingTasks {
        verses: document.verses().collect(),
        scope,
        verse: 0,
        word: None,
    }
}

impl Iterator for PendingTasks<'_> {
    type Item = TranslationTask;

    fn next(&mut self) -> Option<Self::Item> {
        while let Some(&(number, verse)) = self.verses.get(self.verse) {
            let word_index = match self.word {
                None => {
                    self.word = Some(0);
                    if self.scope.verses && verse.needs_translation() {
                        return Some(TranslationTask {
                            slot: Slot::Verse {
                                verse: number.to_string(),
                            },
                            source: verse.source_text().unwrap_or_default().to_string(),
                        });
                    }
                    0
                }
                Some(index) => index,
            };

            if self.scope.words {
                for offset in word_index..verse.words().len() {
                    let Some(mapping) = verse.word(offset) else {
                        continue;
                    };
                    if mapping.needs_translation() {
                        self.word = Some(offset + 1);
                        return Some(TranslationTask {
                            slot: Slot::Word {
                                verse: number.to_string(),
                                word: offset,
                            },
                            source: mapping.source_text().unwrap_or_default().to_string(),
                        });
                    }
                }
            }

            self.verse += 1;
            self.word = None;
        }

        None
    }
}

/// 按范围统计待翻译的经节数与词数
pub fn count_pending(document: &ChapterDocument, scope: ScanScope) -> (usize, usize) {
    pending_tasks(document, scope).fold((0, 0), |(verses, words), task| {
        if task.is_word() {
            (verses, words + 1)
        } else {
            (verses + 1, words)
        }
    })
}

impl ChapterDocument {
    /// 把译文写入任务位置对应的目标字段，位置不存在时返回 `false`
    pub fn fill(&mut self, slot: &Slot, text: String) -> bool {
        let entry = match slot {
            Slot::Verse { verse } => self.verse_mut(verse),
            Slot::Word { verse, word } => self.verse_mut(verse).and_then(|verse| verse.word_mut(*word)),
        };

        match entry {
            Some(entry) => {
                entry.set_target_text(text);
                true
            }
            None => false,
        }
    }
}
