//! 章节文档模型与加载/写回
//!
//! 文档结构：`{ verses: { [编号]: { ar, en, mappings?: [{ ar, en, ... }] } } }`。
//! 经节与逐词条目都以 `serde_json::Map` 保存（开启 `preserve_order`），写回时
//! 只有被填写的目标字段发生变化，其余字段（包括 `null`）及其顺序原样保留。

// 标准库导入
use std::fs;
use std::path::Path;

// 第三方crate导入
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use tracing::debug;

// 本地模块导入
use crate::api_constants::corpus_config::{MAPPINGS_FIELD, SOURCE_FIELD, TARGET_FIELD, VERSES_FIELD};
use crate::error::{BackfillError, Result};

/// 经节条目
pub type Verse = Map<String, Value>;

/// 逐词对齐条目
pub type WordMapping = Map<String, Value>;

/// 单个章节文档
///
/// 反序列化时保证 `verses` 存在且每个经节都是对象。
#[derive(Debug, Clone, PartialEq)]
pub struct ChapterDocument {
    fields: Map<String, Value>,
}

/// 带有源/目标注释字段的条目
///
/// 只有 JSON 字符串才算作源文本或目标文本；`null` 与其他类型的值不会被改写。
pub trait Annotated {
    fn fields(&self) -> &Map<String, Value>;
    fn fields_mut(&mut self) -> &mut Map<String, Value>;

    fn source_text(&self) -> Option<&str> {
        self.fields().get(SOURCE_FIELD).and_then(Value::as_str)
    }

    fn target_text(&self) -> Option<&str> {
        self.fields().get(TARGET_FIELD).and_then(Value::as_str)
    }

    /// 目标字段缺失、为 `null` 或为空字符串时视为空
    fn has_target(&self) -> bool {
        match self.fields().get(TARGET_FIELD) {
            None | Some(Value::Null) => false,
            Some(Value::String(text)) => !text.is_empty(),
            Some(_) => true,
        }
    }

    /// 源文本非空且目标为空
    fn needs_translation(&self) -> bool {
        let has_source = self.source_text().is_some_and(|s| !s.trim().is_empty());
        has_source && !self.has_target()
    }

    /// 写入目标文本；已有字段原位替换，缺失时追加到末尾
    fn set_target_text(&mut self, text: String) {
        self.fields_mut().insert(TARGET_FIELD.to_string(), Value::String(text));
    }
}

impl Annotated for Map<String, Value> {
    fn fields(&self) -> &Map<String, Value> {
        self
    }

    fn fields_mut(&mut self) -> &mut Map<String, Value> {
        self
    }
}

/// 经节的逐词对齐访问
pub trait VerseWords {
    /// `mappings` 数组中的原始条目（缺失或非数组时为空切片）
    fn words(&self) -> &[Value];

    /// 第 `index` 个逐词条目，非对象条目返回 `None`
    fn word(&self, index: usize) -> Option<&WordMapping> {
        self.words().get(index).and_then(Value::as_object)
    }

    fn word_mut(&mut self, index: usize) -> Option<&mut WordMapping>;
}

impl VerseWords for Verse {
    fn words(&self) -> &[Value] {
        self.get(MAPPINGS_FIELD)
            .and_then(Value::as_array)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    fn word_mut(&mut self, index: usize) -> Option<&mut WordMapping> {
        self.get_mut(MAPPINGS_FIELD)
            .and_then(Value::as_array_mut)
            .and_then(|words| words.get_mut(index))
            .and_then(Value::as_object_mut)
    }
}

impl Serialize for ChapterDocument {
    fn serialize<S>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for ChapterDocument {
    fn deserialize<D>(deserializer: D) -> std::result::Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let fields = Map::<String, Value>::deserialize(deserializer)?;

        match fields.get(VERSES_FIELD) {
            Some(Value::Object(verses)) => {
                if let Some((number, _)) = verses.iter().find(|(_, verse)| !verse.is_object()) {
                    return Err(D::Error::custom(format!("经节 {} 不是对象", number)));
                }
            }
            Some(_) => return Err(D::Error::custom("`verses` 必须是以经节编号为键的对象")),
            None => return Err(D::Error::missing_field(VERSES_FIELD)),
        }

        Ok(Self { fields })
    }
}

impl ChapterDocument {
    /// 从文件加载章节文档
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).map_err(|source| BackfillError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let document = Self::parse(path, &content)?;
        debug!("加载章节: {} ({} 节)", path.display(), document.verse_count());
        Ok(document)
    }

    /// 解析章节文档内容，`path` 仅用于错误信息
    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|source| BackfillError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// 序列化为两空格缩进的 JSON
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// 整体覆盖写回原路径（非事务性）
    pub fn persist(&self, path: &Path) -> Result<()> {
        let persistence_error = |source: std::io::Error| BackfillError::Persistence {
            path: path.to_path_buf(),
            source,
        };

        let content = self.to_json().map_err(|e| persistence_error(e.into()))?;
        fs::write(path, content).map_err(persistence_error)?;
        debug!("写回章节: {}", path.display());
        Ok(())
    }

    /// 顶层字段（含 `verses`）
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// 按文件中出现顺序遍历经节
    pub fn verses(&self) -> impl Iterator<Item = (&str, &Verse)> {
        self.fields
            .get(VERSES_FIELD)
            .and_then(Value::as_object)
            .into_iter()
            .flatten()
            .filter_map(|(number, verse)| verse.as_object().map(|verse| (number.as_str(), verse)))
    }

    pub fn verse_count(&self) -> usize {
        self.verses().count()
    }

    /// 按编号查找经节
    pub fn verse(&self, number: &str) -> Option<&Verse> {
        self.fields
            .get(VERSES_FIELD)
            .and_then(|verses| verses.get(number))
            .and_then(Value::as_object)
    }

    pub fn verse_mut(&mut self, number: &str) -> Option<&mut Verse> {
        self.fields
            .get_mut(VERSES_FIELD)
            .and_then(|verses| verses.get_mut(number))
            .and_then(Value::as_object_mut)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::path::PathBuf;

    const SAMPLE: &str = r#"{
  "book": "MRK",
  "verses": {
    "1": {
      "ar": "بدء إنجيل يسوع",
      "en": "",
      "mappings": [
        { "ar": "بدء", "en": "", "position": 0, "strongs": "G746" },
        { "ar": "إنجيل", "en": "gospel", "position": 1 }
      ]
    },
    "2": { "ar": "كما هو مكتوب", "en": "As it is written" },
    "10": { "en": "no source here", "note": "kept" }
  }
}"#;

    fn sample_path() -> PathBuf {
        PathBuf::from("MRK/1.json")
    }

    fn keys(entry: &Map<String, Value>) -> Vec<&str> {
        entry.keys().map(String::as_str).collect()
    }

    #[test]
    fn test_parse_keeps_verse_order_and_extra_fields() {
        let doc = ChapterDocument::parse(&sample_path(), SAMPLE).unwrap();

        let numbers: Vec<&str> = doc.verses().map(|(n, _)| n).collect();
        assert_eq!(numbers, vec!["1", "2", "10"]);
        assert_eq!(doc.fields().get("book"), Some(&Value::from("MRK")));

        let first = doc.verse("1").unwrap();
        assert_eq!(first.words().len(), 2);
        assert_eq!(first.word(0).unwrap().get("strongs"), Some(&Value::from("G746")));

        let tenth = doc.verse("10").unwrap();
        assert!(tenth.source_text().is_none());
        assert!(tenth.words().is_empty());
    }

    #[test]
    fn test_needs_translation() {
        let doc = ChapterDocument::parse(&sample_path(), SAMPLE).unwrap();

        assert!(doc.verse("1").unwrap().needs_translation());
        assert!(!doc.verse("2").unwrap().needs_translation());
        // 没有源文本的条目直接跳过
        assert!(!doc.verse("10").unwrap().needs_translation());

        let first = doc.verse("1").unwrap();
        assert!(first.word(0).unwrap().needs_translation());
        assert!(!first.word(1).unwrap().needs_translation());

        let entry = |value: Value| value.as_object().cloned().unwrap();

        assert!(entry(json!({ "ar": "كلمة" })).needs_translation());
        assert!(entry(json!({ "ar": "كلمة", "en": null })).needs_translation());
        assert!(!entry(json!({ "ar": "  ", "en": "" })).needs_translation());
        assert!(!entry(json!({ "ar": null, "en": "" })).needs_translation());
    }

    #[test]
    fn test_whitespace_target_counts_as_present() {
        let entry = json!({ "ar": "مرحبا", "en": " " });
        let entry = entry.as_object().unwrap();

        assert!(entry.has_target());
        assert!(!entry.needs_translation());
    }

    #[test]
    fn test_round_trip_is_byte_identical() {
        let doc = ChapterDocument::parse(&sample_path(), SAMPLE).unwrap();
        let json = doc.to_json().unwrap();

        let original: Value = serde_json::from_str(SAMPLE).unwrap();
        assert_eq!(json, serde_json::to_string_pretty(&original).unwrap());

        // 源文本缺失的经节不会被补出空字段
        let written: Value = serde_json::from_str(&json).unwrap();
        assert!(!written["verses"]["10"].as_object().unwrap().contains_key("ar"));
        assert!(json.starts_with("{\n  \"book\""));
    }

    #[test]
    fn test_null_fields_survive_beside_translated_verse() {
        let content = r#"{
  "verses": {
    "1": { "ar": "مرحبا", "en": "" },
    "2": { "ar": null, "en": null, "mappings": null }
  }
}"#;
        let mut doc = ChapterDocument::parse(&sample_path(), content).unwrap();
        doc.verse_mut("1").unwrap().set_target_text("hello".to_string());

        let written: Value = serde_json::from_str(&doc.to_json().unwrap()).unwrap();
        assert_eq!(written["verses"]["1"], json!({ "ar": "مرحبا", "en": "hello" }));
        assert_eq!(
            written["verses"]["2"],
            json!({ "ar": null, "en": null, "mappings": null })
        );
    }

    #[test]
    fn test_field_order_survives_target_write() {
        let content = r#"{
  "verses": {
    "1": {
      "mappings": [ { "position": 0, "en": "", "ar": "في" } ],
      "en": "",
      "note": "first",
      "ar": "في البدء"
    },
    "2": { "ar": "كان" }
  }
}"#;
        let mut doc = ChapterDocument::parse(&sample_path(), content).unwrap();
        let verse = doc.verse_mut("1").unwrap();
        verse.set_target_text("In the beginning".to_string());
        verse.word_mut(0).unwrap().set_target_text("In".to_string());
        doc.verse_mut("2").unwrap().set_target_text("was".to_string());

        let reparsed = ChapterDocument::parse(&sample_path(), &doc.to_json().unwrap()).unwrap();
        let first = reparsed.verse("1").unwrap();
        assert_eq!(keys(first), vec!["mappings", "en", "note", "ar"]);
        assert_eq!(keys(first.word(0).unwrap()), vec!["position", "en", "ar"]);
        // 原本缺失的目标字段追加在末尾
        assert_eq!(keys(reparsed.verse("2").unwrap()), vec!["ar", "en"]);
    }

    #[test]
    fn test_malformed_document_is_parse_error() {
        let err = ChapterDocument::parse(&sample_path(), "{ \"verses\": [").unwrap_err();
        assert!(matches!(err, BackfillError::Parse { .. }));

        let err = ChapterDocument::parse(&sample_path(), "{ \"chapters\": {} }").unwrap_err();
        assert!(matches!(err, BackfillError::Parse { .. }));

        let err = ChapterDocument::parse(&sample_path(), "{ \"verses\": [] }").unwrap_err();
        assert!(matches!(err, BackfillError::Parse { .. }));

        let err = ChapterDocument::parse(&sample_path(), "{ \"verses\": { \"1\": \"text\" } }").unwrap_err();
        assert!(matches!(err, BackfillError::Parse { .. }));
    }

    #[test]
    fn test_load_and_persist() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("1.json");
        fs::write(&path, SAMPLE).unwrap();

        let mut doc = ChapterDocument::load(&path).unwrap();
        doc.verse_mut("1").unwrap().set_target_text("The beginning".to_string());
        doc.persist(&path).unwrap();

        let reloaded = ChapterDocument::load(&path).unwrap();
        assert_eq!(reloaded.verse("1").unwrap().target_text(), Some("The beginning"));
        assert_eq!(reloaded.verse("2"), doc.verse("2"));

        let missing = dir.path().join("missing.json");
        assert!(matches!(
            ChapterDocument::load(&missing).unwrap_err(),
            BackfillError::Read { .. }
        ));
    }

    #[test]
    fn test_persist_into_missing_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let doc = ChapterDocument::parse(&sample_path(), SAMPLE).unwrap();
        let err = doc.persist(&dir.path().join("gone").join("1.json")).unwrap_err();
        assert!(matches!(err, BackfillError::Persistence { .. }));
    }
}
