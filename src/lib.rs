//! Annotation Backfill - 语料注释回填工具库
//!
//! 这个库提供语料遍历、章节加载与写回、待翻译条目扫描、并发准入控制和
//! 翻译客户端等核心功能，由 [`pipeline::Backfill`] 串联成回填流水线。

pub mod api_constants;
pub mod config;
pub mod corpus;
pub mod document;
pub mod error;
pub mod gate;
pub mod pipeline;
pub mod scanner;
pub mod stats;
pub mod translator;
pub mod utils;

pub use config::BackfillConfig;
pub use error::{BackfillError, Result};
pub use pipeline::Backfill;
pub use stats::RunStats;
pub use translator::{TranslateRequest, TranslationBackend};
