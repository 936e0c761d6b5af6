use std::time::Duration;

use chrono::{DateTime, Local};

/// 单个章节的处理结果
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct ChapterStats {
    pub verses_translated: usize,
    pub words_translated: usize,
    pub errors: usize,
    /// 是否写回了文件
    pub written: bool,
}

impl ChapterStats {
    pub fn translations(&self) -> usize {
        self.verses_translated + self.words_translated
    }
}

/// 一次回填运行的统计，仅在本次运行内有效，不持久化
#[derive(Debug, Clone, PartialEq)]
pub struct RunStats {
    pub chapters_found: usize,
    pub chapters_written: usize,
    pub chapters_unchanged: usize,
    pub chapters_skipped: usize,
    pub verses_translated: usize,
    pub words_translated: usize,
    pub errors: usize,
    /// 试运行时统计的待翻译经节数
    pub pending_verses: usize,
    /// 试运行时统计的待翻译词数
    pub pending_words: usize,
    pub dry_run: bool,
    pub started_at: DateTime<Local>,
    pub elapsed: Duration,
}

impl Default for RunStats {
    fn default() -> Self {
        Self {
            chapters_found: 0,
            chapters_written: 0,
            chapters_unchanged: 0,
            chapters_skipped: 0,
            verses_translated: 0,
            words_translated: 0,
            errors: 0,
            pending_verses: 0,
            pending_words: 0,
            dry_run: false,
            started_at: Local::now(),
            elapsed: Duration::ZERO,
        }
    }
}

impl RunStats {
    /// 合并一个章节的结果
    pub fn record_chapter(&mut self, chapter: &ChapterStats) {
        self.verses_translated += chapter.verses_translated;
        self.words_translated += chapter.words_translated;
        self.errors += chapter.errors;
        if chapter.written {
            self.chapters_written += 1;
        } else {
            self.chapters_unchanged += 1;
        }
    }

    pub fn translations(&self) -> usize {
        self.verses_translated + self.words_translated
    }

    /// 每秒翻译条数
    pub fn throughput(&self) -> f64 {
        let seconds = self.elapsed.as_secs_f64();
        if seconds > 0.0 {
            self.translations() as f64 / seconds
        } else {
            0.0
        }
    }
}

/// 打印运行报告
pub fn print_run_report(stats: &RunStats) {
    let finished_at = stats.started_at + chrono::Duration::from_std(stats.elapsed).unwrap_or_else(|_| chrono::Duration::zero());

    println!();
    println!("═══════════════════════════════════════");
    if stats.dry_run {
        println!("🔍 试运行完成（未发出请求，未写入文件）");
    } else {
        println!("🎉 回填完成");
    }
    println!("═══════════════════════════════════════");

    println!("📂 章节统计:");
    println!("   找到章节: {}", stats.chapters_found);
    println!("   写回章节: {}", stats.chapters_written);
    println!("   无需改动: {}", stats.chapters_unchanged);
    if stats.chapters_skipped > 0 {
        println!("   跳过章节: {}", stats.chapters_skipped);
    }

    if stats.dry_run {
        println!("\n🔤 待翻译:");
        println!("   经节: {}", stats.pending_verses);
        println!("   单词: {}", stats.pending_words);
    } else {
        println!("\n🔤 翻译统计:");
        println!("   经节: {}", stats.verses_translated);
        println!("   单词: {}", stats.words_translated);
        println!("   合计: {}", stats.translations());
        println!("   失败（已回退为原文）: {}", stats.errors);
    }

    println!("\n⏱️  时间:");
    println!("   开始: {}", stats.started_at.format("%Y-%m-%d %H:%M:%S"));
    println!("   结束: {}", finished_at.format("%Y-%m-%d %H:%M:%S"));
    println!("   总耗时: {}", format_duration(stats.elapsed));
    if !stats.dry_run {
        println!("   平均速率: {:.1} 条/秒", stats.throughput());
    }
}

/// 格式化持续时间
pub fn format_duration(duration: Duration) -> String {
    let millis = duration.as_millis();
    if millis < 1000 {
        return format!("{}ms", millis);
    }

    let total_seconds = duration.as_secs();
    if total_seconds < 60 {
        return format!("{:.3}s", duration.as_secs_f64());
    }

    let hours = total_seconds / 3600;
    let minutes = (total_seconds % 3600) / 60;
    let seconds = total_seconds % 60;
    format!("{}h {}m {}s", hours, minutes, seconds)
}
