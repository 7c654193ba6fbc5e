//! 下载相关的数据模型定义。
//!
//! 两种获取方式（镜像 API / 官网页面）在边界处都归一化为这里的结构。

use serde::{Deserialize, Serialize};

/// 章节目录项，`index` 从 1 开始。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterRef {
    pub chapter_id: String,
    pub title: String,
    pub index: usize,
}

impl ChapterRef {
    pub fn new(chapter_id: impl Into<String>, title: impl Into<String>, index: usize) -> Self {
        Self {
            chapter_id: chapter_id.into(),
            title: title.into(),
            index,
        }
    }
}

/// 章节正文：已去除标签或已还原字形的纯文本。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChapterContent {
    pub title: String,
    pub content: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookMetadata {
    pub novel_id: String,
    pub title: String,
    pub author: String,
    pub description: String,
    pub cover_url: String,
    pub word_count: u64,
    pub chapter_count: u64,
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct DownloadResult {
    pub success: u32,
    pub failed: u32,
}

impl DownloadResult {
    pub fn total(&self) -> u32 {
        self.success + self.failed
    }
}

/// 章节范围（`start` 从 1 开始，`end` 含端点）。
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ChapterRange {
    pub start: Option<usize>,
    pub end: Option<usize>,
}

impl ChapterRange {
    /// 把范围夹到 `[1, total]`，返回切片用的 `[lo, hi)`；范围为空时返回 `None`。
    pub fn clamp(&self, total: usize) -> Option<(usize, usize)> {
        if total == 0 {
            return None;
        }
        let start = self.start.unwrap_or(1).clamp(1, total);
        let end = self.end.unwrap_or(total).min(total);
        if end < start {
            return None;
        }
        Some((start - 1, end))
    }
}
