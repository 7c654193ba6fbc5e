//! 下载结果的持久化接口与 TXT 导出实现。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use thiserror::Error;
use tracing::info;

use super::models::BookMetadata;
use crate::base_system::context::safe_fs_name;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("novel {0} has not been saved")]
    UnknownNovel(String),
    #[error("novel {0} has no chapters to export")]
    NoChapters(String),
}

pub trait NovelStore: Send + Sync {
    fn save_novel(&self, meta: &BookMetadata) -> Result<(), StoreError>;

    fn save_chapter(
        &self,
        novel_id: &str,
        chapter_id: &str,
        title: &str,
        index: usize,
        content: &str,
        word_count: usize,
    ) -> Result<(), StoreError>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredChapter {
    pub chapter_id: String,
    pub title: String,
    pub index: usize,
    pub content: String,
    pub word_count: usize,
}

#[derive(Debug, Default)]
struct StoredNovel {
    meta: BookMetadata,
    chapters: HashMap<String, StoredChapter>,
}

/// 内存中暂存，下载结束后导出为单个 `.txt` 文件。
#[derive(Debug, Default)]
pub struct TxtStore {
    novels: Mutex<HashMap<String, StoredNovel>>,
}

impl TxtStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, HashMap<String, StoredNovel>> {
        match self.novels.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// 按章节序号排列的已保存章节。
    pub fn chapters(&self, novel_id: &str) -> Vec<StoredChapter> {
        let guard = self.lock();
        let mut out: Vec<StoredChapter> = guard
            .get(novel_id)
            .map(|n| n.chapters.values().cloned().collect())
            .unwrap_or_default();
        out.sort_by(|a, b| a.index.cmp(&b.index).then_with(|| a.chapter_id.cmp(&b.chapter_id)));
        out
    }

    pub fn render(&self, novel_id: &str) -> Result<String, StoreError> {
        let meta = self
            .lock()
            .get(novel_id)
            .map(|n| n.meta.clone())
            .ok_or_else(|| StoreError::UnknownNovel(novel_id.to_string()))?;
        let chapters = self.chapters(novel_id);
        if chapters.is_empty() {
            return Err(StoreError::NoChapters(novel_id.to_string()));
        }

        let rule = "=".repeat(50);
        let mut out = String::new();
        out.push_str(&format!("{rule}\n"));
        out.push_str(&format!("书名: {}\n", meta.title));
        out.push_str(&format!("作者: {}\n", meta.author));
        out.push_str(&format!("简介: {}\n", meta.description));
        out.push_str(&format!("字数: {} 字\n", group_thousands(meta.word_count)));
        out.push_str(&format!("章节数: {} 章\n", meta.chapter_count));
        out.push_str(&format!("{rule}\n\n"));

        let short_rule = "=".repeat(30);
        for ch in &chapters {
            out.push_str(&format!("\n{short_rule}\n{}\n{short_rule}\n\n", ch.title));
            out.push_str(&ch.content);
            out.push('\n');
        }
        Ok(out)
    }

    /// `target` 为目录（或不带扩展名的不存在路径）时，在其中以书名生成文件名。
    pub fn export(&self, novel_id: &str, target: &Path) -> Result<PathBuf, StoreError> {
        let text = self.render(novel_id)?;
        let title = self
            .lock()
            .get(novel_id)
            .map(|n| n.meta.title.clone())
            .unwrap_or_default();

        let path = if target.is_dir() || target.extension().is_none() {
            target.join(format!("{}.txt", safe_fs_name(&title, "_", 120)))
        } else {
            target.to_path_buf()
        };
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, text)?;
        info!("已导出到: {}", path.display());
        Ok(path)
    }
}

impl NovelStore for TxtStore {
    fn save_novel(&self, meta: &BookMetadata) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let entry = guard.entry(meta.novel_id.clone()).or_default();
        entry.meta = meta.clone();
        entry.chapters.clear();
        Ok(())
    }

    fn save_chapter(
        &self,
        novel_id: &str,
        chapter_id: &str,
        title: &str,
        index: usize,
        content: &str,
        word_count: usize,
    ) -> Result<(), StoreError> {
        let mut guard = self.lock();
        let novel = guard
            .get_mut(novel_id)
            .ok_or_else(|| StoreError::UnknownNovel(novel_id.to_string()))?;
        novel.chapters.insert(
            chapter_id.to_string(),
            StoredChapter {
                chapter_id: chapter_id.to_string(),
                title: title.to_string(),
                index,
                content: content.to_string(),
                word_count,
            },
        );
        Ok(())
    }
}

pub fn group_thousands(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
