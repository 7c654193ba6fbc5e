//! 整书下载流程：元数据 -> 目录 -> 按范围并发拉取正文 -> 按章节顺序保存。

use std::sync::Arc;
use std::thread;
use std::time::Instant;

use crossbeam_channel as channel;
use thiserror::Error;
use tracing::{error, info, warn};

use super::models::{BookMetadata, ChapterContent, ChapterRange, ChapterRef, DownloadResult};
use super::progress::ProgressReporter;
use super::source::{NovelSource, SourceError};
use super::store::{NovelStore, StoreError};

#[derive(Debug, Error)]
pub enum DownloadError {
    #[error("获取小说信息失败: {0}")]
    Metadata(#[source] SourceError),
    #[error("获取章节列表失败: {0}")]
    ChapterList(#[source] SourceError),
    #[error("章节列表为空")]
    EmptyChapterList,
    #[error("下载范围内没有章节（共 {total} 章）")]
    EmptyRange { total: usize },
    #[error(transparent)]
    Store(#[from] StoreError),
}

impl DownloadError {
    /// 鉴权类失败时给用户的建议。
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::Metadata(e) | Self::ChapterList(e) if e.is_authorization() => {
                Some("建议: 切换获取方式（官网模式需要登录 Cookie），或更换 API 节点")
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone)]
pub struct DownloadOutcome {
    pub meta: BookMetadata,
    pub result: DownloadResult,
}

pub struct Downloader {
    source: Arc<dyn NovelSource>,
    store: Arc<dyn NovelStore>,
    max_workers: usize,
    show_progress: bool,
}

impl Downloader {
    pub fn new(source: Arc<dyn NovelSource>, store: Arc<dyn NovelStore>, max_workers: usize) -> Self {
        Self {
            source,
            store,
            max_workers: max_workers.max(1),
            show_progress: false,
        }
    }

    pub fn with_progress(mut self, show: bool) -> Self {
        self.show_progress = show;
        self
    }

    pub fn run(&self, book: &str, range: ChapterRange) -> Result<DownloadOutcome, DownloadError> {
        let start = Instant::now();
        info!("开始下载小说: {}（来源: {}）", book, self.source.label());

        let meta = self.source.novel_info(book).map_err(|e| {
            error!("获取小说信息失败: {}", e);
            DownloadError::Metadata(e)
        })?;
        info!(
            "小说名称: {} 作者: {} 字数: {} 章节数: {}",
            meta.title, meta.author, meta.word_count, meta.chapter_count
        );
        self.store.save_novel(&meta)?;

        let chapters = self
            .source
            .chapter_list(&meta.novel_id)
            .map_err(DownloadError::ChapterList)?;
        if chapters.is_empty() {
            return Err(DownloadError::EmptyChapterList);
        }
        let total = chapters.len();
        let (lo, hi) = range
            .clamp(total)
            .ok_or(DownloadError::EmptyRange { total })?;
        info!("共获取到 {} 个章节，下载范围: 第 {} 章到第 {} 章", total, lo + 1, hi);

        let fetched = self.fetch_all(&meta.novel_id, &chapters[lo..hi]);

        let mut result = DownloadResult::default();
        for (chapter, outcome) in fetched {
            match outcome {
                Ok(content) => {
                    let title = if content.title.trim().is_empty() {
                        chapter.title.as_str()
                    } else {
                        content.title.as_str()
                    };
                    let word_count = content.content.chars().count();
                    match self.store.save_chapter(
                        &meta.novel_id,
                        &chapter.chapter_id,
                        title,
                        chapter.index,
                        &content.content,
                        word_count,
                    ) {
                        Ok(()) => result.success += 1,
                        Err(err) => {
                            error!("保存章节 {} 失败: {}", chapter.chapter_id, err);
                            result.failed += 1;
                        }
                    }
                }
                Err(err) => {
                    warn!("章节 {} 下载失败: {}", chapter.title, err);
                    result.failed += 1;
                }
            }
        }

        info!(
            "下载完成：{} 成功 {} 章，失败 {} 章，用时 {:.1}s",
            meta.title,
            result.success,
            result.failed,
            start.elapsed().as_secs_f32()
        );
        Ok(DownloadOutcome { meta, result })
    }

    /// 固定大小的工作线程池并发拉取，返回值按章节序号排序。
    fn fetch_all(
        &self,
        novel_id: &str,
        chapters: &[ChapterRef],
    ) -> Vec<(ChapterRef, Result<ChapterContent, SourceError>)> {
        let (job_tx, job_rx) = channel::unbounded::<ChapterRef>();
        let (done_tx, done_rx) = channel::unbounded();
        for ch in chapters {
            let _ = job_tx.send(ch.clone());
        }
        drop(job_tx);

        let workers = self.max_workers.min(chapters.len()).max(1);
        let mut progress = ProgressReporter::new(chapters.len(), self.show_progress);
        let mut out = Vec::with_capacity(chapters.len());

        thread::scope(|scope| {
            for _ in 0..workers {
                let job_rx = job_rx.clone();
                let done_tx = done_tx.clone();
                let source = self.source.clone();
                scope.spawn(move || {
                    for chapter in job_rx.iter() {
                        let outcome = source.chapter_content(novel_id, &chapter);
                        if done_tx.send((chapter, outcome)).is_err() {
                            return;
                        }
                    }
                });
            }
            drop(done_tx);

            for (chapter, outcome) in done_rx.iter() {
                progress.chapter_done(&chapter.title, outcome.is_ok());
                out.push((chapter, outcome));
            }
        });
        progress.finish();

        out.sort_by_key(|(ch, _)| ch.index);
        out
    }
}
