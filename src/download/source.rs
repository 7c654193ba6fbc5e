//! 内容来源抽象：镜像 API 与官网页面两种策略，由调用方按模式二选一。

use thiserror::Error;

use super::models::{BookMetadata, ChapterContent, ChapterRef};
use crate::base_system::book_id::parse_book_id;
use crate::network_parser::network::{WebError, WebFallbackClient};
use crate::third_party::api_manager::{BookDetail, NovelApiManager, UpstreamError};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("cannot parse novel id from {0:?}")]
    InvalidId(String),
    #[error(transparent)]
    Upstream(#[from] UpstreamError),
    #[error(transparent)]
    Web(#[from] WebError),
    #[error("{0}")]
    Unavailable(String),
}

impl SourceError {
    /// 鉴权类错误：重试无意义，应提示登录或切换获取方式。
    pub fn is_authorization(&self) -> bool {
        match self {
            Self::Upstream(e) => e.is_auth(),
            Self::Web(e) => e.is_authorization(),
            _ => false,
        }
    }
}

pub trait NovelSource: Send + Sync {
    /// 用于日志的来源名称。
    fn label(&self) -> &'static str;

    fn novel_info(&self, url_or_id: &str) -> Result<BookMetadata, SourceError>;

    fn chapter_list(&self, novel_id: &str) -> Result<Vec<ChapterRef>, SourceError>;

    fn chapter_content(
        &self,
        novel_id: &str,
        chapter: &ChapterRef,
    ) -> Result<ChapterContent, SourceError>;
}

pub struct ApiSource {
    manager: NovelApiManager,
}

impl ApiSource {
    pub fn new(manager: NovelApiManager) -> Self {
        Self { manager }
    }
}

impl NovelSource for ApiSource {
    fn label(&self) -> &'static str {
        "第三方API"
    }

    fn novel_info(&self, url_or_id: &str) -> Result<BookMetadata, SourceError> {
        let novel_id =
            parse_book_id(url_or_id).ok_or_else(|| SourceError::InvalidId(url_or_id.to_string()))?;
        match self.manager.get_book_detail(&novel_id) {
            Some(BookDetail::Found(meta)) => Ok(meta),
            Some(BookDetail::Rejected(err)) => Err(err.into()),
            None => Err(SourceError::Unavailable(
                "所有 API 节点均不可用".to_string(),
            )),
        }
    }

    fn chapter_list(&self, novel_id: &str) -> Result<Vec<ChapterRef>, SourceError> {
        self.manager
            .get_chapter_list(novel_id)
            .ok_or_else(|| SourceError::Unavailable("获取章节列表失败".to_string()))
    }

    fn chapter_content(
        &self,
        novel_id: &str,
        chapter: &ChapterRef,
    ) -> Result<ChapterContent, SourceError> {
        self.manager
            .get_chapter_content(&chapter.chapter_id, novel_id)
            .ok_or_else(|| {
                SourceError::Unavailable(format!("章节 {} 两个正文接口均无结果", chapter.chapter_id))
            })
    }
}

impl NovelSource for WebFallbackClient {
    fn label(&self) -> &'static str {
        "官网"
    }

    fn novel_info(&self, url_or_id: &str) -> Result<BookMetadata, SourceError> {
        Ok(self.get_novel_info(url_or_id)?)
    }

    fn chapter_list(&self, novel_id: &str) -> Result<Vec<ChapterRef>, SourceError> {
        Ok(self.get_chapter_list(novel_id)?)
    }

    fn chapter_content(
        &self,
        novel_id: &str,
        chapter: &ChapterRef,
    ) -> Result<ChapterContent, SourceError> {
        Ok(self.get_chapter_content(novel_id, &chapter.chapter_id)?)
    }
}
