//! 镜像 API 的业务封装：书籍详情、章节目录、章节正文。
//!
//! 网络层失败由 [`FailoverClient`] 吸收；这里只关心上游返回了什么，
//! 并把业务错误（下架、鉴权失败等）作为类型化结果交给调用方。

use std::sync::Arc;

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::envelope::{ChapterListShape, Envelope, unwrap_inner};
use super::failover::{FailoverClient, MirrorResponse};
use super::reconciler::{ContentEndpoint, ContentReconciler, RawChapter};
use super::transport::HttpTransport;
use crate::base_system::context::Config;
use crate::base_system::json_extract::{pick_string, pick_u64};
use crate::book_parser::parser::ContentParser;
use crate::download::models::{BookMetadata, ChapterContent, ChapterRef};

pub const DETAIL_ENDPOINT: &str = "/api/detail";
pub const BOOK_ENDPOINT: &str = "/api/book";
pub const CHAPTER_ENDPOINT: &str = "/api/chapter";
pub const CONTENT_ENDPOINT: &str = "/api/content";

const BOOK_REMOVED_MESSAGE: &str = "BOOK_REMOVE";
const BOOK_REMOVED_CODE: i64 = 101109;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpstreamErrorKind {
    AuthFailed,
    BookRemoved,
    Api { code: Option<i64> },
    Other,
}

/// 上游明确给出的业务错误。
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{message}")]
pub struct UpstreamError {
    pub kind: UpstreamErrorKind,
    pub message: String,
}

impl UpstreamError {
    fn new(kind: UpstreamErrorKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    fn auth(message: &str) -> Self {
        let detail = if message.is_empty() {
            "授权验证失败"
        } else {
            message
        };
        Self::new(
            UpstreamErrorKind::AuthFailed,
            format!("第三方API授权验证失败: {detail}（可切换到官网模式或更换 API 节点）"),
        )
    }

    pub fn is_auth(&self) -> bool {
        self.kind == UpstreamErrorKind::AuthFailed
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BookDetail {
    Found(BookMetadata),
    Rejected(UpstreamError),
}

pub struct NovelApiManager {
    client: FailoverClient,
    reconciler: ContentReconciler,
}

impl NovelApiManager {
    pub fn new(client: FailoverClient) -> Self {
        Self {
            client,
            reconciler: ContentReconciler::new(),
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        Self::new(FailoverClient::from_config(cfg, transport))
    }

    pub fn client(&self) -> &FailoverClient {
        &self.client
    }

    pub fn reconciler(&self) -> &ContentReconciler {
        &self.reconciler
    }

    /// 获取书籍详情；仅当所有节点都失败时返回 `None`。
    pub fn get_book_detail(&self, book_id: &str) -> Option<BookDetail> {
        let params = vec![("book_id".to_string(), book_id.to_string())];
        let resp = match self.client.request(DETAIL_ENDPOINT, &params) {
            Ok(r) => r,
            Err(err) => {
                error!("获取书籍详情失败: {}", err);
                return None;
            }
        };
        let detail = interpret_detail(&resp, book_id);
        if let BookDetail::Rejected(err) = &detail {
            warn!("书籍详情被拒绝 ({:?}): {}", err.kind, err.message);
        }
        Some(detail)
    }

    pub fn get_chapter_list(&self, book_id: &str) -> Option<Vec<ChapterRef>> {
        let params = vec![("book_id".to_string(), book_id.to_string())];
        let resp = match self.client.request(BOOK_ENDPOINT, &params) {
            Ok(r) => r,
            Err(err) => {
                error!("获取章节列表失败: {}", err);
                return None;
            }
        };
        let data = match open_response(&resp) {
            Ok(data) => data,
            Err(err) => {
                error!("获取章节列表失败: {}", err);
                return None;
            }
        };
        let Some(shape) = ChapterListShape::parse(unwrap_inner(&data)) else {
            warn!("无法识别的章节列表结构");
            return None;
        };
        let chapters = shape.flatten();
        match chapters.first() {
            Some(first) => info!(
                "获取章节列表成功: {} 个章节，第一章: {}",
                chapters.len(),
                first.title
            ),
            None => warn!("章节列表为空: {}", book_id),
        }
        Some(chapters)
    }

    /// 两个正文接口择优后返回清洗过的正文。
    pub fn get_chapter_content(&self, item_id: &str, book_id: &str) -> Option<ChapterContent> {
        let (endpoint, raw) = self
            .reconciler
            .reconcile(|ep| self.fetch_raw(ep, item_id, book_id))?;
        if raw.title.is_empty() {
            warn!("API 返回的标题为空，chapter_id={}", item_id);
        }
        debug!("章节 {} 采用 {} 接口结果", item_id, endpoint.label());
        Some(ChapterContent {
            title: raw.title,
            content: ContentParser::clean_html_content(&raw.content),
        })
    }

    fn fetch_raw(&self, endpoint: ContentEndpoint, item_id: &str, book_id: &str) -> Option<RawChapter> {
        let (path, mut params) = match endpoint {
            ContentEndpoint::Chapter => (CHAPTER_ENDPOINT, Vec::new()),
            ContentEndpoint::Content => (
                CONTENT_ENDPOINT,
                vec![("tab".to_string(), "小说".to_string())],
            ),
        };
        params.push(("item_id".to_string(), item_id.to_string()));
        if !book_id.trim().is_empty() {
            params.push(("book_id".to_string(), book_id.to_string()));
        }

        let resp = match self.client.request(path, &params) {
            Ok(r) => r,
            Err(err) => {
                warn!("{} 接口获取失败: {}", endpoint.label(), err);
                return None;
            }
        };
        let data = match open_response(&resp) {
            Ok(data) => data,
            Err(err) => {
                warn!("{} 接口不可用: {}", endpoint.label(), err);
                return None;
            }
        };
        let raw = raw_chapter(&data)?;
        debug!("{} 接口返回内容长度: {} 字符", endpoint.label(), raw.char_len());
        Some(raw)
    }
}

/// 把最终响应解成信封里的 `data`；鉴权失败与业务错误都归为 [`UpstreamError`]。
fn open_response(resp: &MirrorResponse) -> Result<Value, UpstreamError> {
    let message = resp
        .json
        .as_ref()
        .and_then(Value::as_object)
        .and_then(|o| pick_string(o, &["message", "msg"]))
        .unwrap_or_default();
    if resp.is_auth_failure() {
        return Err(UpstreamError::auth(&message));
    }
    let Some(json) = resp.json.as_ref().filter(|_| resp.status == 200) else {
        return Err(UpstreamError::new(
            UpstreamErrorKind::Api {
                code: Some(i64::from(resp.status)),
            },
            format!("HTTP {}: {}", resp.status, message),
        ));
    };
    match Envelope::open(json) {
        Envelope::Data(data) => Ok(data),
        Envelope::AuthFailed { message } => Err(UpstreamError::auth(&message)),
        Envelope::Error { code, message } => {
            let message = if message.is_empty() {
                "未知错误".to_string()
            } else {
                message
            };
            Err(UpstreamError::new(
                UpstreamErrorKind::Api { code },
                format!("API返回错误 (code={}): {}", code.unwrap_or_default(), message),
            ))
        }
    }
}

fn interpret_detail(resp: &MirrorResponse, book_id: &str) -> BookDetail {
    let data = match open_response(resp) {
        Ok(data) => data,
        Err(err) => return BookDetail::Rejected(err),
    };

    let payload = match data.as_object() {
        Some(level1) => {
            let inner_msg = pick_string(level1, &["message"]).unwrap_or_default();
            let inner_code = level1.get("code").and_then(Value::as_i64);
            if inner_msg == BOOK_REMOVED_MESSAGE || inner_code == Some(BOOK_REMOVED_CODE) {
                return BookDetail::Rejected(UpstreamError::new(
                    UpstreamErrorKind::BookRemoved,
                    "书籍已下架",
                ));
            }
            match level1.get("data") {
                Some(Value::Object(inner)) if inner.is_empty() && !inner_msg.is_empty() => {
                    return BookDetail::Rejected(UpstreamError::new(
                        UpstreamErrorKind::Other,
                        inner_msg,
                    ));
                }
                Some(inner) => inner.clone(),
                None => data.clone(),
            }
        }
        None => data,
    };

    match payload.as_object() {
        Some(obj) => BookDetail::Found(BookMetadata {
            novel_id: pick_string(obj, &["book_id", "bookId"]).unwrap_or_else(|| book_id.to_string()),
            title: pick_string(obj, &["book_name", "bookName"]).unwrap_or_default(),
            author: pick_string(obj, &["author", "author_name"]).unwrap_or_default(),
            description: pick_string(obj, &["abstract", "description"]).unwrap_or_default(),
            cover_url: pick_string(obj, &["thumb_url", "thumbUri"]).unwrap_or_default(),
            word_count: pick_u64(obj, &["word_count", "word_number"]).unwrap_or(0),
            chapter_count: pick_u64(obj, &["chapter_count", "serial_count"]).unwrap_or(0),
        }),
        None => BookDetail::Rejected(UpstreamError::new(
            UpstreamErrorKind::Other,
            "书籍详情结构无法识别",
        )),
    }
}

/// 正文为空白的结果视为不可用。
fn raw_chapter(data: &Value) -> Option<RawChapter> {
    let obj = match data.as_object() {
        Some(o) if o.contains_key("content") => o,
        _ => unwrap_inner(data).as_object()?,
    };
    let content = obj.get("content").and_then(Value::as_str)?;
    if content.trim().is_empty() {
        return None;
    }
    Some(RawChapter {
        title: pick_string(obj, &["title", "chapter_title"]).unwrap_or_default(),
        content: content.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ok(json: Value) -> MirrorResponse {
        MirrorResponse {
            base_url: "http://m".into(),
            status: 200,
            body: json.to_string(),
            json: Some(json),
        }
    }

    fn rejected(detail: BookDetail) -> UpstreamError {
        match detail {
            BookDetail::Rejected(e) => e,
            other => panic!("expected rejection, got {other:?}"),
        }
    }

    #[test]
    fn detail_unwraps_double_data() {
        let resp = ok(json!({"code": 200, "data": {"code": 0, "data": {
            "book_id": 7, "book_name": "书", "author": "某", "abstract": "简介",
            "thumb_url": "http://c", "word_count": "1000", "chapter_count": 3
        }}}));
        let BookDetail::Found(meta) = interpret_detail(&resp, "ignored") else {
            panic!("expected metadata");
        };
        assert_eq!(meta.novel_id, "7");
        assert_eq!(meta.title, "书");
        assert_eq!(meta.word_count, 1000);
        assert_eq!(meta.chapter_count, 3);
    }

    #[test]
    fn detail_recognizes_removed_books() {
        let by_msg = ok(json!({"code": 200, "data": {"message": "BOOK_REMOVE"}}));
        assert_eq!(
            rejected(interpret_detail(&by_msg, "1")).kind,
            UpstreamErrorKind::BookRemoved
        );
        let by_code = ok(json!({"code": 200, "data": {"code": 101109, "data": {}}}));
        assert_eq!(
            rejected(interpret_detail(&by_code, "1")).kind,
            UpstreamErrorKind::BookRemoved
        );
    }

    #[test]
    fn detail_empty_inner_data_with_message_is_an_error() {
        let resp = ok(json!({"code": 200, "data": {"message": "NOT_FOUND", "data": {}}}));
        let err = rejected(interpret_detail(&resp, "1"));
        assert_eq!(err.kind, UpstreamErrorKind::Other);
        assert_eq!(err.message, "NOT_FOUND");
    }

    #[test]
    fn detail_auth_and_api_codes() {
        let auth = ok(json!({"code": 401, "message": "token"}));
        assert!(rejected(interpret_detail(&auth, "1")).is_auth());

        let mut forbidden = ok(json!({"message": "no"}));
        forbidden.status = 403;
        assert!(rejected(interpret_detail(&forbidden, "1")).is_auth());

        let api = ok(json!({"code": 500, "message": "busy"}));
        assert_eq!(
            rejected(interpret_detail(&api, "1")).kind,
            UpstreamErrorKind::Api { code: Some(500) }
        );
    }

    #[test]
    fn detail_falls_back_to_requested_id() {
        let resp = ok(json!({"code": 200, "data": {"book_name": "X"}}));
        let BookDetail::Found(meta) = interpret_detail(&resp, "42") else {
            panic!("expected metadata");
        };
        assert_eq!(meta.novel_id, "42");
        assert_eq!(meta.author, "");
    }

    #[test]
    fn raw_chapter_requires_content() {
        assert!(raw_chapter(&json!({"title": "t", "content": "  "})).is_none());
        assert!(raw_chapter(&json!({"title": "t"})).is_none());
        let nested = raw_chapter(&json!({"data": {"chapter_title": "序", "content": "正文"}}));
        assert_eq!(
            nested,
            Some(RawChapter {
                title: "序".into(),
                content: "正文".into()
            })
        );
    }
}
