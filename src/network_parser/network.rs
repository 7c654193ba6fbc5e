//! 官网页面抓取（不走镜像 API 时使用）。
//!
//! 书籍页 `/page/<id>` 提供元数据与目录，阅读页 `/reader/<id>` 提供正文，
//! 搜索页 `/search?keyword=` 提供候选书目；
//! 正文经过自定义字体混淆，需要按书构建一次字形映射表后还原。

use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, OnceLock};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use regex::Regex;
use reqwest::header::HeaderMap;
use scraper::{Html, Selector};
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, info, warn};

use super::page_state;
use super::verification::{VerificationStatus, classify_page};
use crate::base_system::book_id::parse_book_id;
use crate::base_system::context::Config;
use crate::base_system::cookies::cookie_header_from_config;
use crate::base_system::json_extract::{JsonMap, pick_string, pick_u64};
use crate::download::models::{BookMetadata, ChapterContent, ChapterRef};
use crate::font::{FontMappingBuilder, GlyphMap, TextDecoder};
use crate::third_party::envelope::{ChapterListShape, default_title};
use crate::third_party::transport::{HttpTransport, TransportError, page_headers};

/// 正文去空白后少于该字符数视为无效。
pub const MIN_CHAPTER_CHARS: usize = 50;

static RE_CHAPTER_LINK: OnceLock<Regex> = OnceLock::new();

fn re_chapter_link() -> &'static Regex {
    RE_CHAPTER_LINK.get_or_init(|| {
        Regex::new(r#"<a href="/reader/(\d+)" class="chapter-item-title""#)
            .expect("compile RE_CHAPTER_LINK")
    })
}

#[derive(Debug, Error)]
pub enum WebError {
    #[error("cannot parse novel id from {0:?}")]
    InvalidId(String),
    #[error("HTTP {status} from {url}, login or cookie required")]
    Authorization { url: String, status: u16 },
    #[error("request intercepted at {url}, human verification may be required")]
    VerificationRequired { url: String },
    #[error("page from {url} is too short ({length} bytes)")]
    ShortPage { url: String, length: usize },
    #[error("page structure not recognized: {url}")]
    StructureUnrecognized { url: String },
    #[error("chapter {chapter_id} content too short ({length} chars)")]
    ContentTooShort { chapter_id: String, length: usize },
    #[error("HTTP {status} from {url}")]
    Http { url: String, status: u16 },
    #[error(transparent)]
    Transport(#[from] TransportError),
}

impl WebError {
    /// 需要换策略（登录、换模式）而不是重试的错误。
    pub fn is_authorization(&self) -> bool {
        matches!(
            self,
            Self::Authorization { .. } | Self::VerificationRequired { .. }
        )
    }
}

#[derive(Debug, Clone)]
pub struct WebOptions {
    pub base_url: String,
    pub max_retries: u32,
    /// 每次成功请求后的随机等待区间。
    pub min_wait: Duration,
    pub max_wait: Duration,
    /// 重试退避的基准时长，第 n 次重试等待 `base * 2^(n-1)` 再加抖动。
    pub retry_backoff: Duration,
    pub cookie: Option<String>,
    /// 设置后，无法识别的书籍页、阅读页和搜索页会被保存到该目录。
    pub debug_dir: Option<PathBuf>,
}

impl Default for WebOptions {
    fn default() -> Self {
        Self {
            base_url: "https://fanqienovel.com".to_string(),
            max_retries: 3,
            min_wait: Duration::from_millis(500),
            max_wait: Duration::from_millis(1500),
            retry_backoff: Duration::from_secs(1),
            cookie: None,
            debug_dir: None,
        }
    }
}

impl WebOptions {
    pub fn from_config(cfg: &Config) -> Self {
        let cookie = match cookie_header_from_config(cfg) {
            Ok(c) => c,
            Err(err) => {
                warn!("读取 Cookie 失败，将以匿名身份访问: {}", err);
                None
            }
        };
        if cookie.is_none() {
            info!("未配置 Cookie，部分章节可能无法获取");
        }
        Self {
            base_url: cfg.web_base(),
            max_retries: cfg.web_max_retries,
            min_wait: Duration::from_millis(cfg.min_wait_time),
            max_wait: Duration::from_millis(cfg.max_wait_time),
            cookie,
            debug_dir: cfg.dump_debug_pages.then(|| cfg.debug_pages_dir()),
            ..Self::default()
        }
    }
}

struct Selectors {
    book_title: Selector,
    author: Selector,
    abstract_text: Selector,
    page_title: Selector,
    reader_title: Selector,
    paragraph: Selector,
    search_item: Selector,
    search_title: Selector,
    search_author: Selector,
    search_link: Selector,
}

impl Selectors {
    fn new() -> Self {
        Self {
            book_title: Selector::parse("h1").expect("valid selector"),
            author: Selector::parse("span.author-name-text").expect("valid selector"),
            abstract_text: Selector::parse("div.abstract").expect("valid selector"),
            page_title: Selector::parse("title").expect("valid selector"),
            reader_title: Selector::parse(".muye-reader-title").expect("valid selector"),
            paragraph: Selector::parse(".muye-reader-content p").expect("valid selector"),
            search_item: Selector::parse("div.book-item").expect("valid selector"),
            search_title: Selector::parse("h3, a.book-title").expect("valid selector"),
            search_author: Selector::parse("span.author, a.author-name").expect("valid selector"),
            search_link: Selector::parse("a[href*='/page/']").expect("valid selector"),
        }
    }
}

type GlyphCell = Arc<OnceLock<Arc<GlyphMap>>>;

pub struct WebFallbackClient {
    transport: Arc<dyn HttpTransport>,
    fonts: FontMappingBuilder,
    options: WebOptions,
    headers: HeaderMap,
    selectors: Selectors,
    glyphs: Mutex<HashMap<String, GlyphCell>>,
}

impl WebFallbackClient {
    pub fn new(
        transport: Arc<dyn HttpTransport>,
        fonts: FontMappingBuilder,
        options: WebOptions,
    ) -> Self {
        let headers = page_headers(options.cookie.as_deref());
        Self {
            transport,
            fonts,
            options,
            headers,
            selectors: Selectors::new(),
            glyphs: Mutex::new(HashMap::new()),
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        let fonts = FontMappingBuilder::new(cfg.font_cache_path(), transport.clone());
        Self::new(transport, fonts, WebOptions::from_config(cfg))
    }

    pub fn get_novel_info(&self, url_or_id: &str) -> Result<BookMetadata, WebError> {
        let novel_id =
            parse_book_id(url_or_id).ok_or_else(|| WebError::InvalidId(url_or_id.to_string()))?;
        info!("正在获取小说信息（官网）: {}", novel_id);

        let url = format!("{}/page/{}", self.options.base_url, novel_id);
        let html = self.fetch_page(&url, &[])?;
        let meta = self.parse_book_page(&html, &novel_id);
        if meta.title.is_empty() {
            error!("获取小说信息失败: 无法解析页面 {}", url);
            return Err(self.unrecognized_page(
                &url,
                &format!("书籍 {novel_id}"),
                &format!("debug_page_{novel_id}.html"),
                &html,
            ));
        }
        Ok(meta)
    }

    /// 页面能解析但没有章节时返回空列表；拦截页和过短的错误页返回错误。
    pub fn get_chapter_list(&self, novel_id: &str) -> Result<Vec<ChapterRef>, WebError> {
        info!("正在获取章节列表（官网）: {}", novel_id);
        let url = format!("{}/page/{}", self.options.base_url, novel_id);
        let html = self.fetch_page(&url, &[])?;
        let chapters = parse_chapter_list(&html);
        if !chapters.is_empty() {
            info!("获取到 {} 个章节", chapters.len());
            return Ok(chapters);
        }
        warn!("获取章节列表失败: 未找到章节");
        match self.unrecognized_page(
            &url,
            &format!("书籍 {novel_id}"),
            &format!("debug_page_{novel_id}.html"),
            &html,
        ) {
            WebError::StructureUnrecognized { .. } => Ok(chapters),
            err => Err(err),
        }
    }

    /// 官网搜索：优先页面初始状态里的 `search.bookList`，没有时解析结果列表标记。
    pub fn search(&self, keyword: &str) -> Result<Vec<BookMetadata>, WebError> {
        let keyword = keyword.trim();
        if keyword.is_empty() {
            return Ok(Vec::new());
        }
        info!("正在搜索（官网）: {}", keyword);
        let url = format!("{}/search", self.options.base_url);
        let query = [("keyword".to_string(), keyword.to_string())];
        let html = self.fetch_page(&url, &query)?;

        let state = page_state::extract_initial_state(&html);
        let listed = state
            .as_ref()
            .and_then(|s| s.get("search")?.get("bookList")?.as_array())
            .map(|list| {
                list.iter()
                    .filter_map(Value::as_object)
                    .filter_map(search_entry)
                    .collect::<Vec<_>>()
            });
        let books = match listed {
            Some(books) if !books.is_empty() => books,
            _ => self.parse_search_markup(&html),
        };
        if !books.is_empty() {
            info!("搜索到 {} 本小说", books.len());
            return Ok(books);
        }

        // 搜索页本身认得出来，只是没有结果
        let recognized = state.as_ref().is_some_and(|s| s.get("search").is_some());
        if !recognized {
            let title = self.page_title(&html);
            if classify_page(&html, &title) == VerificationStatus::Confirmed {
                self.dump_debug_page("搜索页", "debug_search.html", &html);
                warn!("搜索 {} 被拦截（可能需要人机验证或Cookie失效），页面标题: {}", keyword, title);
                return Err(WebError::VerificationRequired { url });
            }
        }
        info!("未找到与 {} 相关的小说", keyword);
        Ok(books)
    }

    pub fn get_chapter_content(
        &self,
        novel_id: &str,
        chapter_id: &str,
    ) -> Result<ChapterContent, WebError> {
        let url = format!("{}/reader/{}", self.options.base_url, chapter_id);
        let html = self.fetch_page(&url, &[])?;

        let (title, paragraphs) = {
            let doc = Html::parse_document(&html);
            let title = doc
                .select(&self.selectors.reader_title)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .filter(|t| !t.is_empty());
            let Some(title) = title else {
                return Err(self.unrecognized_page(
                    &url,
                    &format!("章节 {chapter_id}"),
                    &format!("debug_chapter_{chapter_id}.html"),
                    &html,
                ));
            };
            let paragraphs: Vec<String> = doc
                .select(&self.selectors.paragraph)
                .map(|p| p.text().collect::<String>())
                .collect();
            (title, paragraphs)
        };

        let content = paragraphs.join("\n\n");
        let length = content.trim().chars().count();
        if length < MIN_CHAPTER_CHARS {
            warn!("章节 {} 内容为空或过短", chapter_id);
            return Err(WebError::ContentTooShort {
                chapter_id: chapter_id.to_string(),
                length,
            });
        }

        let glyphs = self.glyph_map_for(novel_id, &html);
        Ok(ChapterContent {
            title,
            content: TextDecoder::decode(&content, &glyphs),
        })
    }

    /// 同一本书只构建一次映射表；并发请求会等待首个构建完成。
    fn glyph_map_for(&self, novel_id: &str, html: &str) -> Arc<GlyphMap> {
        let cell = {
            let mut guard = match self.glyphs.lock() {
                Ok(g) => g,
                Err(poisoned) => poisoned.into_inner(),
            };
            guard.entry(novel_id.to_string()).or_default().clone()
        };
        cell.get_or_init(|| match self.fonts.from_html(html) {
            Ok(map) => map,
            Err(err) => {
                warn!("字体映射生成失败，改用内置表: {:#}", err);
                Arc::new(GlyphMap::bundled())
            }
        })
        .clone()
    }

    /// 页面结构不认识时先保存调试页，再判断是拦截页、错误页还是改版。
    fn unrecognized_page(&self, url: &str, what: &str, dump_name: &str, html: &str) -> WebError {
        self.dump_debug_page(what, dump_name, html);
        let page_title = self.page_title(html);
        match classify_page(html, &page_title) {
            VerificationStatus::Confirmed => {
                warn!(
                    "{} 检测到拦截页面（可能需要人机验证或Cookie失效），页面标题: {}",
                    what, page_title
                );
                WebError::VerificationRequired {
                    url: url.to_string(),
                }
            }
            VerificationStatus::SuspectedShortPage => {
                warn!("{} 返回页面内容过短: {} 字节", what, html.len());
                WebError::ShortPage {
                    url: url.to_string(),
                    length: html.len(),
                }
            }
            VerificationStatus::Normal => {
                warn!("{} 页面结构可能已改变，页面标题: {}", what, page_title);
                WebError::StructureUnrecognized {
                    url: url.to_string(),
                }
            }
        }
    }

    fn page_title(&self, html: &str) -> String {
        Html::parse_document(html)
            .select(&self.selectors.page_title)
            .next()
            .map(|el| el.text().collect::<String>())
            .unwrap_or_default()
    }

    fn dump_debug_page(&self, what: &str, file_name: &str, html: &str) {
        let Some(dir) = &self.options.debug_dir else {
            return;
        };
        let path = dir.join(file_name);
        let written = fs::create_dir_all(dir).and_then(|_| fs::write(&path, html));
        match written {
            Ok(()) => info!("{} 调试页面已保存到: {}", what, path.display()),
            Err(err) => debug!("保存调试页面失败(忽略): {}", err),
        }
    }

    fn parse_search_markup(&self, html: &str) -> Vec<BookMetadata> {
        let doc = Html::parse_document(html);
        let text_in = |item: &scraper::ElementRef, sel: &Selector| {
            item.select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        };
        doc.select(&self.selectors.search_item)
            .filter_map(|item| {
                let title = text_in(&item, &self.selectors.search_title);
                let novel_id = item
                    .select(&self.selectors.search_link)
                    .next()
                    .and_then(|a| a.value().attr("href"))
                    .and_then(|href| href.rsplit('/').next())
                    .unwrap_or_default()
                    .to_string();
                if title.is_empty() || novel_id.is_empty() {
                    return None;
                }
                Some(BookMetadata {
                    novel_id,
                    title,
                    author: text_in(&item, &self.selectors.search_author),
                    ..BookMetadata::default()
                })
            })
            .collect()
    }

    fn parse_book_page(&self, html: &str, novel_id: &str) -> BookMetadata {
        let mut meta = BookMetadata {
            novel_id: novel_id.to_string(),
            ..BookMetadata::default()
        };
        if let Some(page) = page_state::page_info(html) {
            meta.title = pick_string(&page, &["bookName"]).unwrap_or_default();
            meta.author = pick_string(&page, &["authorName"]).unwrap_or_default();
            meta.description = pick_string(&page, &["abstract"]).unwrap_or_default();
            meta.cover_url = pick_string(&page, &["thumbUri", "thumbUrl"]).unwrap_or_default();
            meta.word_count = pick_u64(&page, &["wordNumber"]).unwrap_or(0);
            meta.chapter_count = pick_u64(&page, &["chapterTotal"]).unwrap_or(0);
        }

        let doc = Html::parse_document(html);
        let text_of = |sel: &Selector| {
            doc.select(sel)
                .next()
                .map(|el| el.text().collect::<String>().trim().to_string())
                .unwrap_or_default()
        };
        if meta.title.is_empty() {
            meta.title = text_of(&self.selectors.book_title);
        }
        if meta.author.is_empty() {
            meta.author = text_of(&self.selectors.author);
        }
        if meta.description.is_empty() {
            meta.description = text_of(&self.selectors.abstract_text);
        }
        meta
    }

    /// GET 页面文本：传输失败与 5xx/429 按退避重试，401/403 立即返回。
    fn fetch_page(&self, url: &str, query: &[(String, String)]) -> Result<String, WebError> {
        let retries = self.options.max_retries.max(1);
        let mut last_err: Option<WebError> = None;

        for attempt in 1..=retries {
            if attempt > 1 {
                debug!("重试第 {} 次: {}", attempt, url);
            }
            match self.transport.get(url, query, &self.headers) {
                Ok(resp) if resp.is_auth_failure() => {
                    error!("访问 {} 被拒绝 (HTTP {})，可能需要登录", url, resp.status);
                    return Err(WebError::Authorization {
                        url: url.to_string(),
                        status: resp.status,
                    });
                }
                Ok(resp) if resp.is_success() => {
                    self.polite_delay();
                    return Ok(resp.text());
                }
                Ok(resp) if resp.status >= 500 || resp.status == 429 => {
                    warn!("请求失败 (尝试 {}/{}): HTTP {}", attempt, retries, resp.status);
                    last_err = Some(WebError::Http {
                        url: url.to_string(),
                        status: resp.status,
                    });
                }
                Ok(resp) => {
                    return Err(WebError::Http {
                        url: url.to_string(),
                        status: resp.status,
                    });
                }
                Err(err) => {
                    warn!("请求失败 (尝试 {}/{}): {}", attempt, retries, err);
                    last_err = Some(WebError::Transport(err));
                }
            }
            if attempt < retries {
                self.sleep_backoff(attempt);
            }
        }

        Err(last_err.unwrap_or_else(|| WebError::StructureUnrecognized {
            url: url.to_string(),
        }))
    }

    fn sleep_backoff(&self, attempt: u32) {
        let base = self.options.retry_backoff.as_secs_f64();
        if base <= 0.0 {
            return;
        }
        let exp = base * f64::from(2u32.saturating_pow(attempt - 1));
        let delay = exp + base * (0.5 + jitter_unit());
        debug!("等待 {:.1} 秒后重试", delay);
        std::thread::sleep(Duration::from_secs_f64(delay));
    }

    fn polite_delay(&self) {
        let min = self.options.min_wait.as_secs_f64();
        let max = self.options.max_wait.as_secs_f64().max(min);
        let delay = min + (max - min) * jitter_unit();
        if delay > 0.0 {
            std::thread::sleep(Duration::from_secs_f64(delay));
        }
    }
}

/// 搜索结果条目；缺书名或书籍 ID 的条目丢弃。
fn search_entry(book: &JsonMap) -> Option<BookMetadata> {
    let novel_id = pick_string(book, &["bookId"])?;
    let title = pick_string(book, &["bookName"])?;
    Some(BookMetadata {
        novel_id,
        title,
        author: pick_string(book, &["authorName"]).unwrap_or_default(),
        description: pick_string(book, &["abstract"]).unwrap_or_default(),
        cover_url: pick_string(book, &["cover", "thumbUri", "thumbUrl"]).unwrap_or_default(),
        word_count: pick_u64(book, &["wordCount", "wordNumber"]).unwrap_or(0),
        chapter_count: 0,
    })
}

/// 书籍页目录：优先页面初始状态里的分卷目录，否则按阅读链接提取。
pub fn parse_chapter_list(html: &str) -> Vec<ChapterRef> {
    let from_state = page_state::page_info(html)
        .and_then(|page| {
            let volumes = page.get("chapterListWithVolume")?.clone();
            let wrapper: Value = serde_json::json!({ "chapterListWithVolume": volumes });
            ChapterListShape::parse(&wrapper)
        })
        .map(ChapterListShape::flatten)
        .unwrap_or_default();
    if !from_state.is_empty() {
        return from_state;
    }

    // 第一个匹配是页面顶部的“最新章节”入口
    re_chapter_link()
        .captures_iter(html)
        .skip(1)
        .filter_map(|caps| caps.get(1))
        .enumerate()
        .map(|(i, m)| ChapterRef::new(m.as_str(), default_title(i + 1), i + 1))
        .collect()
}

/// [0,1) 之间的轻量抖动（用时间戳，避免引入 rand 依赖）。
fn jitter_unit() -> f64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    (nanos % 10_000) as f64 / 10_000.0
}
