//! HTTP 传输层。
//!
//! 上层（镜像故障切换、官网抓取、字体下载）只依赖 [`HttpTransport`]，
//! 默认实现基于 `reqwest::blocking`；测试里可以换成脚本化的假实现。

use std::time::Duration;

use anyhow::Result;
use reqwest::blocking::Client;
use reqwest::header::{
    ACCEPT, ACCEPT_ENCODING, ACCEPT_LANGUAGE, CACHE_CONTROL, CONNECTION, COOKIE, HeaderMap,
    HeaderName, HeaderValue, PRAGMA, REFERER, USER_AGENT,
};
use serde_json::Value;
use thiserror::Error;

use crate::base_system::context::Config;

pub const BROWSER_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";
pub const SITE_REFERER: &str = "https://fanqienovel.com/";

/// 传输层失败：连接、超时、DNS、读取响应体失败等。
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("request to {url} timed out")]
    Timeout { url: String },
    #[error("connection to {url} failed: {message}")]
    Connect { url: String, message: String },
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl TransportError {
    pub fn url(&self) -> &str {
        match self {
            Self::Timeout { url } | Self::Connect { url, .. } | Self::Request { url, .. } => url,
        }
    }

    fn from_reqwest(url: &str, err: reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            Self::Timeout { url }
        } else if err.is_connect() {
            Self::Connect {
                url,
                message: err.to_string(),
            }
        } else {
            Self::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct HttpResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<Vec<u8>>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// 响应体为空白或不是合法 JSON 时返回 `None`。
    pub fn json(&self) -> Option<Value> {
        let text = self.text();
        let trimmed = text.trim();
        if trimmed.is_empty() {
            return None;
        }
        serde_json::from_str(trimmed).ok()
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

pub trait HttpTransport: Send + Sync {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &HeaderMap,
    ) -> Result<HttpResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
}

impl ReqwestTransport {
    pub fn new(timeout: Duration, connect_timeout: Option<Duration>) -> Result<Self> {
        let mut default_headers = HeaderMap::new();
        default_headers.insert(ACCEPT_ENCODING, HeaderValue::from_static("identity"));
        default_headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let mut builder = Client::builder()
            .default_headers(default_headers)
            .timeout(timeout);
        if let Some(ct) = connect_timeout {
            builder = builder.connect_timeout(ct);
        }
        Ok(Self {
            client: builder.build()?,
        })
    }

    pub fn from_config(cfg: &Config) -> Result<Self> {
        Self::new(cfg.request_timeout(), cfg.connect_timeout())
    }
}

impl HttpTransport for ReqwestTransport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        headers: &HeaderMap,
    ) -> Result<HttpResponse, TransportError> {
        let mut req = self.client.get(url).headers(headers.clone());
        if !query.is_empty() {
            req = req.query(query);
        }
        let resp = req
            .send()
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        let status = resp.status().as_u16();
        let body = resp
            .bytes()
            .map_err(|e| TransportError::from_reqwest(url, e))?;
        Ok(HttpResponse::new(status, body.to_vec()))
    }
}

/// 镜像 API 使用的固定“浏览器”请求头。
pub fn api_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6"),
    );
    headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));
    headers.insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));
    headers.insert(PRAGMA, HeaderValue::from_static("no-cache"));
    for (name, value) in [
        (
            "sec-ch-ua",
            "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", "\"Windows\""),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
    ] {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }
    headers
}

/// 官网页面请求头；Cookie 非法（含控制字符等）时丢弃并匿名访问。
pub fn page_headers(cookie: Option<&str>) -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(
        ACCEPT,
        HeaderValue::from_static(
            "text/html,application/xhtml+xml,application/xml;q=0.9,image/webp,*/*;q=0.8",
        ),
    );
    headers.insert(
        ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8"),
    );
    headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));
    if let Some(value) = cookie.and_then(|c| HeaderValue::from_str(c).ok()) {
        headers.insert(COOKIE, value);
    }
    headers
}

/// 字体等静态资源的请求头。
pub fn asset_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_UA));
    headers.insert(REFERER, HeaderValue::from_static(SITE_REFERER));
    headers
}
