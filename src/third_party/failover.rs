//! 镜像故障切换请求。
//!
//! 一次逻辑请求按 [`MirrorRegistry::candidates`] 的顺序逐个尝试节点：
//! - 连接失败 / 超时 / 5xx / 200 但响应体为空或不是 JSON：换下一个节点；
//! - 其余非 200 状态（4xx、3xx、204 等）：视为该节点的明确答复，原样返回，不切换；
//! - 200 且为合法 JSON：记为首选节点并返回。

use std::sync::Arc;

use reqwest::header::HeaderMap;
use serde_json::Value;
use thiserror::Error;
use tracing::{debug, error, warn};

use super::mirrors::MirrorRegistry;
use super::transport::{HttpResponse, HttpTransport, TransportError, api_headers};
use crate::base_system::context::Config;

#[derive(Debug, Error)]
pub enum FailoverError {
    #[error("no API mirror configured")]
    NoMirrors,
    #[error("all {attempted} mirrors failed, last transport error: {source}")]
    Exhausted {
        attempted: usize,
        #[source]
        source: TransportError,
    },
    #[error("no mirror returned valid data ({attempted} tried)")]
    NoValidData { attempted: usize },
}

/// 某个节点给出的最终响应（200+JSON，或 500 以下的其他状态）。
#[derive(Debug, Clone)]
pub struct MirrorResponse {
    pub base_url: String,
    pub status: u16,
    pub body: String,
    pub json: Option<Value>,
}

impl MirrorResponse {
    pub fn is_ok(&self) -> bool {
        self.status == 200 && self.json.is_some()
    }

    pub fn is_auth_failure(&self) -> bool {
        matches!(self.status, 401 | 403)
    }
}

/// 单个节点响应的分类结果。
#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Verdict {
    Accept(Value),
    Reject(Option<Value>),
    Skip(&'static str),
}

pub(crate) fn classify(resp: &HttpResponse) -> Verdict {
    match resp.status {
        200 => match resp.json() {
            Some(v) => Verdict::Accept(v),
            None if resp.text().trim().is_empty() => Verdict::Skip("empty body"),
            None => Verdict::Skip("non-JSON body"),
        },
        s if s >= 500 => Verdict::Skip("server error"),
        _ => Verdict::Reject(resp.json()),
    }
}

pub struct FailoverClient {
    registry: Arc<MirrorRegistry>,
    transport: Arc<dyn HttpTransport>,
    headers: HeaderMap,
    max_attempts: usize,
}

impl FailoverClient {
    pub fn new(registry: Arc<MirrorRegistry>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            registry,
            transport,
            headers: api_headers(),
            max_attempts: 0,
        }
    }

    pub fn from_config(cfg: &Config, transport: Arc<dyn HttpTransport>) -> Self {
        let registry = Arc::new(MirrorRegistry::from_sources(&cfg.api_sources));
        Self::new(registry, transport).with_max_attempts(cfg.max_mirror_attempts)
    }

    /// 每次请求最多尝试的节点数，0 表示不限制。
    pub fn with_max_attempts(mut self, max_attempts: usize) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    pub fn registry(&self) -> &Arc<MirrorRegistry> {
        &self.registry
    }

    pub fn request(
        &self,
        endpoint: &str,
        params: &[(String, String)],
    ) -> Result<MirrorResponse, FailoverError> {
        let mut candidates = self.registry.candidates();
        if candidates.is_empty() {
            return Err(FailoverError::NoMirrors);
        }
        if self.max_attempts > 0 {
            candidates.truncate(self.max_attempts);
        }

        let total = candidates.len();
        let mut last_transport: Option<TransportError> = None;

        for (index, base) in candidates.iter().enumerate() {
            let url = format!("{base}{endpoint}");
            debug!("尝试 API 节点 {}/{}: {}", index + 1, total, base);

            let resp = match self.transport.get(&url, params, &self.headers) {
                Ok(r) => r,
                Err(err) => {
                    warn!("节点 {} 请求失败: {}", base, err);
                    last_transport = Some(err);
                    continue;
                }
            };

            match classify(&resp) {
                Verdict::Accept(json) => {
                    self.registry.promote(base);
                    return Ok(MirrorResponse {
                        base_url: base.clone(),
                        status: resp.status,
                        body: resp.text(),
                        json: Some(json),
                    });
                }
                Verdict::Reject(json) => {
                    debug!("节点 {} 返回 HTTP {}，不再切换", base, resp.status);
                    return Ok(MirrorResponse {
                        base_url: base.clone(),
                        status: resp.status,
                        body: resp.text(),
                        json,
                    });
                }
                Verdict::Skip(reason) => {
                    warn!(
                        "节点 {} 不可用（HTTP {}，{}），尝试下一个节点",
                        base, resp.status, reason
                    );
                }
            }
        }

        error!("全部 {} 个 API 节点均失败: {}", total, endpoint);
        match last_transport {
            Some(source) => Err(FailoverError::Exhausted {
                attempted: total,
                source,
            }),
            None => Err(FailoverError::NoValidData { attempted: total }),
        }
    }
}
