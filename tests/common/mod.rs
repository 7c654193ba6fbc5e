#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

use reqwest::header::HeaderMap;
use serde_json::Value;

use tomato_novel_fetch::third_party::failover::FailoverClient;
use tomato_novel_fetch::third_party::mirrors::{Mirror, MirrorRegistry};
use tomato_novel_fetch::third_party::transport::{HttpResponse, HttpTransport, TransportError};

#[derive(Debug, Clone)]
pub enum Reply {
    Status(u16, String),
    Timeout,
}

impl Reply {
    pub fn json(value: Value) -> Self {
        Self::Status(200, value.to_string())
    }

    pub fn html(body: impl Into<String>) -> Self {
        Self::Status(200, body.into())
    }

    fn resolve(&self, url: &str) -> Result<HttpResponse, TransportError> {
        match self {
            Self::Status(status, body) => Ok(HttpResponse::new(*status, body.clone().into_bytes())),
            Self::Timeout => Err(TransportError::Timeout {
                url: url.to_string(),
            }),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Call {
    pub url: String,
    pub query: Vec<(String, String)>,
}

impl Call {
    pub fn param(&self, key: &str) -> Option<&str> {
        self.query
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
    }
}

struct Route {
    url: String,
    param: Option<(String, String)>,
    replies: VecDeque<Reply>,
    last: Reply,
}

/// 按 URL（可附加一个查询参数条件）返回预设响应，并记录所有请求。
/// 同一路由的多个响应依次消费，用完后重复最后一个。
#[derive(Default)]
pub struct ScriptedTransport {
    routes: Mutex<Vec<Route>>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn on(&self, url: &str, reply: Reply) {
        self.on_seq(url, vec![reply]);
    }

    pub fn on_seq(&self, url: &str, replies: Vec<Reply>) {
        self.push(url, None, replies);
    }

    /// 仅当查询参数 `key=value` 存在时命中。
    pub fn on_param(&self, url: &str, key: &str, value: &str, reply: Reply) {
        self.push(url, Some((key.to_string(), value.to_string())), vec![reply]);
    }

    fn push(&self, url: &str, param: Option<(String, String)>, replies: Vec<Reply>) {
        let mut replies: VecDeque<Reply> = replies.into();
        let last = replies.back().cloned().expect("at least one reply");
        if replies.len() == 1 {
            replies.clear();
        }
        self.routes.lock().unwrap().push(Route {
            url: url.to_string(),
            param,
            replies,
            last,
        });
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn urls(&self) -> Vec<String> {
        self.calls().into_iter().map(|c| c.url).collect()
    }

    pub fn count(&self, url: &str) -> usize {
        self.calls().iter().filter(|c| c.url == url).count()
    }

    pub fn reset_calls(&self) {
        self.calls.lock().unwrap().clear();
    }
}

impl HttpTransport for ScriptedTransport {
    fn get(
        &self,
        url: &str,
        query: &[(String, String)],
        _headers: &HeaderMap,
    ) -> Result<HttpResponse, TransportError> {
        self.calls.lock().unwrap().push(Call {
            url: url.to_string(),
            query: query.to_vec(),
        });

        let mut routes = self.routes.lock().unwrap();
        // 带参数条件的路由优先
        let pos = routes
            .iter()
            .position(|r| {
                r.url == url
                    && r.param
                        .as_ref()
                        .is_some_and(|(k, v)| query.iter().any(|(qk, qv)| qk == k && qv == v))
            })
            .or_else(|| routes.iter().position(|r| r.url == url && r.param.is_none()));

        match pos {
            Some(i) => {
                let route = &mut routes[i];
                let reply = route.replies.pop_front().unwrap_or_else(|| route.last.clone());
                reply.resolve(url)
            }
            None => Err(TransportError::Connect {
                url: url.to_string(),
                message: "no scripted route".to_string(),
            }),
        }
    }
}

pub fn registry(bases: &[&str]) -> Arc<MirrorRegistry> {
    Arc::new(MirrorRegistry::new(
        bases.iter().filter_map(|b| Mirror::new(b, true)),
    ))
}

pub fn failover(bases: &[&str], transport: Arc<ScriptedTransport>) -> FailoverClient {
    FailoverClient::new(registry(bases), transport)
}

/// `{code:200, data:{title, content}}` 形式的正文响应。
pub fn chapter_body(title: &str, len: usize) -> Reply {
    Reply::json(serde_json::json!({
        "code": 200,
        "data": {"title": title, "content": "字".repeat(len)}
    }))
}
