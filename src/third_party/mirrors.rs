//! 镜像 API 节点登记表。
//!
//! 节点集合在构造后不可变；唯一可变的状态是“当前首选节点”，
//! 每次请求都据此重新排出候选顺序。多个线程同时写首选节点时后写者胜出，
//! 它只是一个加速提示，写丢了也不影响正确性。

use std::sync::RwLock;

use tracing::info;

use crate::base_system::context::MirrorSource;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Mirror {
    base_url: String,
    supports_full_download: bool,
}

impl Mirror {
    /// 返回 `None` 表示地址为空。
    pub fn new(base_url: &str, supports_full_download: bool) -> Option<Self> {
        let base_url = normalize_base(base_url);
        if base_url.is_empty() {
            return None;
        }
        Some(Self {
            base_url,
            supports_full_download,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    pub fn supports_full_download(&self) -> bool {
        self.supports_full_download
    }
}

pub fn normalize_base(base: &str) -> String {
    base.trim().trim_end_matches('/').to_string()
}

#[derive(Debug)]
pub struct MirrorRegistry {
    mirrors: Vec<Mirror>,
    preferred: RwLock<Option<String>>,
}

impl MirrorRegistry {
    /// 空地址与重复地址会被丢弃（按规范化后的地址判重，保留第一次出现的配置）。
    pub fn new(mirrors: impl IntoIterator<Item = Mirror>) -> Self {
        let mut unique: Vec<Mirror> = Vec::new();
        for mirror in mirrors {
            if !unique.iter().any(|m| m.base_url == mirror.base_url) {
                unique.push(mirror);
            }
        }
        let initial = unique
            .iter()
            .find(|m| m.supports_full_download)
            .or_else(|| unique.first())
            .map(|m| m.base_url.clone());
        Self {
            mirrors: unique,
            preferred: RwLock::new(initial),
        }
    }

    pub fn from_sources(sources: &[MirrorSource]) -> Self {
        Self::new(
            sources
                .iter()
                .filter_map(|s| Mirror::new(&s.base_url, s.supports_full_download)),
        )
    }

    pub fn mirrors(&self) -> &[Mirror] {
        &self.mirrors
    }

    pub fn is_empty(&self) -> bool {
        self.mirrors.is_empty()
    }

    pub fn preferred(&self) -> Option<String> {
        match self.preferred.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }

    /// 首选节点在前，其后依次为其余的整本下载节点、其余普通节点（均保持配置顺序）。
    pub fn candidates(&self) -> Vec<String> {
        let preferred = self
            .preferred()
            .filter(|p| self.mirrors.iter().any(|m| &m.base_url == p));

        let mut out = Vec::with_capacity(self.mirrors.len());
        if let Some(p) = &preferred {
            out.push(p.clone());
        }
        for full in [true, false] {
            for mirror in &self.mirrors {
                if mirror.supports_full_download != full
                    || preferred.as_deref() == Some(mirror.base_url.as_str())
                {
                    continue;
                }
                out.push(mirror.base_url.clone());
            }
        }
        out
    }

    /// 记录可用节点；已经是首选时不做任何事。
    pub fn promote(&self, base_url: &str) {
        let normalized = normalize_base(base_url);
        if normalized.is_empty() {
            return;
        }
        let mut guard = match self.preferred.write() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        };
        if guard.as_deref() == Some(normalized.as_str()) {
            return;
        }
        info!("切换 API 节点: {:?} -> {}", guard.as_deref(), normalized);
        *guard = Some(normalized);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> MirrorRegistry {
        MirrorRegistry::new(
            [
                ("http://a/", true),
                ("http://b", false),
                ("http://c", true),
                ("http://a", false),
                ("  ", true),
            ]
            .into_iter()
            .filter_map(|(u, f)| Mirror::new(u, f)),
        )
    }

    #[test]
    fn normalizes_and_dedups() {
        let reg = registry();
        let urls: Vec<_> = reg.mirrors().iter().map(|m| m.base_url()).collect();
        assert_eq!(urls, vec!["http://a", "http://b", "http://c"]);
        assert_eq!(reg.preferred().as_deref(), Some("http://a"));
    }

    #[test]
    fn full_download_mirrors_come_first() {
        let reg = registry();
        assert_eq!(reg.candidates(), vec!["http://a", "http://c", "http://b"]);
    }

    #[test]
    fn preferred_leads_even_without_full_download() {
        let reg = registry();
        reg.promote("http://b/");
        assert_eq!(reg.preferred().as_deref(), Some("http://b"));
        assert_eq!(reg.candidates(), vec!["http://b", "http://a", "http://c"]);
    }

    #[test]
    fn unknown_preferred_is_ignored() {
        let reg = registry();
        reg.promote("http://elsewhere");
        assert_eq!(reg.candidates(), vec!["http://a", "http://c", "http://b"]);
    }

    #[test]
    fn first_mirror_is_initial_when_none_full() {
        let reg = MirrorRegistry::new(Mirror::new("http://x", false));
        assert_eq!(reg.preferred().as_deref(), Some("http://x"));
        assert!(MirrorRegistry::new(None).candidates().is_empty());
    }
}
