//! 正文双接口择优。
//!
//! 上游的 `chapter` 与 `content` 两个正文接口对同一章节可能给出不同结果
//! （截断、残缺），哪个都不总是更好。这里用“正文更长”作为质量指标，
//! 并在某一侧明显更长时记住它，后续章节先走它。

use std::sync::Mutex;
use std::time::Instant;

use tracing::{debug, info};

/// 判定“明显更长”的倍数。
pub const SIGNIFICANT_MARGIN: f64 = 1.2;
/// 首选接口快速返回所需的最少字符数（不含）。
pub const MIN_USABLE_LEN: usize = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentEndpoint {
    Chapter,
    Content,
}

impl ContentEndpoint {
    pub fn label(self) -> &'static str {
        match self {
            Self::Chapter => "chapter",
            Self::Content => "content",
        }
    }
}

/// 当前记住的首选正文接口。`generation` 每次设置或清除时递增。
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EndpointPreference {
    pub preferred: Option<ContentEndpoint>,
    pub generation: u64,
    pub validated_at: Option<Instant>,
}

/// 单个接口返回的正文（尚未清洗）。
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawChapter {
    pub title: String,
    pub content: String,
}

impl RawChapter {
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

#[derive(Debug, Default)]
pub struct ContentReconciler {
    preference: Mutex<EndpointPreference>,
}

impl ContentReconciler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn preference(&self) -> EndpointPreference {
        self.lock().clone()
    }

    pub fn preferred(&self) -> Option<ContentEndpoint> {
        self.lock().preferred
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, EndpointPreference> {
        match self.preference.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    fn set(&self, endpoint: ContentEndpoint) {
        let mut pref = self.lock();
        if pref.preferred != Some(endpoint) {
            info!("记住首选正文接口: {}", endpoint.label());
        }
        pref.preferred = Some(endpoint);
        pref.generation += 1;
        pref.validated_at = Some(Instant::now());
    }

    fn clear(&self) {
        let mut pref = self.lock();
        if let Some(old) = pref.preferred.take() {
            info!("首选正文接口 {} 本章不可用，清除偏好", old.label());
            pref.generation += 1;
            pref.validated_at = None;
        }
    }

    fn touch(&self) {
        self.lock().validated_at = Some(Instant::now());
    }

    /// 按择优规则取一章正文；`fetch` 对单个接口发起请求，失败返回 `None`。
    ///
    /// 1. 有首选接口时先问它，正文超过 [`MIN_USABLE_LEN`] 直接返回，否则清除偏好；
    /// 2. 依次请求两个接口（互不影响）；
    /// 3. 两边都可用时取更长者，超出 [`SIGNIFICANT_MARGIN`] 才记住该接口；
    /// 4. 只有一边可用就返回它，偏好不变。
    pub fn reconcile<F>(&self, mut fetch: F) -> Option<(ContentEndpoint, RawChapter)>
    where
        F: FnMut(ContentEndpoint) -> Option<RawChapter>,
    {
        if let Some(preferred) = self.preferred() {
            debug!("优先使用正文接口: {}", preferred.label());
            match fetch(preferred) {
                Some(raw) if raw.char_len() > MIN_USABLE_LEN => {
                    self.touch();
                    return Some((preferred, raw));
                }
                Some(raw) => {
                    debug!("首选接口正文过短: {} 字符", raw.char_len());
                    self.clear();
                }
                None => self.clear(),
            }
        }

        let primary = fetch(ContentEndpoint::Chapter);
        let backup = fetch(ContentEndpoint::Content);

        match (primary, backup) {
            (Some(a), Some(b)) => {
                let (la, lb) = (a.char_len(), b.char_len());
                debug!("正文长度 chapter={} content={}", la, lb);
                if lb as f64 > la as f64 * SIGNIFICANT_MARGIN {
                    self.set(ContentEndpoint::Content);
                    Some((ContentEndpoint::Content, b))
                } else if la as f64 > lb as f64 * SIGNIFICANT_MARGIN {
                    self.set(ContentEndpoint::Chapter);
                    Some((ContentEndpoint::Chapter, a))
                } else if lb > la {
                    Some((ContentEndpoint::Content, b))
                } else {
                    Some((ContentEndpoint::Chapter, a))
                }
            }
            (Some(a), None) => Some((ContentEndpoint::Chapter, a)),
            (None, Some(b)) => Some((ContentEndpoint::Content, b)),
            (None, None) => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn raw(len: usize) -> Option<RawChapter> {
        Some(RawChapter {
            title: "t".into(),
            content: "字".repeat(len),
        })
    }

    #[test]
    fn close_lengths_pick_longer_without_committing() {
        let r = ContentReconciler::new();
        let (ep, got) = r
            .reconcile(|ep| match ep {
                ContentEndpoint::Chapter => raw(1000),
                ContentEndpoint::Content => raw(1100),
            })
            .unwrap();
        assert_eq!(ep, ContentEndpoint::Content);
        assert_eq!(got.char_len(), 1100);
        assert_eq!(r.preference(), EndpointPreference::default());
    }

    #[test]
    fn ties_go_to_chapter() {
        let r = ContentReconciler::new();
        let (ep, _) = r.reconcile(|_| raw(300)).unwrap();
        assert_eq!(ep, ContentEndpoint::Chapter);
        assert_eq!(r.preferred(), None);
    }

    #[test]
    fn significant_win_is_remembered_and_used_first() {
        let r = ContentReconciler::new();
        r.reconcile(|ep| match ep {
            ContentEndpoint::Chapter => raw(500),
            ContentEndpoint::Content => raw(200),
        });
        let pref = r.preference();
        assert_eq!(pref.preferred, Some(ContentEndpoint::Chapter));
        assert_eq!(pref.generation, 1);
        assert!(pref.validated_at.is_some());

        let mut calls = Vec::new();
        let (ep, _) = r
            .reconcile(|ep| {
                calls.push(ep);
                raw(101)
            })
            .unwrap();
        assert_eq!(ep, ContentEndpoint::Chapter);
        assert_eq!(calls, vec![ContentEndpoint::Chapter]);
    }

    #[test]
    fn one_side_alone_is_returned_without_preference() {
        let r = ContentReconciler::new();
        let (ep, _) = r
            .reconcile(|ep| match ep {
                ContentEndpoint::Chapter => None,
                ContentEndpoint::Content => raw(20),
            })
            .unwrap();
        assert_eq!(ep, ContentEndpoint::Content);
        assert_eq!(r.preferred(), None);
        assert!(r.reconcile(|_| None).is_none());
    }

    #[test]
    fn failed_preferred_call_clears_and_bumps_generation() {
        let r = ContentReconciler::new();
        r.set(ContentEndpoint::Content);
        let mut calls = Vec::new();
        r.reconcile(|ep| {
            calls.push(ep);
            match ep {
                ContentEndpoint::Content => None,
                ContentEndpoint::Chapter => raw(10),
            }
        });
        assert_eq!(
            calls,
            vec![
                ContentEndpoint::Content,
                ContentEndpoint::Chapter,
                ContentEndpoint::Content
            ]
        );
        let pref = r.preference();
        assert_eq!(pref.preferred, None);
        assert_eq!(pref.generation, 2);
    }
}
