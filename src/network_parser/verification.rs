//! 阅读页异常判定：人机验证 / 拦截页、过短的错误页、结构变化。
//!
//! 只是关键字启发式，误判在所难免，因此给出三态结果而不是布尔值。

/// 低于该字节数的页面视为可疑的错误页。
pub const SHORT_PAGE_BYTES: usize = 1000;

const INTERCEPT_KEYWORDS: &[&str] = &[
    "验证",
    "安全",
    "人机",
    "captcha",
    "verify",
    "security",
    "robot",
    "拦截",
    "禁止访问",
    "访问被拒绝",
    "access denied",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerificationStatus {
    /// 命中拦截关键字，需要人机验证或 Cookie 已失效。
    Confirmed,
    /// 没有关键字但页面过短，多半是请求失败。
    SuspectedShortPage,
    /// 看起来是正常页面，只是结构无法识别。
    Normal,
}

pub fn classify_page(html: &str, page_title: &str) -> VerificationStatus {
    let text = html.to_lowercase();
    let title = page_title.to_lowercase();
    if INTERCEPT_KEYWORDS
        .iter()
        .any(|kw| text.contains(kw) || title.contains(kw))
    {
        return VerificationStatus::Confirmed;
    }
    if html.len() < SHORT_PAGE_BYTES {
        return VerificationStatus::SuspectedShortPage;
    }
    VerificationStatus::Normal
}
