//! 从官网页面内联脚本里取出 `window.__INITIAL_STATE__` 对象。

use regex::Regex;
use serde_json::Value;
use std::sync::OnceLock;

pub const STATE_MARKER: &str = "window.__INITIAL_STATE__";

static RE_UNDEFINED: OnceLock<Regex> = OnceLock::new();

fn re_undefined() -> &'static Regex {
    RE_UNDEFINED
        .get_or_init(|| Regex::new(r"([:\[,])\s*undefined\b").expect("compile RE_UNDEFINED"))
}

/// 从 `text` 中第一个 `{` 开始做括号配对，返回完整对象的切片。
///
/// 字符串字面量（含转义）里的括号不参与计数。未闭合时返回 `None`。
pub fn balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string: Option<char> = None;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if let Some(quote) = in_string {
            if escaped {
                escaped = false;
            } else if ch == '\\' {
                escaped = true;
            } else if ch == quote {
                in_string = None;
            }
            continue;
        }
        match ch {
            '"' | '\'' => in_string = Some(ch),
            '{' => depth += 1,
            '}' => {
                depth = depth.checked_sub(1)?;
                if depth == 0 {
                    return Some(&text[start..start + offset + ch.len_utf8()]);
                }
            }
            _ => {}
        }
    }
    None
}

/// 解析页面初始状态；脚本里偶尔出现的 `undefined` 按 `null` 处理。
pub fn extract_initial_state(html: &str) -> Option<Value> {
    let idx = html.find(STATE_MARKER)?;
    let rest = &html[idx + STATE_MARKER.len()..];
    let object = balanced_object(rest)?;
    serde_json::from_str(object).ok().or_else(|| {
        let patched = re_undefined().replace_all(object, "${1}null");
        serde_json::from_str(&patched).ok()
    })
}

/// 取初始状态里的 `page` 对象。
pub fn page_info(html: &str) -> Option<serde_json::Map<String, Value>> {
    extract_initial_state(html)?
        .get("page")?
        .as_object()
        .cloned()
}
