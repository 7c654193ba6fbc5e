//! 官网 Cookie 读取。
//!
//! 支持三种来源格式：
//! - 原始请求头：`a=b; c=d`
//! - 每行一个 `name=value`（`#` 开头为注释）
//! - JSON 对象：`{"a": "b"}`
//!
//! 没有 Cookie 只意味着部分章节不可读，不视为错误。

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::Value;
use thiserror::Error;
use tracing::{debug, warn};

use super::context::Config;

#[derive(Debug, Error)]
pub enum CookieError {
    #[error("failed to read cookie file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid cookie JSON in {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
}

/// 按配置解析出 `Cookie` 请求头；`cookie_file` 优先于 `cookie`。
pub fn cookie_header_from_config(cfg: &Config) -> Result<Option<String>, CookieError> {
    let file = cfg.cookie_file.trim();
    if !file.is_empty() {
        let path = Path::new(file);
        if path.exists() {
            return load_cookie_file(path);
        }
        warn!("Cookie 文件不存在，忽略: {}", path.display());
    }
    Ok(normalize_cookie_text(&cfg.cookie))
}

pub fn load_cookie_file(path: &Path) -> Result<Option<String>, CookieError> {
    let raw = fs::read_to_string(path).map_err(|source| CookieError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let trimmed = raw.trim();
    if trimmed.starts_with('{') {
        let value: Value = serde_json::from_str(trimmed).map_err(|source| CookieError::Json {
            path: path.to_path_buf(),
            source,
        })?;
        let header = cookie_header_from_json(&value);
        debug!("从 JSON 读取 Cookie: {} 项", header.as_ref().map(|h| h.split(';').count()).unwrap_or(0));
        return Ok(header);
    }
    Ok(normalize_cookie_text(trimmed))
}

fn cookie_header_from_json(value: &Value) -> Option<String> {
    let map = value.as_object()?;
    let pairs: Vec<String> = map
        .iter()
        .filter_map(|(k, v)| {
            let val = match v {
                Value::String(s) => s.trim().to_string(),
                Value::Number(n) => n.to_string(),
                Value::Bool(b) => b.to_string(),
                _ => return None,
            };
            let key = k.trim();
            if key.is_empty() || val.is_empty() {
                None
            } else {
                Some(format!("{key}={val}"))
            }
        })
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

/// 把多行或分号分隔的 `name=value` 统一为 `a=b; c=d`。
pub fn normalize_cookie_text(raw: &str) -> Option<String> {
    let pairs: Vec<String> = raw
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .flat_map(|line| line.split(';'))
        .map(str::trim)
        .filter_map(|pair| {
            let (name, value) = pair.split_once('=')?;
            let name = name.trim();
            if name.is_empty() {
                return None;
            }
            Some(format!("{}={}", name, value.trim()))
        })
        .collect();
    if pairs.is_empty() {
        None
    } else {
        Some(pairs.join("; "))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn normalizes_header_and_line_formats() {
        assert_eq!(
            normalize_cookie_text(" sessionid=abc ;  ttwid=1|x ").as_deref(),
            Some("sessionid=abc; ttwid=1|x")
        );
        assert_eq!(
            normalize_cookie_text("# exported\nsessionid=abc\n\nodin_tt=q\n").as_deref(),
            Some("sessionid=abc; odin_tt=q")
        );
        assert_eq!(normalize_cookie_text("   "), None);
        assert_eq!(normalize_cookie_text("garbage"), None);
    }

    #[test]
    fn reads_json_cookie_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("cookies.json");
        fs::write(&path, r#"{"sessionid": "abc", "uid": 7, "empty": ""}"#).unwrap();
        let header = load_cookie_file(&path).unwrap().unwrap();
        assert!(header.contains("sessionid=abc"));
        assert!(header.contains("uid=7"));
        assert!(!header.contains("empty"));
    }

    #[test]
    fn missing_file_falls_back_to_inline_cookie() {
        let cfg = Config {
            cookie: "a=1".to_string(),
            cookie_file: "/definitely/not/here.txt".to_string(),
            ..Config::default()
        };
        assert_eq!(cookie_header_from_config(&cfg).unwrap().as_deref(), Some("a=1"));
    }
}
