//! 全局配置结构（Config）与默认值。
//!
//! 该模块同时提供生成 `config.yml` 的字段元信息。配置对象在启动时构造一次，
//! 之后以引用的形式传入各个客户端构造函数，不存在模块级全局状态。

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::config::{ConfigError, ConfigSpec, FieldMeta};

/// 单个镜像 API 源。
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MirrorSource {
    pub base_url: String,
    #[serde(default = "default_true")]
    pub supports_full_download: bool,
}

impl MirrorSource {
    fn new(base_url: &str, supports_full_download: bool) -> Self {
        Self {
            base_url: base_url.to_string(),
            supports_full_download,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    // API 配置
    #[serde(default = "default_true")]
    pub use_api: bool,
    #[serde(default = "default_api_sources")]
    pub api_sources: Vec<MirrorSource>,
    #[serde(default)]
    pub max_mirror_attempts: usize,

    // 网络配置
    #[serde(default = "default_max_workers")]
    pub max_workers: usize,
    #[serde(default = "default_request_timeout")]
    pub request_timeout: u64,
    #[serde(default = "default_min_connect_timeout")]
    pub min_connect_timeout: f64,
    #[serde(default = "default_web_base_url")]
    pub web_base_url: String,
    #[serde(default = "default_web_max_retries")]
    pub web_max_retries: u32,
    #[serde(default = "default_max_wait_time")]
    pub max_wait_time: u64,
    #[serde(default = "default_min_wait_time")]
    pub min_wait_time: u64,

    // Cookie 配置
    #[serde(default)]
    pub cookie: String,
    #[serde(default)]
    pub cookie_file: String,

    // 字体 / 调试
    #[serde(default = "default_font_cache_dir")]
    pub font_cache_dir: String,
    #[serde(default)]
    pub dump_debug_pages: bool,

    // 路径配置
    #[serde(default)]
    pub save_path: String,

    /// 数据目录（`--data-dir`），不写入配置文件；相对路径以它为基准。
    #[serde(skip)]
    pub data_dir: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            use_api: default_true(),
            api_sources: default_api_sources(),
            max_mirror_attempts: 0,
            max_workers: default_max_workers(),
            request_timeout: default_request_timeout(),
            min_connect_timeout: default_min_connect_timeout(),
            web_base_url: default_web_base_url(),
            web_max_retries: default_web_max_retries(),
            max_wait_time: default_max_wait_time(),
            min_wait_time: default_min_wait_time(),
            cookie: String::new(),
            cookie_file: String::new(),
            font_cache_dir: default_font_cache_dir(),
            dump_debug_pages: false,
            save_path: String::new(),
            data_dir: None,
        }
    }
}

impl ConfigSpec for Config {
    const FILE_NAME: &'static str = "config.yml";

    fn fields() -> &'static [FieldMeta] {
        static FIELDS: [FieldMeta; 15] = [
            FieldMeta {
                name: "use_api",
                description: "是否使用第三方 API 模式（false 时直接抓取官网阅读页并解密字体）",
            },
            FieldMeta {
                name: "api_sources",
                description: "API 镜像列表（supports_full_download 为 true 的节点优先）",
            },
            FieldMeta {
                name: "max_mirror_attempts",
                description: "单次请求最多尝试的镜像数（0 表示不限制）",
            },
            FieldMeta {
                name: "max_workers",
                description: "最大并发线程数",
            },
            FieldMeta {
                name: "request_timeout",
                description: "请求超时时间（秒）",
            },
            FieldMeta {
                name: "min_connect_timeout",
                description: "最小连接超时时间（秒，0 表示不单独限制）",
            },
            FieldMeta {
                name: "web_base_url",
                description: "官网地址（官网模式使用）",
            },
            FieldMeta {
                name: "web_max_retries",
                description: "官网模式单个请求的最大重试次数",
            },
            FieldMeta {
                name: "max_wait_time",
                description: "官网模式请求间隔上限, 单位ms",
            },
            FieldMeta {
                name: "min_wait_time",
                description: "官网模式请求间隔下限, 单位ms",
            },
            FieldMeta {
                name: "cookie",
                description: "官网 Cookie（形如 a=b; c=d，留空表示匿名访问）",
            },
            FieldMeta {
                name: "cookie_file",
                description: "Cookie 文件路径（优先于 cookie 字段）",
            },
            FieldMeta {
                name: "font_cache_dir",
                description: "字体文件与映射表缓存目录（相对路径基于数据目录）",
            },
            FieldMeta {
                name: "dump_debug_pages",
                description: "解析失败时是否把页面 HTML 保存到保存路径下的 debug_pages 目录便于排查",
            },
            FieldMeta {
                name: "save_path",
                description: "保存路径",
            },
        ];
        &FIELDS
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.max_workers == 0 {
            return Err(ConfigError::Validation(
                "max_workers 必须大于 0".to_string(),
            ));
        }
        if self.min_wait_time > self.max_wait_time {
            return Err(ConfigError::Validation(format!(
                "min_wait_time ({}) 不能大于 max_wait_time ({})",
                self.min_wait_time, self.max_wait_time
            )));
        }
        if self.use_api && self.api_sources.iter().all(|s| s.base_url.trim().is_empty()) {
            return Err(ConfigError::Validation(
                "use_api=true 时，api_sources 不能为空".to_string(),
            ));
        }
        Ok(())
    }
}

impl Config {
    pub fn default_save_dir(&self) -> PathBuf {
        if self.save_path.trim().is_empty() {
            std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
        } else {
            PathBuf::from(&self.save_path)
        }
    }

    pub fn with_data_dir(mut self, dir: Option<&Path>) -> Self {
        self.data_dir = dir.map(Path::to_path_buf);
        self
    }

    /// 相对路径挂在数据目录下，未指定数据目录时相对当前目录。
    pub fn font_cache_path(&self) -> PathBuf {
        let dir = match self.font_cache_dir.trim() {
            "" => PathBuf::from(default_font_cache_dir()),
            configured => PathBuf::from(configured),
        };
        match &self.data_dir {
            Some(base) if dir.is_relative() => base.join(dir),
            _ => dir,
        }
    }

    /// 调试页面目录（仅在 `dump_debug_pages` 打开时使用）。
    pub fn debug_pages_dir(&self) -> PathBuf {
        self.default_save_dir().join("debug_pages")
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout.max(1))
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        if self.min_connect_timeout <= 0.0 || !self.min_connect_timeout.is_finite() {
            return None;
        }
        let ms = (self.min_connect_timeout * 1000.0).round() as u64;
        if ms == 0 {
            None
        } else {
            Some(Duration::from_millis(ms))
        }
    }

    pub fn web_base(&self) -> String {
        self.web_base_url.trim().trim_end_matches('/').to_string()
    }
}

/// 生成可安全用作文件名的字符串。
pub fn safe_fs_name(name: &str, replacement: &str, max_len: usize) -> String {
    let mut out = String::with_capacity(name.len());
    for ch in name.trim().chars() {
        if matches!(ch, '<' | '>' | ':' | '"' | '/' | '\\' | '|' | '?' | '*') || ch.is_control() {
            out.push_str(replacement);
        } else {
            out.push(ch);
        }
    }
    let trimmed = out.trim_matches(|c: char| c == '.' || c.is_whitespace());
    let mut result: String = trimmed.chars().take(max_len).collect();
    if result.is_empty() {
        result = "untitled".to_string();
    }
    result
}

fn default_true() -> bool {
    true
}

fn default_max_workers() -> usize {
    4
}

fn default_request_timeout() -> u64 {
    30
}

fn default_min_connect_timeout() -> f64 {
    10.0
}

fn default_web_base_url() -> String {
    "https://fanqienovel.com".to_string()
}

fn default_web_max_retries() -> u32 {
    3
}

fn default_max_wait_time() -> u64 {
    1500
}

fn default_min_wait_time() -> u64 {
    500
}

fn default_font_cache_dir() -> String {
    "font_cache".to_string()
}

fn default_api_sources() -> Vec<MirrorSource> {
    vec![
        MirrorSource::new("https://bk.yydjtc.cn", true),
        MirrorSource::new("https://qkfqapi.vv9v.cn", true),
        MirrorSource::new("http://49.232.137.12", true),
        MirrorSource::new("http://103.236.91.147:9999", false),
        MirrorSource::new("http://43.248.77.205:22222", true),
        MirrorSource::new("http://47.108.80.161:5005", true),
        MirrorSource::new("https://fq.shusan.cn", true),
        MirrorSource::new("http://101.35.133.34:5000", true),
    ]
}
