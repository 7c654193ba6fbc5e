//! 从阅读页 HTML 得到字形映射表。
//!
//! 流程：提取 CSS 中的字体地址 -> 下载到缓存目录（已存在则跳过）
//! -> 按字体文件名查内存缓存、磁盘 `mapping_<key>.json`，都没有时取内置表并写回缓存。

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, OnceLock};

use anyhow::{Context, Result, anyhow};
use regex::Regex;
use sha2::{Digest, Sha256};
use tracing::{debug, info, warn};

use super::glyph_map::GlyphMap;
use crate::third_party::transport::{HttpTransport, asset_headers};

const FONT_EXTS: &[&str] = &["woff", "woff2", "ttf", "otf"];
const DEFAULT_FONT_EXT: &str = ".woff2";

static RE_FONT_URL: OnceLock<Regex> = OnceLock::new();

fn re_font_url() -> &'static Regex {
    RE_FONT_URL.get_or_init(|| {
        Regex::new(r#"url\(\s*['"]?([^)'"]+\.(?:woff2?|ttf|otf))['"]?\s*\)"#)
            .expect("valid font url regex")
    })
}

/// sha256 十六进制的前 16 位。
fn short_hash(s: &str) -> String {
    let digest = hex::encode(Sha256::digest(s.as_bytes()));
    digest[..16].to_string()
}

fn font_ext(url: &str) -> String {
    let path = url.split(['?', '#']).next().unwrap_or(url);
    let file = path.rsplit('/').next().unwrap_or(path);
    match file.rsplit_once('.') {
        Some((_, ext)) if FONT_EXTS.contains(&ext.to_ascii_lowercase().as_str()) => {
            format!(".{}", ext.to_ascii_lowercase())
        }
        _ => DEFAULT_FONT_EXT.to_string(),
    }
}

pub struct FontMappingBuilder {
    cache_dir: PathBuf,
    transport: Arc<dyn HttpTransport>,
    memo: Mutex<HashMap<String, Arc<GlyphMap>>>,
}

impl FontMappingBuilder {
    pub fn new(cache_dir: impl Into<PathBuf>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            cache_dir: cache_dir.into(),
            transport,
            memo: Mutex::new(HashMap::new()),
        }
    }

    pub fn extract_font_url(html: &str) -> Option<String> {
        let caps = re_font_url().captures(html)?;
        let raw = caps.get(1)?.as_str().trim().trim_matches(['"', '\'']);
        if raw.is_empty() {
            return None;
        }
        if raw.starts_with("//") {
            return Some(format!("https:{raw}"));
        }
        Some(raw.to_string())
    }

    /// 缓存路径为 `font_<hash(url)><ext>`，文件已存在时不重复下载。
    pub fn download_font(&self, url: &str) -> Result<PathBuf> {
        let path = self
            .cache_dir
            .join(format!("font_{}{}", short_hash(url), font_ext(url)));
        if path.exists() {
            debug!("字体已缓存: {}", path.display());
            return Ok(path);
        }

        let resp = self.transport.get(url, &[], &asset_headers())?;
        if !resp.is_success() {
            return Err(anyhow!("字体下载失败: HTTP {} ({})", resp.status, url));
        }
        fs::create_dir_all(&self.cache_dir)
            .with_context(|| format!("创建字体缓存目录失败: {}", self.cache_dir.display()))?;
        fs::write(&path, &resp.body)
            .with_context(|| format!("写入字体文件失败: {}", path.display()))?;
        info!("字体已下载到: {}", path.display());
        Ok(path)
    }

    pub fn mapping_for_font(&self, font_path: &Path) -> Result<Arc<GlyphMap>> {
        let name = font_path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let key = short_hash(&name);

        if let Some(hit) = self.lock_memo().get(&key) {
            return Ok(hit.clone());
        }

        let cache_file = self.cache_dir.join(format!("mapping_{key}.json"));
        if cache_file.exists() {
            match GlyphMap::load(&cache_file) {
                Ok(map) => {
                    info!("从缓存加载映射表: {} 个字符", map.len());
                    return Ok(self.remember(key, map));
                }
                Err(err) => warn!("映射缓存无法读取，改用内置表: {}", err),
            }
        }

        let map = GlyphMap::bundled();
        info!("使用静态字体映射: {} 个字符", map.len());
        map.save(&cache_file)
            .with_context(|| format!("写入映射缓存失败: {}", cache_file.display()))?;
        Ok(self.remember(key, map))
    }

    /// 页面里没有字体地址时返回空表（解码即原样输出）。
    pub fn from_html(&self, html: &str) -> Result<Arc<GlyphMap>> {
        let Some(url) = Self::extract_font_url(html) else {
            debug!("未找到字体URL");
            return Ok(Arc::new(GlyphMap::default()));
        };
        debug!("找到字体URL: {}", url);
        let font_path = self.download_font(&url)?;
        self.mapping_for_font(&font_path)
    }

    fn remember(&self, key: String, map: GlyphMap) -> Arc<GlyphMap> {
        let map = Arc::new(map);
        self.lock_memo().insert(key, map.clone());
        map
    }

    fn lock_memo(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<GlyphMap>>> {
        match self.memo.lock() {
            Ok(g) => g,
            Err(poisoned) => poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::third_party::transport::{HttpResponse, TransportError};
    use reqwest::header::HeaderMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    struct FontServer {
        hits: AtomicUsize,
        status: u16,
    }

    impl HttpTransport for FontServer {
        fn get(
            &self,
            _url: &str,
            _query: &[(String, String)],
            _headers: &HeaderMap,
        ) -> Result<HttpResponse, TransportError> {
            self.hits.fetch_add(1, Ordering::SeqCst);
            Ok(HttpResponse::new(self.status, b"wOF2fake".to_vec()))
        }
    }

    fn builder(dir: &TempDir, status: u16) -> (FontMappingBuilder, Arc<FontServer>) {
        let server = Arc::new(FontServer {
            hits: AtomicUsize::new(0),
            status,
        });
        (FontMappingBuilder::new(dir.path(), server.clone()), server)
    }

    #[test]
    fn extracts_first_font_url() {
        let html = r#"<style>@font-face{src:url("//lf.example.com/f/dc027189e0ba4cd.woff2") format("woff2"),url(/a.ttf)}</style>"#;
        assert_eq!(
            FontMappingBuilder::extract_font_url(html).as_deref(),
            Some("https://lf.example.com/f/dc027189e0ba4cd.woff2")
        );
        assert_eq!(
            FontMappingBuilder::extract_font_url("url(/static/a.otf)").as_deref(),
            Some("/static/a.otf")
        );
        assert!(FontMappingBuilder::extract_font_url("url(/a.png)").is_none());
    }

    #[test]
    fn font_ext_defaults_to_woff2() {
        assert_eq!(font_ext("https://x/a.TTF?v=1"), ".ttf");
        assert_eq!(font_ext("https://x.com/font"), ".woff2");
    }

    #[test]
    fn download_is_skipped_when_cached() {
        let dir = TempDir::new().unwrap();
        let (b, server) = builder(&dir, 200);
        let first = b.download_font("https://x/f.woff").unwrap();
        let second = b.download_font("https://x/f.woff").unwrap();
        assert_eq!(first, second);
        assert_eq!(server.hits.load(Ordering::SeqCst), 1);
        assert!(first.file_name().unwrap().to_string_lossy().ends_with(".woff"));
    }

    #[test]
    fn failed_download_is_an_error() {
        let dir = TempDir::new().unwrap();
        let (b, _) = builder(&dir, 404);
        assert!(b.download_font("https://x/f.woff2").is_err());
    }

    #[test]
    fn mapping_falls_back_to_bundled_and_writes_cache() {
        let dir = TempDir::new().unwrap();
        let (b, _) = builder(&dir, 200);
        let font = dir.path().join("font_abc.woff2");
        let map = b.mapping_for_font(&font).unwrap();
        assert_eq!(*map, GlyphMap::bundled());

        let cache = dir
            .path()
            .join(format!("mapping_{}.json", short_hash("font_abc.woff2")));
        assert!(cache.exists());
        assert!(Arc::ptr_eq(&map, &b.mapping_for_font(&font).unwrap()));
    }

    #[test]
    fn page_without_font_yields_empty_map() {
        let dir = TempDir::new().unwrap();
        let (b, server) = builder(&dir, 200);
        assert!(b.from_html("<html>plain</html>").unwrap().is_empty());
        assert_eq!(server.hits.load(Ordering::SeqCst), 0);
    }
}
