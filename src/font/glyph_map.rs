//! 码位到字符的映射表，构造后不可变。
//!
//! 磁盘格式为 JSON 对象：键是十进制码位字符串，值是单个字符的字符串。

use std::collections::{BTreeMap, HashMap};
use std::fs;
use std::path::Path;

use thiserror::Error;

use super::default_table::DEFAULT_GLYPHS;

#[derive(Debug, Error)]
pub enum GlyphMapError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid glyph entry: {key:?} -> {value:?}")]
    InvalidEntry { key: String, value: String },
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GlyphMap {
    glyphs: HashMap<u32, char>,
}

impl GlyphMap {
    /// 内置静态表。
    pub fn bundled() -> Self {
        DEFAULT_GLYPHS.iter().copied().collect()
    }

    pub fn get(&self, code_point: u32) -> Option<char> {
        self.glyphs.get(&code_point).copied()
    }

    pub fn len(&self) -> usize {
        self.glyphs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.glyphs.is_empty()
    }

    pub fn from_json(text: &str) -> Result<Self, GlyphMapError> {
        let raw: HashMap<String, String> = serde_json::from_str(text)?;
        let mut glyphs = HashMap::with_capacity(raw.len());
        for (key, value) in raw {
            let code = key.trim().parse::<u32>().ok();
            let mut chars = value.chars();
            match (code, chars.next(), chars.next()) {
                (Some(code), Some(ch), None) => {
                    glyphs.insert(code, ch);
                }
                _ => return Err(GlyphMapError::InvalidEntry { key, value }),
            }
        }
        Ok(Self { glyphs })
    }

    /// 按码位升序输出，便于比对缓存文件。
    pub fn to_json(&self) -> Result<String, GlyphMapError> {
        let ordered: BTreeMap<u32, String> = self
            .glyphs
            .iter()
            .map(|(code, ch)| (*code, ch.to_string()))
            .collect();
        Ok(serde_json::to_string(&ordered)?)
    }

    pub fn load(path: &Path) -> Result<Self, GlyphMapError> {
        Self::from_json(&fs::read_to_string(path)?)
    }

    pub fn save(&self, path: &Path) -> Result<(), GlyphMapError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}

impl FromIterator<(u32, char)> for GlyphMap {
    fn from_iter<I: IntoIterator<Item = (u32, char)>>(iter: I) -> Self {
        Self {
            glyphs: iter.into_iter().collect(),
        }
    }
}
