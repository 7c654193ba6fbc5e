//! 官网阅读页的自定义字体反混淆。

pub mod builder;
pub mod decoder;
pub mod default_table;
pub mod glyph_map;

pub use builder::FontMappingBuilder;
pub use decoder::TextDecoder;
pub use glyph_map::GlyphMap;
