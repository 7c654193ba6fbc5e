use super::glyph_map::GlyphMap;

pub struct TextDecoder;

impl TextDecoder {
    /// 逐字符替换：命中映射表的码位换成对应字符，其余原样保留。
    ///
    /// 输出与输入字符数相同、位置一一对应；表里没有的私有区字形会原样漏出。
    pub fn decode(text: &str, map: &GlyphMap) -> String {
        if map.is_empty() {
            return text.to_string();
        }
        text.chars()
            .map(|ch| map.get(u32::from(ch)).unwrap_or(ch))
            .collect()
    }
}
