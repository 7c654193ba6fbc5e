use regex::Regex;
use std::sync::OnceLock;

static RE_IMG: OnceLock<Regex> = OnceLock::new();
static RE_TAG: OnceLock<Regex> = OnceLock::new();
static RE_BLANK_RUN: OnceLock<Regex> = OnceLock::new();

fn re_img() -> &'static Regex {
    RE_IMG.get_or_init(|| Regex::new(r"(?i)<img[^>]*>").expect("valid img regex"))
}

fn re_tag() -> &'static Regex {
    RE_TAG.get_or_init(|| Regex::new(r"<[^>]+>").expect("valid tag regex"))
}

fn re_blank_run() -> &'static Regex {
    RE_BLANK_RUN.get_or_init(|| Regex::new(r"\n\s*\n\s*\n+").expect("valid blank-run regex"))
}

pub struct ContentParser;

impl ContentParser {
    /// 章节正文清洗：去掉图片与其余标签，还原常见实体，折叠连续空行。
    pub fn clean_html_content(raw: &str) -> String {
        if raw.is_empty() {
            return String::new();
        }
        let without_img = re_img().replace_all(raw, "");
        let with_breaks = Self::block_breaks(&without_img);
        let without_tags = re_tag().replace_all(&with_breaks, "");
        let text = Self::decode_entities(&without_tags.replace("\r\n", "\n").replace('\r', "\n"));
        re_blank_run()
            .replace_all(&text, "\n\n")
            .trim()
            .to_string()
    }

    /// `</p>` 与 `<br>` 换成换行，避免去标签后段落粘连。
    fn block_breaks(raw: &str) -> String {
        raw.replace("</p>", "</p>\n")
            .replace("</P>", "</P>\n")
            .replace("<br>", "\n")
            .replace("<br/>", "\n")
            .replace("<br />", "\n")
    }

    pub fn decode_entities(s: &str) -> String {
        if !s.contains('&') {
            return s.to_string();
        }
        s.replace("&nbsp;", " ")
            .replace("&lt;", "<")
            .replace("&gt;", ">")
            .replace("&quot;", "\"")
            .replace("&#39;", "'")
            .replace("&apos;", "'")
            .replace("&amp;", "&")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn strips_images_and_tags() {
        let raw = "<p>第一段<img src=\"x.png\"/></p><p>第二段&amp;注</p>";
        assert_eq!(ContentParser::clean_html_content(raw), "第一段\n第二段&注");
    }

    #[test]
    fn collapses_blank_runs_and_trims() {
        let raw = "\n\n  甲\n\n\n\n乙\n \n \n丙  \n";
        assert_eq!(ContentParser::clean_html_content(raw), "甲\n\n乙\n\n丙");
    }

    #[test]
    fn plain_text_passes_through() {
        assert_eq!(ContentParser::clean_html_content("只是文字"), "只是文字");
        assert_eq!(ContentParser::clean_html_content(""), "");
    }

    #[test]
    fn entities_are_decoded_once() {
        assert_eq!(
            ContentParser::decode_entities("&lt;b&gt; &amp;lt; &quot;x&quot;"),
            "<b> &lt; \"x\""
        );
    }
}
