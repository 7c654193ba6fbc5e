//! 上游 JSON 的宽松取值工具：同一含义的字段在不同镜像上可能叫不同名字、
//! 是数字也可能是数字字符串。

use serde_json::Value;

pub type JsonMap = serde_json::Map<String, Value>;

/// 依次尝试 `keys`，返回第一个非空字符串；数字会被格式化成字符串。
pub fn pick_string(map: &JsonMap, keys: &[&str]) -> Option<String> {
    keys.iter().find_map(|key| value_as_string(map.get(*key)?))
}

/// 依次尝试 `keys`，返回第一个可解释为非负整数的值。
pub fn pick_u64(map: &JsonMap, keys: &[&str]) -> Option<u64> {
    keys.iter().find_map(|key| value_as_u64(map.get(*key)?))
}

pub fn pick_i64(map: &JsonMap, keys: &[&str]) -> Option<i64> {
    keys.iter().find_map(|key| {
        let val = map.get(*key)?;
        val.as_i64()
            .or_else(|| val.as_str().and_then(|s| s.trim().parse::<i64>().ok()))
    })
}

pub fn value_as_string(val: &Value) -> Option<String> {
    match val {
        Value::String(s) => {
            let trimmed = s.trim();
            (!trimmed.is_empty()).then(|| trimmed.to_string())
        }
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

pub fn value_as_u64(val: &Value) -> Option<u64> {
    match val {
        Value::Number(n) => n
            .as_u64()
            .or_else(|| n.as_f64().filter(|f| f.is_finite() && *f >= 0.0).map(|f| f as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn obj(v: Value) -> JsonMap {
        v.as_object().cloned().unwrap()
    }

    #[test]
    fn strings_skip_blank_and_accept_numbers() {
        let map = obj(json!({"title": "  ", "name": "第一章", "book_id": 42}));
        assert_eq!(pick_string(&map, &["title", "name"]).as_deref(), Some("第一章"));
        assert_eq!(pick_string(&map, &["book_id"]).as_deref(), Some("42"));
        assert_eq!(pick_string(&map, &["missing"]), None);
    }

    #[test]
    fn numbers_accept_numeric_strings() {
        let map = obj(json!({"word_count": "12345", "chapter_count": 12.0, "bad": "x"}));
        assert_eq!(pick_u64(&map, &["word_count"]), Some(12345));
        assert_eq!(pick_u64(&map, &["chapter_count"]), Some(12));
        assert_eq!(pick_u64(&map, &["bad"]), None);
        assert_eq!(pick_i64(&obj(json!({"code": "-3"})), &["code"]), Some(-3));
    }
}
