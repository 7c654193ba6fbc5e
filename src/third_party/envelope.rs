//! 镜像 API 响应的边界解析。
//!
//! 上游 JSON 形态不稳定：外层信封 `{code, message, data}` 里的 `data`
//! 有时还会再包一层；章节目录有按卷嵌套、扁平列表、纯 ID 列表等多种形态。
//! 这里一次性归一化，上层只面对 [`Envelope`] 和 [`ChapterListShape`]。

use serde_json::Value;

use crate::base_system::json_extract::{
    JsonMap, pick_i64, pick_string, pick_u64, value_as_string,
};
use crate::download::models::ChapterRef;

const ITEM_ID_KEYS: &[&str] = &["itemId", "item_id", "chapter_id"];
const ITEM_TITLE_KEYS: &[&str] = &["title", "chapter_title", "name"];
const ITEM_INDEX_KEYS: &[&str] = &["index", "chapter_index"];
const VOLUME_ITEM_KEYS: &[&str] = &["chapters", "chapterList", "itemList"];

/// 外层信封的解读结果。
#[derive(Debug, Clone, PartialEq)]
pub enum Envelope {
    Data(Value),
    AuthFailed { message: String },
    Error { code: Option<i64>, message: String },
}

impl Envelope {
    pub fn open(body: &Value) -> Self {
        let Some(obj) = body.as_object() else {
            return Self::Error {
                code: None,
                message: "response is not a JSON object".to_string(),
            };
        };
        let code = pick_i64(obj, &["code"]);
        let message = pick_string(obj, &["message", "msg"]).unwrap_or_default();
        match (code, obj.get("data")) {
            (Some(401 | 403), _) => Self::AuthFailed { message },
            (Some(200), Some(data)) => Self::Data(data.clone()),
            _ => Self::Error { code, message },
        }
    }
}

/// 去掉 `data` 的第二层包装（仅当它是对象且带 `data` 字段时）。
pub fn unwrap_inner(data: &Value) -> &Value {
    match data.as_object().and_then(|o| o.get("data")) {
        Some(inner) => inner,
        None => data,
    }
}

/// 章节目录的几种上游形态。
#[derive(Debug, Clone, PartialEq)]
pub enum ChapterListShape {
    /// 按卷嵌套：每卷一组条目。
    Volumes(Vec<Vec<Value>>),
    /// 扁平的条目对象列表。
    Items(Vec<Value>),
    /// 只有章节 ID。
    Ids(Vec<String>),
}

impl ChapterListShape {
    /// 无法识别时返回 `None`。
    pub fn parse(data: &Value) -> Option<Self> {
        match data {
            Value::Array(arr) => Some(Self::from_array(arr)),
            Value::Object(map) => Self::from_object(map),
            _ => None,
        }
    }

    fn from_object(map: &JsonMap) -> Option<Self> {
        if let Some(Value::Array(volumes)) = map.get("chapterListWithVolume")
            && !volumes.is_empty()
        {
            return Some(Self::from_array(volumes));
        }
        if let Some(Value::Array(ids)) = map.get("allItemIds")
            && !ids.is_empty()
        {
            return Some(Self::Ids(ids.iter().filter_map(value_as_string).collect()));
        }
        if let Some(items) = volume_items(map) {
            return Some(Self::from_array(items));
        }
        match map.get("data") {
            Some(inner @ (Value::Array(_) | Value::Object(_))) => Self::parse(inner),
            _ => None,
        }
    }

    fn from_array(arr: &[Value]) -> Self {
        let nested = arr.iter().any(|v| {
            v.is_array() || v.as_object().is_some_and(|o| volume_items(o).is_some())
        });
        if nested {
            let volumes = arr
                .iter()
                .map(|v| match v {
                    Value::Array(items) => items.clone(),
                    Value::Object(o) => volume_items(o).map(|s| s.to_vec()).unwrap_or_default(),
                    other => vec![other.clone()],
                })
                .collect();
            return Self::Volumes(volumes);
        }
        if !arr.is_empty() && arr.iter().all(|v| v.is_string() || v.is_number()) {
            return Self::Ids(arr.iter().filter_map(value_as_string).collect());
        }
        Self::Items(arr.to_vec())
    }

    /// 展平成有序目录。缺 ID 的条目被跳过，且不占用序号。
    pub fn flatten(self) -> Vec<ChapterRef> {
        let mut out = Vec::new();
        match self {
            Self::Volumes(volumes) => {
                for item in volumes.iter().flatten() {
                    push_item(&mut out, item);
                }
            }
            Self::Items(items) => {
                for item in &items {
                    push_item(&mut out, item);
                }
            }
            Self::Ids(ids) => {
                for id in ids {
                    let index = out.len() + 1;
                    out.push(ChapterRef::new(id, default_title(index), index));
                }
            }
        }
        out
    }
}

fn volume_items(map: &JsonMap) -> Option<&Vec<Value>> {
    VOLUME_ITEM_KEYS
        .iter()
        .find_map(|key| map.get(*key).and_then(Value::as_array))
}

fn push_item(out: &mut Vec<ChapterRef>, item: &Value) {
    let position = out.len() + 1;
    let chapter = match item {
        Value::Object(obj) => {
            let Some(id) = pick_string(obj, ITEM_ID_KEYS) else {
                return;
            };
            let index = pick_u64(obj, ITEM_INDEX_KEYS)
                .filter(|i| *i > 0)
                .map(|i| i as usize)
                .unwrap_or(position);
            let title = pick_string(obj, ITEM_TITLE_KEYS).unwrap_or_else(|| default_title(index));
            ChapterRef::new(id, title, index)
        }
        other => match value_as_string(other) {
            Some(id) => ChapterRef::new(id, default_title(position), position),
            None => return,
        },
    };
    out.push(chapter);
}

pub fn default_title(index: usize) -> String {
    format!("第{index}章")
}
