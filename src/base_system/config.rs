//! 配置文件读写与带注释生成。
//!
//! 读取流程：默认值序列化为 YAML → 用户文件逐键覆盖 → 反序列化 → 校验。
//! 用户文件缺少字段时会按默认值补齐并带注释回写。

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("io error at {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
    #[error("invalid yaml at {path}: {source}")]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
    #[error("validation error: {0}")]
    Validation(String),
}

#[derive(Debug, Clone, Copy)]
pub struct FieldMeta {
    pub name: &'static str,
    pub description: &'static str,
}

pub trait ConfigSpec: Serialize + DeserializeOwned + Default {
    const FILE_NAME: &'static str;
    fn fields() -> &'static [FieldMeta];

    fn validate(&self) -> Result<(), ConfigError> {
        Ok(())
    }
}

/// 读取配置；`base_dir` 为空时使用当前目录。
pub fn load_or_create<T: ConfigSpec>(base_dir: Option<&Path>) -> Result<T, ConfigError> {
    let path = match base_dir {
        Some(dir) => dir.join(T::FILE_NAME),
        None => PathBuf::from(T::FILE_NAME),
    };
    load_from_path(&path)
}

/// 从指定路径读取配置，不存在时写入带注释的默认配置。
pub fn load_from_path<T: ConfigSpec>(path: &Path) -> Result<T, ConfigError> {
    if !path.exists() {
        let config = T::default();
        write_with_comments(&config, path)?;
        info!("已生成默认配置文件: {}", path.display());
        return Ok(config);
    }

    let raw = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let user_yaml: Value = if raw.trim().is_empty() {
        Value::Mapping(Mapping::new())
    } else {
        serde_yaml::from_str(&raw).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?
    };

    let missing = missing_fields::<T>(&user_yaml);

    let mut merged = to_yaml(&T::default())?;
    overlay(&mut merged, user_yaml);
    let config: T =
        serde_yaml::from_value(merged).map_err(|err| ConfigError::Validation(err.to_string()))?;
    config.validate()?;

    if !missing.is_empty() {
        debug!("配置缺少字段 {:?}，按默认值补齐并回写", missing);
        write_with_comments(&config, path)?;
    }

    Ok(config)
}

pub fn write_with_comments<T: ConfigSpec>(config: &T, path: &Path) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| ConfigError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }
    let yaml = render_with_comments(config)?;
    fs::write(path, yaml).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// 按 `fields()` 顺序输出 YAML，每个字段前附注释行。
pub fn render_with_comments<T: ConfigSpec>(config: &T) -> Result<String, ConfigError> {
    let Value::Mapping(mapping) = to_yaml(config)? else {
        return Err(ConfigError::Validation(
            "config must serialize to a mapping".to_string(),
        ));
    };

    let mut blocks = Vec::with_capacity(T::fields().len());
    for field in T::fields() {
        let mut block = String::new();
        for line in field.description.lines().filter(|l| !l.trim().is_empty()) {
            block.push_str("# ");
            block.push_str(line);
            block.push('\n');
        }
        let key = Value::String(field.name.to_string());
        let value = mapping.get(&key).cloned().unwrap_or(Value::Null);
        let mut single = Mapping::new();
        single.insert(key, value);
        let body = serde_yaml::to_string(&single)
            .map_err(|err| ConfigError::Validation(err.to_string()))?;
        block.push_str(body.trim_end());
        blocks.push(block);
    }

    let mut out = blocks.join("\n");
    out.push('\n');
    Ok(out)
}

fn to_yaml<T: Serialize>(value: &T) -> Result<Value, ConfigError> {
    serde_yaml::to_value(value).map_err(|err| ConfigError::Validation(err.to_string()))
}

fn missing_fields<T: ConfigSpec>(user: &Value) -> Vec<&'static str> {
    let Value::Mapping(map) = user else {
        return T::fields().iter().map(|f| f.name).collect();
    };
    T::fields()
        .iter()
        .filter(|f| !map.contains_key(Value::String(f.name.to_string())))
        .map(|f| f.name)
        .collect()
}

/// 用户值覆盖默认值：映射逐键递归合并，其余类型（含列表）整体替换。
fn overlay(base: &mut Value, user: Value) {
    match (base, user) {
        (Value::Mapping(dest), Value::Mapping(src)) => {
            for (key, user_val) in src {
                match dest.get_mut(&key) {
                    Some(slot) => overlay(slot, user_val),
                    None => {
                        dest.insert(key, user_val);
                    }
                }
            }
        }
        (_, Value::Null) => {}
        (slot, other) => *slot = other,
    }
}
