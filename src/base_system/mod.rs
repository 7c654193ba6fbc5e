//! 基础设施：配置、日志、Cookie、ID 解析与 JSON 取值工具。

pub mod book_id;
pub mod config;
pub mod context;
pub mod cookies;
pub mod json_extract;
pub mod logging;
