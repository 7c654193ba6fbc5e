//! 正文解析与清洗。

pub mod parser;
