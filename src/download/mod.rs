//! 下载模块入口。
//!
//! 负责整书下载流程编排：来源选择、并发拉取、结果保存与导出。

pub mod downloader;
pub mod models;
pub(crate) mod progress;
pub mod source;
pub mod store;
