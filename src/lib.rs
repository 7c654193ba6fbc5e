//! 番茄小说内容获取核心。
//!
//! 代码结构（读代码入口）：
//! - `base_system`：配置/日志/Cookie/书籍 ID 解析等基础设施
//! - `third_party`：多镜像 API（故障切换、正文双接口择优）
//! - `network_parser`：官网页面抓取与拦截页判定
//! - `font`：自定义字体混淆的字形还原
//! - `book_parser`：正文清洗
//! - `download`：整书下载流程与 TXT 导出

pub mod base_system;
pub mod book_parser;
pub mod download;
pub mod font;
pub mod network_parser;
pub mod third_party;
