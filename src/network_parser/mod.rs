//! 官网页面抓取：页面初始状态解析、拦截页判定、正文还原。

pub mod network;
pub mod page_state;
pub mod verification;
