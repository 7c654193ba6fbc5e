//! 第三方镜像 API：传输层、节点登记与故障切换、响应解析、正文择优。

pub mod api_manager;
pub mod envelope;
pub mod failover;
pub mod mirrors;
pub mod reconciler;
pub mod transport;
